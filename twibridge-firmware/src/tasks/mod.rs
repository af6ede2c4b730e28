//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod bridge;
pub mod uart_rx;
pub mod watchdog;

pub use bridge::bridge_task;
pub use uart_rx::uart_rx_task;
pub use watchdog::watchdog_task;
