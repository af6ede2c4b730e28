//! I2C master session over a TWI peripheral
//!
//! [`MasterSession`] sequences START, address, data and STOP on anything
//! implementing [`TwiPeripheral`]: a hardware TWI block or the software
//! [`BitBangTwi`](crate::bitbang::BitBangTwi).

pub mod master;
pub mod twi;

pub use master::{MasterSession, DEFAULT_WAIT_POLLS};
pub use twi::{TwiCommand, TwiPeripheral};
