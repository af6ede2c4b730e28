//! Software-timed bus signal driver
//!
//! Generates I2C signalling by toggling SCL and SDA from software. Data bits
//! move through a model of a two-wire universal serial interface: an 8-bit
//! shift register whose MSB drives SDA and a 4-bit edge counter that ends
//! each transfer. Every clock edge is produced by the CPU.
//!
//! [`BitBangTwi`] puts the TWI status-register contract on top of the
//! driver so the session sequencer can run on plain GPIO.

pub mod driver;
pub mod shift;
pub mod twi;

pub use driver::BitBangDriver;
pub use shift::{ShiftRegister, TransferWord};
pub use twi::BitBangTwi;

/// Errors raised by the bit-bang driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitBangError {
    /// SCL stayed low after being released for the whole wait budget
    ClockStretchTimeout,
}

/// Bound on how long the driver waits for a released SCL to read high
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaitBudget {
    /// Spin until the line goes high; relies on the bus always releasing
    Unbounded,
    /// Give up after this many polls of the line
    Polls(u32),
}

impl Default for WaitBudget {
    fn default() -> Self {
        WaitBudget::Polls(DEFAULT_STRETCH_POLLS)
    }
}

/// Default clock stretch budget
pub const DEFAULT_STRETCH_POLLS: u32 = 0x8000;
