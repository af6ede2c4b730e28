//! GPIO line abstractions
//!
//! I2C lines are open-drain: a line is either actively pulled low or
//! released, in which case the external pull-up takes it high unless some
//! other device on the bus holds it low. "High" on an output therefore means
//! "released", and reading the line back returns the real bus level.

/// Open-drain output line
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Release the line (pull-up takes it high)
    fn set_high(&mut self);

    /// Actively drive the line low
    fn set_low(&mut self);

    /// Set the line to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the line is currently released by us
    fn is_set_high(&self) -> bool;
}

/// Line level sampling
pub trait InputPin {
    /// Check if the line reads high (logic 1)
    ///
    /// For an open-drain line this is the bus level, which may be low even
    /// while we release it (clock stretching, slave ACK).
    fn is_high(&self) -> bool;

    /// Check if the line reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Line that can be both driven and sampled
///
/// Both I2C lines need this: SCL is read back to detect clock stretching,
/// SDA is sampled for data and acknowledge bits.
pub trait IoPin: OutputPin + InputPin {}

// Blanket implementation for types that implement both traits
impl<T: OutputPin + InputPin> IoPin for T {}
