//! I2C bus abstractions
//!
//! Provides the transaction-level I2C master trait and the bus timing
//! modes shared by the software-timed and hardware-assisted drivers.

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Bus timing mode for software-sequenced clocking
///
/// Each mode fixes the two settling delays inserted between clock edges:
/// the SCL low period (also used as bus free time) and the SCL high period
/// (also used as START/STOP setup and hold time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusTiming {
    /// Standard mode, SCL <= 100 kHz
    Standard,
    /// Fast mode, SCL 100-400 kHz
    Fast,
    /// No settling delays; the clock runs as fast as the CPU toggles it
    #[default]
    Overclock,
}

impl BusTiming {
    /// SCL low period in nanoseconds (>4.7us standard, >1.3us fast)
    pub const fn low_period_ns(self) -> u32 {
        match self {
            BusTiming::Standard => 5_000,
            BusTiming::Fast => 2_000,
            BusTiming::Overclock => 0,
        }
    }

    /// SCL high period in nanoseconds (>4.0us standard, >0.6us fast)
    pub const fn high_period_ns(self) -> u32 {
        match self {
            BusTiming::Standard => 4_000,
            BusTiming::Fast => 1_000,
            BusTiming::Overclock => 0,
        }
    }

    /// Delay between SCL going high and a (repeated) START
    ///
    /// Fast mode only needs the short setup time; the other modes wait a
    /// full low period so a repeated START sees a settled bus.
    pub const fn start_setup_ns(self) -> u32 {
        match self {
            BusTiming::Fast => self.high_period_ns(),
            _ => self.low_period_ns(),
        }
    }

    /// Parse a timing mode name as used in configuration files
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(BusTiming::Standard),
            "fast" => Some(BusTiming::Fast),
            "overclock" => Some(BusTiming::Overclock),
            _ => None,
        }
    }
}
