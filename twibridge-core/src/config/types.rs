//! Configuration types
//!
//! Defaults reproduce the classic bridge setup: 250000 baud 8N1, clock
//! divisor 1 with no prescaler, no settling delays and a 120 ms frame
//! deadline.

use twibridge_hal::{BusTiming, UartConfig};

use crate::bitbang::WaitBudget;
use crate::bridge::FailurePolicy;
use crate::session::DEFAULT_WAIT_POLLS;

/// Complete bridge configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BridgeConfig {
    /// Serial line settings
    pub uart: UartConfig,
    /// Bus settings
    pub i2c: I2cSettings,
    /// Frame handling
    pub frame: FrameSettings,
}

/// I2C bus settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct I2cSettings {
    /// Bit-rate divisor handed to the session; must be nonzero
    pub divisor: u8,
    /// Status register option bits (prescaler)
    pub status_bits: u8,
    /// Settling delays between clock edges
    pub timing: BusTiming,
    /// How long a stretched clock is tolerated
    pub stretch: WaitBudget,
    /// Completion-flag polls per session operation
    pub wait_polls: u32,
}

impl Default for I2cSettings {
    fn default() -> Self {
        Self {
            divisor: 1,
            status_bits: 0,
            timing: BusTiming::Overclock,
            stretch: WaitBudget::default(),
            wait_polls: DEFAULT_WAIT_POLLS,
        }
    }
}

/// Longest frame deadline the STM32F0 independent watchdog can cover
///
/// LSI at 40 kHz with the /256 prescaler and a full 12-bit reload gives
/// about 26.2 s.
pub const MAX_DEADLINE_MS: u32 = 26_000;

/// Frame handling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameSettings {
    /// Maximum gap between payload bytes before the device resets, at most [`MAX_DEADLINE_MS`]
    pub deadline_ms: u32,
    /// Reaction to bus errors within a frame
    pub policy: FailurePolicy,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            deadline_ms: 120,
            policy: FailurePolicy::Drain,
        }
    }
}
