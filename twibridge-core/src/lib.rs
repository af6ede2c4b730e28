//! Board-agnostic core logic for the serial to I2C bridge
//!
//! This crate contains everything that does not depend on a specific chip:
//!
//! - Bus vocabulary (transaction mode, TWI status codes, errors)
//! - Software-timed bus signal driver (bit-banged, USI-style shift model)
//! - TWI session sequencer over any [`session::TwiPeripheral`]
//! - The bridge tying the frame decoder to the session and watchdog
//! - Configuration types and the embedded config parser

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod bitbang;
pub mod bridge;
pub mod bus;
pub mod config;
pub mod session;

pub use bitbang::{BitBangDriver, BitBangError, BitBangTwi, WaitBudget};
pub use bridge::{Bridge, BridgeEvent, BridgeStats, FailurePolicy};
pub use bus::{SessionError, StatusCode, TransactionMode};
pub use config::{parse_config, BridgeConfig, ConfigError};
pub use session::{MasterSession, TwiCommand, TwiPeripheral};

#[cfg(test)]
pub(crate) mod sim;
