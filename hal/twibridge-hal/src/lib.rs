//! Twibridge Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the bridge logic is
//! written against. Chip-specific crates (currently STM32F0) implement them,
//! and the host test suites implement them with simulated hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  twibridge-firmware                     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twibridge-core (bit-bang, session,     │
//! │  bridge)                                │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twibridge-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │ twibridge-hal-  │
//!            │    stm32f0      │
//!            └─────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Open-drain bus lines
//! - [`i2c::I2cBus`] - I2C master transactions
//! - [`watchdog::FrameWatchdog`] - Frame forwarding deadline
//!
//! [`uart::UartConfig`] carries the serial line settings.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod uart;
pub mod watchdog;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, IoPin, OutputPin};
pub use i2c::{BusTiming, I2cBus};
pub use uart::UartConfig;
pub use watchdog::{FrameWatchdog, NoWatchdog};
