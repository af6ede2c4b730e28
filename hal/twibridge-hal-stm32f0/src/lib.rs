//! STM32F0-specific HAL for the Twibridge firmware
//!
//! Implements the `twibridge-hal` traits on embassy-stm32 peripherals for
//! STM32F0 chips:
//!
//! - STM32F042K6 (bridge board)
//! - STM32F042F6
//!
//! # Features
//!
//! - `stm32f042k6` / `stm32f042f6` - Select the chip
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! [`gpio::FlexLine`] turns a pin into an open-drain bus line for the
//! bit-bang driver, [`watchdog::FrameDeadline`] is the frame deadline shared
//! between the bridge and watchdog tasks, and [`uart`] converts serial
//! settings and errors to and from embassy-stm32.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;
pub mod watchdog;

pub use gpio::FlexLine;
pub use uart::{usart_config, UartBusError};
pub use watchdog::FrameDeadline;
