//! Twibridge Serial Frame Protocol
//!
//! This crate defines the byte stream a host sends to the bridge over UART.
//! Each frame becomes exactly one I2C write transaction on the bus.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌─────────┬────────┬────────┬───────────────┐
//! │ ADDRESS │ LEN_HI │ LEN_LO │ PAYLOAD       │
//! │ 1B      │ 1B     │ 1B     │ 0–65535B      │
//! └─────────┴────────┴────────┴───────────────┘
//! ```
//!
//! There is no start byte, checksum, escaping or delimiter. Framing relies
//! entirely on the receiver counting payload bytes; a desynchronised stream
//! only recovers through the bridge's frame watchdog resetting the device.

#![no_std]
#![deny(unsafe_code)]

pub mod decoder;
pub mod frame;

pub use decoder::{CommandDecoder, DecodeEvent, DecoderState};
pub use frame::{
    encode_frame, encode_frame_to_vec, FrameError, FrameHeader, HEADER_LEN, MAX_ADDRESS,
    MAX_PAYLOAD_LEN,
};
