//! Byte-fed frame decoder.
//!
//! The decoder never buffers payload. Each inbound byte advances a four-step
//! cursor and yields a [`DecodeEvent`] telling the caller what to do on the
//! bus right now, so a frame of any length streams through in constant
//! memory.

use crate::frame::MAX_ADDRESS;

/// Decoder cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    /// Next byte is the I2C target address
    AwaitAddress,
    /// Next byte is the high half of the payload length
    AwaitLenHigh,
    /// Next byte is the low half of the payload length
    AwaitLenLow,
    /// Payload bytes are being forwarded
    Forwarding,
}

/// Action requested by a single decoded byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeEvent {
    /// Address received; open a write transaction to `address`
    Begin { address: u8 },
    /// Length high byte consumed, nothing to do yet
    Header,
    /// Length complete and nonzero; payload follows
    Armed { length: u16 },
    /// Forward `byte`; `last` closes the frame
    Payload { byte: u8, last: bool },
    /// Zero-length frame closed without payload
    End,
}

/// State machine that turns the serial byte stream into bus actions
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    state: DecoderState,
    address: u8,
    remaining: u16,
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDecoder {
    /// Create a decoder waiting for an address byte
    pub const fn new() -> Self {
        Self {
            state: DecoderState::AwaitAddress,
            address: 0,
            remaining: 0,
        }
    }

    /// Drop any partial frame and wait for an address byte
    pub fn reset(&mut self) {
        self.state = DecoderState::AwaitAddress;
        self.address = 0;
        self.remaining = 0;
    }

    /// Current cursor position
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Address of the frame being decoded
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Payload bytes still expected
    ///
    /// Only meaningful while [`DecoderState::Forwarding`].
    pub fn remaining(&self) -> u16 {
        self.remaining
    }

    /// Check whether a frame is open
    pub fn in_frame(&self) -> bool {
        self.state != DecoderState::AwaitAddress
    }

    /// Feed a single byte to the decoder
    pub fn feed(&mut self, byte: u8) -> DecodeEvent {
        match self.state {
            DecoderState::AwaitAddress => {
                self.address = byte & MAX_ADDRESS;
                self.remaining = 0;
                self.state = DecoderState::AwaitLenHigh;
                DecodeEvent::Begin {
                    address: self.address,
                }
            }
            DecoderState::AwaitLenHigh => {
                self.remaining = u16::from(byte) << 8;
                self.state = DecoderState::AwaitLenLow;
                DecodeEvent::Header
            }
            DecoderState::AwaitLenLow => {
                self.remaining |= u16::from(byte);
                if self.remaining == 0 {
                    // Nothing to forward, close right away so the next byte
                    // is read as a fresh address.
                    self.state = DecoderState::AwaitAddress;
                    DecodeEvent::End
                } else {
                    self.state = DecoderState::Forwarding;
                    DecodeEvent::Armed {
                        length: self.remaining,
                    }
                }
            }
            DecoderState::Forwarding => {
                self.remaining -= 1;
                let last = self.remaining == 0;
                if last {
                    self.state = DecoderState::AwaitAddress;
                }
                DecodeEvent::Payload { byte, last }
            }
        }
    }
}
