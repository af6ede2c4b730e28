//! Frame encoding for the serial bridge protocol.
//!
//! Frame format:
//! - ADDRESS (1 byte): 7-bit I2C target address, top bit must be 0
//! - LENGTH (2 bytes): payload length, big-endian
//! - PAYLOAD (LENGTH bytes): forwarded verbatim to the I2C target

use heapless::Vec;

/// Header size in bytes (ADDRESS + LENGTH)
pub const HEADER_LEN: usize = 3;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Highest valid 7-bit I2C address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Errors that can occur while building a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload does not fit the 16-bit length field
    PayloadTooLarge,
    /// Address uses the reserved top bit
    InvalidAddress,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Frame header as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    /// 7-bit I2C target address
    pub address: u8,
    /// Number of payload bytes that follow
    pub length: u16,
}

impl FrameHeader {
    /// Create a header for a payload of `payload_len` bytes
    pub fn new(address: u8, payload_len: usize) -> Result<Self, FrameError> {
        if address > MAX_ADDRESS {
            return Err(FrameError::InvalidAddress);
        }
        let length = u16::try_from(payload_len).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { address, length })
    }

    /// Encode the header into its three wire bytes
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let [hi, lo] = self.length.to_be_bytes();
        [self.address, hi, lo]
    }

    /// Decode a header from its three wire bytes
    ///
    /// The reserved top bit of the address byte is ignored.
    pub fn decode(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            address: bytes[0] & MAX_ADDRESS,
            length: u16::from_be_bytes([bytes[1], bytes[2]]),
        }
    }

    /// Total frame size including the header
    pub fn frame_len(&self) -> usize {
        HEADER_LEN + self.length as usize
    }
}

/// Encode a complete frame into a byte buffer
///
/// Returns the number of bytes written.
pub fn encode_frame(address: u8, payload: &[u8], buffer: &mut [u8]) -> Result<usize, FrameError> {
    let header = FrameHeader::new(address, payload.len())?;
    let frame_len = header.frame_len();
    if buffer.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    buffer[..HEADER_LEN].copy_from_slice(&header.encode());
    buffer[HEADER_LEN..frame_len].copy_from_slice(payload);

    Ok(frame_len)
}

/// Encode a complete frame into a heapless Vec
pub fn encode_frame_to_vec<const N: usize>(
    address: u8,
    payload: &[u8],
) -> Result<Vec<u8, N>, FrameError> {
    let header = FrameHeader::new(address, payload.len())?;
    let mut vec = Vec::new();
    vec.extend_from_slice(&header.encode())
        .map_err(|_| FrameError::BufferTooSmall)?;
    vec.extend_from_slice(payload)
        .map_err(|_| FrameError::BufferTooSmall)?;
    Ok(vec)
}
