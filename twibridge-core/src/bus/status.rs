//! TWI status codes
//!
//! Values follow the classic two-wire interface status register layout:
//! the upper five bits carry the code, the low bits are option bits
//! (prescaler) that must be masked off before comparing.

/// Mask selecting the status code bits of the status register
pub const STATUS_MASK: u8 = 0xF8;

/// TWI status register code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusCode(u8);

impl StatusCode {
    /// Illegal START or STOP observed
    pub const BUS_ERROR: Self = Self(0x00);
    /// START transmitted
    pub const START: Self = Self(0x08);
    /// Repeated START transmitted
    pub const REP_START: Self = Self(0x10);
    /// SLA+W transmitted, ACK received
    pub const MT_SLA_ACK: Self = Self(0x18);
    /// SLA+W transmitted, NACK received
    pub const MT_SLA_NACK: Self = Self(0x20);
    /// Data transmitted, ACK received
    pub const MT_DATA_ACK: Self = Self(0x28);
    /// Data transmitted, NACK received
    pub const MT_DATA_NACK: Self = Self(0x30);
    /// Arbitration lost
    pub const ARB_LOST: Self = Self(0x38);
    /// SLA+R transmitted, ACK received
    pub const MR_SLA_ACK: Self = Self(0x40);
    /// SLA+R transmitted, NACK received
    pub const MR_SLA_NACK: Self = Self(0x48);
    /// Data received, ACK returned
    pub const MR_DATA_ACK: Self = Self(0x50);
    /// Data received, NACK returned
    pub const MR_DATA_NACK: Self = Self(0x58);
    /// No relevant state information
    pub const NO_INFO: Self = Self(0xF8);

    /// Decode a raw status register value
    pub const fn from_register(value: u8) -> Self {
        Self(value & STATUS_MASK)
    }

    /// Raw code value
    pub const fn code(self) -> u8 {
        self.0
    }

    /// START or repeated START went out
    pub fn is_start(self) -> bool {
        self == Self::START || self == Self::REP_START
    }

    /// A data byte was acknowledged, in either direction
    pub fn is_data_ack(self) -> bool {
        self == Self::MT_DATA_ACK || self == Self::MR_DATA_ACK
    }

    /// The target refused an address or data byte
    pub fn is_nack(self) -> bool {
        matches!(
            self,
            Self::MT_SLA_NACK | Self::MT_DATA_NACK | Self::MR_SLA_NACK
        )
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> u8 {
        status.0
    }
}
