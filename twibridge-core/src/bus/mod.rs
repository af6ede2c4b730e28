//! Bus vocabulary shared by every driver layer
//!
//! Transaction direction, TWI status codes and the session error type.

pub mod status;

pub use status::StatusCode;

/// Direction of an I2C transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionMode {
    /// Master transmits to the target
    Write,
    /// Master receives from the target
    Read,
}

impl TransactionMode {
    /// R/W bit appended to the address
    pub const fn direction_bit(self) -> u8 {
        match self {
            TransactionMode::Write => 0,
            TransactionMode::Read => 1,
        }
    }

    /// Mode encoded in an address-phase byte
    pub const fn from_address_byte(byte: u8) -> Self {
        if byte & 1 == 0 {
            TransactionMode::Write
        } else {
            TransactionMode::Read
        }
    }

    /// Address-phase byte sent right after START
    ///
    /// Only the low 7 bits of `address` are used.
    pub const fn address_byte(self, address: u8) -> u8 {
        (address << 1) | self.direction_bit()
    }

    /// Status reported when the target acknowledges its address
    pub const fn address_ack(self) -> StatusCode {
        match self {
            TransactionMode::Write => StatusCode::MT_SLA_ACK,
            TransactionMode::Read => StatusCode::MR_SLA_ACK,
        }
    }
}

/// Failure of a session-level operation
///
/// Success is always `Ok`; unlike a raw status byte, "not configured" can
/// no longer be confused with success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// The bus clock has never been configured
    NotConfigured,
    /// The peripheral reported an unexpected status
    Bus(StatusCode),
    /// The peripheral did not complete within the wait budget
    Timeout,
}

impl SessionError {
    /// Check if the target refused an address or data byte
    pub fn is_nack(&self) -> bool {
        matches!(self, SessionError::Bus(status) if status.is_nack())
    }
}
