//! Serial to I2C bridge
//!
//! Ties the frame decoder to a master session and the frame watchdog. Every
//! byte from the serial link goes through [`Bridge::on_byte`], which performs
//! the bus action for that byte before returning. One frame maps to exactly
//! one write transaction.

use twibridge_hal::FrameWatchdog;
use twibridge_protocol::{CommandDecoder, DecodeEvent};

use crate::bus::{SessionError, TransactionMode};
use crate::session::{MasterSession, TwiPeripheral};

/// What to do with the rest of a frame once the bus reports an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailurePolicy {
    /// Issue STOP right away and swallow the remaining payload
    #[default]
    Drain,
    /// Keep writing every payload byte regardless of errors
    Continue,
}

impl FailurePolicy {
    /// Parse a policy name as used in configuration files
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "drain" => Some(FailurePolicy::Drain),
            "continue" => Some(FailurePolicy::Continue),
            _ => None,
        }
    }
}

/// Running counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    /// Frames closed without any bus error
    pub frames_ok: u32,
    /// Frames that saw at least one bus error
    pub frames_failed: u32,
    /// Payload bytes acknowledged on the bus
    pub bytes_forwarded: u32,
    /// Payload bytes that failed or were swallowed
    pub bytes_dropped: u32,
}

/// Outcome of feeding one serial byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeEvent {
    /// Header byte consumed, no bus activity
    Pending,
    /// Write transaction opened
    Opened { address: u8 },
    /// START or address phase failed
    OpenFailed { address: u8, error: SessionError },
    /// Payload byte acknowledged
    Forwarded { byte: u8 },
    /// Payload byte not acknowledged
    WriteFailed { error: SessionError },
    /// Payload byte swallowed after an earlier failure
    Dropped,
    /// Frame finished; `error` is the first failure seen, if any
    Closed { error: Option<SessionError> },
}

/// Byte-driven bridge from the serial decoder to an I2C session
pub struct Bridge<T, W> {
    decoder: CommandDecoder,
    session: MasterSession<T>,
    watchdog: W,
    policy: FailurePolicy,
    stats: BridgeStats,
    frame_error: Option<SessionError>,
    stopped: bool,
}

impl<T, W> Bridge<T, W>
where
    T: TwiPeripheral,
    W: FrameWatchdog,
{
    /// Create a bridge with the default failure policy
    pub fn new(session: MasterSession<T>, watchdog: W) -> Self {
        Self::with_policy(session, watchdog, FailurePolicy::default())
    }

    pub fn with_policy(session: MasterSession<T>, watchdog: W, policy: FailurePolicy) -> Self {
        Self {
            decoder: CommandDecoder::new(),
            session,
            watchdog,
            policy,
            stats: BridgeStats::default(),
            frame_error: None,
            stopped: true,
        }
    }

    /// Handle one byte from the serial link
    pub fn on_byte(&mut self, byte: u8) -> BridgeEvent {
        match self.decoder.feed(byte) {
            DecodeEvent::Begin { address } => self.open(address),
            DecodeEvent::Header => BridgeEvent::Pending,
            DecodeEvent::Armed { length } => {
                trace!("frame armed, {} bytes", length);
                self.watchdog.arm();
                BridgeEvent::Pending
            }
            DecodeEvent::Payload { byte, last } => {
                self.watchdog.feed();
                let event = self.forward(byte);
                if last {
                    self.watchdog.disarm();
                    self.close()
                } else {
                    event
                }
            }
            DecodeEvent::End => self.close(),
        }
    }

    /// Abandon any partial frame and wait for a new address byte
    pub fn resync(&mut self) {
        if self.decoder.in_frame() {
            warn!("dropping partial frame to 0x{:02x}", self.decoder.address());
            self.stop();
            self.watchdog.disarm();
            self.frame_error = None;
        }
        self.decoder.reset();
    }

    /// Counters since boot; they wrap rather than saturate
    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Decoder position, e.g. the address of the frame in flight
    pub fn decoder(&self) -> &CommandDecoder {
        &self.decoder
    }

    pub fn session(&self) -> &MasterSession<T> {
        &self.session
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    fn open(&mut self, address: u8) -> BridgeEvent {
        self.frame_error = None;
        self.stopped = false;

        match self.session.start_transaction(address, TransactionMode::Write) {
            Ok(()) => {
                debug!("frame to 0x{:02x}", address);
                BridgeEvent::Opened { address }
            }
            Err(error) => {
                warn!("open 0x{:02x} failed: {:?}", address, error);
                self.fail(error);
                BridgeEvent::OpenFailed { address, error }
            }
        }
    }

    fn forward(&mut self, byte: u8) -> BridgeEvent {
        if self.frame_error.is_some() && self.policy == FailurePolicy::Drain {
            self.stats.bytes_dropped = self.stats.bytes_dropped.wrapping_add(1);
            return BridgeEvent::Dropped;
        }

        match self.session.write_byte(byte) {
            Ok(()) => {
                self.stats.bytes_forwarded = self.stats.bytes_forwarded.wrapping_add(1);
                BridgeEvent::Forwarded { byte }
            }
            Err(error) => {
                if self.frame_error.is_none() {
                    warn!("write to 0x{:02x} failed: {:?}", self.decoder.address(), error);
                }
                self.stats.bytes_dropped = self.stats.bytes_dropped.wrapping_add(1);
                self.fail(error);
                BridgeEvent::WriteFailed { error }
            }
        }
    }

    fn fail(&mut self, error: SessionError) {
        if self.frame_error.is_none() {
            self.frame_error = Some(error);
        }
        if self.policy == FailurePolicy::Drain {
            self.stop();
        }
    }

    fn close(&mut self) -> BridgeEvent {
        self.stop();
        let error = self.frame_error.take();
        if error.is_some() {
            self.stats.frames_failed = self.stats.frames_failed.wrapping_add(1);
        } else {
            self.stats.frames_ok = self.stats.frames_ok.wrapping_add(1);
        }
        BridgeEvent::Closed { error }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.session.stop();
            self.stopped = true;
        }
    }
}
