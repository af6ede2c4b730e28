//! Frame forwarding watchdog
//!
//! The wire format has no delimiter or checksum, so a host that stops
//! mid-frame would leave the bridge waiting forever. The watchdog bounds the
//! time a frame may stay open; when it fires the whole device resets.

/// Deadline guard around a single frame
///
/// Lifecycle per frame: `arm` once the length is known, `feed` on every
/// forwarded payload byte, `disarm` when the frame closes.
pub trait FrameWatchdog {
    /// Start the deadline
    fn arm(&mut self);

    /// Push the deadline out again
    fn feed(&mut self);

    /// Cancel the deadline
    fn disarm(&mut self);
}

impl<W: FrameWatchdog + ?Sized> FrameWatchdog for &mut W {
    fn arm(&mut self) {
        (**self).arm();
    }

    fn feed(&mut self) {
        (**self).feed();
    }

    fn disarm(&mut self) {
        (**self).disarm();
    }
}

/// Watchdog that never fires
///
/// For hosts and tests that drive the bridge without a reset source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWatchdog;

impl FrameWatchdog for NoWatchdog {
    fn arm(&mut self) {}

    fn feed(&mut self) {}

    fn disarm(&mut self) {}
}
