//! Inter-task communication
//!
//! Serial bytes flow from the UART task to the bridge task through a single
//! bounded channel, so the bridge sees them strictly in arrival order. Data
//! loss travels down the same channel, after the bytes that preceded it. The
//! frame deadline is shared between the bridge and watchdog tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Duration;
use twibridge_hal_stm32f0::FrameDeadline;

/// Channel capacity for serial events
const SERIAL_CHANNEL_SIZE: usize = 64;

/// What the UART task hands to the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SerialEvent {
    /// One received byte
    Byte(u8),
    /// The UART dropped data; the framing can no longer be trusted
    Lost,
}

/// Received serial events, one at a time
pub static SERIAL_CHANNEL: Channel<CriticalSectionRawMutex, SerialEvent, SERIAL_CHANNEL_SIZE> =
    Channel::new();

/// Frame deadline; the window is replaced from configuration at boot
pub static FRAME_DEADLINE: FrameDeadline = FrameDeadline::new(Duration::from_millis(120));
