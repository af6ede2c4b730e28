//! Bridge task
//!
//! Sole consumer of the serial channel. Every byte is handled to completion,
//! bus traffic included, before the next one is taken.

use defmt::*;
use embassy_time::Delay;
use twibridge_core::{BitBangTwi, Bridge, BridgeEvent};
use twibridge_hal_stm32f0::{FlexLine, FrameDeadline};

use crate::channels::{SerialEvent, SERIAL_CHANNEL};

/// Bit-banged TWI on the bus pins
pub type BusTwi = BitBangTwi<FlexLine<'static>, FlexLine<'static>, Delay>;

/// Bridge as run by the firmware
pub type BusBridge = Bridge<BusTwi, &'static FrameDeadline>;

/// Log stats every this many frames
const STATS_INTERVAL: u32 = 256;

#[embassy_executor::task]
pub async fn bridge_task(mut bridge: BusBridge) {
    info!("Bridge task started");

    loop {
        let byte = match SERIAL_CHANNEL.receive().await {
            SerialEvent::Byte(byte) => byte,
            SerialEvent::Lost => {
                // Whatever follows is read as a fresh frame
                bridge.resync();
                continue;
            }
        };

        match bridge.on_byte(byte) {
            BridgeEvent::Closed { error: Some(e) } => {
                warn!("Frame to 0x{:02x} failed: {:?}", bridge.decoder().address(), e);
            }
            BridgeEvent::Closed { error: None } => {
                let stats = bridge.stats();
                let frames = stats.frames_ok.wrapping_add(stats.frames_failed);
                if frames % STATS_INTERVAL == 0 {
                    info!("Bridge stats: {:?}", stats);
                }
            }
            BridgeEvent::OpenFailed { address, error } => {
                debug!("No answer from 0x{:02x}: {:?}", address, error);
            }
            _ => {}
        }
    }
}
