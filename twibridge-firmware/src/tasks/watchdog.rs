//! Watchdog task
//!
//! Pets the independent watchdog while the frame deadline holds. An expired
//! deadline resets the chip right away; a stalled executor stops petting
//! and the watchdog resets it.

use cortex_m::peripheral::SCB;
use defmt::*;
use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_time::{Duration, Ticker};

use crate::channels::FRAME_DEADLINE;

#[embassy_executor::task]
pub async fn watchdog_task(mut wdg: IndependentWatchdog<'static, IWDG>, period: Duration) {
    info!("Watchdog task started");

    wdg.unleash();
    let mut ticker = Ticker::every(period);

    loop {
        if FRAME_DEADLINE.is_expired() {
            error!("Frame deadline expired, resetting");
            SCB::sys_reset();
        }
        wdg.pet();
        ticker.next().await;
    }
}
