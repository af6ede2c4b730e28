//! Twibridge - Serial to I2C Bridge Firmware
//!
//! Firmware for STM32F042K6 bridge boards. Receives
//! `[address][length][payload]` frames on USART2 and replays each frame as
//! one I2C write transaction, bit-banged on PB6 (SCL) / PB7 (SDA).

#![no_std]
#![no_main]

mod channels;
mod tasks;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::peripherals::USART2;
use embassy_stm32::usart::{BufferedInterruptHandler, BufferedUart};
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_time::{Delay, Duration};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use twibridge_core::config::MAX_DEADLINE_MS;
use twibridge_core::{parse_config, BitBangDriver, BitBangTwi, Bridge, BridgeConfig, MasterSession};
use twibridge_hal_stm32f0::{usart_config, FlexLine};

use crate::channels::FRAME_DEADLINE;

/// Embedded configuration (compiled into firmware)
/// Edit bridge.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../bridge.toml");

/// Watchdog pets per deadline window
const PETS_PER_WINDOW: u32 = 4;

bind_interrupts!(struct Irqs {
    USART2 => BufferedInterruptHandler<USART2>;
});

// UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Twibridge firmware starting...");

    let p = embassy_stm32::init(Default::default());

    let config = load_config();

    // Serial link to the host (PA2=TX, PA3=RX on F042K6)
    let uart = unwrap!(BufferedUart::new(
        p.USART2,
        p.PA3,
        p.PA2,
        TX_BUF.init([0; 16]),
        RX_BUF.init([0; 256]),
        Irqs,
        usart_config(&config.uart),
    ));
    info!("UART at {} baud", config.uart.baudrate);

    // Bus lines (PB6=SCL, PB7=SDA), open-drain with external pull-ups
    let driver = BitBangDriver::new(
        FlexLine::new(p.PB6),
        FlexLine::new(p.PB7),
        Delay,
        config.i2c.timing,
        config.i2c.stretch,
    );
    let mut session = MasterSession::with_wait_budget(BitBangTwi::new(driver), config.i2c.wait_polls);
    if !session.configure(config.i2c.divisor, config.i2c.status_bits) {
        warn!("I2C session not configured, frames will fail");
    }
    info!("I2C timing {:?}", config.i2c.timing);

    let window = Duration::from_millis(u64::from(config.frame.deadline_ms));
    FRAME_DEADLINE.set_window(window);
    let bridge = Bridge::with_policy(session, &FRAME_DEADLINE, config.frame.policy);
    info!("Bus failure policy {:?}", bridge.policy());

    // Hardware watchdog covers a stalled executor as well as an expired frame
    let timeout_us = config.frame.deadline_ms.min(MAX_DEADLINE_MS) * 1000;
    let wdg = IndependentWatchdog::new(p.IWDG, timeout_us);
    let pet_period = window / PETS_PER_WINDOW;

    spawner.spawn(unwrap!(tasks::uart_rx_task(uart)));
    spawner.spawn(unwrap!(tasks::bridge_task(bridge)));
    spawner.spawn(unwrap!(tasks::watchdog_task(wdg, pet_period)));

    info!("All tasks spawned, bridge running");
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> BridgeConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Loaded configuration from bridge.toml");
            config
        }
        Err(e) => {
            warn!("Config error on line {} (using defaults): {:?}", e.line(), e);
            BridgeConfig::default()
        }
    }
}
