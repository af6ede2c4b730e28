//! Serial receive task
//!
//! Moves bytes from the UART into the serial channel.

use defmt::*;
use embassy_stm32::usart::BufferedUart;
use embedded_io_async::Read;
use twibridge_hal_stm32f0::UartBusError;

use crate::channels::{SerialEvent, SERIAL_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

#[embassy_executor::task]
pub async fn uart_rx_task(mut uart: BufferedUart<'static>) {
    info!("UART RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match uart.read(&mut buf).await {
            Ok(n) => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    // Back-pressure: waits while the bridge is busy on the bus
                    SERIAL_CHANNEL.send(SerialEvent::Byte(byte)).await;
                }
            }
            Err(e) => {
                let e = UartBusError::from(e);
                if e.loses_data() {
                    warn!("UART data lost: {:?}", e);
                    SERIAL_CHANNEL.send(SerialEvent::Lost).await;
                } else {
                    warn!("UART read error: {:?}", e);
                }
            }
        }
    }
}
