//! Open-drain bus lines for STM32F0
//!
//! I2C pins are switched to open-drain output with the input buffer left
//! on, so the same pin can release the line and read back the real bus
//! level (clock stretching, slave ACK).

use embassy_stm32::gpio::{Flex, Pin, Speed};
use embassy_stm32::Peri;
use twibridge_hal::{InputPin, OutputPin};

/// Open-drain line backed by an embassy `Flex` pin
pub struct FlexLine<'d> {
    pin: Flex<'d>,
}

impl<'d> FlexLine<'d> {
    /// Configure `pin` as a released open-drain line
    ///
    /// The external pull-ups on the bus take the line high.
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        let mut pin = Flex::new(pin);
        pin.set_high();
        pin.set_as_input_output(Speed::VeryHigh);
        Self { pin }
    }
}

impl OutputPin for FlexLine<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

impl InputPin for FlexLine<'_> {
    fn is_high(&self) -> bool {
        self.pin.is_high()
    }
}
