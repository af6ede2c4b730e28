//! TWI peripheral register contract

/// Control register command
///
/// Every command except [`Reset`](TwiCommand::Reset) clears the completion
/// flag and starts the bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiCommand {
    /// Disable and clear the control register
    Reset,
    /// Generate a (repeated) START
    Start,
    /// Transmit the data register
    Send,
    /// Receive a byte and answer ACK
    Ack,
    /// Receive a byte and answer NACK
    Nack,
    /// Generate a STOP; does not set the completion flag
    Stop,
}

/// Two-wire interface peripheral
///
/// Mirrors the register set of a classic TWI block: bit-rate divisor,
/// status register (code in the top five bits, option bits below),
/// data register, control commands and the completion flag.
pub trait TwiPeripheral {
    /// Current bit-rate divisor; zero means the bus was never set up
    fn bit_rate(&self) -> u8;

    /// Program the bit-rate divisor
    fn set_bit_rate(&mut self, divisor: u8);

    /// OR option bits (prescaler) into the status register
    fn set_status_bits(&mut self, bits: u8);

    /// Load the data register
    fn write_data(&mut self, data: u8);

    /// Read the data register
    fn read_data(&self) -> u8;

    /// Write a control command
    fn command(&mut self, command: TwiCommand);

    /// Poll the completion flag
    fn is_complete(&mut self) -> bool;

    /// Raw status register, option bits included
    fn status(&self) -> u8;
}

impl<T: TwiPeripheral + ?Sized> TwiPeripheral for &mut T {
    fn bit_rate(&self) -> u8 {
        (**self).bit_rate()
    }

    fn set_bit_rate(&mut self, divisor: u8) {
        (**self).set_bit_rate(divisor);
    }

    fn set_status_bits(&mut self, bits: u8) {
        (**self).set_status_bits(bits);
    }

    fn write_data(&mut self, data: u8) {
        (**self).write_data(data);
    }

    fn read_data(&self) -> u8 {
        (**self).read_data()
    }

    fn command(&mut self, command: TwiCommand) {
        (**self).command(command);
    }

    fn is_complete(&mut self) -> bool {
        (**self).is_complete()
    }

    fn status(&self) -> u8 {
        (**self).status()
    }
}
