//! TWI register contract emulated on the bit-bang driver

use embedded_hal::delay::DelayNs;
use twibridge_hal::IoPin;

use super::{BitBangDriver, BitBangError};
use crate::bus::status::STATUS_MASK;
use crate::bus::{StatusCode, TransactionMode};
use crate::session::{TwiCommand, TwiPeripheral};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    /// No START, or the last address was refused
    Idle,
    /// START sent, next SEND carries the address byte
    Address,
    /// Master transmitter
    Transmit,
    /// Master receiver
    Receive,
}

/// Software TWI peripheral
///
/// Each command runs to completion synchronously on the bit-bang driver and
/// then reports the status a hardware TWI block would have latched:
///
/// | Command     | Phase              | Status                     |
/// |-------------|--------------------|----------------------------|
/// | Start       | any                | `START`, `REP_START` if open |
/// | Send        | address            | `MT/MR_SLA_ACK/NACK`       |
/// | Send        | transmit           | `MT_DATA_ACK/NACK`         |
/// | Ack / Nack  | receive            | `MR_DATA_ACK/NACK`         |
/// | other       | any                | `BUS_ERROR`                |
///
/// STOP and Reset leave the completion flag clear, as does a driver
/// failure; the latter is kept in [`last_error`](Self::last_error).
pub struct BitBangTwi<SCL, SDA, D> {
    driver: BitBangDriver<SCL, SDA, D>,
    bit_rate: u8,
    status_bits: u8,
    data: u8,
    status: StatusCode,
    complete: bool,
    phase: Phase,
    open: bool,
    last_error: Option<BitBangError>,
}

impl<SCL, SDA, D> BitBangTwi<SCL, SDA, D>
where
    SCL: IoPin,
    SDA: IoPin,
    D: DelayNs,
{
    /// Wrap a driver and put the bus into its idle state
    pub fn new(mut driver: BitBangDriver<SCL, SDA, D>) -> Self {
        driver.configure();
        Self {
            driver,
            bit_rate: 0,
            status_bits: 0,
            data: 0xFF,
            status: StatusCode::NO_INFO,
            complete: false,
            phase: Phase::Idle,
            open: false,
            last_error: None,
        }
    }

    /// Most recent driver failure, if any
    pub fn last_error(&self) -> Option<BitBangError> {
        self.last_error
    }

    /// Check whether a START has been sent without a matching STOP
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn finish(&mut self, status: StatusCode) {
        self.status = status;
        self.complete = true;
    }

    fn fail(&mut self, error: BitBangError) {
        warn!("bit-bang {:?} failed: {:?}", self.phase, error);
        self.last_error = Some(error);
        self.driver.release();
        self.status = StatusCode::NO_INFO;
        self.complete = false;
        self.open = false;
        self.phase = Phase::Idle;
    }

    fn start(&mut self) -> Result<(), BitBangError> {
        let status = if self.open {
            self.driver.repeated_start()?;
            StatusCode::REP_START
        } else {
            self.driver.start()?;
            StatusCode::START
        };
        self.open = true;
        self.phase = Phase::Address;
        self.finish(status);
        Ok(())
    }

    fn send(&mut self) -> Result<(), BitBangError> {
        match self.phase {
            Phase::Address => {
                let mode = TransactionMode::from_address_byte(self.data);
                let ack = self.driver.put_byte(self.data)?;
                let status = match (mode, ack) {
                    (TransactionMode::Write, true) => StatusCode::MT_SLA_ACK,
                    (TransactionMode::Write, false) => StatusCode::MT_SLA_NACK,
                    (TransactionMode::Read, true) => StatusCode::MR_SLA_ACK,
                    (TransactionMode::Read, false) => StatusCode::MR_SLA_NACK,
                };
                self.phase = match (mode, ack) {
                    (_, false) => Phase::Idle,
                    (TransactionMode::Write, true) => Phase::Transmit,
                    (TransactionMode::Read, true) => Phase::Receive,
                };
                self.finish(status);
            }
            Phase::Transmit => {
                let status = if self.driver.put_byte(self.data)? {
                    StatusCode::MT_DATA_ACK
                } else {
                    StatusCode::MT_DATA_NACK
                };
                self.finish(status);
            }
            Phase::Idle | Phase::Receive => self.finish(StatusCode::BUS_ERROR),
        }
        Ok(())
    }

    fn receive(&mut self, last: bool) -> Result<(), BitBangError> {
        if self.phase != Phase::Receive {
            self.finish(StatusCode::BUS_ERROR);
            return Ok(());
        }
        self.data = self.driver.get_byte(last)?;
        self.finish(if last {
            StatusCode::MR_DATA_NACK
        } else {
            StatusCode::MR_DATA_ACK
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BitBangError> {
        let was_open = self.open;
        self.open = false;
        self.phase = Phase::Idle;
        self.status = StatusCode::NO_INFO;
        // Not bus master: nothing to release
        if was_open {
            self.driver.stop()
        } else {
            Ok(())
        }
    }
}

impl<SCL, SDA, D> TwiPeripheral for BitBangTwi<SCL, SDA, D>
where
    SCL: IoPin,
    SDA: IoPin,
    D: DelayNs,
{
    /// Stored only; the bit-bang clock follows the driver's timing mode
    fn bit_rate(&self) -> u8 {
        self.bit_rate
    }

    fn set_bit_rate(&mut self, divisor: u8) {
        self.bit_rate = divisor;
    }

    fn set_status_bits(&mut self, bits: u8) {
        self.status_bits |= bits & !STATUS_MASK;
    }

    fn write_data(&mut self, data: u8) {
        self.data = data;
    }

    fn read_data(&self) -> u8 {
        self.data
    }

    fn command(&mut self, command: TwiCommand) {
        self.complete = false;
        let result = match command {
            TwiCommand::Reset => {
                // Lines stay as they are so a following START repeats
                self.phase = Phase::Idle;
                self.status = StatusCode::NO_INFO;
                Ok(())
            }
            TwiCommand::Start => self.start(),
            TwiCommand::Send => self.send(),
            TwiCommand::Ack => self.receive(false),
            TwiCommand::Nack => self.receive(true),
            TwiCommand::Stop => self.stop(),
        };
        if let Err(error) = result {
            self.fail(error);
        }
    }

    fn is_complete(&mut self) -> bool {
        self.complete
    }

    fn status(&self) -> u8 {
        self.status.code() | self.status_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbang::WaitBudget;
    use crate::sim::{BusEvent, SimBus, SimDelay, SimPin, SimSlave};
    use twibridge_hal::BusTiming;

    fn twi(bus: &SimBus) -> BitBangTwi<SimPin<'_>, SimPin<'_>, SimDelay> {
        BitBangTwi::new(BitBangDriver::new(
            bus.scl(),
            bus.sda(),
            SimDelay::default(),
            BusTiming::Overclock,
            WaitBudget::Polls(32),
        ))
    }

    fn run(twi: &mut impl TwiPeripheral, command: TwiCommand) -> StatusCode {
        twi.command(command);
        assert!(twi.is_complete());
        StatusCode::from_register(twi.status())
    }

    fn send(twi: &mut impl TwiPeripheral, data: u8) -> StatusCode {
        twi.write_data(data);
        run(twi, TwiCommand::Send)
    }

    #[test]
    fn test_write_status_sequence() {
        let bus = SimBus::new(SimSlave::new(0x50));
        let mut twi = twi(&bus);

        assert_eq!(run(&mut twi, TwiCommand::Start), StatusCode::START);
        assert_eq!(send(&mut twi, 0xA0), StatusCode::MT_SLA_ACK);
        assert_eq!(send(&mut twi, 0x11), StatusCode::MT_DATA_ACK);
        twi.command(TwiCommand::Stop);
        assert!(!twi.is_complete());

        assert_eq!(
            bus.events(),
            [
                BusEvent::Start,
                BusEvent::Byte(0xA0),
                BusEvent::Byte(0x11),
                BusEvent::Stop
            ]
        );
    }

    #[test]
    fn test_address_nack() {
        let bus = SimBus::new(SimSlave::new(0x50));
        let mut twi = twi(&bus);

        run(&mut twi, TwiCommand::Start);
        assert_eq!(send(&mut twi, 0x78), StatusCode::MT_SLA_NACK);
        // Data after a refused address is a protocol error
        assert_eq!(send(&mut twi, 0x00), StatusCode::BUS_ERROR);
    }

    #[test]
    fn test_data_nack() {
        let bus = SimBus::new(SimSlave::new(0x50).nack_after(1));
        let mut twi = twi(&bus);

        run(&mut twi, TwiCommand::Start);
        send(&mut twi, 0xA0);
        assert_eq!(send(&mut twi, 0x01), StatusCode::MT_DATA_ACK);
        assert_eq!(send(&mut twi, 0x02), StatusCode::MT_DATA_NACK);
    }

    #[test]
    fn test_repeated_start_then_read() {
        let bus = SimBus::new(SimSlave::new(0x50).with_read_data(&[0x42, 0x43]));
        let mut twi = twi(&bus);

        run(&mut twi, TwiCommand::Start);
        send(&mut twi, 0xA0);
        send(&mut twi, 0x10);

        twi.command(TwiCommand::Reset);
        assert_eq!(run(&mut twi, TwiCommand::Start), StatusCode::REP_START);
        assert_eq!(send(&mut twi, 0xA1), StatusCode::MR_SLA_ACK);
        assert_eq!(run(&mut twi, TwiCommand::Ack), StatusCode::MR_DATA_ACK);
        assert_eq!(twi.read_data(), 0x42);
        assert_eq!(run(&mut twi, TwiCommand::Nack), StatusCode::MR_DATA_NACK);
        assert_eq!(twi.read_data(), 0x43);
        twi.command(TwiCommand::Stop);

        assert_eq!(bus.master_acks(), [true, false]);
        assert!(!twi.is_open());
    }

    #[test]
    fn test_receive_outside_read_phase_is_bus_error() {
        let bus = SimBus::new(SimSlave::new(0x50));
        let mut twi = twi(&bus);

        run(&mut twi, TwiCommand::Start);
        send(&mut twi, 0xA0);
        assert_eq!(run(&mut twi, TwiCommand::Ack), StatusCode::BUS_ERROR);
    }

    #[test]
    fn test_option_bits_reported_with_status() {
        let bus = SimBus::new(SimSlave::new(0x50));
        let mut twi = twi(&bus);
        twi.set_status_bits(0x03);
        twi.set_status_bits(0xF0);

        twi.command(TwiCommand::Start);
        assert_eq!(twi.status(), 0x08 | 0x03);
        assert_eq!(StatusCode::from_register(twi.status()), StatusCode::START);
    }

    #[test]
    fn test_stop_without_start_is_silent() {
        let bus = SimBus::new(SimSlave::new(0x50));
        let mut twi = twi(&bus);

        twi.command(TwiCommand::Stop);

        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_stretch_timeout_leaves_flag_clear() {
        let bus = SimBus::new(SimSlave::new(0x50).stretch(500));
        let mut twi = twi(&bus);

        twi.command(TwiCommand::Start);
        assert!(twi.is_complete());
        twi.write_data(0xA0);
        twi.command(TwiCommand::Send);

        assert!(!twi.is_complete());
        assert_eq!(twi.last_error(), Some(BitBangError::ClockStretchTimeout));
        assert!(!twi.is_open());
        assert!(bus.sda_released_by_master());
    }
}
