//! Master transaction sequencer

use twibridge_hal::I2cBus;

use super::twi::{TwiCommand, TwiPeripheral};
use crate::bus::{SessionError, StatusCode, TransactionMode};

/// Default number of completion-flag polls before giving up
pub const DEFAULT_WAIT_POLLS: u32 = 0x8000;

/// I2C master session
///
/// A session is unconfigured until [`configure`](Self::configure) succeeds
/// once; every bus operation before that fails with
/// [`SessionError::NotConfigured`]. Operations busy-wait on the
/// peripheral's completion flag for at most the wait budget.
pub struct MasterSession<T> {
    twi: T,
    wait_polls: u32,
}

impl<T: TwiPeripheral> MasterSession<T> {
    /// Create a session with the default wait budget
    pub fn new(twi: T) -> Self {
        Self::with_wait_budget(twi, DEFAULT_WAIT_POLLS)
    }

    /// Create a session that polls the completion flag at most `polls` times
    pub fn with_wait_budget(twi: T, polls: u32) -> Self {
        Self {
            twi,
            wait_polls: polls.max(1),
        }
    }

    /// Set the bus clock divisor and status option bits
    ///
    /// Only the first successful call has an effect. Returns `false` without
    /// touching the peripheral when already configured or when `divisor`
    /// is zero.
    pub fn configure(&mut self, divisor: u8, status_bits: u8) -> bool {
        if self.twi.bit_rate() != 0 || divisor == 0 {
            return false;
        }
        self.twi.set_bit_rate(divisor);
        self.twi.set_status_bits(status_bits);
        debug!("session configured, divisor {}", divisor);
        true
    }

    pub fn is_configured(&self) -> bool {
        self.twi.bit_rate() != 0
    }

    /// Programmed clock divisor
    pub fn bit_rate(&self) -> u8 {
        self.twi.bit_rate()
    }

    /// Completion-flag poll budget
    pub fn wait_budget(&self) -> u32 {
        self.wait_polls
    }

    /// Generate START and address the target
    ///
    /// Accepts both START and repeated START. The address phase only
    /// succeeds on the SLA ACK matching `mode`.
    pub fn start_transaction(&mut self, address: u8, mode: TransactionMode) -> Result<(), SessionError> {
        self.ensure_configured()?;

        self.twi.command(TwiCommand::Reset);
        self.twi.command(TwiCommand::Start);
        self.wait()?;

        let status = self.status();
        if !status.is_start() {
            return Err(SessionError::Bus(status));
        }

        let status = self.transmit(mode.address_byte(address))?;
        if status == mode.address_ack() {
            Ok(())
        } else {
            Err(SessionError::Bus(status))
        }
    }

    /// Transmit one data byte
    pub fn write_byte(&mut self, data: u8) -> Result<(), SessionError> {
        self.ensure_configured()?;

        let status = self.transmit(data)?;
        if status.is_data_ack() {
            Ok(())
        } else {
            Err(SessionError::Bus(status))
        }
    }

    /// Receive one byte and ask for more
    pub fn read_ack(&mut self) -> Result<u8, SessionError> {
        self.receive(TwiCommand::Ack)
    }

    /// Receive the final byte of a read
    pub fn read_nack(&mut self) -> Result<u8, SessionError> {
        self.receive(TwiCommand::Nack)
    }

    /// Generate STOP; does not wait for the bus
    pub fn stop(&mut self) {
        self.twi.command(TwiCommand::Stop);
    }

    /// Peripheral the session drives
    pub fn peripheral(&self) -> &T {
        &self.twi
    }

    fn ensure_configured(&self) -> Result<(), SessionError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(SessionError::NotConfigured)
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_register(self.twi.status())
    }

    /// Load, SEND, wait, report the resulting status
    fn transmit(&mut self, data: u8) -> Result<StatusCode, SessionError> {
        self.twi.write_data(data);
        self.twi.command(TwiCommand::Send);
        self.wait()?;
        Ok(self.status())
    }

    fn receive(&mut self, command: TwiCommand) -> Result<u8, SessionError> {
        self.ensure_configured()?;

        self.twi.command(command);
        self.wait()?;
        Ok(self.twi.read_data())
    }

    fn wait(&mut self) -> Result<(), SessionError> {
        for _ in 0..self.wait_polls {
            if self.twi.is_complete() {
                return Ok(());
            }
        }
        warn!("TWI did not complete within {} polls", self.wait_polls);
        Err(SessionError::Timeout)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<(), SessionError> {
        let Some((last, head)) = buf.split_last_mut() else {
            return Ok(());
        };
        for byte in head {
            *byte = self.read_ack()?;
        }
        *last = self.read_nack()?;
        Ok(())
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), SessionError> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Run `body` and always finish with STOP once START was attempted
    fn transaction<F>(&mut self, body: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Self) -> Result<(), SessionError>,
    {
        self.ensure_configured()?;
        let result = body(self);
        self.stop();
        result
    }
}

impl<T: TwiPeripheral> I2cBus for MasterSession<T> {
    type Error = SessionError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.transaction(|session| {
            session.start_transaction(address, TransactionMode::Write)?;
            session.write_all(data)
        })
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.transaction(|session| {
            session.start_transaction(address, TransactionMode::Read)?;
            session.read_into(buf)
        })
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transaction(|session| {
            session.start_transaction(address, TransactionMode::Write)?;
            session.write_all(write_data)?;
            session.start_transaction(address, TransactionMode::Read)?;
            session.read_into(read_buf)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbang::{BitBangDriver, BitBangTwi, WaitBudget};
    use crate::sim::{BusEvent, SimBus, SimDelay, SimPin, SimSlave};
    use std::collections::VecDeque;
    use std::vec::Vec;
    use twibridge_hal::BusTiming;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Cmd(TwiCommand),
        Data(u8),
    }

    /// Peripheral answering each completing command from a status script
    #[derive(Default)]
    struct MockTwi {
        bit_rate: u8,
        status_bits: u8,
        script: VecDeque<StatusCode>,
        status: u8,
        data: u8,
        complete: bool,
        hang: bool,
        polls: u32,
        ops: Vec<Op>,
    }

    impl MockTwi {
        fn configured(script: &[StatusCode]) -> Self {
            Self {
                bit_rate: 1,
                script: script.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl TwiPeripheral for MockTwi {
        fn bit_rate(&self) -> u8 {
            self.bit_rate
        }

        fn set_bit_rate(&mut self, divisor: u8) {
            self.bit_rate = divisor;
        }

        fn set_status_bits(&mut self, bits: u8) {
            self.status_bits |= bits;
        }

        fn write_data(&mut self, data: u8) {
            self.data = data;
            self.ops.push(Op::Data(data));
        }

        fn read_data(&self) -> u8 {
            self.data
        }

        fn command(&mut self, command: TwiCommand) {
            self.ops.push(Op::Cmd(command));
            self.complete = false;
            if matches!(command, TwiCommand::Reset | TwiCommand::Stop) || self.hang {
                return;
            }
            if let Some(status) = self.script.pop_front() {
                self.status = status.code() | self.status_bits;
            }
            self.complete = true;
        }

        fn is_complete(&mut self) -> bool {
            self.polls += 1;
            self.complete
        }

        fn status(&self) -> u8 {
            self.status
        }
    }

    fn sim_session(bus: &SimBus) -> MasterSession<BitBangTwi<SimPin<'_>, SimPin<'_>, SimDelay>> {
        let driver = BitBangDriver::new(
            bus.scl(),
            bus.sda(),
            SimDelay::default(),
            BusTiming::Overclock,
            WaitBudget::Polls(64),
        );
        let mut session = MasterSession::new(BitBangTwi::new(driver));
        assert!(session.configure(1, 0));
        session
    }

    #[test]
    fn test_configure_first_call_wins() {
        let mut session = MasterSession::new(MockTwi::default());
        assert!(!session.is_configured());

        assert!(session.configure(12, 0x01));
        assert!(!session.configure(72, 0x02));

        assert_eq!(session.bit_rate(), 12);
        assert_eq!(session.peripheral().status_bits, 0x01);
    }

    #[test]
    fn test_configure_rejects_zero_divisor() {
        let mut session = MasterSession::new(MockTwi::default());
        assert!(!session.configure(0, 0));
        assert!(!session.is_configured());
        assert!(session.configure(1, 0));
    }

    #[test]
    fn test_unconfigured_session_touches_nothing() {
        let mut session = MasterSession::new(MockTwi::default());

        assert_eq!(
            session.start_transaction(0x50, TransactionMode::Write),
            Err(SessionError::NotConfigured)
        );
        assert_eq!(session.write_byte(0x00), Err(SessionError::NotConfigured));
        assert_eq!(session.read_ack(), Err(SessionError::NotConfigured));
        assert_eq!(session.write(0x50, &[1]), Err(SessionError::NotConfigured));
        assert!(session.peripheral().ops.is_empty());
    }

    #[test]
    fn test_start_transaction_sequence() {
        let twi = MockTwi::configured(&[StatusCode::START, StatusCode::MT_SLA_ACK]);
        let mut session = MasterSession::new(twi);

        assert_eq!(session.start_transaction(0x50, TransactionMode::Write), Ok(()));
        assert_eq!(
            session.peripheral().ops,
            [
                Op::Cmd(TwiCommand::Reset),
                Op::Cmd(TwiCommand::Start),
                Op::Data(0xA0),
                Op::Cmd(TwiCommand::Send),
            ]
        );
    }

    #[test]
    fn test_repeated_start_accepted() {
        let twi = MockTwi::configured(&[StatusCode::REP_START, StatusCode::MR_SLA_ACK]);
        let mut session = MasterSession::new(twi);

        assert_eq!(session.start_transaction(0x50, TransactionMode::Read), Ok(()));
        assert_eq!(session.peripheral().ops[2], Op::Data(0xA1));
    }

    #[test]
    fn test_start_failure_skips_address() {
        let twi = MockTwi::configured(&[StatusCode::ARB_LOST]);
        let mut session = MasterSession::new(twi);

        assert_eq!(
            session.start_transaction(0x50, TransactionMode::Write),
            Err(SessionError::Bus(StatusCode::ARB_LOST))
        );
        assert!(!session.peripheral().ops.contains(&Op::Cmd(TwiCommand::Send)));
    }

    #[test]
    fn test_address_ack_must_match_mode() {
        let twi = MockTwi::configured(&[StatusCode::START, StatusCode::MT_SLA_ACK]);
        let mut session = MasterSession::new(twi);

        assert_eq!(
            session.start_transaction(0x50, TransactionMode::Read),
            Err(SessionError::Bus(StatusCode::MT_SLA_ACK))
        );
    }

    #[test]
    fn test_address_nack() {
        let twi = MockTwi::configured(&[StatusCode::START, StatusCode::MT_SLA_NACK]);
        let mut session = MasterSession::new(twi);

        let err = session
            .start_transaction(0x50, TransactionMode::Write)
            .unwrap_err();
        assert!(err.is_nack());
    }

    #[test]
    fn test_write_byte_accepts_either_data_ack() {
        let twi = MockTwi::configured(&[
            StatusCode::MT_DATA_ACK,
            StatusCode::MR_DATA_ACK,
            StatusCode::MT_DATA_NACK,
        ]);
        let mut session = MasterSession::new(twi);

        assert_eq!(session.write_byte(1), Ok(()));
        assert_eq!(session.write_byte(2), Ok(()));
        assert_eq!(
            session.write_byte(3),
            Err(SessionError::Bus(StatusCode::MT_DATA_NACK))
        );
    }

    #[test]
    fn test_option_bits_masked_from_status() {
        let mut twi = MockTwi::configured(&[StatusCode::START, StatusCode::MT_SLA_ACK]);
        twi.status_bits = 0x03;
        let mut session = MasterSession::new(twi);

        assert_eq!(session.start_transaction(0x50, TransactionMode::Write), Ok(()));
    }

    #[test]
    fn test_wait_budget_exhausted() {
        let mut twi = MockTwi::configured(&[]);
        twi.hang = true;
        let mut session = MasterSession::with_wait_budget(twi, 100);

        assert_eq!(session.write_byte(0x00), Err(SessionError::Timeout));
        assert_eq!(session.peripheral().polls, 100);
    }

    #[test]
    fn test_default_wait_budget() {
        let session = MasterSession::new(MockTwi::default());
        assert_eq!(session.wait_budget(), 0x8000);
    }

    #[test]
    fn test_stop_does_not_wait() {
        let mut session = MasterSession::new(MockTwi::configured(&[]));
        session.stop();

        assert_eq!(session.peripheral().ops, [Op::Cmd(TwiCommand::Stop)]);
        assert_eq!(session.peripheral().polls, 0);
    }

    #[test]
    fn test_write_byte_fails_iff_nack() {
        let bus = SimBus::new(SimSlave::new(0x50).nack_data_with_bit7());
        let mut session = sim_session(&bus);

        session
            .start_transaction(0x50, TransactionMode::Write)
            .unwrap();
        for value in 0..=255u8 {
            let result = session.write_byte(value);
            if value & 0x80 == 0 {
                assert_eq!(result, Ok(()));
            } else {
                assert_eq!(result, Err(SessionError::Bus(StatusCode::MT_DATA_NACK)));
            }
        }
        session.stop();
    }

    #[test]
    fn test_second_start_without_stop() {
        let bus = SimBus::new(SimSlave::new(0x50));
        let mut session = sim_session(&bus);

        assert_eq!(session.start_transaction(0x50, TransactionMode::Write), Ok(()));
        assert_eq!(session.start_transaction(0x50, TransactionMode::Write), Ok(()));
        session.stop();

        let starts = bus
            .events()
            .iter()
            .filter(|e| **e == BusEvent::Start)
            .count();
        assert_eq!(starts, 2);
    }

    #[test]
    fn test_i2c_write_over_bitbang() {
        let bus = SimBus::new(SimSlave::new(0x3C));
        let mut session = sim_session(&bus);

        session.write(0x3C, &[0x00, 0xAF]).unwrap();

        assert_eq!(
            bus.events(),
            [
                BusEvent::Start,
                BusEvent::Byte(0x78),
                BusEvent::Byte(0x00),
                BusEvent::Byte(0xAF),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_i2c_write_read_uses_repeated_start() {
        let bus = SimBus::new(SimSlave::new(0x50).with_read_data(&[0xDE, 0xAD]));
        let mut session = sim_session(&bus);
        let mut buf = [0u8; 2];

        session.write_read(0x50, &[0x10], &mut buf).unwrap();

        assert_eq!(buf, [0xDE, 0xAD]);
        assert_eq!(
            bus.events(),
            [
                BusEvent::Start,
                BusEvent::Byte(0xA0),
                BusEvent::Byte(0x10),
                BusEvent::Start,
                BusEvent::Byte(0xA1),
                BusEvent::Stop,
            ]
        );
        assert_eq!(bus.master_acks(), [true, false]);
    }

    #[test]
    fn test_i2c_read_single_byte_nacks() {
        let bus = SimBus::new(SimSlave::new(0x50).with_read_data(&[0x77]));
        let mut session = sim_session(&bus);
        let mut buf = [0u8; 1];

        session.read(0x50, &mut buf).unwrap();

        assert_eq!(buf, [0x77]);
        assert_eq!(bus.master_acks(), [false]);
    }

    #[test]
    fn test_failed_write_still_stops() {
        let bus = SimBus::new(SimSlave::new(0x50));
        let mut session = sim_session(&bus);

        let err = session.write(0x51, &[0x01]).unwrap_err();

        assert_eq!(err, SessionError::Bus(StatusCode::MT_SLA_NACK));
        assert_eq!(bus.events().last(), Some(&BusEvent::Stop));
    }
}
