//! Bit-banged bus signal driver

use embedded_hal::delay::DelayNs;
use twibridge_hal::{BusTiming, IoPin};

use super::shift::{ShiftRegister, TransferWord};
use super::{BitBangError, WaitBudget};

/// Software-timed I2C master on two open-drain lines
///
/// SDA follows the usual port/direction model: while SDA is an output the
/// line is pulled low when either the port latch is low or the shift
/// register MSB is 0; as an input the line is released and only sampled.
pub struct BitBangDriver<SCL, SDA, D> {
    scl: SCL,
    sda: SDA,
    delay: D,
    timing: BusTiming,
    budget: WaitBudget,
    shift: ShiftRegister,
    sda_output: bool,
    sda_port: bool,
}

impl<SCL, SDA, D> BitBangDriver<SCL, SDA, D>
where
    SCL: IoPin,
    SDA: IoPin,
    D: DelayNs,
{
    /// Create a driver; lines are not touched until [`configure`](Self::configure)
    pub fn new(scl: SCL, sda: SDA, delay: D, timing: BusTiming, budget: WaitBudget) -> Self {
        Self {
            scl,
            sda,
            delay,
            timing,
            budget,
            shift: ShiftRegister::new(),
            sda_output: true,
            sda_port: true,
        }
    }

    /// Put the bus into its idle state
    ///
    /// Both lines released as outputs, shift register preloaded with `0xFF`,
    /// completion flag and edge counter cleared. Safe to call repeatedly.
    pub fn configure(&mut self) {
        self.scl.set_high();
        self.sda_port = true;
        self.sda_output = true;
        self.shift.load(0xFF);
        self.shift.clear();
        self.drive_sda();
    }

    /// Generate a START condition
    pub fn start(&mut self) -> Result<(), BitBangError> {
        self.scl.set_high();
        self.wait_scl_high()?;
        self.settle(self.timing.start_setup_ns());

        self.set_sda_port(false);
        self.settle(self.timing.high_period_ns());
        self.scl.set_low();
        self.set_sda_port(true);
        Ok(())
    }

    /// Generate a repeated START; identical to [`start`](Self::start)
    pub fn repeated_start(&mut self) -> Result<(), BitBangError> {
        self.start()
    }

    /// Generate a STOP condition
    pub fn stop(&mut self) -> Result<(), BitBangError> {
        self.set_sda_port(false);
        self.scl.set_high();
        self.wait_scl_high()?;
        self.settle(self.timing.high_period_ns());
        self.set_sda_port(true);
        self.settle(self.timing.low_period_ns());
        Ok(())
    }

    /// Clock out one byte and read the acknowledge bit
    ///
    /// Returns `true` when the target pulled SDA low (ACK).
    pub fn put_byte(&mut self, data: u8) -> Result<bool, BitBangError> {
        self.scl.set_low();
        self.shift.load(data);
        self.drive_sda();
        self.transfer(TransferWord::BYTE)?;

        self.set_sda_output(false);
        let ack = self.transfer(TransferWord::BIT)?;
        Ok(ack & 0x01 == 0)
    }

    /// Clock in one byte and answer it
    ///
    /// The last byte of a read is answered with NACK, all others with ACK.
    pub fn get_byte(&mut self, last: bool) -> Result<u8, BitBangError> {
        self.set_sda_output(false);
        let data = self.transfer(TransferWord::BYTE)?;

        self.shift.load(if last { 0xFF } else { 0x00 });
        self.drive_sda();
        self.transfer(TransferWord::BIT)?;
        Ok(data)
    }

    /// Run the clock until the edge counter in `word` wraps
    ///
    /// Returns the shift register contents; afterwards the register holds
    /// `0xFF` and SDA is an output again, so the line ends up released.
    pub fn transfer(&mut self, word: TransferWord) -> Result<u8, BitBangError> {
        self.shift.arm(word);

        loop {
            self.settle(self.timing.low_period_ns());

            self.scl.set_high();
            self.wait_scl_high()?;
            self.shift.rising_edge(self.sda.is_high());

            self.settle(self.timing.high_period_ns());

            self.scl.set_low();
            self.shift.falling_edge();
            self.drive_sda();

            if self.shift.is_complete() {
                break;
            }
        }

        self.settle(self.timing.low_period_ns());

        let data = self.shift.data();
        self.shift.load(0xFF);
        self.set_sda_output(true);
        Ok(data)
    }

    /// Release both lines after an aborted operation
    pub fn release(&mut self) {
        self.shift.load(0xFF);
        self.shift.clear();
        self.sda_port = true;
        self.sda_output = true;
        self.drive_sda();
        self.scl.set_high();
    }

    /// Active timing mode
    pub fn timing(&self) -> BusTiming {
        self.timing
    }

    /// Change the timing mode
    pub fn set_timing(&mut self, timing: BusTiming) {
        self.timing = timing;
    }

    /// Active clock stretch budget
    pub fn budget(&self) -> WaitBudget {
        self.budget
    }

    /// Give the lines and delay provider back
    pub fn free(self) -> (SCL, SDA, D) {
        (self.scl, self.sda, self.delay)
    }

    fn wait_scl_high(&mut self) -> Result<(), BitBangError> {
        match self.budget {
            WaitBudget::Unbounded => {
                while self.scl.is_low() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            WaitBudget::Polls(polls) => {
                for _ in 0..polls.max(1) {
                    if self.scl.is_high() {
                        return Ok(());
                    }
                }
                warn!("SCL held low past {} polls", polls);
                Err(BitBangError::ClockStretchTimeout)
            }
        }
    }

    fn settle(&mut self, ns: u32) {
        if ns > 0 {
            self.delay.delay_ns(ns);
        }
    }

    fn set_sda_port(&mut self, high: bool) {
        self.sda_port = high;
        self.drive_sda();
    }

    fn set_sda_output(&mut self, output: bool) {
        self.sda_output = output;
        self.drive_sda();
    }

    fn drive_sda(&mut self) {
        let release = !self.sda_output || (self.sda_port && self.shift.msb());
        self.sda.set_state(release);
    }
}
