//! Simulated open-drain I2C bus for host tests
//!
//! The master side is a pair of [`SimPin`]s handed to the driver under
//! test. A scripted slave watches every line change, reacts on clock edges
//! and can stretch the clock.

use core::cell::RefCell;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use twibridge_hal::{InputPin, OutputPin};

/// Condition or byte observed by the slave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    Stop,
    /// Byte clocked in from the master (address or data)
    Byte(u8),
}

#[derive(Debug, Clone, Copy)]
enum DataAck {
    All,
    NackBit7,
    NackAfter(usize),
}

/// Behaviour of the simulated target
#[derive(Debug, Clone)]
pub struct SimSlave {
    address: u8,
    data_ack: DataAck,
    read_data: Vec<u8>,
    stretch: u32,
}

impl SimSlave {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            data_ack: DataAck::All,
            read_data: Vec::new(),
            stretch: 0,
        }
    }

    /// NACK data bytes with the top bit set
    pub fn nack_data_with_bit7(mut self) -> Self {
        self.data_ack = DataAck::NackBit7;
        self
    }

    /// ACK `count` data bytes, NACK everything after
    pub fn nack_after(mut self, count: usize) -> Self {
        self.data_ack = DataAck::NackAfter(count);
        self
    }

    /// Bytes returned to master reads, 0xFF once exhausted
    pub fn with_read_data(mut self, data: &[u8]) -> Self {
        self.read_data = data.to_vec();
        self
    }

    /// Hold SCL low for `polls` reads every time the master releases it
    pub fn stretch(mut self, polls: u32) -> Self {
        self.stretch = polls;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Address,
    Write,
    Read,
    Ignore,
}

struct BusState {
    slave: SimSlave,
    master_scl: bool,
    master_sda: bool,
    slave_sda: bool,
    hold: u32,
    scl: bool,
    sda: bool,
    phase: Phase,
    shift: u8,
    bits: u8,
    ack_slot: bool,
    address_slot: bool,
    master_nacked: bool,
    data_count: usize,
    read_index: usize,
    events: Vec<BusEvent>,
    master_acks: Vec<bool>,
}

impl BusState {
    fn scl_line(&self) -> bool {
        self.master_scl && self.hold == 0
    }

    fn sda_line(&self) -> bool {
        self.master_sda && self.slave_sda
    }

    fn update(&mut self) {
        let scl = self.scl_line();
        let sda = self.sda_line();
        let (prev_scl, prev_sda) = (self.scl, self.sda);
        self.scl = scl;
        self.sda = sda;

        if scl && prev_scl && sda != prev_sda {
            if sda {
                self.on_stop();
            } else {
                self.on_start();
            }
        } else if scl && !prev_scl {
            self.on_rising(sda);
        } else if !scl && prev_scl {
            self.on_falling();
        }

        // Slave reactions may have moved SDA
        self.sda = self.sda_line();
    }

    fn on_start(&mut self) {
        self.events.push(BusEvent::Start);
        self.phase = Phase::Address;
        self.shift = 0;
        self.bits = 0;
        self.ack_slot = false;
        self.address_slot = false;
        self.slave_sda = true;
    }

    fn on_stop(&mut self) {
        self.events.push(BusEvent::Stop);
        self.phase = Phase::Idle;
        self.ack_slot = false;
        self.address_slot = false;
        self.slave_sda = true;
    }

    fn on_rising(&mut self, sda: bool) {
        if self.ack_slot {
            // The slave acknowledges SLA+R itself; only data slots carry a master ACK
            if self.phase == Phase::Read && !self.address_slot {
                self.master_nacked = sda;
                self.master_acks.push(!sda);
            }
            return;
        }
        match self.phase {
            Phase::Address | Phase::Write => {
                self.shift = (self.shift << 1) | u8::from(sda);
                self.bits += 1;
            }
            Phase::Read => self.bits += 1,
            Phase::Idle | Phase::Ignore => {}
        }
    }

    fn on_falling(&mut self) {
        if self.ack_slot {
            self.ack_slot = false;
            self.address_slot = false;
            self.slave_sda = true;
            self.bits = 0;
            self.shift = 0;
            if self.phase == Phase::Read {
                if self.master_nacked {
                    self.phase = Phase::Ignore;
                } else {
                    self.present_read_bit();
                }
            }
            return;
        }

        match self.phase {
            Phase::Address if self.bits == 8 => {
                let byte = self.shift;
                self.events.push(BusEvent::Byte(byte));
                if byte >> 1 == self.slave.address {
                    self.phase = if byte & 1 == 0 {
                        Phase::Write
                    } else {
                        self.master_nacked = false;
                        Phase::Read
                    };
                    self.slave_sda = false;
                } else {
                    self.phase = Phase::Ignore;
                }
                self.ack_slot = true;
                self.address_slot = true;
            }
            Phase::Write if self.bits == 8 => {
                let byte = self.shift;
                self.events.push(BusEvent::Byte(byte));
                let ack = match self.slave.data_ack {
                    DataAck::All => true,
                    DataAck::NackBit7 => byte & 0x80 == 0,
                    DataAck::NackAfter(count) => self.data_count < count,
                };
                self.data_count += 1;
                self.slave_sda = !ack;
                self.ack_slot = true;
            }
            Phase::Read if self.bits == 8 => {
                self.slave_sda = true;
                self.read_index += 1;
                self.ack_slot = true;
            }
            Phase::Read => self.present_read_bit(),
            _ => {}
        }
    }

    fn present_read_bit(&mut self) {
        let byte = self
            .slave
            .read_data
            .get(self.read_index)
            .copied()
            .unwrap_or(0xFF);
        self.slave_sda = (byte >> (7 - self.bits)) & 1 != 0;
    }
}

/// Two-line bus with one simulated slave
pub struct SimBus {
    state: RefCell<BusState>,
}

impl SimBus {
    pub fn new(slave: SimSlave) -> Self {
        Self {
            state: RefCell::new(BusState {
                slave,
                master_scl: true,
                master_sda: true,
                slave_sda: true,
                hold: 0,
                scl: true,
                sda: true,
                phase: Phase::Idle,
                shift: 0,
                bits: 0,
                ack_slot: false,
                address_slot: false,
                master_nacked: false,
                data_count: 0,
                read_index: 0,
                events: Vec::new(),
                master_acks: Vec::new(),
            }),
        }
    }

    pub fn scl(&self) -> SimPin<'_> {
        SimPin {
            bus: self,
            line: Line::Scl,
        }
    }

    pub fn sda(&self) -> SimPin<'_> {
        SimPin {
            bus: self,
            line: Line::Sda,
        }
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.state.borrow().events.clone()
    }

    /// Payload bytes seen after each address, START/STOP stripped
    pub fn bytes(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BusEvent::Byte(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// ACK (true) or NACK (false) answered by the master to each read byte
    pub fn master_acks(&self) -> Vec<bool> {
        self.state.borrow().master_acks.clone()
    }

    pub fn scl_level(&self) -> bool {
        self.state.borrow().scl_line()
    }

    pub fn sda_level(&self) -> bool {
        self.state.borrow().sda_line()
    }

    pub fn sda_released_by_master(&self) -> bool {
        self.state.borrow().master_sda
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Scl,
    Sda,
}

/// Master side of one bus line
pub struct SimPin<'a> {
    bus: &'a SimBus,
    line: Line,
}

impl OutputPin for SimPin<'_> {
    fn set_high(&mut self) {
        let mut state = self.bus.state.borrow_mut();
        match self.line {
            Line::Scl => {
                if !state.master_scl {
                    state.hold = state.slave.stretch;
                }
                state.master_scl = true;
            }
            Line::Sda => state.master_sda = true,
        }
        state.update();
    }

    fn set_low(&mut self) {
        let mut state = self.bus.state.borrow_mut();
        match self.line {
            Line::Scl => state.master_scl = false,
            Line::Sda => state.master_sda = false,
        }
        state.update();
    }

    fn is_set_high(&self) -> bool {
        let state = self.bus.state.borrow();
        match self.line {
            Line::Scl => state.master_scl,
            Line::Sda => state.master_sda,
        }
    }
}

impl InputPin for SimPin<'_> {
    fn is_high(&self) -> bool {
        let mut state = self.bus.state.borrow_mut();
        match self.line {
            Line::Scl => {
                if state.hold > 0 {
                    state.hold -= 1;
                    if state.hold == 0 {
                        state.update();
                    }
                }
                state.scl_line()
            }
            Line::Sda => state.sda_line(),
        }
    }
}

/// Delay provider that only adds up the requested time
#[derive(Debug, Default)]
pub struct SimDelay {
    total: u64,
}

impl SimDelay {
    pub fn total_ns(&self) -> u64 {
        self.total
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total += u64::from(ns);
    }
}
