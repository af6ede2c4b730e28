//! Shift register and edge counter model

/// Control word for one transfer
///
/// Holds the starting value of the 4-bit edge counter. The counter ticks on
/// every clock edge and the transfer ends when it wraps, so a start value of
/// `n` yields `16 - n` edges, i.e. `(16 - n) / 2` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferWord {
    counter: u8,
}

impl TransferWord {
    /// Shift a full byte (16 edges)
    pub const BYTE: Self = Self::from_counter(0x0);
    /// Shift a single acknowledge bit (2 edges)
    pub const BIT: Self = Self::from_counter(0xE);

    /// Build from a raw counter start value (low nibble)
    pub const fn from_counter(counter: u8) -> Self {
        Self {
            counter: counter & 0x0F,
        }
    }

    /// Counter start value
    pub const fn counter(self) -> u8 {
        self.counter
    }

    /// Clock edges generated by this transfer
    pub const fn edges(self) -> u8 {
        16 - self.counter
    }
}

/// Data register plus edge counter
///
/// SDA is sampled into a latch on the rising edge and shifted in at the
/// LSB on the falling edge, which also moves the next bit into the MSB that
/// drives the line.
#[derive(Debug, Clone)]
pub struct ShiftRegister {
    data: u8,
    latch: bool,
    counter: u8,
    complete: bool,
}

impl Default for ShiftRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftRegister {
    /// Create a register holding the released level
    pub const fn new() -> Self {
        Self {
            data: 0xFF,
            latch: true,
            counter: 0,
            complete: false,
        }
    }

    /// Load the data register
    pub fn load(&mut self, data: u8) {
        self.data = data;
    }

    /// Current data register contents
    pub fn data(&self) -> u8 {
        self.data
    }

    /// Level the register presents on SDA
    pub fn msb(&self) -> bool {
        self.data & 0x80 != 0
    }

    /// Clear the completion flag and reset the counter
    pub fn clear(&mut self) {
        self.counter = 0;
        self.complete = false;
    }

    /// Prepare for a transfer
    pub fn arm(&mut self, word: TransferWord) {
        self.counter = word.counter();
        self.complete = false;
    }

    /// Rising SCL edge: sample the line
    pub fn rising_edge(&mut self, sda: bool) {
        self.latch = sda;
        self.tick();
    }

    /// Falling SCL edge: shift the sampled bit in
    pub fn falling_edge(&mut self) {
        self.data = (self.data << 1) | u8::from(self.latch);
        self.tick();
    }

    /// Check whether the edge counter has wrapped
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn tick(&mut self) {
        self.counter = (self.counter + 1) & 0x0F;
        if self.counter == 0 {
            self.complete = true;
        }
    }
}
