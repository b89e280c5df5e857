//! ATtiny85 Timer1 register access.
//!
//! Timer1 is shared: the board core may already run its millisecond
//! service on it.  The pulse engine therefore captures a
//! [`TimerSnapshot`] before reprogramming the timer and restores it when
//! the transmission ends.
//!
//! ## Dual-target design
//!
//! On AVR: volatile access to the memory-mapped I/O registers.
//! On host/test: a plain in-memory register file.  Writes store the value
//! as given; the write-one-to-clear behaviour of `TIFR` is not modelled.

/// Registers the transmitter touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerReg {
    Tccr1 = 0,
    Gtccr = 1,
    Tcnt1 = 2,
    Ocr1a = 3,
    Ocr1b = 4,
    Ocr1c = 5,
    Timsk = 6,
    Tifr = 7,
    Pllcsr = 8,
}

impl TimerReg {
    pub const COUNT: usize = 9;

    /// Data-space address (I/O address + 0x20).
    pub const fn address(self) -> usize {
        match self {
            Self::Tccr1 => 0x50,
            Self::Gtccr => 0x4C,
            Self::Tcnt1 => 0x4F,
            Self::Ocr1a => 0x4E,
            Self::Ocr1b => 0x4B,
            Self::Ocr1c => 0x4D,
            Self::Timsk => 0x59,
            Self::Tifr => 0x58,
            Self::Pllcsr => 0x47,
        }
    }
}

/// Bit masks for the registers above.
pub mod bits {
    // TCCR1
    pub const CTC1: u8 = 1 << 7;
    pub const PWM1A: u8 = 1 << 6;
    pub const CS13: u8 = 1 << 3;
    pub const CS12: u8 = 1 << 2;
    pub const CS11: u8 = 1 << 1;
    pub const CS10: u8 = 1 << 0;
    pub const CS_MASK: u8 = CS13 | CS12 | CS11 | CS10;

    // TIMSK
    pub const OCIE1A: u8 = 1 << 6;
    pub const OCIE1B: u8 = 1 << 5;
    pub const TOIE1: u8 = 1 << 2;

    // TIFR
    pub const OCF1A: u8 = 1 << 6;
    pub const OCF1B: u8 = 1 << 5;
    pub const TOV1: u8 = 1 << 2;

    // PLLCSR
    pub const PCKE: u8 = 1 << 2;
}

/// Byte-wide register access.
pub trait TimerPeripheral {
    fn read(&self, reg: TimerReg) -> u8;
    fn write(&mut self, reg: TimerReg, value: u8);

    fn modify(&mut self, reg: TimerReg, f: impl FnOnce(u8) -> u8) {
        let v = self.read(reg);
        self.write(reg, f(v));
    }

    fn set_bits(&mut self, reg: TimerReg, mask: u8) {
        self.modify(reg, |v| v | mask);
    }

    fn clear_bits(&mut self, reg: TimerReg, mask: u8) {
        self.modify(reg, |v| v & !mask);
    }
}

/// Timer state owned by whoever had the timer before the transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub tccr1: u8,
    pub gtccr: u8,
    pub tifr: u8,
    pub ocr1a: u8,
    pub ocr1c: u8,
}

impl TimerSnapshot {
    pub fn capture<T: TimerPeripheral + ?Sized>(timer: &T) -> Self {
        Self {
            tccr1: timer.read(TimerReg::Tccr1),
            gtccr: timer.read(TimerReg::Gtccr),
            tifr: timer.read(TimerReg::Tifr),
            ocr1a: timer.read(TimerReg::Ocr1a),
            ocr1c: timer.read(TimerReg::Ocr1c),
        }
    }

    pub fn restore<T: TimerPeripheral + ?Sized>(&self, timer: &mut T) {
        timer.write(TimerReg::Tccr1, self.tccr1);
        timer.write(TimerReg::Gtccr, self.gtccr);
        timer.write(TimerReg::Tifr, self.tifr);
        timer.write(TimerReg::Ocr1a, self.ocr1a);
        timer.write(TimerReg::Ocr1c, self.ocr1c);
    }
}

// ── AVR implementation ────────────────────────────────────────

#[cfg(target_arch = "avr")]
pub struct Timer1 {
    _private: (),
}

#[cfg(target_arch = "avr")]
impl Timer1 {
    /// Only one handle may exist; the pulse engine takes it.
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(target_arch = "avr")]
impl TimerPeripheral for Timer1 {
    fn read(&self, reg: TimerReg) -> u8 {
        // SAFETY: every `TimerReg` maps to a valid, byte-wide ATtiny85 I/O
        // register; reads have no side effects on these registers.
        unsafe { core::ptr::read_volatile(reg.address() as *const u8) }
    }

    fn write(&mut self, reg: TimerReg, value: u8) {
        // SAFETY: as above.  `&mut self` serialises writers in thread
        // context; the compare ISRs reach the timer through the engine cell.
        unsafe { core::ptr::write_volatile(reg.address() as *mut u8, value) }
    }
}

// ── Host implementation ───────────────────────────────────────

#[cfg(not(target_arch = "avr"))]
#[derive(Debug, Clone, Default)]
pub struct Timer1 {
    regs: [u8; TimerReg::COUNT],
}

#[cfg(not(target_arch = "avr"))]
impl Timer1 {
    pub const fn new() -> Self {
        Self { regs: [0; TimerReg::COUNT] }
    }
}

#[cfg(not(target_arch = "avr"))]
impl TimerPeripheral for Timer1 {
    fn read(&self, reg: TimerReg) -> u8 {
        self.regs[reg as usize]
    }

    fn write(&mut self, reg: TimerReg, value: u8) {
        self.regs[reg as usize] = value;
    }
}
