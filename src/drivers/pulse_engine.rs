//! Compare-match driven pulse generator.
//!
//! Timer1 runs in CTC mode.  Every compare-A match ends a pulse: the ISR
//! toggles the RF pin, looks at the next bit of the transmit word and
//! programs the following period.
//!
//! ```text
//!            start          bit = 1          bit = 0
//!        ┌────────────┐                 ┌───────┐
//!  pin ──┘            └─────────────────┘       └───────┐
//!        │◀── start ─▶│◀──── full ─────▶│◀ half▶│◀ half▶│
//!        arm          A                 A       B       A
//! ```
//!
//! A `0` is two half pulses: compare B, at half the period, adds the
//! extra toggle.  A `1` is one full pulse with compare B disabled.
//!
//! The engine lives in a [`SharedEngine`] cell; the ISRs and the transmitter
//! reach it only through a critical section, so the transmit word is never
//! touched by two contexts at once.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;
use embedded_hal::digital::StatefulOutputPin;

use crate::config::{OcrTiming, TimerClock, TimingConfig};
use crate::drivers::timer::{TimerPeripheral, TimerReg, TimerSnapshot, bits};
use crate::error::ConfigError;
use crate::protocol::encoder::TxWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Never armed.
    Idle,
    /// Timer running, compare interrupts enabled.
    Running,
    /// Timer stopped after a frame or an abort.
    Stopped,
}

pub struct PulseEngine<P, T> {
    pin: P,
    timer: T,
    ocr: OcrTiming,
    clock_select: u8,
    pll: bool,
    word: TxWord,
    state: EngineState,
}

impl<P, T> PulseEngine<P, T>
where
    P: StatefulOutputPin<Error = Infallible>,
    T: TimerPeripheral,
{
    pub fn new(pin: P, timer: T, timing: &TimingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            pin,
            timer,
            ocr: timing.ocr()?,
            clock_select: timing.clock_select()?,
            pll: matches!(timing.clock, TimerClock::Pll64MHz),
            word: TxWord::EMPTY,
            state: EngineState::Idle,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn ocr(&self) -> OcrTiming {
        self.ocr
    }

    /// Remaining bits of the frame in flight.
    pub fn word(&self) -> TxWord {
        self.word
    }

    /// The frame (terminator included) has been shifted out.
    pub fn is_drained(&self) -> bool {
        self.word.is_empty()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn capture(&self) -> TimerSnapshot {
        TimerSnapshot::capture(&self.timer)
    }

    /// Load `word`, raise the pin and start the timer on the start interval.
    /// Call with interrupts masked.
    pub fn arm(&mut self, word: TxWord) {
        self.word = word;
        let Ok(()) = self.pin.set_high();

        let t = &mut self.timer;
        t.write(TimerReg::Tccr1, 0);
        t.write(TimerReg::Gtccr, 0);
        t.write(TimerReg::Tcnt1, 0);
        t.write(TimerReg::Tifr, bits::OCF1B | bits::OCF1A);
        if self.pll {
            t.set_bits(TimerReg::Pllcsr, bits::PCKE);
        }
        t.set_bits(TimerReg::Tccr1, bits::CTC1);
        t.write(TimerReg::Ocr1c, self.ocr.start);
        t.write(TimerReg::Ocr1a, self.ocr.start);
        t.set_bits(TimerReg::Timsk, bits::OCIE1A);
        t.set_bits(TimerReg::Tccr1, self.clock_select);

        self.state = EngineState::Running;
    }

    /// Compare-A handler body: end the current pulse, schedule the next bit.
    pub fn on_compare_a(&mut self) {
        if self.state != EngineState::Running || self.word.is_empty() {
            return;
        }
        let Ok(()) = self.pin.toggle();

        if self.word.lsb() {
            self.program(self.ocr.full, 0);
        } else {
            self.program(self.ocr.full, self.ocr.half);
        }
        self.word.shift();
    }

    /// Compare-B handler body: mid-bit toggle of a `0`.
    pub fn on_compare_b(&mut self) {
        if self.state == EngineState::Running {
            let Ok(()) = self.pin.toggle();
        }
    }

    fn program(&mut self, period: u8, half: u8) {
        let t = &mut self.timer;
        t.write(TimerReg::Ocr1a, period);
        t.write(TimerReg::Ocr1c, period);
        if half > 0 {
            t.write(TimerReg::Ocr1b, half);
            t.write(TimerReg::Tifr, bits::OCF1B);
            t.set_bits(TimerReg::Timsk, bits::OCIE1B);
        } else {
            t.clear_bits(TimerReg::Timsk, bits::OCIE1B);
        }
    }

    /// Halt the timer between frames.  Leaves the pin where it is.
    pub fn stop(&mut self) {
        let t = &mut self.timer;
        t.clear_bits(TimerReg::Tccr1, bits::CS_MASK);
        t.clear_bits(TimerReg::Timsk, bits::OCIE1A | bits::OCIE1B);
        t.write(TimerReg::Ocr1c, 0xFF);
        t.write(TimerReg::Ocr1a, 0xFF);
        t.write(TimerReg::Ocr1b, 0xFF);
        t.write(TimerReg::Tcnt1, 0);
        self.word = TxWord::EMPTY;
        self.state = EngineState::Stopped;
    }

    /// End of a transmission: pin low, timer parked, the previous owner's
    /// registers put back.
    pub fn release(&mut self, snapshot: &TimerSnapshot) {
        let Ok(()) = self.pin.set_low();
        self.stop();
        if self.pll {
            self.timer.clear_bits(TimerReg::Pllcsr, bits::PCKE);
        }
        self.timer.write(TimerReg::Ocr1c, 0xFF);
        self.timer.write(TimerReg::Tifr, bits::OCF1A | bits::OCF1B | bits::TOV1);
        snapshot.restore(&mut self.timer);
    }
}

/// Interrupt-safe home of the engine.
///
/// Typically a `static`; the board's `TIMER1_COMPA`/`TIMER1_COMPB` vectors
/// call [`SharedEngine::on_compare_a`]/[`SharedEngine::on_compare_b`].
pub struct SharedEngine<P, T> {
    cell: Mutex<RefCell<Option<PulseEngine<P, T>>>>,
}

impl<P, T> SharedEngine<P, T> {
    /// No engine installed; compare events are ignored.
    pub const fn empty() -> Self {
        Self { cell: Mutex::new(RefCell::new(None)) }
    }

    pub fn new(engine: PulseEngine<P, T>) -> Self {
        Self { cell: Mutex::new(RefCell::new(Some(engine))) }
    }

    pub fn take(&self) -> Option<PulseEngine<P, T>> {
        critical_section::with(|cs| self.cell.borrow_ref_mut(cs).take())
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.cell.borrow_ref(cs).is_some())
    }

    /// Run `f` on the engine with interrupts masked.  `None` if no engine
    /// is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut PulseEngine<P, T>) -> R) -> Option<R> {
        critical_section::with(|cs| self.cell.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<P, T> SharedEngine<P, T>
where
    P: StatefulOutputPin<Error = Infallible>,
    T: TimerPeripheral,
{
    pub fn on_compare_a(&self) {
        self.with(PulseEngine::on_compare_a);
    }

    pub fn on_compare_b(&self) {
        self.with(PulseEngine::on_compare_b);
    }
}
