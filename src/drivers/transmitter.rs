//! Transmitter capability and its two implementations.
//!
//! A transmission is a [`Session`]: the transmitter is acquired when the
//! session opens and released when it drops, on every exit path.  Inside
//! the session each repeat is `arm` → `wait` → `stop`.
//!
//! * [`HardwareTransmitter`]: the compare-match [`PulseEngine`] does the
//!   timing; `wait` spins on the transmit word and calls the idle
//!   callback between checks.
//! * [`SoftwareTransmitter`]: the legacy algorithm, bit-banged with
//!   busy-wait delays.  The idle callback is never called, and pin errors
//!   are dropped since a frame cannot be resumed half way.

use core::convert::Infallible;
use core::ops::{Deref, DerefMut};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, StatefulOutputPin};
use log::debug;

use crate::config::LegacyTiming;
use crate::drivers::pulse_engine::{EngineState, SharedEngine};
use crate::drivers::timer::{TimerPeripheral, TimerSnapshot};
use crate::protocol::encoder::{self, SwitchCode, TxWord};
use crate::protocol::pulse::{Pulse, schedule};

pub trait Transmitter {
    /// Frames sent per command.
    fn repeats(&self) -> u16;

    /// Whether a session can be opened right now.
    fn is_available(&self) -> bool;

    fn encode(&self, code: SwitchCode) -> TxWord {
        encoder::encode(code)
    }

    fn acquire(&mut self);

    /// Start one frame.
    fn arm(&mut self, word: TxWord);

    /// Block until the armed frame is out.
    fn wait(&mut self, idle: &mut dyn FnMut());

    fn stop(&mut self);

    fn release(&mut self);
}

/// Scoped use of a transmitter.
pub struct Session<'a, X: Transmitter + ?Sized> {
    tx: &'a mut X,
}

impl<'a, X: Transmitter + ?Sized> Session<'a, X> {
    pub fn open(tx: &'a mut X) -> Self {
        tx.acquire();
        Self { tx }
    }

    /// One complete frame.
    pub fn send_frame(&mut self, word: TxWord, idle: &mut dyn FnMut()) {
        self.tx.arm(word);
        self.tx.wait(idle);
        self.tx.stop();
    }
}

impl<X: Transmitter + ?Sized> Deref for Session<'_, X> {
    type Target = X;

    fn deref(&self) -> &X {
        self.tx
    }
}

impl<X: Transmitter + ?Sized> DerefMut for Session<'_, X> {
    fn deref_mut(&mut self) -> &mut X {
        self.tx
    }
}

impl<X: Transmitter + ?Sized> Drop for Session<'_, X> {
    fn drop(&mut self) {
        self.tx.release();
    }
}

// ───────────────────────────────────────────────────────────────
// Compare-match transmitter
// ───────────────────────────────────────────────────────────────

pub struct HardwareTransmitter<'e, P, T> {
    engine: &'e SharedEngine<P, T>,
    repeats: u16,
    snapshot: Option<TimerSnapshot>,
}

impl<'e, P, T> HardwareTransmitter<'e, P, T> {
    pub fn new(engine: &'e SharedEngine<P, T>, repeats: u16) -> Self {
        Self { engine, repeats, snapshot: None }
    }

    /// Timer state saved by the open session, if any.
    pub fn saved(&self) -> Option<&TimerSnapshot> {
        self.snapshot.as_ref()
    }
}

impl<P, T> Transmitter for HardwareTransmitter<'_, P, T>
where
    P: StatefulOutputPin<Error = Infallible>,
    T: TimerPeripheral,
{
    fn repeats(&self) -> u16 {
        self.repeats
    }

    fn is_available(&self) -> bool {
        self.snapshot.is_none()
            && self
                .engine
                .with(|e| e.state() != EngineState::Running)
                .unwrap_or(false)
    }

    fn acquire(&mut self) {
        self.snapshot = self.engine.with(|e| e.capture());
        debug!("tx: timer1 acquired, snapshot={:?}", self.snapshot);
    }

    fn arm(&mut self, word: TxWord) {
        self.engine.with(|e| e.arm(word));
    }

    fn wait(&mut self, idle: &mut dyn FnMut()) {
        while !self.engine.with(|e| e.is_drained()).unwrap_or(true) {
            idle();
        }
    }

    fn stop(&mut self) {
        self.engine.with(|e| e.stop());
    }

    fn release(&mut self) {
        if let Some(snap) = self.snapshot.take() {
            self.engine.with(|e| e.release(&snap));
            debug!("tx: timer1 restored");
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Legacy busy-wait transmitter
// ───────────────────────────────────────────────────────────────

pub struct SoftwareTransmitter<P, D> {
    pin: P,
    delay: D,
    timing: LegacyTiming,
    repeats: u16,
    word: TxWord,
}

impl<P, D> SoftwareTransmitter<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D, timing: LegacyTiming, repeats: u16) -> Self {
        Self { pin, delay, timing, repeats, word: TxWord::EMPTY }
    }

    /// Drive `level_high` for `us`, then pre-set the opposite level for the
    /// next pulse.
    fn pulse(&mut self, level_high: bool, us: u32) {
        if level_high {
            self.pin.set_high().ok();
            self.delay.delay_us(us);
            self.pin.set_low().ok();
        } else {
            self.pin.set_low().ok();
            self.delay.delay_us(us);
            self.pin.set_high().ok();
        }
    }
}

impl<P, D> Transmitter for SoftwareTransmitter<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    fn repeats(&self) -> u16 {
        self.repeats
    }

    fn is_available(&self) -> bool {
        true
    }

    fn acquire(&mut self) {}

    fn arm(&mut self, word: TxWord) {
        self.word = word;
    }

    fn wait(&mut self, _idle: &mut dyn FnMut()) {
        // Level of the pulse being sent; pulses alternate starting low.
        let mut high = false;
        for p in schedule(self.word) {
            match p {
                Pulse::Start => {
                    self.pin.set_high().ok();
                    self.delay.delay_us(self.timing.start_us);
                }
                Pulse::Half => {
                    self.pulse(high, self.timing.half_us);
                    high = !high;
                }
                Pulse::Full => {
                    self.pulse(high, self.timing.full_us);
                    high = !high;
                }
            }
        }
        self.word = TxWord::EMPTY;
    }

    fn stop(&mut self) {
        self.word = TxWord::EMPTY;
    }

    fn release(&mut self) {
        self.pin.set_low().ok();
    }
}
