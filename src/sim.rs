//! Host-side simulation of the device.
//!
//! * [`SimClock`]: shared nanosecond clock; nothing sleeps for real.
//! * [`SimDelay`]: `DelayNs` that advances the clock.
//! * [`TracePin`]: output pin recording every level change with its time.
//! * [`SimTicker`]: plays the Timer1 compare-match hardware.  Each
//!   [`step`](SimTicker::step) jumps to the next enabled compare event and
//!   runs the matching ISR body on the engine.
//! * [`SimLink`]: `LinkPort` whose refresh steps the ticker, standing in
//!   for interrupts arriving while the main loop spins.
//! * [`EndpointPort`]: host-side `FeatureReportPort` wired straight into a
//!   device [`ReportEndpoint`].
//!
//! The simulated counter runs from 0 to the compare value and restarts, so
//! a CTC period is exactly `OCR1A` ticks.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

use crate::adapters::report_endpoint::ReportEndpoint;
use crate::app::ports::LinkPort;
use crate::config::TimerClock;
use crate::drivers::pulse_engine::SharedEngine;
use crate::drivers::timer::{TimerPeripheral, TimerReg, bits};
use crate::host::FeatureReportPort;
use crate::protocol::record::RECORD_LEN;

// ───────────────────────────────────────────────────────────────
// Clock and delay
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ns(&self) -> u64 {
        self.0.get()
    }

    pub fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

#[derive(Debug, Clone)]
pub struct SimDelay {
    clock: SimClock,
}

impl SimDelay {
    pub fn new(clock: SimClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(u64::from(ns));
    }
}

// ───────────────────────────────────────────────────────────────
// Edge-recording pin
// ───────────────────────────────────────────────────────────────

/// Level change: time in ns and the new level.
pub type Edge = (u64, bool);

/// Clones share the line: all handles see and record the same level.
#[derive(Debug, Clone)]
pub struct TracePin {
    clock: SimClock,
    level: Rc<Cell<bool>>,
    edges: Rc<RefCell<Vec<Edge>>>,
}

impl TracePin {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            level: Rc::new(Cell::new(false)),
            edges: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn drive(&self, high: bool) {
        if self.level.get() != high {
            self.level.set(high);
            self.edges.borrow_mut().push((self.clock.now_ns(), high));
        }
    }

    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.edges.borrow().clone()
    }

    /// Time between consecutive edges, i.e. the width of every pulse that
    /// has ended.
    pub fn widths_ns(&self) -> Vec<u32> {
        self.edges
            .borrow()
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) as u32)
            .collect()
    }

    pub fn clear(&self) {
        self.edges.borrow_mut().clear();
    }
}

impl ErrorType for TracePin {
    type Error = Infallible;
}

impl OutputPin for TracePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

impl StatefulOutputPin for TracePin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

// ───────────────────────────────────────────────────────────────
// Timer1 compare-match model
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareEvent {
    A,
    B,
}

#[derive(Debug, Clone)]
pub struct SimTicker {
    clock: SimClock,
    timer_hz: u32,
}

impl SimTicker {
    pub fn new(clock: SimClock, source: TimerClock) -> Self {
        Self { clock, timer_hz: source.hz() }
    }

    /// Tick length for the prescaler currently selected in `TCCR1`, or
    /// `None` while the timer is stopped.
    pub fn tick_ns(&self, timer: &impl TimerPeripheral) -> Option<u64> {
        let cs = timer.read(TimerReg::Tccr1) & bits::CS_MASK;
        if cs == 0 {
            return None;
        }
        let prescaler = 1u64 << (cs - 1);
        Some(prescaler * 1_000_000_000 / u64::from(self.timer_hz.max(1)))
    }

    /// Next compare event and the counter value it fires at.
    pub fn next_event(&self, timer: &impl TimerPeripheral) -> Option<(CompareEvent, u8)> {
        self.tick_ns(timer)?;
        let timsk = timer.read(TimerReg::Timsk);
        let tcnt = timer.read(TimerReg::Tcnt1);
        let ocr_a = timer.read(TimerReg::Ocr1a);
        let ocr_b = timer.read(TimerReg::Ocr1b);
        let a_on = timsk & bits::OCIE1A != 0;
        let b_on = timsk & bits::OCIE1B != 0;

        if b_on && ocr_b > tcnt && (!a_on || ocr_b < ocr_a) {
            Some((CompareEvent::B, ocr_b))
        } else if a_on && ocr_a > tcnt {
            Some((CompareEvent::A, ocr_a))
        } else {
            None
        }
    }

    /// Advance to the next compare event and run its handler.  Returns
    /// `false` when no compare interrupt is pending.
    pub fn step<P, T>(&self, engine: &SharedEngine<P, T>) -> bool
    where
        P: StatefulOutputPin<Error = Infallible>,
        T: TimerPeripheral,
    {
        engine
            .with(|e| {
                let Some(tick) = self.tick_ns(e.timer()) else {
                    return false;
                };
                let Some((event, at)) = self.next_event(e.timer()) else {
                    return false;
                };
                let tcnt = e.timer().read(TimerReg::Tcnt1);
                self.clock.advance_ns(u64::from(at - tcnt) * tick);
                match event {
                    CompareEvent::B => {
                        e.timer_mut().write(TimerReg::Tcnt1, at);
                        e.on_compare_b();
                    }
                    CompareEvent::A => {
                        e.timer_mut().write(TimerReg::Tcnt1, 0);
                        e.on_compare_a();
                    }
                }
                true
            })
            .unwrap_or(false)
    }
}

/// Program the timer the way a board core leaves it when Timer1 drives
/// its millisecond counter.
pub fn preset_millis_service(timer: &mut impl TimerPeripheral) {
    timer.write(
        TimerReg::Tccr1,
        bits::CTC1 | bits::PWM1A | bits::CS12 | bits::CS11 | bits::CS10,
    );
    timer.write(TimerReg::Gtccr, 0);
    timer.write(TimerReg::Ocr1a, 0x7F);
    timer.write(TimerReg::Ocr1c, 0xFF);
    timer.write(TimerReg::Timsk, bits::TOIE1);
    timer.write(TimerReg::Tifr, bits::TOV1);
}

// ───────────────────────────────────────────────────────────────
// Link and host transport
// ───────────────────────────────────────────────────────────────

pub struct SimLink<'a, P, T> {
    clock: SimClock,
    ticker: &'a SimTicker,
    engine: &'a SharedEngine<P, T>,
    refreshes: u64,
}

impl<'a, P, T> SimLink<'a, P, T> {
    pub fn new(clock: SimClock, ticker: &'a SimTicker, engine: &'a SharedEngine<P, T>) -> Self {
        Self { clock, ticker, engine, refreshes: 0 }
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl<P, T> LinkPort for SimLink<'_, P, T>
where
    P: StatefulOutputPin<Error = Infallible>,
    T: TimerPeripheral,
{
    fn refresh(&mut self) {
        self.refreshes += 1;
        self.ticker.step(self.engine);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_ns(u64::from(ms) * 1_000_000);
        self.refresh();
    }
}

/// Host transport looped back into the device endpoint.
pub struct EndpointPort<'q> {
    endpoint: ReportEndpoint<'q>,
    release: u16,
}

impl<'q> EndpointPort<'q> {
    pub fn new(endpoint: ReportEndpoint<'q>, release: u16) -> Self {
        Self { endpoint, release }
    }
}

impl FeatureReportPort for EndpointPort<'_> {
    type Error = Infallible;

    fn send_feature_report(&mut self, report: &[u8; RECORD_LEN]) -> Result<(), Infallible> {
        // A rejected report is simply lost, as with a stalled control
        // transfer the host never hears about.
        self.endpoint.set_report(report);
        Ok(())
    }

    fn get_feature_report(&mut self, buf: &mut [u8; RECORD_LEN]) -> Result<usize, Infallible> {
        match self.endpoint.get_report() {
            Some(bytes) => {
                *buf = bytes;
                Ok(RECORD_LEN)
            }
            None => Ok(0),
        }
    }

    fn release_number(&self) -> u16 {
        self.release
    }
}
