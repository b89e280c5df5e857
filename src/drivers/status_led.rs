//! Single-colour status LED.
//!
//! Lit while the main loop handles a command, so activity is visible
//! on the board.
//!
//! ## Dual-target design
//!
//! Takes any `OutputPin`: a [`PortPin`](super::port::PortPin) on the
//! device, an in-memory or mock pin on host/test.

use embedded_hal::digital::OutputPin;

pub struct StatusLed<P> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Wraps `pin` and drives it low.
    pub fn new(mut pin: P) -> Self {
        pin.set_low().ok();
        Self { pin, lit: false }
    }

    pub fn on(&mut self) {
        self.pin.set_high().ok();
        self.lit = true;
    }

    pub fn off(&mut self) {
        self.pin.set_low().ok();
        self.lit = false;
    }

    pub fn is_on(&self) -> bool {
        self.lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock, State, Transaction};

    #[test]
    fn on_off_sequence() {
        let expected = [
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ];
        let mut pin = Mock::new(&expected);
        let mut led = StatusLed::new(pin.clone());
        assert!(!led.is_on());
        led.on();
        assert!(led.is_on());
        led.off();
        assert!(!led.is_on());
        pin.done();
    }
}
