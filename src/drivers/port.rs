//! Port B output pin.
//!
//! The ATtiny85 has a single I/O port, so a pin is just a bit number.
//! Handles are `Copy`: the RF data line is driven by the pulse engine and
//! by the legacy transmitter, never at the same time.
//!
//! ## Dual-target design
//!
//! On AVR: `PORTB`/`DDRB` read-modify-write, toggles through a `PINB`
//! write (single instruction, safe from an ISR).
//! On host/test: the level lives in the handle.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

#[cfg(target_arch = "avr")]
mod regs {
    pub const PINB: *mut u8 = 0x36 as *mut u8;
    pub const DDRB: *mut u8 = 0x37 as *mut u8;
    pub const PORTB: *mut u8 = 0x38 as *mut u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPin {
    mask: u8,
    #[cfg(not(target_arch = "avr"))]
    high: bool,
}

impl PortPin {
    /// Configure bit `bit` of port B as an output, driven low.
    pub fn output(bit: u8) -> Self {
        let mask = 1 << (bit & 7);
        configure_output(mask);
        Self {
            mask,
            #[cfg(not(target_arch = "avr"))]
            high: false,
        }
    }

    pub const fn mask(&self) -> u8 {
        self.mask
    }
}

#[cfg(target_arch = "avr")]
fn configure_output(mask: u8) {
    // SAFETY: DDRB/PORTB are valid I/O registers.  Runs once per pin at
    // init, before any ISR that touches the pin is enabled.
    unsafe {
        let ddr = core::ptr::read_volatile(regs::DDRB);
        core::ptr::write_volatile(regs::DDRB, ddr | mask);
        let port = core::ptr::read_volatile(regs::PORTB);
        core::ptr::write_volatile(regs::PORTB, port & !mask);
    }
}

#[cfg(not(target_arch = "avr"))]
fn configure_output(_mask: u8) {}

impl ErrorType for PortPin {
    type Error = Infallible;
}

#[cfg(target_arch = "avr")]
impl OutputPin for PortPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        critical_section::with(|_| {
            // SAFETY: PORTB read-modify-write inside a critical section.
            unsafe {
                let v = core::ptr::read_volatile(regs::PORTB);
                core::ptr::write_volatile(regs::PORTB, v & !self.mask);
            }
        });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        critical_section::with(|_| {
            // SAFETY: as above.
            unsafe {
                let v = core::ptr::read_volatile(regs::PORTB);
                core::ptr::write_volatile(regs::PORTB, v | self.mask);
            }
        });
        Ok(())
    }
}

#[cfg(target_arch = "avr")]
impl StatefulOutputPin for PortPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        // SAFETY: plain read of PORTB.
        Ok(unsafe { core::ptr::read_volatile(regs::PORTB) } & self.mask != 0)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        self.is_set_high().map(|h| !h)
    }

    fn toggle(&mut self) -> Result<(), Infallible> {
        // SAFETY: writing a one to PINB toggles that PORTB bit atomically.
        unsafe { core::ptr::write_volatile(regs::PINB, self.mask) };
        Ok(())
    }
}

#[cfg(not(target_arch = "avr"))]
impl OutputPin for PortPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

#[cfg(not(target_arch = "avr"))]
impl StatefulOutputPin for PortPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}
