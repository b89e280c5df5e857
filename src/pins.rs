//! Pin assignments for the Digispark-style ATtiny85 board.
//!
//! Board setup takes bit numbers from here rather than hard-coding them.
//! The chip has only port B, so a pin is a bit index.  PB3/PB4 carry USB
//! D-/D+ and belong to the USB stack, which lives outside this crate.

// ---------------------------------------------------------------------------
// RF transmitter (433.92 MHz ASK module, data input)
// ---------------------------------------------------------------------------

/// PB5.  Toggled from the Timer1 compare ISRs during hardware-timed frames.
pub const RF_TX_BIT: u8 = 5;

// ---------------------------------------------------------------------------
// Status LED (on-board, active HIGH)
// ---------------------------------------------------------------------------

pub const STATUS_LED_BIT: u8 = 1;
