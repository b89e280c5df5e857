//! Pulse-width view of a frame.
//!
//! Every level change on the RF data line ends a pulse.  A frame is one start
//! pulse followed by the data bits: a `1` is a single full-width pulse and a
//! `0` is two half-width pulses.  The line level alternates with each pulse,
//! so only widths carry information.
//!
//! [`schedule`] expands a transmit word into that pulse list, and
//! [`decode_frame`] reverses the process from measured widths, accepting
//! ±25 % jitter on every pulse.

use heapless::Vec;

use crate::config::OcrTiming;
use crate::error::PulseError;
use crate::protocol::encoder::{FRAME_BITS, TxWord};

/// Start pulse plus two pulses per bit in the worst case.
pub const MAX_PULSES: usize = 1 + 2 * FRAME_BITS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    Start,
    Half,
    Full,
}

/// Nominal pulse widths in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseWidths {
    pub start_ns: u32,
    pub half_ns: u32,
    pub full_ns: u32,
}

impl PulseWidths {
    pub const fn from_micros(start_us: u32, half_us: u32, full_us: u32) -> Self {
        Self {
            start_ns: start_us.saturating_mul(1_000),
            half_ns: half_us.saturating_mul(1_000),
            full_ns: full_us.saturating_mul(1_000),
        }
    }

    /// Widths produced by the compare-match engine.  Saturates at
    /// `u32::MAX` ns for clocks too slow to express in nanoseconds.
    pub const fn from_ticks(ocr: OcrTiming, tick_ns: u32) -> Self {
        Self {
            start_ns: (ocr.start as u32).saturating_mul(tick_ns),
            half_ns: (ocr.half as u32).saturating_mul(tick_ns),
            full_ns: (ocr.full as u32).saturating_mul(tick_ns),
        }
    }

    pub const fn width_ns(&self, pulse: Pulse) -> u32 {
        match pulse {
            Pulse::Start => self.start_ns,
            Pulse::Half => self.half_ns,
            Pulse::Full => self.full_ns,
        }
    }
}

/// Pulse sequence for one frame of `word`.
pub fn schedule(word: TxWord) -> Vec<Pulse, MAX_PULSES> {
    let mut out = Vec::new();
    // Capacity covers the worst case (all zero bits), so pushes cannot fail.
    let _ = out.push(Pulse::Start);
    for bit in word.bits() {
        if bit {
            let _ = out.push(Pulse::Full);
        } else {
            let _ = out.push(Pulse::Half);
            let _ = out.push(Pulse::Half);
        }
    }
    out
}

fn near(width: u32, nominal: u32) -> bool {
    let tol = nominal / 4;
    width >= nominal.saturating_sub(tol) && width <= nominal.saturating_add(tol)
}

/// Reconstruct `(remote_id, key)` from the widths of consecutive pulses,
/// beginning with the start pulse.  Widths after the 23rd bit are ignored.
pub fn decode_frame(widths_ns: &[u32], nominal: &PulseWidths) -> Result<(u16, u8), PulseError> {
    let (&first, rest) = widths_ns.split_first().ok_or(PulseError::MissingStart)?;
    if !near(first, nominal.start_ns) {
        return Err(PulseError::MissingStart);
    }

    let mut value: u32 = 0;
    let mut bits = 0usize;
    let mut iter = rest.iter().copied().enumerate();

    while bits < FRAME_BITS as usize {
        let Some((idx, w)) = iter.next() else {
            return Err(PulseError::Truncated(bits));
        };
        let bit = if near(w, nominal.full_ns) {
            1
        } else if near(w, nominal.half_ns) {
            match iter.next() {
                Some((_, w2)) if near(w2, nominal.half_ns) => 0,
                Some(_) | None => return Err(PulseError::DanglingHalf),
            }
        } else {
            return Err(PulseError::UnexpectedWidth { index: idx + 1, width_ns: w });
        };
        value = (value << 1) | bit;
        bits += 1;
    }

    Ok(((value >> 7) as u16, (value & 0x7F) as u8))
}
