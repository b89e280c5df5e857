//! Livolo RF bridge library.
//!
//! Drives Livolo wireless light switches from an ATtiny85: commands arrive
//! as 8-byte HID feature reports, are encoded into the Livolo pulse-width
//! protocol and sent through a Timer1 compare-match engine (or the legacy
//! busy-wait algorithm), then acknowledged back to the host.
//!
//! Register-level code is guarded by `#[cfg(target_arch = "avr")]` inside
//! each driver; on the host the same types keep their state in memory, and
//! the `sim` feature adds a simulated timer, pin and link.

#![cfg_attr(not(any(test, feature = "sim")), no_std)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod host;
pub mod pins;
pub mod protocol;
pub mod queue;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use error::{Error, Result};
