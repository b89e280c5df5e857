//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one end of the bridge
//! against the simulated timer, pin and USB link.  All tests run on the host
//! with no real hardware required.

#![cfg(feature = "sim")]

mod exchange_flow_tests;
mod rig;
mod transmit_cycle_tests;
