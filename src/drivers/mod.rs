//! Timer, pin and transmitter drivers.

pub mod port;
pub mod pulse_engine;
pub mod status_led;
pub mod timer;
pub mod transmitter;
