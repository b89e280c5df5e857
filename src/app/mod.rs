//! Application core: the device main loop and the transmission policy.
//!
//! All interaction with the USB link and the log goes through the port
//! traits in [`ports`]; the transmitters arrive as generics.  Everything
//! here runs on the host under test with simulated or mock adapters.

pub mod controller;
pub mod events;
pub mod ports;
pub mod service;
