//! Livolo RF protocol and the host command exchange.
//!
//! Pure logic, no I/O: everything in here is usable both on the device and
//! on the host side of the link.
//!
//! | Module     | Responsibility                                           |
//! |------------|----------------------------------------------------------|
//! | `record`   | 8-byte command record, wire encoding                     |
//! | `encoder`  | (remote id, key code) → bit-reversed transmit word       |
//! | `pulse`    | transmit word → pulse schedule, and captured pulses back |
//! | `exchange` | device-side interpretation of inbound records            |

pub mod encoder;
pub mod exchange;
pub mod pulse;
pub mod record;
