//! Adapters: concrete implementations of the port traits and the USB-facing
//! endpoint.
//!
//! | Adapter           | Implements | Connects to                   |
//! |-------------------|------------|-------------------------------|
//! | `log_sink`        | EventSink  | `log` facade                  |
//! | `report_endpoint` | (none)     | USB SET_REPORT / GET_REPORT   |

pub mod log_sink;
pub mod report_endpoint;
