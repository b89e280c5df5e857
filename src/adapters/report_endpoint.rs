//! HID feature-report endpoint.
//!
//! The USB driver calls [`ReportEndpoint::set_report`] from its SET_REPORT
//! handler and [`ReportEndpoint::get_report`] from GET_REPORT.  Both run in
//! the USB interrupt; the queues take care of the hand-off to the main loop.

use log::{debug, warn};

use crate::protocol::record::{CommandRecord, RECORD_LEN};
use crate::queue::CommandQueues;

pub struct ReportEndpoint<'q> {
    queues: &'q CommandQueues,
}

impl<'q> ReportEndpoint<'q> {
    pub const fn new(queues: &'q CommandQueues) -> Self {
        Self { queues }
    }

    /// Host → device.  Returns `false` when the record is malformed or the
    /// inbound queue is full; either way it is discarded.
    pub fn set_report(&self, data: &[u8]) -> bool {
        let Some(record) = CommandRecord::from_bytes(data) else {
            debug!("usb: ignoring {}-byte report without our report id", data.len());
            return false;
        };
        if !self.queues.inbound.write(record) {
            warn!("usb: inbound queue full, dropped {}", record);
            return false;
        }
        true
    }

    /// Device → host.  `None` (a zero-length reply) while nothing is pending.
    pub fn get_report(&self) -> Option<[u8; RECORD_LEN]> {
        self.queues.outbound.read().map(|r| r.to_bytes())
    }
}
