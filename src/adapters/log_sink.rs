//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events through the
//! `log` facade.  On the device the logger is usually compiled out; the
//! host simulator installs `env_logger`.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted { ready_queued } => {
                info!("BOOT  | ready={}", if *ready_queued { "queued" } else { "dropped" });
            }
            AppEvent::CommandReceived(rec) => {
                info!("RECV  | {}", rec);
            }
            AppEvent::Transmitted { record, requested, used } => {
                if requested == used {
                    info!("TX    | remote={} key={} mode={:?}", record.remote_id, record.key, used);
                } else {
                    warn!(
                        "TX    | remote={} key={} mode={:?} (requested {:?})",
                        record.remote_id, record.key, used, requested
                    );
                }
            }
            AppEvent::Rejected(rec) => {
                warn!("REJECT| kind=0x{:02X} {}", rec.kind.as_byte(), rec);
            }
            AppEvent::ReplyDropped(rec) => {
                warn!("DROP  | outbound full, lost {}", rec);
            }
        }
    }
}
