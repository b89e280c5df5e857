//! Outbound application events.
//!
//! [`BridgeService`](super::service::BridgeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.

use crate::protocol::exchange::TransmitMode;
use crate::protocol::record::CommandRecord;

/// Structured events emitted by the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Boot finished; the `Ready` record is queued (or dropped).
    Booted { ready_queued: bool },

    /// A record was taken from the inbound queue.
    CommandReceived(CommandRecord),

    /// Frames went out.  `requested` differs from `used` after a fallback.
    Transmitted {
        record: CommandRecord,
        requested: TransmitMode,
        used: TransmitMode,
    },

    /// The record was answered with an error reply.
    Rejected(CommandRecord),

    /// The outbound queue was full; the reply is lost.
    ReplyDropped(CommandRecord),
}
