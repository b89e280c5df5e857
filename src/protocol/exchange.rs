//! Device-side handling of records arriving from the host, plus the
//! acknowledgment check the host applies to the reply.
//!
//! | Inbound kind        | Device action            | Reply                 |
//! |---------------------|--------------------------|-----------------------|
//! | `Switch`            | transmit, hardware timed | identical record      |
//! | `SwitchLegacy`      | transmit, busy-wait      | identical record      |
//! | anything else       | nothing                  | error-marked copy     |
//!
//! `Ready` only ever travels device → host, so a host-sent `Ready` lands in
//! the last row.

use crate::protocol::encoder::SwitchCode;
use crate::protocol::record::{CommandKind, CommandRecord};

/// Which pulse generator a command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitMode {
    Hardware,
    Software,
}

/// What the main loop should do with one inbound record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Send `code` over RF, then queue `ack`.
    Transmit {
        code: SwitchCode,
        mode: TransmitMode,
        ack: CommandRecord,
    },
    /// Queue `reply` without transmitting.
    Reject { reply: CommandRecord },
}

pub fn interpret(record: CommandRecord) -> Dispatch {
    let mode = match record.kind {
        CommandKind::Switch => TransmitMode::Hardware,
        CommandKind::SwitchLegacy => TransmitMode::Software,
        _ => return Dispatch::Reject { reply: record.as_error() },
    };
    match SwitchCode::new(record.remote_id, record.key) {
        Ok(code) => Dispatch::Transmit { code, mode, ack: record },
        // A zero id or key cannot come from a well-behaved host.
        Err(_) => Dispatch::Reject { reply: record.as_error() },
    }
}

/// Host-side check: the reply must echo kind, remote id and key exactly.
pub fn ack_matches(sent: &CommandRecord, received: &CommandRecord) -> bool {
    sent.kind == received.kind && sent.remote_id == received.remote_id && sent.key == received.key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_is_echoed() {
        let rec = CommandRecord::new(CommandKind::Switch, 8525, 42);
        match interpret(rec) {
            Dispatch::Transmit { code, mode, ack } => {
                assert_eq!((code.remote_id(), code.key()), (8525, 42));
                assert_eq!(mode, TransmitMode::Hardware);
                assert_eq!(ack, rec);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn legacy_selects_software_timing() {
        let rec = CommandRecord::new(CommandKind::SwitchLegacy, 7400, 96);
        assert!(matches!(
            interpret(rec),
            Dispatch::Transmit { mode: TransmitMode::Software, .. }
        ));
    }

    #[test]
    fn unknown_kind_rejected_with_same_payload() {
        let rec = CommandRecord::new(CommandKind::Unrecognized(0x77), 8525, 42);
        let expected = CommandRecord::new(CommandKind::UnknownCommandError, 8525, 42);
        assert_eq!(interpret(rec), Dispatch::Reject { reply: expected });
    }

    #[test]
    fn host_ready_is_rejected() {
        let rec = CommandRecord::ready();
        assert!(matches!(interpret(rec), Dispatch::Reject { .. }));
    }

    #[test]
    fn zero_key_is_rejected() {
        let rec = CommandRecord::new(CommandKind::Switch, 10, 0);
        assert_eq!(interpret(rec), Dispatch::Reject { reply: rec.as_error() });
    }

    #[test]
    fn ack_check() {
        let sent = CommandRecord::new(CommandKind::Switch, 8525, 42);
        assert!(ack_matches(&sent, &sent));
        assert!(!ack_matches(&sent, &CommandRecord::new(CommandKind::Switch, 8525, 43)));
        assert!(!ack_matches(&sent, &sent.as_error()));
    }
}
