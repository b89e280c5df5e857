//! Command record: the fixed 8-byte unit exchanged with the host.
//!
//! ```text
//!  0      1      2    3    4     5  6  7
//! ┌──────┬──────┬─────────┬─────┬────────┐
//! │ 0x4C │ kind │ remote  │ key │ 0 0 0  │
//! │ tag  │      │ (LE u16)│     │ pad    │
//! └──────┴──────┴─────────┴─────┴────────┘
//! ```
//!
//! Padding is written as zero and ignored on receive.

use core::fmt;

/// HID report id carried in byte 0 of every record.
pub const REPORT_ID: u8 = 0x4C;

/// Size of one record on the wire.
pub const RECORD_LEN: usize = 8;

/// Bytes that carry information; the rest is padding.
pub const PAYLOAD_LEN: usize = 5;

/// Remote id sent in the boot `Ready` record.
pub const READY_REMOTE_ID: u16 = 0xABCD;
/// Key code sent in the boot `Ready` record.
pub const READY_KEY: u8 = 0xEF;

/// Command kind (byte 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Transmit using hardware-timed pulses.
    Switch,
    /// Transmit using the legacy busy-wait algorithm.
    SwitchLegacy,
    /// Device has booted and accepts commands (device → host only).
    Ready,
    /// Reply to a record whose kind the device does not handle.
    UnknownCommandError,
    /// Any other byte, kept so it can be echoed inside an error reply.
    Unrecognized(u8),
}

impl CommandKind {
    pub const fn from_byte(b: u8) -> Self {
        match b {
            0x01 => Self::Switch,
            0x02 => Self::SwitchLegacy,
            0x10 => Self::Ready,
            0xFF => Self::UnknownCommandError,
            other => Self::Unrecognized(other),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Switch => 0x01,
            Self::SwitchLegacy => 0x02,
            Self::Ready => 0x10,
            Self::UnknownCommandError => 0xFF,
            Self::Unrecognized(b) => b,
        }
    }
}

/// One command or acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandRecord {
    pub kind: CommandKind,
    pub remote_id: u16,
    pub key: u8,
}

impl CommandRecord {
    pub const fn new(kind: CommandKind, remote_id: u16, key: u8) -> Self {
        Self { kind, remote_id, key }
    }

    /// The record announced once after power-up.
    pub const fn ready() -> Self {
        Self::new(CommandKind::Ready, READY_REMOTE_ID, READY_KEY)
    }

    /// Same payload, kind replaced by [`CommandKind::UnknownCommandError`].
    pub const fn as_error(self) -> Self {
        Self::new(CommandKind::UnknownCommandError, self.remote_id, self.key)
    }

    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let remote = self.remote_id.to_le_bytes();
        [
            REPORT_ID,
            self.kind.as_byte(),
            remote[0],
            remote[1],
            self.key,
            0,
            0,
            0,
        ]
    }

    /// Parse a record.  Returns `None` for short input or a foreign report id.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < PAYLOAD_LEN || bytes[0] != REPORT_ID {
            return None;
        }
        Some(Self {
            kind: CommandKind::from_byte(bytes[1]),
            remote_id: u16::from_le_bytes([bytes[2], bytes[3]]),
            key: bytes[4],
        })
    }
}

impl fmt::Display for CommandRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[kind=0x{:02X} remote={} key={}]",
            self.kind.as_byte(),
            self.remote_id,
            self.key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_record_layout() {
        let rec = CommandRecord::new(CommandKind::Switch, 8525, 42);
        assert_eq!(rec.to_bytes(), [0x4C, 0x01, 0x4D, 0x21, 42, 0, 0, 0]);
    }

    #[test]
    fn ready_sentinel_bytes() {
        assert_eq!(
            CommandRecord::ready().to_bytes(),
            [0x4C, 0x10, 0xCD, 0xAB, 0xEF, 0, 0, 0]
        );
    }

    #[test]
    fn padding_ignored_on_receive() {
        let bytes = [0x4C, 0x02, 0x01, 0x00, 0x07, 0xAA, 0xBB, 0xCC];
        let rec = CommandRecord::from_bytes(&bytes).unwrap();
        assert_eq!(rec, CommandRecord::new(CommandKind::SwitchLegacy, 1, 7));
    }

    #[test]
    fn foreign_report_id_rejected() {
        assert!(CommandRecord::from_bytes(&[0x01, 0x01, 0, 0, 0, 0, 0, 0]).is_none());
    }

    #[test]
    fn short_input_rejected() {
        assert!(CommandRecord::from_bytes(&[0x4C, 0x01, 0x00, 0x01]).is_none());
        assert!(CommandRecord::from_bytes(&[]).is_none());
    }

    #[test]
    fn unrecognized_kind_survives_decode() {
        let rec = CommandRecord::from_bytes(&[0x4C, 0x77, 1, 0, 2]).unwrap();
        assert_eq!(rec.kind, CommandKind::Unrecognized(0x77));
        assert_eq!(rec.to_bytes()[1], 0x77);
    }

    #[test]
    fn error_copy_keeps_payload() {
        let rec = CommandRecord::new(CommandKind::Unrecognized(0x77), 300, 9).as_error();
        assert_eq!(rec.kind, CommandKind::UnknownCommandError);
        assert_eq!((rec.remote_id, rec.key), (300, 9));
    }

    #[test]
    fn kind_byte_mapping() {
        for b in 0..=u8::MAX {
            assert_eq!(CommandKind::from_byte(b).as_byte(), b);
        }
    }
}
