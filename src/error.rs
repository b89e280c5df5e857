//! Unified error types for the Livolo bridge.
//!
//! A single `Error` enum that every device-side subsystem converts into,
//! keeping the main loop's error handling uniform.  All variants are `Copy`
//! so they can be passed around without allocation.
//!
//! Host-side exchange failures live in [`ExchangeError`], which is generic
//! over the transport's own error type.

use core::fmt;

use crate::protocol::record::CommandRecord;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible device-side operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A remote id / key code pair was rejected before encoding.
    Command(CommandError),
    /// Configuration is invalid.
    Config(ConfigError),
    /// A captured pulse train could not be decoded.
    Pulse(PulseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Pulse(e) => write!(f, "pulse: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Command (encoder input) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Remote id 0 is reserved and never paired.
    RemoteIdOutOfRange(u32),
    /// Key code outside 1–255.
    KeyCodeOutOfRange(u32),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteIdOutOfRange(v) => write!(f, "remote id {v} outside 1-65535"),
            Self::KeyCodeOutOfRange(v) => write!(f, "key code {v} outside 1-255"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Timer prescaler is not a power of two the clock-select bits can express.
    InvalidPrescaler(u16),
    /// A derived compare value does not fit the 8-bit compare registers.
    IntervalOutOfRange(&'static str),
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrescaler(p) => write!(f, "unsupported timer prescaler {p}"),
            Self::IntervalOutOfRange(which) => {
                write!(f, "{which} interval does not fit an 8-bit compare register")
            }
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Pulse decoding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseError {
    /// The first pulse is not a start pulse.
    MissingStart,
    /// A pulse width matches neither the half-bit nor the full-bit width.
    UnexpectedWidth { index: usize, width_ns: u32 },
    /// A half-bit pulse was not followed by its second half.
    DanglingHalf,
    /// Fewer than 23 data bits were present.
    Truncated(usize),
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart => write!(f, "frame does not begin with a start pulse"),
            Self::UnexpectedWidth { index, width_ns } => {
                write!(f, "pulse #{index} has unexpected width {width_ns}ns")
            }
            Self::DanglingHalf => write!(f, "half-bit pulse without its pair"),
            Self::Truncated(bits) => write!(f, "frame truncated after {bits} bits"),
        }
    }
}

impl From<PulseError> for Error {
    fn from(e: PulseError) -> Self {
        Self::Pulse(e)
    }
}

// ---------------------------------------------------------------------------
// Host exchange errors
// ---------------------------------------------------------------------------

/// Failures of one host → device → host command exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError<E> {
    /// Arguments were rejected before anything was sent.
    Command(CommandError),
    /// The feature report could not be sent.
    Send(E),
    /// Reading the acknowledgment failed twice in a row.
    Read(E),
    /// The device answered with a record that does not echo the request.
    AckMismatch {
        sent: CommandRecord,
        received: CommandRecord,
    },
    /// The reply is too short or carries a foreign report id.
    MalformedReply { len: usize },
    /// The device never produced an acknowledgment within the poll limit.
    NoReply { polls: u16 },
}

impl<E: fmt::Debug> fmt::Display for ExchangeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "invalid command: {e}"),
            Self::Send(e) => write!(f, "unable to send feature report: {e:?}"),
            Self::Read(e) => write!(f, "unable to get ACK feature report: {e:?}"),
            Self::AckMismatch { sent, received } => {
                write!(f, "wrong reply from device: sent {sent}, got {received}")
            }
            Self::MalformedReply { len } => write!(f, "malformed {len}-byte reply from device"),
            Self::NoReply { polls } => write!(f, "no reply from device after {polls} polls"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for ExchangeError<E> {}

impl<E> From<CommandError> for ExchangeError<E> {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
