//! Bridge configuration parameters
//!
//! All tunable parameters for the transmitter, the device main loop and the
//! host exchange.  Defaults match the shipped ATtiny85 firmware; the host
//! simulator can override them from a JSON file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Clock feeding Timer1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerClock {
    /// Asynchronous 64 MHz PLL clock (`PCKE` set).
    Pll64MHz,
    /// Synchronous system clock.
    System { hz: u32 },
}

impl TimerClock {
    pub const fn hz(self) -> u32 {
        match self {
            Self::Pll64MHz => 64_000_000,
            Self::System { hz } => hz,
        }
    }
}

/// Compare-register values, in timer ticks, for the three pulse widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrTiming {
    pub start: u8,
    pub full: u8,
    pub half: u8,
}

/// Hardware pulse timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub clock: TimerClock,
    /// Timer1 prescaler (power of two, 1–16384).
    pub prescaler: u16,
    /// Start pulse width in microseconds, used when deriving compare values.
    pub start_us: u32,
    /// Full bit width in microseconds, used when deriving compare values.
    pub bit_us: u32,
    /// Hand-tuned compare values; take precedence over derived ones.
    pub calibrated: Option<OcrTiming>,
}

impl TimingConfig {
    /// Clock-select bits (`CS13..CS10`) for the configured prescaler.
    pub fn clock_select(&self) -> Result<u8, ConfigError> {
        let p = self.prescaler;
        if p == 0 || !p.is_power_of_two() || p > 16_384 {
            return Err(ConfigError::InvalidPrescaler(p));
        }
        Ok(p.trailing_zeros() as u8 + 1)
    }

    /// Duration of one timer tick in nanoseconds.
    pub fn tick_ns(&self) -> u32 {
        let ns = u64::from(self.prescaler) * 1_000_000_000 / u64::from(self.clock.hz().max(1));
        ns.min(u64::from(u32::MAX)) as u32
    }

    fn ticks(&self, us: u32) -> u64 {
        let denom = 1_000_000 * u64::from(self.prescaler);
        (u64::from(us) * u64::from(self.clock.hz()) + denom / 2) / denom
    }

    /// Compare values the engine programs.
    ///
    /// Derived values round to the nearest tick; the start interval saturates
    /// at 255 and the full bit is rounded up to an even count so the half bit
    /// is exact.
    pub fn ocr(&self) -> Result<OcrTiming, ConfigError> {
        if let Some(cal) = self.calibrated {
            return Ok(cal);
        }
        if self.prescaler == 0 {
            return Err(ConfigError::InvalidPrescaler(0));
        }
        let start = self.ticks(self.start_us).min(255);
        let mut full = self.ticks(self.bit_us);
        if full % 2 == 1 {
            full += 1;
        }
        if full == 0 || full > 255 {
            return Err(ConfigError::IntervalOutOfRange("full bit"));
        }
        if start == 0 {
            return Err(ConfigError::IntervalOutOfRange("start"));
        }
        Ok(OcrTiming {
            start: start as u8,
            full: full as u8,
            half: (full / 2) as u8,
        })
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clock: TimerClock::Pll64MHz,
            prescaler: 128,
            start_us: 530,
            bit_us: 320,
            // Measured against a stock remote; 2 µs ticks.
            calibrated: Some(OcrTiming { start: 255, full: 164, half: 82 }),
        }
    }
}

/// Busy-wait widths of the legacy algorithm, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTiming {
    pub start_us: u32,
    pub half_us: u32,
    pub full_us: u32,
}

impl Default for LegacyTiming {
    fn default() -> Self {
        Self { start_us: 500, half_us: 100, full_us: 300 }
    }
}

/// Host-side exchange timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Wait before each acknowledgment read.
    pub poll_interval_ms: u32,
    /// Wait before the single retry after a failed read.
    pub retry_delay_ms: u32,
    /// Give up after this many empty reads.
    pub poll_limit: u16,
    /// Upper bound on stale reports discarded before sending.
    pub drain_limit: u16,
    /// Oldest device release (BCD, `0xMMmm`) that understands `SwitchLegacy`.
    pub legacy_min_release: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
            retry_delay_ms: 300,
            poll_limit: 20,
            drain_limit: 16,
            legacy_min_release: 0x0200,
        }
    }
}

/// Core bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    // --- Transmitter ---
    pub timing: TimingConfig,
    /// Frames per command with the compare-match engine.
    pub hardware_repeats: u16,
    /// Frames per command with the legacy algorithm.
    pub legacy_repeats: u16,
    pub legacy: LegacyTiming,
    /// Serve `Switch` with the compare-match engine.  When false every
    /// command uses the legacy algorithm.
    pub use_hardware_timing: bool,

    // --- Device main loop ---
    /// Wait between inbound queue checks (milliseconds).
    pub idle_poll_ms: u32,
    /// Wait after each processed command, LED still on (milliseconds).
    pub post_command_ms: u32,

    // --- Host ---
    pub host: HostConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            hardware_repeats: 128,
            legacy_repeats: 181,
            legacy: LegacyTiming::default(),
            use_hardware_timing: true,
            idle_poll_ms: 50,
            post_command_ms: 100,
            host: HostConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Reject values the firmware cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.clock_select()?;
        let ocr = self.timing.ocr()?;
        if ocr.half == 0 || u16::from(ocr.half) * 2 > u16::from(ocr.full) + 1 {
            return Err(ConfigError::ValidationFailed("half bit must be about half the full bit"));
        }
        // Pulse widths are carried in u32 nanoseconds.
        if u64::from(self.timing.tick_ns()) * 255 > u64::from(u32::MAX) {
            return Err(ConfigError::ValidationFailed("timer tick too slow"));
        }
        if self.hardware_repeats == 0 || self.legacy_repeats == 0 {
            return Err(ConfigError::ValidationFailed("repeat counts must be non-zero"));
        }
        let l = &self.legacy;
        if l.half_us == 0 || l.half_us >= l.full_us || l.start_us == 0 {
            return Err(ConfigError::ValidationFailed("legacy widths must satisfy 0 < half < full"));
        }
        if l.start_us.max(l.full_us) > u32::MAX / 1_000 {
            return Err(ConfigError::ValidationFailed("legacy widths too long"));
        }
        if self.host.poll_interval_ms == 0 || self.host.poll_limit == 0 {
            return Err(ConfigError::ValidationFailed("host polling must be enabled"));
        }
        Ok(())
    }
}
