//! Host side of the command exchange.
//!
//! ```text
//!  host                                   device
//!   │── GET_REPORT (until empty) ────────▶│  drain stale replies, e.g. Ready
//!   │── SET_REPORT [4C 01 id id key ..] ─▶│
//!   │        … poll interval …            │  transmits 128 frames
//!   │── GET_REPORT ──────────────────────▶│
//!   │◀─ [4C 01 id id key ..] ─────────────│  echo = acknowledgment
//! ```
//!
//! A zero-length reply means the device is still busy; the client waits and
//! polls again.  A failed read is retried once after a short delay.  A reply
//! that does not echo the request is fatal; nothing is retransmitted.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::HostConfig;
use crate::error::ExchangeError;
use crate::protocol::encoder::SwitchCode;
use crate::protocol::exchange::ack_matches;
use crate::protocol::record::{CommandKind, CommandRecord, RECORD_LEN};

/// Byte transport to one opened device (hidapi or similar).
pub trait FeatureReportPort {
    type Error: Debug;

    fn send_feature_report(&mut self, report: &[u8; RECORD_LEN]) -> Result<(), Self::Error>;

    /// Fills `buf` and returns the number of bytes read; 0 when the device
    /// has nothing queued.
    fn get_feature_report(&mut self, buf: &mut [u8; RECORD_LEN]) -> Result<usize, Self::Error>;

    /// Device release number from the USB descriptor (BCD, `0xMMmm`).
    fn release_number(&self) -> u16;
}

pub struct HostClient<P, D> {
    port: P,
    delay: D,
    config: HostConfig,
}

impl<P, D> HostClient<P, D>
where
    P: FeatureReportPort,
    D: DelayNs,
{
    pub fn new(port: P, delay: D, config: HostConfig) -> Self {
        Self { port, delay, config }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Discard replies queued before this exchange.  Returns how many were
    /// read.
    pub fn drain(&mut self) -> usize {
        let mut buf = [0u8; RECORD_LEN];
        let mut drained = 0;
        for _ in 0..self.config.drain_limit {
            match self.port.get_feature_report(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    drained += 1;
                    debug!("host: drained {:02X?}", &buf[..n.min(RECORD_LEN)]);
                }
                Err(e) => warn!("host: unable to get a feature report: {:?}", e),
            }
        }
        drained
    }

    /// Command kind to send.  Firmware before the legacy-timing release
    /// does not know `SwitchLegacy`, so it falls back to `Switch`.
    pub fn command_kind(&self, legacy: bool) -> CommandKind {
        if legacy && self.port.release_number() < self.config.legacy_min_release {
            warn!(
                "host: firmware {:#06x} lacks legacy timing, sending a plain switch",
                self.port.release_number()
            );
            return CommandKind::Switch;
        }
        if legacy { CommandKind::SwitchLegacy } else { CommandKind::Switch }
    }

    /// Send one switch command.  Returns the record sent.
    pub fn send(
        &mut self,
        code: SwitchCode,
        legacy: bool,
    ) -> Result<CommandRecord, ExchangeError<P::Error>> {
        let record = CommandRecord::new(self.command_kind(legacy), code.remote_id(), code.key());
        self.port
            .send_feature_report(&record.to_bytes())
            .map_err(ExchangeError::Send)?;
        info!("host: command sent, waiting for a reply");
        Ok(record)
    }

    fn read(&mut self, buf: &mut [u8; RECORD_LEN]) -> Result<usize, ExchangeError<P::Error>> {
        match self.port.get_feature_report(buf) {
            Ok(n) => Ok(n),
            Err(e) => {
                warn!("host: unable to get ACK feature report: {:?}, retrying", e);
                self.delay.delay_ms(self.config.retry_delay_ms);
                self.port.get_feature_report(buf).map_err(ExchangeError::Read)
            }
        }
    }

    /// Poll until the device echoes `sent`.
    pub fn await_ack(
        &mut self,
        sent: &CommandRecord,
    ) -> Result<CommandRecord, ExchangeError<P::Error>> {
        let mut buf = [0u8; RECORD_LEN];
        for _ in 0..self.config.poll_limit {
            self.delay.delay_ms(self.config.poll_interval_ms);
            let n = self.read(&mut buf)?.min(RECORD_LEN);
            if n == 0 {
                continue;
            }
            let received = CommandRecord::from_bytes(&buf[..n])
                .ok_or(ExchangeError::MalformedReply { len: n })?;
            if !ack_matches(sent, &received) {
                return Err(ExchangeError::AckMismatch { sent: *sent, received });
            }
            info!("host: device acks codes correctly");
            return Ok(received);
        }
        Err(ExchangeError::NoReply { polls: self.config.poll_limit })
    }

    /// Full exchange: validate, drain, send, wait for the echo.
    pub fn switch(
        &mut self,
        remote_id: u32,
        key: u32,
        legacy: bool,
    ) -> Result<CommandRecord, ExchangeError<P::Error>> {
        let code = SwitchCode::from_wide(remote_id, key)?;
        self.drain();
        let sent = self.send(code, legacy)?;
        self.await_ack(&sent)
    }
}
