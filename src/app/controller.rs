//! Transmission policy: which transmitter serves a command, and how many
//! frames it sends.

use log::{debug, warn};

use crate::drivers::transmitter::{Session, Transmitter};
use crate::protocol::encoder::SwitchCode;
use crate::protocol::exchange::TransmitMode;

pub struct TransmissionController<H, S> {
    hardware: H,
    software: S,
}

impl<H: Transmitter, S: Transmitter> TransmissionController<H, S> {
    pub fn new(hardware: H, software: S) -> Self {
        Self { hardware, software }
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn software(&self) -> &S {
        &self.software
    }

    /// Send `code` the configured number of times.  Blocks until done.
    ///
    /// Hardware mode falls back to the software transmitter when the timer
    /// engine is missing or busy.  `idle` runs between checks while the
    /// hardware engine is busy; the software path never calls it.
    /// Returns the mode actually used.
    pub fn transmit(
        &mut self,
        code: SwitchCode,
        mode: TransmitMode,
        idle: Option<&mut dyn FnMut()>,
    ) -> TransmitMode {
        let mut noop = || {};
        let idle: &mut dyn FnMut() = match idle {
            Some(f) => f,
            None => &mut noop,
        };

        let used = match mode {
            TransmitMode::Hardware if self.hardware.is_available() => TransmitMode::Hardware,
            TransmitMode::Hardware => {
                warn!("tx: timer engine unavailable, using legacy timing");
                TransmitMode::Software
            }
            TransmitMode::Software => TransmitMode::Software,
        };

        match used {
            TransmitMode::Hardware => send_repeated(&mut self.hardware, code, idle),
            TransmitMode::Software => send_repeated(&mut self.software, code, idle),
        }
        used
    }
}

fn send_repeated<X: Transmitter>(tx: &mut X, code: SwitchCode, idle: &mut dyn FnMut()) {
    let word = tx.encode(code);
    let repeats = tx.repeats();
    debug!(
        "tx: remote={} key={} word=0x{:06X} x{}",
        code.remote_id(),
        code.key(),
        word.raw(),
        repeats
    );
    let mut session = Session::open(tx);
    for _ in 0..repeats {
        session.send_frame(word, idle);
    }
}
