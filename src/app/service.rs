//! Bridge service: the device main loop.
//!
//! [`BridgeService`] owns the transmission controller and the status LED.
//! The USB link, the queues and the event sink are passed in per call, so
//! the whole loop runs under test with simulated adapters.
//!
//! ```text
//!  inbound queue ──▶ ┌──────────────────────┐ ──▶ outbound queue
//!                    │    BridgeService     │
//!       LinkPort ◀── │ interpret · transmit │ ──▶ EventSink
//!                    └──────────────────────┘
//! ```

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::config::BridgeConfig;
use crate::drivers::status_led::StatusLed;
use crate::drivers::transmitter::Transmitter;
use crate::protocol::exchange::{Dispatch, TransmitMode, interpret};
use crate::protocol::record::CommandRecord;
use crate::queue::CommandQueues;

use super::controller::TransmissionController;
use super::events::AppEvent;
use super::ports::{EventSink, LinkPort};

pub struct BridgeService<H, S, L> {
    controller: TransmissionController<H, S>,
    led: StatusLed<L>,
    use_hardware_timing: bool,
    idle_poll_ms: u32,
    post_command_ms: u32,
    handled: u32,
}

impl<H, S, L> BridgeService<H, S, L>
where
    H: Transmitter,
    S: Transmitter,
    L: OutputPin,
{
    pub fn new(
        controller: TransmissionController<H, S>,
        led: StatusLed<L>,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            controller,
            led,
            use_hardware_timing: config.use_hardware_timing,
            idle_poll_ms: config.idle_poll_ms,
            post_command_ms: config.post_command_ms,
            handled: 0,
        }
    }

    pub fn controller(&self) -> &TransmissionController<H, S> {
        &self.controller
    }

    pub fn led(&self) -> &StatusLed<L> {
        &self.led
    }

    /// Commands processed since boot.
    pub fn handled(&self) -> u32 {
        self.handled
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the device to the host and settle the LED.
    pub fn boot(
        &mut self,
        queues: &CommandQueues,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        link.refresh();
        let ready_queued = queues.outbound.write(CommandRecord::ready());
        if !ready_queued {
            warn!("bridge: outbound queue full, Ready dropped");
        }
        self.led.off();
        link.refresh();
        sink.emit(&AppEvent::Booted { ready_queued });
        info!("bridge: ready");
    }

    // ── Main loop body ────────────────────────────────────────

    /// One pass of the main loop: handle at most one inbound record, then
    /// idle.  Returns whether a record was handled.
    pub fn poll(
        &mut self,
        queues: &CommandQueues,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let handled = match queues.inbound.read() {
            Some(record) => {
                self.handle(record, queues, link, sink);
                true
            }
            None => false,
        };
        link.delay_ms(self.idle_poll_ms);
        handled
    }

    fn handle(
        &mut self,
        record: CommandRecord,
        queues: &CommandQueues,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        self.led.on();
        link.refresh();
        sink.emit(&AppEvent::CommandReceived(record));

        let reply = match interpret(record) {
            Dispatch::Transmit { code, mode, ack } => {
                let requested =
                    if self.use_hardware_timing { mode } else { TransmitMode::Software };
                let mut keep_alive = || link.refresh();
                let used = self.controller.transmit(code, requested, Some(&mut keep_alive));
                link.refresh();
                sink.emit(&AppEvent::Transmitted { record, requested, used });
                ack
            }
            Dispatch::Reject { reply } => {
                warn!("bridge: unhandled command kind 0x{:02X}", record.kind.as_byte());
                sink.emit(&AppEvent::Rejected(record));
                reply
            }
        };

        if !queues.outbound.write(reply) {
            warn!("bridge: outbound queue full, reply dropped");
            sink.emit(&AppEvent::ReplyDropped(reply));
        }
        self.handled = self.handled.wrapping_add(1);

        link.delay_ms(self.post_command_ms);
        self.led.off();
    }
}
