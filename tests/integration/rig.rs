//! Simulated device for integration tests.
//!
//! Owns everything the firmware would keep in statics (engine, queues) plus
//! the simulated clock and pins, and hands out the borrowing parts (service,
//! link, host client) on demand.

use livolo_bridge::adapters::report_endpoint::ReportEndpoint;
use livolo_bridge::app::controller::TransmissionController;
use livolo_bridge::app::events::AppEvent;
use livolo_bridge::app::ports::EventSink;
use livolo_bridge::app::service::BridgeService;
use livolo_bridge::config::BridgeConfig;
use livolo_bridge::drivers::pulse_engine::{PulseEngine, SharedEngine};
use livolo_bridge::drivers::status_led::StatusLed;
use livolo_bridge::drivers::timer::{Timer1, TimerSnapshot};
use livolo_bridge::drivers::transmitter::{HardwareTransmitter, SoftwareTransmitter};
use livolo_bridge::host::HostClient;
use livolo_bridge::protocol::pulse::PulseWidths;
use livolo_bridge::queue::CommandQueues;
use livolo_bridge::sim::{
    EndpointPort, SimClock, SimDelay, SimLink, SimTicker, TracePin, preset_millis_service,
};

pub type Service<'e> = BridgeService<
    HardwareTransmitter<'e, TracePin, Timer1>,
    SoftwareTransmitter<TracePin, SimDelay>,
    TracePin,
>;

pub type Host<'q> = HostClient<EndpointPort<'q>, SimDelay>;

/// First release that understands `SwitchLegacy`.
pub const CURRENT_RELEASE: u16 = 0x0200;

pub struct Rig {
    pub config: BridgeConfig,
    pub clock: SimClock,
    pub rf: TracePin,
    pub led: TracePin,
    pub engine: SharedEngine<TracePin, Timer1>,
    pub ticker: SimTicker,
    pub queues: CommandQueues,
}

#[allow(dead_code)]
impl Rig {
    /// Device with Timer1 already running the board's millisecond service.
    pub fn new(config: BridgeConfig) -> Self {
        let clock = SimClock::new();
        let rf = TracePin::new(clock.clone());
        let led = TracePin::new(clock.clone());
        let mut timer = Timer1::new();
        preset_millis_service(&mut timer);
        let engine = SharedEngine::new(
            PulseEngine::new(rf.clone(), timer, &config.timing).expect("default timing is valid"),
        );
        let ticker = SimTicker::new(clock.clone(), config.timing.clock);
        Self { config, clock, rf, led, engine, ticker, queues: CommandQueues::new() }
    }

    pub fn with_repeats(hardware: u16, legacy: u16) -> Self {
        let config = BridgeConfig {
            hardware_repeats: hardware,
            legacy_repeats: legacy,
            ..BridgeConfig::default()
        };
        Self::new(config)
    }

    pub fn service(&self) -> Service<'_> {
        let hardware = HardwareTransmitter::new(&self.engine, self.config.hardware_repeats);
        let software = SoftwareTransmitter::new(
            self.rf.clone(),
            SimDelay::new(self.clock.clone()),
            self.config.legacy,
            self.config.legacy_repeats,
        );
        BridgeService::new(
            TransmissionController::new(hardware, software),
            StatusLed::new(self.led.clone()),
            &self.config,
        )
    }

    pub fn link(&self) -> SimLink<'_, TracePin, Timer1> {
        SimLink::new(self.clock.clone(), &self.ticker, &self.engine)
    }

    pub fn endpoint(&self) -> ReportEndpoint<'_> {
        ReportEndpoint::new(&self.queues)
    }

    pub fn host(&self, release: u16) -> Host<'_> {
        HostClient::new(
            EndpointPort::new(self.endpoint(), release),
            SimDelay::new(self.clock.clone()),
            self.config.host.clone(),
        )
    }

    pub fn timer(&self) -> TimerSnapshot {
        self.engine.with(|e| e.capture()).expect("engine installed")
    }

    pub fn hardware_widths(&self) -> PulseWidths {
        let ocr = self.config.timing.ocr().expect("default timing is valid");
        PulseWidths::from_ticks(ocr, self.config.timing.tick_ns())
    }

    pub fn legacy_widths(&self) -> PulseWidths {
        let l = self.config.legacy;
        PulseWidths::from_micros(l.start_us, l.half_us, l.full_us)
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct Recorder {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transmitted(&self) -> Vec<&AppEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Transmitted { .. }))
            .collect()
    }
}

impl EventSink for Recorder {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
