//! Livolo bridge simulator: host entry point.
//!
//! Runs the device firmware and the host exchange against each other in
//! simulated time and checks what went out on the RF line.
//!
//! ```text
//! ┌──────────────┐  feature reports  ┌───────────────────────────────┐
//! │  HostClient  │ ────────────────▶ │ ReportEndpoint ─▶ queues      │
//! │ (EndpointPort│ ◀──────────────── │ BridgeService ─▶ controller   │
//! └──────────────┘                   │   PulseEngine ◀─ SimTicker    │
//!                                    │   TracePin (RF data line)     │
//!                                    └───────────────────────────────┘
//! ```
//!
//! Usage: `livolo-sim [--legacy] [-v] <remote_id> <key_code>`.  Set
//! `LIVOLO_SIM_CONFIG` to a JSON file to override the default configuration.
#![deny(unused_must_use)]

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use livolo_bridge::Error;
use livolo_bridge::adapters::log_sink::LogEventSink;
use livolo_bridge::adapters::report_endpoint::ReportEndpoint;
use livolo_bridge::app::controller::TransmissionController;
use livolo_bridge::app::service::BridgeService;
use livolo_bridge::config::BridgeConfig;
use livolo_bridge::drivers::pulse_engine::{PulseEngine, SharedEngine};
use livolo_bridge::drivers::status_led::StatusLed;
use livolo_bridge::drivers::timer::Timer1;
use livolo_bridge::drivers::transmitter::{HardwareTransmitter, SoftwareTransmitter};
use livolo_bridge::host::HostClient;
use livolo_bridge::protocol::encoder::SwitchCode;
use livolo_bridge::protocol::pulse::{PulseWidths, decode_frame};
use livolo_bridge::protocol::record::CommandKind;
use livolo_bridge::queue::CommandQueues;
use livolo_bridge::sim::{
    EndpointPort, SimClock, SimDelay, SimLink, SimTicker, TracePin, preset_millis_service,
};

/// Release number reported by the simulated device descriptor.
const SIM_RELEASE: u16 = 0x0200;

/// Send one Livolo switch command through the simulated bridge.
#[derive(Parser, Debug)]
#[command(name = "livolo-sim", author, version, long_about = None)]
struct Args {
    /// Remote id printed on the Livolo remote (1-65535)
    #[arg(value_parser = clap::value_parser!(u32).range(1..=65535))]
    remote_id: u32,

    /// Key code of the button to press (1-255)
    #[arg(value_parser = clap::value_parser!(u32).range(1..=255))]
    key_code: u32,

    /// Request the legacy software-timed transmitter
    #[arg(long)]
    legacy: bool,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn load_config() -> Result<BridgeConfig> {
    let config = match std::env::var("LIVOLO_SIM_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            let cfg: BridgeConfig =
                serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
            info!("Config loaded from {}", path);
            cfg
        }
        Err(_) => BridgeConfig::default(),
    };
    config.validate().map_err(Error::from)?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    info!("livolo-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let code = SwitchCode::from_wide(args.remote_id, args.key_code).map_err(Error::from)?;

    // ── Device ────────────────────────────────────────────────
    let clock = SimClock::new();
    let rf_pin = TracePin::new(clock.clone());
    let led_pin = TracePin::new(clock.clone());

    let mut timer = Timer1::new();
    preset_millis_service(&mut timer);
    let engine = SharedEngine::new(
        PulseEngine::new(rf_pin.clone(), timer, &config.timing).map_err(Error::from)?,
    );
    let ticker = SimTicker::new(clock.clone(), config.timing.clock);
    let timer_before = engine.with(|e| e.capture());

    let hardware = HardwareTransmitter::new(&engine, config.hardware_repeats);
    let software = SoftwareTransmitter::new(
        rf_pin.clone(),
        SimDelay::new(clock.clone()),
        config.legacy,
        config.legacy_repeats,
    );
    let mut service = BridgeService::new(
        TransmissionController::new(hardware, software),
        StatusLed::new(led_pin.clone()),
        &config,
    );

    let queues = CommandQueues::new();
    let mut link = SimLink::new(clock.clone(), &ticker, &engine);
    let mut sink = LogEventSink::new();
    service.boot(&queues, &mut link, &mut sink);

    // ── Host ──────────────────────────────────────────────────
    let port = EndpointPort::new(ReportEndpoint::new(&queues), SIM_RELEASE);
    let mut host = HostClient::new(port, SimDelay::new(clock.clone()), config.host.clone());

    let drained = host.drain();
    info!("Host drained {} pending report(s)", drained);
    let sent = host.send(code, args.legacy)?;

    rf_pin.clear();
    let started = clock.now_ns();
    service.poll(&queues, &mut link, &mut sink);
    let busy_ms = (clock.now_ns() - started) / 1_000_000;

    let ack = host.await_ack(&sent)?;
    info!("Ack {} after {} ms of device time", ack, busy_ms);

    // ── Check the RF line ─────────────────────────────────────
    let nominal = if sent.kind == CommandKind::SwitchLegacy || !config.use_hardware_timing {
        let l = config.legacy;
        PulseWidths::from_micros(l.start_us, l.half_us, l.full_us)
    } else {
        let ocr = config.timing.ocr().map_err(Error::from)?;
        PulseWidths::from_ticks(ocr, config.timing.tick_ns())
    };
    let widths = rf_pin.widths_ns();
    let (rx_remote, rx_key) = decode_frame(&widths, &nominal).map_err(Error::from)?;
    info!(
        "RF frame decoded: remote={} key={} ({} edges total)",
        rx_remote,
        rx_key,
        rf_pin.edges().len()
    );
    if (rx_remote, rx_key) != (code.remote_id(), code.key() & 0x7F) {
        bail!("decoded frame does not match the command sent");
    }

    if engine.with(|e| e.capture()) != timer_before {
        bail!("timer registers not restored after transmission");
    }
    if led_pin.is_high() {
        warn!("Status LED still lit");
    }
    info!("Simulation finished, {} link refreshes", link.refreshes());
    Ok(())
}
