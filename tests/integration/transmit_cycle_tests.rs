//! Integration tests for the record → RF pulse train path.
//!
//! A command is queued on the inbound side, one main-loop pass runs, and the
//! RF line trace is decoded back into the remote id and key.

use livolo_bridge::app::events::AppEvent;
use livolo_bridge::config::BridgeConfig;
use livolo_bridge::drivers::pulse_engine::EngineState;
use livolo_bridge::protocol::exchange::TransmitMode;
use livolo_bridge::protocol::pulse::decode_frame;
use livolo_bridge::protocol::record::{CommandKind, CommandRecord};

use super::rig::{Recorder, Rig};

const SWITCH: CommandRecord = CommandRecord::new(CommandKind::Switch, 8525, 42);
const LEGACY: CommandRecord = CommandRecord::new(CommandKind::SwitchLegacy, 8525, 42);

/// Post-command pause plus the idle pause of the same loop pass.
const LOOP_OVERHEAD_NS: u64 = (100 + 50) * 1_000_000;

/// One hardware frame at PLL/128: 255 start ticks plus 23 bits of 164
/// ticks, 2 µs each.  A `0` is two halves of 82 ticks, so every bit lasts
/// the same.
const HW_FRAME_NS: u64 = (255 + 23 * 164) * 2_000;

/// 8525/42 has nine `1` bits and fourteen `0` bits.
const LEGACY_FRAME_NS: u64 = (500 + 9 * 300 + 14 * 2 * 100) * 1_000;

fn run_once(rig: &Rig, record: CommandRecord) -> Recorder {
    let mut service = rig.service();
    let mut link = rig.link();
    let mut sink = Recorder::new();
    assert!(rig.queues.inbound.write(record));
    assert!(service.poll(&rig.queues, &mut link, &mut sink));
    sink
}

// ── Hardware timing ───────────────────────────────────────────

#[test]
fn full_hardware_cycle_restores_millis_timer() {
    let rig = Rig::new(BridgeConfig::default());
    let before = rig.timer();

    let sink = run_once(&rig, SWITCH);

    assert_eq!(rig.timer(), before, "Timer1 must be handed back bit-for-bit");
    assert_eq!(rig.clock.now_ns(), 128 * HW_FRAME_NS + LOOP_OVERHEAD_NS);
    assert_eq!(
        sink.transmitted(),
        vec![&AppEvent::Transmitted {
            record: SWITCH,
            requested: TransmitMode::Hardware,
            used: TransmitMode::Hardware,
        }]
    );
    assert_eq!(rig.engine.with(|e| e.state()), Some(EngineState::Stopped));
    assert!(!rig.rf.is_high(), "RF line left idle");
    assert!(!rig.led.is_high(), "LED off after the command");
}

#[test]
fn hardware_frame_decodes_to_command() {
    let rig = Rig::with_repeats(1, 1);
    run_once(&rig, SWITCH);

    let widths = rig.rf.widths_ns();
    assert_eq!(decode_frame(&widths, &rig.hardware_widths()), Ok((8525, 42)));
    assert_eq!(widths[0], 510_000, "start pulse is 255 ticks");
}

#[test]
fn every_hardware_frame_is_identical() {
    let rig = Rig::with_repeats(3, 1);
    run_once(&rig, SWITCH);

    let nominal = rig.hardware_widths();
    let edges = rig.rf.edges();
    // Frames start where the line rises after a full frame period.
    let frame_starts: Vec<u64> = (0..3).map(|i| edges[0].0 + i * HW_FRAME_NS).collect();
    for start in frame_starts {
        let widths: Vec<u32> = edges
            .iter()
            .skip_while(|(t, _)| *t < start)
            .collect::<Vec<_>>()
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) as u32)
            .collect();
        assert_eq!(decode_frame(&widths, &nominal), Ok((8525, 42)), "frame at {start} ns");
    }
}

#[test]
fn hardware_timing_disabled_uses_legacy() {
    let config = BridgeConfig {
        use_hardware_timing: false,
        legacy_repeats: 1,
        ..BridgeConfig::default()
    };
    let rig = Rig::new(config);
    let before = rig.timer();

    let sink = run_once(&rig, SWITCH);

    assert_eq!(
        sink.transmitted(),
        vec![&AppEvent::Transmitted {
            record: SWITCH,
            requested: TransmitMode::Software,
            used: TransmitMode::Software,
        }]
    );
    assert_eq!(rig.timer(), before, "legacy path never touches Timer1");
    assert_eq!(decode_frame(&rig.rf.widths_ns(), &rig.legacy_widths()), Ok((8525, 42)));
}

#[test]
fn missing_engine_falls_back_to_legacy() {
    let rig = Rig::with_repeats(128, 1);
    assert!(rig.engine.take().is_some());

    let sink = run_once(&rig, SWITCH);

    assert_eq!(
        sink.transmitted(),
        vec![&AppEvent::Transmitted {
            record: SWITCH,
            requested: TransmitMode::Hardware,
            used: TransmitMode::Software,
        }]
    );
    assert_eq!(rig.clock.now_ns(), LEGACY_FRAME_NS + LOOP_OVERHEAD_NS);
    assert_eq!(rig.queues.outbound.read(), Some(SWITCH), "fallback still acknowledges");
}

// ── Legacy timing ─────────────────────────────────────────────

#[test]
fn legacy_frame_decodes_to_command() {
    let rig = Rig::with_repeats(128, 1);
    let before = rig.timer();

    run_once(&rig, LEGACY);

    assert_eq!(decode_frame(&rig.rf.widths_ns(), &rig.legacy_widths()), Ok((8525, 42)));
    assert_eq!(rig.clock.now_ns(), LEGACY_FRAME_NS + LOOP_OVERHEAD_NS);
    assert_eq!(rig.timer(), before);
    assert!(!rig.rf.is_high());
}

#[test]
fn legacy_repeats_follow_config() {
    let rig = Rig::with_repeats(128, 4);
    run_once(&rig, LEGACY);
    assert_eq!(rig.clock.now_ns(), 4 * LEGACY_FRAME_NS + LOOP_OVERHEAD_NS);
}

// ── Rejections ────────────────────────────────────────────────

#[test]
fn zero_key_is_never_transmitted() {
    let rig = Rig::new(BridgeConfig::default());
    let rec = CommandRecord::new(CommandKind::Switch, 8525, 0);

    let sink = run_once(&rig, rec);

    assert!(rig.rf.edges().is_empty());
    assert!(sink.transmitted().is_empty());
    assert_eq!(rig.queues.outbound.read(), Some(rec.as_error()));
}
