//! Integration tests for the host ⇄ device feature-report exchange.
//!
//! The host client talks to the device endpoint through the simulated port;
//! the device main loop runs in between, exactly as it would interleave with
//! USB traffic on the real part.

use livolo_bridge::app::events::AppEvent;
use livolo_bridge::config::BridgeConfig;
use livolo_bridge::error::{CommandError, ExchangeError};
use livolo_bridge::protocol::encoder::SwitchCode;
use livolo_bridge::protocol::record::{CommandKind, CommandRecord, READY_KEY, READY_REMOTE_ID};
use livolo_bridge::queue::QUEUE_CAP;

use super::rig::{CURRENT_RELEASE, Recorder, Rig};

fn code() -> SwitchCode {
    SwitchCode::new(8525, 42).unwrap()
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_announces_ready() {
    let rig = Rig::new(BridgeConfig::default());
    let mut service = rig.service();
    let mut sink = Recorder::new();
    service.boot(&rig.queues, &mut rig.link(), &mut sink);

    let bytes = rig.endpoint().get_report().expect("Ready queued");
    assert_eq!(bytes[0], 0x4C);
    assert_eq!(CommandRecord::from_bytes(&bytes), Some(CommandRecord::ready()));
    assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), READY_REMOTE_ID);
    assert_eq!(bytes[4], READY_KEY);
    assert_eq!(sink.events, vec![AppEvent::Booted { ready_queued: true }]);
    assert_eq!(rig.endpoint().get_report(), None);
}

#[test]
fn host_drains_ready_before_sending() {
    let rig = Rig::new(BridgeConfig::default());
    rig.service().boot(&rig.queues, &mut rig.link(), &mut Recorder::new());

    let mut host = rig.host(CURRENT_RELEASE);
    assert_eq!(host.drain(), 1);
    assert_eq!(host.drain(), 0);
}

// ── Round trips ───────────────────────────────────────────────

#[test]
fn switch_command_is_acknowledged() {
    let rig = Rig::with_repeats(2, 2);
    let mut service = rig.service();
    let mut link = rig.link();
    let mut sink = Recorder::new();
    service.boot(&rig.queues, &mut link, &mut sink);

    let mut host = rig.host(CURRENT_RELEASE);
    host.drain();
    let sent = host.send(code(), false).unwrap();
    assert_eq!(sent, CommandRecord::new(CommandKind::Switch, 8525, 42));

    assert!(service.poll(&rig.queues, &mut link, &mut sink));
    assert_eq!(host.await_ack(&sent), Ok(sent));
    assert!(sink.events.contains(&AppEvent::CommandReceived(sent)));
    assert_eq!(service.handled(), 1);
}

#[test]
fn legacy_command_is_acknowledged_on_current_firmware() {
    let rig = Rig::with_repeats(2, 2);
    let mut service = rig.service();
    let mut link = rig.link();

    let mut host = rig.host(CURRENT_RELEASE);
    let sent = host.send(code(), true).unwrap();
    assert_eq!(sent.kind, CommandKind::SwitchLegacy);

    service.poll(&rig.queues, &mut link, &mut Recorder::new());
    assert_eq!(host.await_ack(&sent), Ok(sent));
}

#[test]
fn legacy_request_downgraded_on_old_firmware() {
    let rig = Rig::with_repeats(1, 1);
    let mut service = rig.service();
    let mut link = rig.link();

    let mut host = rig.host(0x0107);
    let sent = host.send(code(), true).unwrap();
    assert_eq!(sent.kind, CommandKind::Switch);

    service.poll(&rig.queues, &mut link, &mut Recorder::new());
    assert_eq!(host.await_ack(&sent), Ok(sent));
    assert_eq!(
        livolo_bridge::protocol::pulse::decode_frame(&rig.rf.widths_ns(), &rig.hardware_widths()),
        Ok((8525, 42)),
        "downgraded command goes out with hardware timing"
    );
}

#[test]
fn commands_are_served_in_order() {
    let rig = Rig::with_repeats(1, 1);
    let mut service = rig.service();
    let mut link = rig.link();
    let mut host = rig.host(CURRENT_RELEASE);

    let first = host.send(code(), false).unwrap();
    let second = host.send(SwitchCode::new(8525, 106).unwrap(), false).unwrap();
    while service.poll(&rig.queues, &mut link, &mut Recorder::new()) {}

    assert_eq!(host.await_ack(&first), Ok(first));
    assert_eq!(host.await_ack(&second), Ok(second));
    assert_eq!(service.handled(), 2);
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn wrong_echo_is_a_mismatch() {
    let rig = Rig::new(BridgeConfig::default());
    let mut host = rig.host(CURRENT_RELEASE);
    let sent = host.send(code(), false).unwrap();

    let wrong = CommandRecord::new(CommandKind::Switch, 8525, 43);
    assert!(rig.queues.outbound.write(wrong));
    assert_eq!(
        host.await_ack(&sent),
        Err(ExchangeError::AckMismatch { sent, received: wrong })
    );
}

#[test]
fn unknown_kind_is_answered_with_error() {
    let rig = Rig::new(BridgeConfig::default());
    let mut service = rig.service();
    let mut sink = Recorder::new();
    let raw = [0x4C, 0x77, 0x4D, 0x21, 42, 0, 0, 0];
    assert!(rig.endpoint().set_report(&raw));

    service.poll(&rig.queues, &mut rig.link(), &mut sink);

    let sent = CommandRecord::from_bytes(&raw).unwrap();
    let mut host = rig.host(CURRENT_RELEASE);
    match host.await_ack(&sent) {
        Err(ExchangeError::AckMismatch { received, .. }) => {
            assert_eq!(received.kind, CommandKind::UnknownCommandError);
            assert_eq!((received.remote_id, received.key), (8525, 42));
        }
        other => panic!("expected an error-marked echo, got {other:?}"),
    }
    assert!(sink.events.contains(&AppEvent::Rejected(sent)));
    assert!(rig.rf.edges().is_empty(), "nothing transmitted");
}

#[test]
fn silent_device_times_out() {
    let mut config = BridgeConfig::default();
    config.host.poll_limit = 3;
    let rig = Rig::new(config);
    let mut host = rig.host(CURRENT_RELEASE);
    let sent = host.send(code(), false).unwrap();

    // The device loop never runs.
    assert_eq!(host.await_ack(&sent), Err(ExchangeError::NoReply { polls: 3 }));
    assert_eq!(rig.clock.now_ns(), 3 * 300 * 1_000_000);
}

#[test]
fn out_of_range_command_never_reaches_device() {
    let rig = Rig::new(BridgeConfig::default());
    let mut host = rig.host(CURRENT_RELEASE);
    assert_eq!(
        host.switch(8525, 300, false),
        Err(ExchangeError::Command(CommandError::KeyCodeOutOfRange(300)))
    );
    assert!(rig.queues.inbound.is_empty());
}

#[test]
fn inbound_overflow_drops_newest() {
    let rig = Rig::new(BridgeConfig::default());
    let endpoint = rig.endpoint();
    let report = CommandRecord::new(CommandKind::Switch, 8525, 42).to_bytes();

    for _ in 0..QUEUE_CAP - 1 {
        assert!(endpoint.set_report(&report));
    }
    let late = CommandRecord::new(CommandKind::Switch, 1, 1).to_bytes();
    assert!(!endpoint.set_report(&late));
    assert_eq!(rig.queues.inbound.len(), QUEUE_CAP - 1);

    let mut drained = 0;
    while let Some(rec) = rig.queues.inbound.read() {
        assert_eq!(rec.remote_id, 8525);
        drained += 1;
    }
    assert_eq!(drained, QUEUE_CAP - 1);
}

#[test]
fn foreign_report_id_is_ignored() {
    let rig = Rig::new(BridgeConfig::default());
    assert!(!rig.endpoint().set_report(&[0x01, 0x01, 0x4D, 0x21, 42, 0, 0, 0]));
    assert!(!rig.endpoint().set_report(&[0x4C, 0x01]));
    assert!(rig.queues.inbound.is_empty());
}
