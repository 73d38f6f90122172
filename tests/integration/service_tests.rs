//! Integration tests for the MQTT → queue → codec → FSM → servo pipeline.
//!
//! Each test drives `AppService::tick` with explicit timestamps, so hold
//! windows are checked to the millisecond.

use crate::mock_hw::{Rig, ServoCall};

use servolink::app::commands::Command;
use servolink::app::events::AppEvent;
use servolink::config::{OverflowPolicy, ServoConfig};
use servolink::error::BufferError;
use servolink::fsm::StateId;
use servolink::fsm::context::ApplyOutcome;
use servolink::link::supervisor::LinkState;

fn applied(rig: &Rig) -> Vec<Command> {
    rig.sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::CommandApplied { command, .. } => Some(*command),
            _ => None,
        })
        .collect()
}

// ── Single commands ───────────────────────────────────────────

#[test]
fn set_angle_frame_updates_desired_angle() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"A50\n", 10);
    assert_eq!(rig.app.desired_angle(), 50);
    assert_eq!(applied(&rig), [Command::SetAngle(50)]);
    // No hold yet: servo stays detached.
    assert!(rig.servo.calls.is_empty());
}

#[test]
fn message_without_delimiter_is_one_hold_frame() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"H1000", 10);
    assert_eq!(applied(&rig), [Command::Hold(1000)]);
    assert_eq!(rig.app.queued_bytes(), 0);
    assert_eq!(rig.app.state(), StateId::Holding);
}

#[test]
fn out_of_range_angle_leaves_desired_unchanged() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"A40", 10);
    rig.send(b"A150", 20);
    assert_eq!(rig.app.desired_angle(), 40);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::CommandApplied { outcome: ApplyOutcome::AngleRejected(150), .. }
        )),
        1
    );
}

#[test]
fn bipolar_config_accepts_negative_angle() {
    let mut rig = Rig::connected(ServoConfig::bipolar(), 0);
    rig.send(b"a-100", 10);
    assert_eq!(rig.app.desired_angle(), -100);
}

#[test]
fn unknown_code_is_consumed_without_effect() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"Z99", 10);
    assert_eq!(applied(&rig), [Command::NoOp]);
    assert_eq!(rig.app.desired_angle(), 0);
    assert_eq!(rig.app.queued_bytes(), 0);
}

#[test]
fn spaced_or_signed_angle_is_not_read_as_zero() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"A 90", 10);
    assert_eq!(rig.app.desired_angle(), 90);
    rig.send(b"A+45", 20);
    assert_eq!(rig.app.desired_angle(), 45);
}

// ── Hold window ───────────────────────────────────────────────

#[test]
fn hold_window_is_exactly_its_duration() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"A30", 10);

    let t = 1_000;
    rig.send(b"H500", t);
    assert_eq!(rig.app.state(), StateId::Holding);
    assert_eq!(rig.servo.calls, [ServoCall::Attach, ServoCall::SetPosition(30)]);

    rig.tick(t + 250);
    rig.tick(t + 499);
    assert_eq!(rig.app.state(), StateId::Holding);

    rig.tick(t + 500);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.servo.calls.last(), Some(&ServoCall::Detach));
    assert_eq!(rig.app.hold_expiry(), None);
}

#[test]
fn servo_rewritten_every_tick_while_holding() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"A70", 10);
    rig.send(b"H100", 100);
    for t in (110..200).step_by(10) {
        rig.tick(t);
    }
    // 100, 110, ..., 190 → ten ticks inside the window.
    assert_eq!(rig.servo.count(ServoCall::SetPosition(70)), 10);
    assert_eq!(rig.servo.count(ServoCall::Attach), 1);
}

#[test]
fn frames_wait_out_the_hold_window() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    let t = 1_000;
    rig.send(b"H500\nA20", t);
    let queued = rig.app.queued_bytes();
    assert!(queued > 0);

    for dt in [1, 100, 499] {
        rig.tick(t + dt);
        assert_eq!(rig.app.queued_bytes(), queued, "decoded during hold at +{dt}");
    }

    rig.tick(t + 500);
    assert_eq!(rig.app.desired_angle(), 20);
    assert_eq!(applied(&rig), [Command::Hold(500), Command::SetAngle(20)]);
}

#[test]
fn two_frames_take_two_ticks() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"A10\nH200\n", 10);
    assert_eq!(applied(&rig), [Command::SetAngle(10)]);
    rig.tick(20);
    assert_eq!(applied(&rig), [Command::SetAngle(10), Command::Hold(200)]);
    assert_eq!(rig.app.state(), StateId::Holding);
}

#[test]
fn zero_length_hold_never_attaches() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"H0", 10);
    rig.send(b"H-50", 20);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.servo.count(ServoCall::Attach), 0);
}

#[test]
fn hold_straddling_counter_wrap() {
    let t = u32::MAX - 100;
    let mut rig = Rig::connected(ServoConfig::default(), t - 10);
    rig.send(b"H500", t);
    rig.tick(u32::MAX);
    rig.tick(t.wrapping_add(499));
    assert_eq!(rig.app.state(), StateId::Holding);
    rig.tick(t.wrapping_add(500));
    assert_eq!(rig.app.state(), StateId::Idle);
}

#[test]
fn servo_fault_is_reported_and_loop_continues() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.servo.fail_writes = true;
    rig.send(b"H50", 10);
    rig.tick(20);
    assert!(rig.sink.count(|e| matches!(e, AppEvent::ActuatorFault(_))) >= 2);
    rig.tick(60);
    assert_eq!(rig.app.state(), StateId::Idle);
}

// ── Topics & buffering ────────────────────────────────────────

#[test]
fn other_topics_are_ignored() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.broker.push("servo/status", b"A10");
    rig.broker.push("elsewhere", b"H100");
    rig.tick(10);
    assert_eq!(rig.app.queued_bytes(), 0);
    assert!(applied(&rig).is_empty());
}

#[test]
fn oversized_message_dropped_under_reject_new() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    let big = vec![b'1'; 300];
    rig.send(&big, 10);
    assert_eq!(rig.app.queued_bytes(), 0);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::MessageDropped { reason: BufferError::TooLarge, .. }
        )),
        1
    );
}

#[test]
fn full_buffer_rejects_new_message_whole() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    // Hold the parser off so the queue fills up.
    rig.send(b"H10000", 10);
    let chunk = [b'7'; 99];
    rig.send(&chunk, 20); // 100 bytes
    rig.send(&chunk, 30); // 200 bytes
    rig.send(&chunk, 40); // 300 bytes: full
    assert_eq!(rig.app.queued_bytes(), 300);
    rig.send(b"A5", 50);
    assert_eq!(rig.app.queued_bytes(), 300);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::MessageDropped { reason: BufferError::Full, .. })),
        1
    );
}

#[test]
fn evict_oldest_makes_room_for_new_message() {
    let cfg = ServoConfig {
        overflow_policy: OverflowPolicy::EvictOldest,
        ..ServoConfig::default()
    };
    let mut rig = Rig::connected(cfg, 0);
    rig.send(b"H10000", 10);
    let chunk = [b'7'; 99];
    rig.send(&chunk, 20);
    rig.send(&chunk, 30);
    rig.send(&chunk, 40);
    rig.send(b"A5", 50);
    assert_eq!(rig.app.queued_bytes(), 203);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FramesEvicted { bytes: 100 })), 1);

    // The newest frame survives and is decoded after the hold.
    for t in [10_010, 10_020, 10_030] {
        rig.tick(t);
    }
    assert_eq!(rig.app.desired_angle(), 5);
}

// ── Connectivity gating ───────────────────────────────────────

#[test]
fn nothing_decoded_before_first_connect() {
    let mut rig = Rig::new(ServoConfig::default());
    rig.broker.fail_connects = 1;
    rig.broker.push("servo/control", b"A10");
    rig.tick(0);
    assert_eq!(rig.app.queued_bytes(), 0);
    assert_eq!(rig.broker.pending(), 1, "not serviced while disconnected");
    rig.tick(5_000);
    assert_eq!(rig.app.desired_angle(), 10);
}

#[test]
fn hold_honoured_while_reconnecting() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.send(b"A60", 10);
    rig.send(b"H1000\nA90", 100);

    rig.broker.drop_session();
    rig.broker.fail_connects = 10;
    rig.tick(200);
    assert_ne!(rig.app.link_state(), LinkState::Connected);
    assert_eq!(rig.app.state(), StateId::Holding);
    assert_eq!(rig.servo.last_position(), Some(60));

    // Window closes on time even though the session is still down,
    // but the queued frame waits for the link.
    rig.tick(1_100);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.app.desired_angle(), 60);
    assert!(rig.app.queued_bytes() > 0);
}
