//! Connection supervisor behaviour through the full service tick.

use crate::mock_hw::{BrokerOp, Rig};

use servolink::app::events::AppEvent;
use servolink::config::ServoConfig;
use servolink::error::CommsError;
use servolink::link::supervisor::LinkState;

#[test]
fn connect_publishes_online_then_subscribes() {
    let rig = Rig::connected(ServoConfig::default(), 0);
    let ops = &rig.broker.ops;
    assert_eq!(ops.len(), 3);
    assert!(matches!(
        &ops[0],
        BrokerOp::Connect { client_id, will }
            if client_id.starts_with("ESP32Client-")
            && will == &("servo/status".to_string(), b"-1".to_vec())
    ));
    assert_eq!(ops[1], BrokerOp::Publish("servo/status".into(), b"1".to_vec()));
    assert_eq!(ops[2], BrokerOp::Subscribe("servo/control".into()));
    assert_eq!(rig.app.link_state(), LinkState::Connected);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::LinkUp { attempt: 1, .. })), 1);
}

#[test]
fn failed_attempts_retry_on_fixed_delay() {
    let mut rig = Rig::new(ServoConfig::default());
    rig.broker.fail_connects = 3;

    rig.tick(0);
    rig.tick(4_999);
    assert_eq!(rig.broker.client_ids().len(), 1);
    rig.tick(5_000);
    assert_eq!(rig.broker.client_ids().len(), 2);
    rig.tick(9_990);
    rig.tick(10_000);
    assert_eq!(rig.broker.client_ids().len(), 3);
    rig.tick(15_000);
    assert_eq!(rig.app.link_state(), LinkState::Connected);

    let ids = rig.broker.client_ids();
    assert_eq!(ids.len(), 4);
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b, "client id reused");
        }
    }

    let failures: Vec<u32> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConnectFailed { attempt, error: CommsError::ConnectFailed, .. } => {
                Some(*attempt)
            }
            _ => None,
        })
        .collect();
    assert_eq!(failures, [1, 2, 3]);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::LinkUp { attempt: 4, .. })), 1);
}

#[test]
fn delay_is_configurable() {
    let cfg = ServoConfig {
        reconnect_delay_ms: 250,
        ..ServoConfig::default()
    };
    let mut rig = Rig::new(cfg);
    rig.broker.fail_connects = 1;
    rig.tick(1_000);
    rig.tick(1_249);
    assert_ne!(rig.app.link_state(), LinkState::Connected);
    rig.tick(1_250);
    assert_eq!(rig.app.link_state(), LinkState::Connected);
}

#[test]
fn lost_session_retried_immediately() {
    let mut rig = Rig::connected(ServoConfig::default(), 0);
    rig.broker.drop_session();
    rig.tick(10);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::LinkLost)), 1);
    assert_eq!(rig.app.link_state(), LinkState::Connected);

    let ids = rig.broker.client_ids();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    // Online status announced on every new session.
    let online = rig
        .broker
        .ops
        .iter()
        .filter(|op| **op == BrokerOp::Publish("servo/status".into(), b"1".to_vec()))
        .count();
    assert_eq!(online, 2);
}

#[test]
fn pending_connect_times_out_after_delay() {
    let mut rig = Rig::new(ServoConfig::default());
    rig.broker.hold_connects = true;

    rig.tick(0);
    assert!(matches!(rig.app.link_state(), LinkState::Connecting { attempt: 1, .. }));
    rig.tick(4_999);
    assert!(matches!(rig.app.link_state(), LinkState::Connecting { .. }));

    rig.tick(5_000);
    assert_eq!(rig.app.link_state(), LinkState::Disconnected);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ConnectFailed { attempt: 1, .. })), 1);

    // Next attempt goes out on the following tick; this one completes.
    rig.tick(5_010);
    assert!(matches!(rig.app.link_state(), LinkState::Connecting { attempt: 2, .. }));
    rig.broker.complete_connect();
    rig.tick(5_020);
    assert_eq!(rig.app.link_state(), LinkState::Connected);
}

#[test]
fn retry_schedule_survives_counter_wrap() {
    let mut rig = Rig::new(ServoConfig::default());
    rig.broker.fail_connects = 1;
    let t = u32::MAX - 1_000;
    rig.tick(t);
    rig.tick(u32::MAX);
    rig.tick(t.wrapping_add(4_999));
    assert_ne!(rig.app.link_state(), LinkState::Connected);
    rig.tick(t.wrapping_add(5_000));
    assert_eq!(rig.app.link_state(), LinkState::Connected);
}

#[test]
fn link_up_reports_the_id_sent_to_the_broker() {
    let rig = Rig::connected(ServoConfig::default(), 0);
    let announced: Vec<String> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::LinkUp { client_id, .. } => Some(client_id.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(announced, rig.broker.client_ids());
}
