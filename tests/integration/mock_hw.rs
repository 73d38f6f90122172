//! Mock adapters for integration tests.
//!
//! Records every servo and broker call so tests can assert on the full
//! command history without touching real PWM registers or a network.

use std::collections::VecDeque;

use servolink::app::events::AppEvent;
use servolink::app::ports::{ConnectOptions, EntropyPort, EventSink, MessagingPort, ServoPort};
use servolink::app::service::AppService;
use servolink::clock::Millis;
use servolink::config::ServoConfig;
use servolink::error::{ActuatorError, CommsError};

// ── Servo call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCall {
    Attach,
    Detach,
    SetPosition(i32),
}

// ── MockServo ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockServo {
    pub calls: Vec<ServoCall>,
    attached: bool,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_position(&self) -> Option<i32> {
        self.calls.iter().rev().find_map(|c| match c {
            ServoCall::SetPosition(a) => Some(*a),
            _ => None,
        })
    }

    pub fn count(&self, call: ServoCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl ServoPort for MockServo {
    fn attach(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ServoCall::Attach);
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ServoCall::Detach);
        self.attached = false;
        Ok(())
    }

    fn set_position(&mut self, angle: i32) -> Result<(), ActuatorError> {
        self.calls.push(ServoCall::SetPosition(angle));
        if self.fail_writes {
            return Err(ActuatorError::PwmWriteFailed);
        }
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}

// ── MockBroker ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerOp {
    Connect { client_id: String, will: (String, Vec<u8>) },
    Publish(String, Vec<u8>),
    Subscribe(String),
}

#[derive(Default)]
pub struct MockBroker {
    pub ops: Vec<BrokerOp>,
    connected: bool,
    /// Upcoming connect attempts that fail outright.
    pub fail_connects: u32,
    /// Connects are accepted but only complete on `complete_connect`.
    pub hold_connects: bool,
    pending: VecDeque<(String, Vec<u8>)>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a publish for delivery on the next `service` call.
    pub fn push(&mut self, topic: &str, payload: &[u8]) {
        self.pending.push_back((topic.to_string(), payload.to_vec()));
    }

    pub fn drop_session(&mut self) {
        self.connected = false;
    }

    pub fn complete_connect(&mut self) {
        self.connected = true;
    }

    pub fn client_ids(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BrokerOp::Connect { client_id, .. } => Some(client_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl MessagingPort for MockBroker {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), CommsError> {
        self.connected = false;
        self.ops.push(BrokerOp::Connect {
            client_id: options.client_id.to_string(),
            will: (options.will_topic.to_string(), options.will_payload.to_vec()),
        });
        if self.fail_connects > 0 {
            self.fail_connects -= 1;
            return Err(CommsError::ConnectFailed);
        }
        if !self.hold_connects {
            self.connected = true;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        self.ops.push(BrokerOp::Publish(topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        self.ops.push(BrokerOp::Subscribe(topic.to_string()));
        Ok(())
    }

    fn service(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) {
        while let Some((topic, payload)) = self.pending.pop_front() {
            on_message(&topic, &payload);
        }
    }
}

// ── Entropy ───────────────────────────────────────────────────

/// Counts up so consecutive client ids always differ.
pub struct SeqEntropy(pub u32);

impl EntropyPort for SeqEntropy {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Event sink that records every event for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// An `AppService` wired to mocks.
pub struct Rig {
    pub app: AppService,
    pub servo: MockServo,
    pub broker: MockBroker,
    pub rng: SeqEntropy,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: ServoConfig) -> Self {
        let mut app = AppService::new(config).expect("valid config");
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            servo: MockServo::new(),
            broker: MockBroker::new(),
            rng: SeqEntropy(0),
            sink,
        }
    }

    /// A rig whose MQTT session came up on the tick at `now`.
    pub fn connected(config: ServoConfig, now: Millis) -> Self {
        let mut rig = Self::new(config);
        rig.tick(now);
        assert!(rig.broker.is_connected());
        rig
    }

    pub fn tick(&mut self, now: Millis) {
        self.app.tick(
            now,
            &mut self.servo,
            &mut self.broker,
            &mut self.rng,
            &mut self.sink,
        );
    }

    /// Send a control message and tick once at `now`.
    pub fn send(&mut self, payload: &[u8], now: Millis) {
        let topic = self.app.config().control_topic.to_string();
        self.broker.push(&topic, payload);
        self.tick(now);
    }
}
