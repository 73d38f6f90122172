//! MQTT client adapter.
//!
//! Implements [`MessagingPort`], the hexagonal boundary for the
//! pub/sub session.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   The client runs its own task; its event callback only flips the
//!   connected flag and copies received publishes into the shared
//!   [`Inbox`].  Each connect attempt drops the previous client and
//!   builds a new one with the attempt's client id and last will.
//! - **all other targets**: an in-process simulated broker.  Connect
//!   failures are scripted, published and subscribed topics are recorded,
//!   and inbound publishes are injected with [`MqttAdapter::inject`].

use log::{info, warn};

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
};

use crate::app::ports::{ConnectOptions, MessagingPort};
use crate::config::TopicString;
use crate::error::CommsError;
use crate::link::inbox::Inbox;

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct MqttAdapter {
    broker_url: TopicString,
    client: Option<EspMqttClient<'static>>,
    connected: Arc<AtomicBool>,
    inbox: Arc<Inbox>,
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    pub fn new(broker_url: &str) -> Result<Self, CommsError> {
        let mut url = TopicString::new();
        url.push_str(broker_url)
            .map_err(|_| CommsError::ConnectFailed)?;
        Ok(Self {
            broker_url: url,
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
            inbox: Arc::new(Inbox::new()),
        })
    }
}

#[cfg(target_os = "espidf")]
impl MessagingPort for MqttAdapter {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), CommsError> {
        // Tear down the previous session before reusing the flag.
        self.client = None;
        self.connected.store(false, Ordering::SeqCst);

        let conf = MqttClientConfiguration {
            client_id: Some(options.client_id),
            lwt: Some(LwtConfiguration {
                topic: options.will_topic,
                payload: options.will_payload,
                qos: QoS::AtLeastOnce,
                retain: false,
            }),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };

        let connected = Arc::clone(&self.connected);
        let inbox = Arc::clone(&self.inbox);
        let client = EspMqttClient::new_cb(&self.broker_url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => connected.store(true, Ordering::SeqCst),
                EventPayload::Disconnected => connected.store(false, Ordering::SeqCst),
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    if let Err(e) = inbox.offer(topic, data) {
                        warn!("MQTT: dropped {} bytes on '{}': {}", data.len(), topic, e);
                    }
                }
                _ => {}
            }
        })
        .map_err(|e| {
            warn!("MQTT: client start failed: {:?}", e);
            CommsError::ConnectFailed
        })?;

        info!("MQTT: connecting to {} as '{}'", self.broker_url, options.client_id);
        self.client = Some(client);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some() && self.connected.load(Ordering::SeqCst)
    }

    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| CommsError::MqttPublishFailed)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| CommsError::MqttSubscribeFailed)
    }

    fn service(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) {
        self.inbox.drain(|topic, payload| on_message(topic, payload));
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Everything the simulated broker has seen, for assertions.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default, Clone)]
pub struct SimRecord {
    pub client_ids: Vec<String>,
    pub wills: Vec<(String, Vec<u8>)>,
    pub published: Vec<(String, Vec<u8>)>,
    pub subscriptions: Vec<String>,
}

#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    broker_url: TopicString,
    connected: bool,
    /// Upcoming connect attempts that fail before one succeeds.
    fail_connects: u32,
    inbox: Inbox,
    record: SimRecord,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(broker_url: &str) -> Result<Self, CommsError> {
        let mut url = TopicString::new();
        url.push_str(broker_url)
            .map_err(|_| CommsError::ConnectFailed)?;
        Ok(Self {
            broker_url: url,
            connected: false,
            fail_connects: 0,
            inbox: Inbox::new(),
            record: SimRecord::default(),
        })
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&mut self, n: u32) {
        self.fail_connects = n;
    }

    /// Simulate the broker dropping the session.
    pub fn drop_session(&mut self) {
        if self.connected {
            warn!("MQTT(sim): session dropped");
        }
        self.connected = false;
    }

    /// Deliver a publish as if the broker had routed it to us.  Only
    /// subscribed topics are delivered, like a real broker.
    pub fn inject(&self, topic: &str, payload: &[u8]) -> bool {
        if !self.connected || !self.record.subscriptions.iter().any(|s| s == topic) {
            return false;
        }
        self.inbox.offer(topic, payload).is_ok()
    }

    pub fn record(&self) -> &SimRecord {
        &self.record
    }
}

#[cfg(not(target_os = "espidf"))]
impl MessagingPort for MqttAdapter {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), CommsError> {
        self.connected = false;
        self.record.subscriptions.clear();
        self.record.client_ids.push(options.client_id.to_string());
        self.record
            .wills
            .push((options.will_topic.to_string(), options.will_payload.to_vec()));

        if self.fail_connects > 0 {
            self.fail_connects -= 1;
            warn!("MQTT(sim): refusing '{}'", options.client_id);
            return Err(CommsError::ConnectFailed);
        }

        info!("MQTT(sim): '{}' connected to {}", options.client_id, self.broker_url);
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        self.record
            .published
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        self.record.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn service(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) {
        self.inbox.drain(|topic, payload| on_message(topic, payload));
    }
}
