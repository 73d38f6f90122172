//! System configuration parameters
//!
//! All tunable parameters for the servo controller.
//! Values can be overridden via NVS (postcard blob) or a JSON provisioning
//! payload.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Topic and identifier strings are bounded so the config stays heap-free.
pub type TopicString = heapless::String<64>;

/// What the ingestion buffer does when a message does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Drop the incoming message whole; queued frames are untouched.
    RejectNew,
    /// Evict whole frames from the front until the message fits.
    EvictOldest,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    // --- Angle range ---
    /// Lowest accepted `SetAngle` target (degrees).
    pub min_angle: i32,
    /// Highest accepted `SetAngle` target (degrees).
    pub max_angle: i32,
    /// Desired angle before the first `SetAngle` arrives.
    pub initial_angle: i32,

    // --- Ingestion ---
    pub overflow_policy: OverflowPolicy,

    // --- Timing ---
    /// Fixed delay between failed MQTT connect attempts (milliseconds).
    pub reconnect_delay_ms: u32,
    /// Main loop period (milliseconds).
    pub control_loop_interval_ms: u32,

    // --- Messaging ---
    pub broker_url: TopicString,
    /// Liveness topic: `online_payload` on connect, `offline_payload` as last will.
    pub status_topic: TopicString,
    /// Command stream topic.
    pub control_topic: TopicString,
    pub client_id_prefix: heapless::String<16>,
    pub online_payload: heapless::String<8>,
    pub offline_payload: heapless::String<8>,
}

fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            // Angle range (unipolar variant)
            min_angle: 0,
            max_angle: 100,
            initial_angle: 0,

            overflow_policy: OverflowPolicy::RejectNew,

            // Timing
            reconnect_delay_ms: 5_000,
            control_loop_interval_ms: 10, // 100 Hz

            // Messaging
            broker_url: bounded("mqtts://broker.local:8883"),
            status_topic: bounded("servo/status"),
            control_topic: bounded("servo/control"),
            client_id_prefix: bounded("ESP32Client"),
            online_payload: bounded("1"),
            offline_payload: bounded("-1"),
        }
    }
}

impl ServoConfig {
    /// Preset for the bipolar firmware variant (`[-100, 100]`).
    pub fn bipolar() -> Self {
        Self {
            min_angle: -100,
            max_angle: 100,
            ..Self::default()
        }
    }

    /// `true` if `angle` lies inside the accepted range (inclusive).
    pub fn angle_in_range(&self, angle: i32) -> bool {
        (self.min_angle..=self.max_angle).contains(&angle)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_angle > self.max_angle {
            return Err(ConfigError::ValidationFailed(
                "min_angle must be <= max_angle",
            ));
        }
        if !self.angle_in_range(self.initial_angle) {
            return Err(ConfigError::ValidationFailed(
                "initial_angle must lie within min_angle..=max_angle",
            ));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "reconnect_delay_ms must be > 0",
            ));
        }
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be > 0",
            ));
        }
        if self.status_topic.is_empty() || self.control_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        if self.status_topic == self.control_topic {
            return Err(ConfigError::ValidationFailed(
                "status_topic and control_topic must differ",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON provisioning payload.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
