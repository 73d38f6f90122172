//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (servo, MQTT client, entropy, event sinks, storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! or the network directly.

use crate::config::ServoConfig;
use crate::error::{ActuatorError, CommsError};

// ───────────────────────────────────────────────────────────────
// Servo port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the single servo.
pub trait ServoPort {
    /// Power the servo and start emitting position pulses.
    fn attach(&mut self) -> Result<(), ActuatorError>;

    /// Stop pulses; the servo goes limp.
    fn detach(&mut self) -> Result<(), ActuatorError>;

    /// Command a position in degrees.  Idempotent.
    fn set_position(&mut self, angle: i32) -> Result<(), ActuatorError>;

    fn is_attached(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Messaging port (driven adapter: domain ↔ MQTT)
// ───────────────────────────────────────────────────────────────

/// Options for a single connect attempt.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions<'a> {
    pub client_id: &'a str,
    /// Last-will topic and payload, published by the broker if we vanish.
    pub will_topic: &'a str,
    pub will_payload: &'a [u8],
}

/// Pub/sub session used by the connectivity supervisor and the service.
pub trait MessagingPort {
    /// Try to open a session.  Returns once the outcome is known.
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), CommsError>;

    fn is_connected(&self) -> bool;

    fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Deliver pending inbound messages to `on_message`, synchronously.
    /// Called once per tick; this is the only place inbound data enters
    /// the core.
    fn service(&mut self, on_message: &mut dyn FnMut(&str, &[u8]));
}

// ───────────────────────────────────────────────────────────────
// Entropy port (client identifiers)
// ───────────────────────────────────────────────────────────────

/// Source of random bits for client identifiers.
pub trait EntropyPort {
    fn next_u32(&mut self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] if nothing has been stored yet.
    fn load(&self) -> Result<ServoConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &ServoConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("config not found"),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
