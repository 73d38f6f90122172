//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the connection
//! supervisor emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log
//! to serial, or record them in tests.

use crate::app::commands::Command;
use crate::clock::Millis;
use crate::config::TopicString;
use crate::error::{ActuatorError, BufferError, CommsError};
use crate::fsm::context::ApplyOutcome;
use crate::fsm::StateId;
use crate::link::supervisor::ClientId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started.
    Started { state: StateId, desired_angle: i32 },

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A control message was queued for decoding.
    MessageQueued { topic: TopicString, len: usize },

    /// A control message was refused by the ingestion buffer.
    MessageDropped { len: usize, reason: BufferError },

    /// Older frames were evicted to make room for a new message.
    FramesEvicted { bytes: usize },

    /// A frame was decoded and applied to the actuation state.
    CommandApplied { command: Command, outcome: ApplyOutcome, at: Millis },

    /// A servo write failed.  The loop carries on.
    ActuatorFault(ActuatorError),

    /// MQTT session established, status published and control subscribed.
    LinkUp { client_id: ClientId, attempt: u32 },

    /// A connect attempt failed; the next one is scheduled.
    ConnectFailed { attempt: u32, error: CommsError, at: Millis },

    /// A previously healthy session dropped.
    LinkLost,
}
