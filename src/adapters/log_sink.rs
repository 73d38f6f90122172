//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::context::ApplyOutcome;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                state,
                desired_angle,
            } => {
                info!("START | state={:?} | angle={}°", state, desired_angle);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::MessageQueued { topic, len } => {
                debug!("MSG | queued {} bytes from '{}'", len, topic);
            }
            AppEvent::MessageDropped { len, reason } => {
                warn!("MSG | dropped {} bytes: {}", len, reason);
            }
            AppEvent::FramesEvicted { bytes } => {
                warn!("MSG | evicted {} queued bytes", bytes);
            }
            AppEvent::CommandApplied {
                command,
                outcome,
                at,
            } => match outcome {
                ApplyOutcome::HoldScheduled {
                    duration_ms,
                    expiry,
                } => {
                    info!("HOLD | {}ms from t={} until t={}", duration_ms, at, expiry);
                }
                ApplyOutcome::AngleAccepted(angle) => {
                    info!("CMD | angle -> {}°", angle);
                }
                ApplyOutcome::AngleRejected(angle) => {
                    warn!("CMD | angle {}° out of range, ignored", angle);
                }
                ApplyOutcome::Ignored => {
                    debug!("CMD | {:?} ignored", command);
                }
            },
            AppEvent::ActuatorFault(e) => {
                warn!("SERVO | {}", e);
            }
            AppEvent::LinkUp { client_id, attempt } => {
                info!("LINK | up as '{}' after {} attempt(s)", client_id, attempt);
            }
            AppEvent::ConnectFailed { attempt, error, at } => {
                warn!("LINK | attempt {} failed at t={}: {}", attempt, at, error);
            }
            AppEvent::LinkLost => {
                warn!("LINK | session lost");
            }
        }
    }
}
