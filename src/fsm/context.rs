//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the actuation state (target angle and hold
//! deadline), the servo command outputs, the tick timestamp and the
//! configuration.  Think of it as the "blackboard" in a blackboard
//! architecture.

use crate::app::commands::Command;
use crate::clock::{self, Millis};
use crate::config::ServoConfig;

// ---------------------------------------------------------------------------
// Actuation state (written by the dispatcher; read by state handlers)
// ---------------------------------------------------------------------------

/// Target angle plus the deadline of the current hold window, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationState {
    /// Always within `[min_angle, max_angle]` of the active config.
    pub desired_angle: i32,
    /// End of the hold window (exclusive).  `None` when no hold is pending.
    pub hold_expiry: Option<Millis>,
}

/// What [`ActuationState::apply`] did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    HoldScheduled { duration_ms: i32, expiry: Millis },
    AngleAccepted(i32),
    /// Outside the configured range; `desired_angle` left untouched.
    AngleRejected(i32),
    Ignored,
}

impl ActuationState {
    pub fn new(initial_angle: i32) -> Self {
        Self {
            desired_angle: initial_angle,
            hold_expiry: None,
        }
    }

    /// Apply one decoded command.  Never blocks; only mutates `self`.
    pub fn apply(&mut self, command: Command, now: Millis, config: &ServoConfig) -> ApplyOutcome {
        match command {
            Command::Hold(duration_ms) => {
                let expiry = clock::deadline_after(now, duration_ms);
                self.hold_expiry = Some(expiry);
                ApplyOutcome::HoldScheduled { duration_ms, expiry }
            }
            Command::SetAngle(angle) if config.angle_in_range(angle) => {
                self.desired_angle = angle;
                ApplyOutcome::AngleAccepted(angle)
            }
            Command::SetAngle(angle) => ApplyOutcome::AngleRejected(angle),
            Command::NoOp => ApplyOutcome::Ignored,
        }
    }

    /// `true` while `now` is inside the hold window.
    pub fn is_holding(&self, now: Millis) -> bool {
        self.hold_expiry
            .is_some_and(|expiry| clock::is_before(now, expiry))
    }
}

// ---------------------------------------------------------------------------
// Servo commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// What the servo should be doing after this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServoCommands {
    pub attached: bool,
    pub angle: i32,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Timestamp of the tick being evaluated.
    pub now: Millis,

    pub actuation: ActuationState,

    /// Applied to the servo port after the FSM tick.
    pub commands: ServoCommands,

    pub config: ServoConfig,
}

impl FsmContext {
    pub fn new(config: ServoConfig) -> Self {
        Self {
            now: 0,
            actuation: ActuationState::new(config.initial_angle),
            commands: ServoCommands::default(),
            config,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.actuation.is_holding(self.now)
    }
}
