//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the ingestion buffer, the FSM with its shared
//! context, and the connection supervisor.  All I/O flows through port
//! traits injected at call sites, making the entire service testable
//! with mock adapters.
//!
//! ```text
//!  MessagingPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                    │          AppService          │
//!      ServoPort ◀── │ Queue · Codec · FSM · Link   │
//!                    └──────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::clock::Millis;
use crate::config::ServoConfig;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::link::codec;
use crate::link::queue::{ByteQueue, DEFAULT_CAPACITY};
use crate::link::supervisor::{ConnectionSupervisor, LinkState};

use super::events::AppEvent;
use super::ports::{EntropyPort, EventSink, MessagingPort, ServoPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    queue: ByteQueue<DEFAULT_CAPACITY>,
    link: ConnectionSupervisor,
}

impl AppService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: ServoConfig) -> crate::error::Result<Self> {
        config.validate()?;
        let queue = ByteQueue::new(config.overflow_policy);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Ok(Self {
            fsm,
            ctx,
            queue,
            link: ConnectionSupervisor::new(),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in its initial state (Idle, servo detached).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started {
            state: self.fsm.current_state(),
            desired_angle: self.ctx.actuation.desired_angle,
        });
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle:
    /// connectivity → inbound delivery → at most one frame → FSM → servo.
    ///
    /// Frames are only decoded while the session is up and outside a hold
    /// window.  The FSM and servo are driven on every tick regardless, so
    /// a hold in progress is honoured even while reconnecting.
    pub fn tick(
        &mut self,
        now: Millis,
        servo: &mut impl ServoPort,
        mqtt: &mut impl MessagingPort,
        rng: &mut impl EntropyPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Connectivity
        let connected = self.link.poll(now, mqtt, rng, &self.ctx.config, sink);

        // 2. Inbound messages land in the queue here and only here
        if connected {
            mqtt.service(&mut |topic: &str, payload: &[u8]| {
                self.ingest_message(topic, payload, sink);
            });
        }

        if !self.queue.is_empty() {
            debug!("<buffer>{}</buffer>", self.queue);
        }

        // 3. One frame, unless holding
        if connected && !self.ctx.actuation.is_holding(now) {
            if let Some(command) = codec::next_command(&mut self.queue) {
                let outcome = self.ctx.actuation.apply(command, now, &self.ctx.config);
                sink.emit(&AppEvent::CommandApplied {
                    command,
                    outcome,
                    at: now,
                });
            }
        }

        // 4. FSM tick (pure state logic)
        if let Some((from, to)) = self.fsm.tick(now, &mut self.ctx) {
            sink.emit(&AppEvent::StateChanged { from, to });
        }

        // 5. Apply servo commands via ServoPort
        self.drive_servo(servo, sink);
    }

    /// Queue one inbound message.  Messages on topics other than the
    /// control topic are ignored.
    pub fn ingest_message(&mut self, topic: &str, payload: &[u8], sink: &mut impl EventSink) {
        if topic != self.ctx.config.control_topic.as_str() {
            debug!("Ignoring message on '{}' ({} bytes)", topic, payload.len());
            return;
        }

        debug!(
            "Message arrived [{}] {}",
            topic,
            core::str::from_utf8(payload).unwrap_or("<non-utf8>")
        );

        match self.queue.ingest(payload) {
            Ok(evicted) => {
                if evicted > 0 {
                    sink.emit(&AppEvent::FramesEvicted { bytes: evicted });
                }
                let mut t = crate::config::TopicString::new();
                // Equal to the configured control topic, so it fits.
                let _ = t.push_str(topic);
                sink.emit(&AppEvent::MessageQueued {
                    topic: t,
                    len: payload.len(),
                });
            }
            Err(reason) => {
                sink.emit(&AppEvent::MessageDropped {
                    len: payload.len(),
                    reason,
                });
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current actuation phase.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn desired_angle(&self) -> i32 {
        self.ctx.actuation.desired_angle
    }

    pub fn hold_expiry(&self) -> Option<Millis> {
        self.ctx.actuation.hold_expiry
    }

    /// Bytes waiting in the ingestion buffer.
    pub fn queued_bytes(&self) -> usize {
        self.queue.size()
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn config(&self) -> &ServoConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM servo commands into port calls.
    fn drive_servo(&self, servo: &mut impl ServoPort, sink: &mut impl EventSink) {
        let cmds = self.ctx.commands;

        let result = if cmds.attached {
            let attached = if servo.is_attached() {
                Ok(())
            } else {
                servo.attach()
            };
            attached.and_then(|()| servo.set_position(cmds.angle))
        } else if servo.is_attached() {
            servo.detach()
        } else {
            Ok(())
        };

        if let Err(e) = result {
            warn!("Servo write failed: {}", e);
            sink.emit(&AppEvent::ActuatorFault(e));
        }
    }
}
