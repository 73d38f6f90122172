//! Connectivity supervisor — keeps the MQTT session alive without ever
//! blocking the control loop.
//!
//! ```text
//!              attempt due
//!  Disconnected ──────────▶ Connecting ──[is_connected]──▶ Connected
//!       ▲                       │                             │
//!       └──[error / timed out]──┘                             │
//!       └────────────────────[session lost]──────────────────┘
//! ```
//!
//! ## Retry policy
//!
//! One attempt per `reconnect_delay_ms` (fixed, forever).  Every attempt
//! uses a fresh random client id.  A session lost while connected is
//! retried immediately.
//!
//! ## Session setup
//!
//! Once the transport reports connected, the online payload is published
//! to the status topic and then the control topic is subscribed.  The
//! offline payload travels with the connect request as the last will.

use core::fmt::Write;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ConnectOptions, EntropyPort, EventSink, MessagingPort};
use crate::clock::{self, Millis};
use crate::config::ServoConfig;
use crate::error::CommsError;

/// MQTT client identifier: `<prefix>-<hex>`.
pub type ClientId = heapless::String<32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// Connect requested; waiting for the transport to confirm.
    Connecting { attempt: u32, deadline: Millis },
    Connected,
}

/// Build a client id from `prefix` and 16 random bits, e.g. `ESP32Client-3fa2`.
pub fn random_client_id(prefix: &str, rng: &mut impl EntropyPort) -> ClientId {
    let mut id = ClientId::new();
    let suffix = rng.next_u32() % 0xFFFF;
    // Prefix is bounded to 16 bytes by the config type; the suffix is at most 5.
    let _ = write!(id, "{}-{:x}", prefix, suffix);
    id
}

pub struct ConnectionSupervisor {
    state: LinkState,
    /// Earliest time the next attempt may start.  `None` = right away.
    next_attempt_at: Option<Millis>,
    /// Attempts since the last successful connect.
    attempts: u32,
    client_id: ClientId,
}

impl Default for ConnectionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSupervisor {
    pub fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            next_attempt_at: None,
            attempts: 0,
            client_id: ClientId::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Advance the connection state machine.  Never blocks.
    ///
    /// Returns `true` when the session is up after this call.
    pub fn poll<M, R, S>(
        &mut self,
        now: Millis,
        link: &mut M,
        rng: &mut R,
        config: &ServoConfig,
        sink: &mut S,
    ) -> bool
    where
        M: MessagingPort,
        R: EntropyPort,
        S: EventSink,
    {
        match self.state {
            LinkState::Connected => {
                if link.is_connected() {
                    return true;
                }
                warn!("LINK: session lost, reconnecting");
                sink.emit(&AppEvent::LinkLost);
                self.state = LinkState::Disconnected;
                self.next_attempt_at = None;
                self.start_attempt(now, link, rng, config, sink);
            }
            LinkState::Connecting { attempt, deadline } => {
                if !link.is_connected() && clock::has_reached(now, deadline) {
                    self.attempt_failed(attempt, now, CommsError::ConnectFailed, sink);
                    // The delay already elapsed while waiting.
                    self.next_attempt_at = None;
                }
            }
            LinkState::Disconnected => {
                let due = self
                    .next_attempt_at
                    .is_none_or(|at| clock::has_reached(now, at));
                if due {
                    self.start_attempt(now, link, rng, config, sink);
                }
            }
        }

        if let LinkState::Connecting { attempt, .. } = self.state {
            if link.is_connected() {
                self.finish_setup(attempt, now, link, config, sink);
            }
        }

        self.is_connected()
    }

    // ── Internal ──────────────────────────────────────────────

    fn start_attempt<M, R, S>(
        &mut self,
        now: Millis,
        link: &mut M,
        rng: &mut R,
        config: &ServoConfig,
        sink: &mut S,
    ) where
        M: MessagingPort,
        R: EntropyPort,
        S: EventSink,
    {
        self.attempts = self.attempts.wrapping_add(1);
        let attempt = self.attempts;
        self.client_id = random_client_id(&config.client_id_prefix, rng);
        info!(
            "LINK: attempt {} to {} as '{}'",
            attempt, config.broker_url, self.client_id
        );

        let options = ConnectOptions {
            client_id: &self.client_id,
            will_topic: &config.status_topic,
            will_payload: config.offline_payload.as_bytes(),
        };
        match link.connect(&options) {
            Ok(()) => {
                self.state = LinkState::Connecting {
                    attempt,
                    deadline: delay_from(now, config.reconnect_delay_ms),
                };
            }
            Err(e) => {
                self.attempt_failed(attempt, now, e, sink);
                self.next_attempt_at = Some(delay_from(now, config.reconnect_delay_ms));
            }
        }
    }

    fn finish_setup<M, S>(
        &mut self,
        attempt: u32,
        now: Millis,
        link: &mut M,
        config: &ServoConfig,
        sink: &mut S,
    ) where
        M: MessagingPort,
        S: EventSink,
    {
        let setup = link
            .send(&config.status_topic, config.online_payload.as_bytes())
            .and_then(|()| link.subscribe(&config.control_topic));

        match setup {
            Ok(()) => {
                self.state = LinkState::Connected;
                self.attempts = 0;
                self.next_attempt_at = None;
                sink.emit(&AppEvent::LinkUp {
                    client_id: self.client_id.clone(),
                    attempt,
                });
            }
            Err(e) => {
                self.attempt_failed(attempt, now, e, sink);
                self.next_attempt_at = Some(delay_from(now, config.reconnect_delay_ms));
            }
        }
    }

    fn attempt_failed<S: EventSink>(
        &mut self,
        attempt: u32,
        now: Millis,
        error: CommsError,
        sink: &mut S,
    ) {
        self.state = LinkState::Disconnected;
        sink.emit(&AppEvent::ConnectFailed { attempt, error, at: now });
    }
}

fn delay_from(now: Millis, delay_ms: u32) -> Millis {
    now.wrapping_add(delay_ms)
}
