//! Hand-off channel between the MQTT client task and the control loop.
//!
//! On ESP-IDF the MQTT client delivers events on its own task.  The
//! callback only copies each message into this bounded `embassy-sync`
//! channel; the control loop drains it inside
//! [`MessagingPort::service`](crate::app::ports::MessagingPort::service),
//! so the byte queue is only ever touched from the loop.
//!
//! ```text
//! ┌──────────────┐ InboundMessage ┌──────────────┐
//! │  MQTT task   │───────────────▶│ Control loop │
//! │  (callback)  │    (bounded)   │  (service)   │
//! └──────────────┘                └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};

use super::queue::DEFAULT_CAPACITY;
use crate::error::BufferError;

/// Longest topic name carried through the inbox.
pub const MAX_TOPIC_LEN: usize = 64;

/// Longest payload worth carrying: anything longer can never fit in the
/// byte queue next to its delimiter.
pub const MAX_PAYLOAD_LEN: usize = DEFAULT_CAPACITY - 1;

/// Messages buffered between two control ticks.
const INBOX_DEPTH: usize = 8;

/// One received publish, copied out of the transport's buffers.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String<MAX_TOPIC_LEN>,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

/// Bounded multi-producer channel of inbound messages.
pub struct Inbox {
    channel: Channel<CriticalSectionRawMutex, InboundMessage, INBOX_DEPTH>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue a message from the transport side.  Never blocks.
    ///
    /// Oversized topics or payloads are refused whole rather than
    /// truncated, since a truncated payload would decode to a different
    /// command.
    pub fn offer(&self, topic: &str, payload: &[u8]) -> Result<(), BufferError> {
        let mut t = String::new();
        t.push_str(topic).map_err(|_| BufferError::TooLarge)?;
        let p = Vec::from_slice(payload).map_err(|_| BufferError::TooLarge)?;

        self.channel
            .try_send(InboundMessage { topic: t, payload: p })
            .map_err(|_| BufferError::Full)
    }

    /// Hand every pending message to `handler`, oldest first.
    /// Returns the number of messages delivered.
    pub fn drain(&self, mut handler: impl FnMut(&str, &[u8])) -> usize {
        let mut delivered = 0;
        while let Ok(msg) = self.channel.try_receive() {
            handler(msg.topic.as_str(), &msg.payload);
            delivered += 1;
        }
        delivered
    }
}
