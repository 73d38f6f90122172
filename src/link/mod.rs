//! Inbound command path: MQTT payload bytes to decoded commands.
//!
//! ```text
//! ┌────────────┐  offer   ┌────────┐ ingest ┌───────────┐ next_command ┌─────────┐
//! │ MQTT task  │─────────▶│ Inbox  │───────▶│ ByteQueue │─────────────▶│ Command │
//! └────────────┘          └────────┘        └───────────┘  (≤1 / tick) └─────────┘
//! ```
//!
//! - [`queue`]      — bounded FIFO byte buffer with an explicit overflow policy
//! - [`codec`]      — line framer and `decode_int`
//! - [`inbox`]      — cross-task hand-off of received messages
//! - [`supervisor`] — non-blocking MQTT session state machine

pub mod codec;
pub mod inbox;
pub mod queue;
pub mod supervisor;
