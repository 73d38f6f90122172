//! Inbound commands to the application service.
//!
//! One [`Command`] is decoded per frame by the
//! [`codec`](crate::link::codec) and applied by
//! [`ActuationState::apply`](crate::fsm::context::ActuationState::apply).

use core::fmt::Write;

/// Commands carried by the control topic's line protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Hold `desired_angle` for this many milliseconds (`H`/`h`).
    /// Zero or negative values expire immediately.
    Hold(i32),

    /// Set the target angle in degrees (`A`/`a`, `F`/`f`).
    SetAngle(i32),

    /// Unrecognised code or payload-less frame; consumed, no effect.
    NoOp,
}

/// Wire form of a single frame: `<code><value>\n`.
pub type EncodedFrame = heapless::String<16>;

impl Command {
    /// Map a command code and decoded payload to a command.
    pub fn from_code(code: u8, value: i32) -> Self {
        match code.to_ascii_uppercase() {
            b'H' => Self::Hold(value),
            b'A' | b'F' => Self::SetAngle(value),
            _ => Self::NoOp,
        }
    }

    /// Encode back into the line protocol.  `NoOp` has no wire form.
    pub fn encode(&self) -> Option<EncodedFrame> {
        let (code, value) = match *self {
            Self::Hold(ms) => ('H', ms),
            Self::SetAngle(deg) => ('A', deg),
            Self::NoOp => return None,
        };
        let mut out = EncodedFrame::new();
        // 1 code byte + at most 11 digits/sign + delimiter always fits in 16.
        let _ = writeln!(out, "{}{}", code, value);
        Some(out)
    }
}
