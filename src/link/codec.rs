//! Line framer and command parser.
//!
//! Wire format, one command per frame:
//! ```text
//! ┌──────────┬───────────────────────────┬──────┐
//! │ code (1B)│ [±]decimal digits (0..N B)│ 0x0A │
//! └──────────┴───────────────────────────┴──────┘
//! ```
//!
//! [`next_command`] consumes at most one frame per call and never leaves
//! a frame half-consumed: the length check happens before any byte is
//! removed, and a frame without payload digits is dropped whole as
//! [`Command::NoOp`].

use heapless::Vec;
use log::debug;

use super::queue::{ByteQueue, DELIMITER};
use crate::app::commands::Command;

/// Decode an ASCII decimal integer, "parse-or-zero".
///
/// Skips leading ASCII whitespace, accepts one optional `+` or `-`, then
/// reads digits up to the first non-digit byte (`atol` rules).  An empty
/// or non-numeric prefix yields `0`.  Values beyond the `i32` range
/// saturate.
pub fn decode_int(bytes: &[u8]) -> i32 {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let trimmed = &bytes[start..];
    let (negative, digits) = match trimmed.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, trimmed),
    };

    // Accumulate towards the sign so i32::MIN is reachable without overflow.
    let mut value: i32 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            break;
        }
        let digit = i32::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

/// Extract and decode the next frame from the front of `queue`.
///
/// Returns `None` when no complete frame is queued yet; nothing is removed
/// in that case.  Otherwise exactly one frame (including its delimiter) is
/// removed and decoded.
pub fn next_command<const N: usize>(queue: &mut ByteQueue<N>) -> Option<Command> {
    let end = queue.find(DELIMITER)?;

    if end <= 1 {
        // Empty frame or a bare code with no payload.
        let dropped = queue.discard(end + 1);
        debug_assert_eq!(dropped, end + 1, "frame shorter than scanned");
        debug!("codec: dropped {}-byte frame without payload", end);
        return Some(Command::NoOp);
    }

    let code = take(queue);

    let mut payload: Vec<u8, N> = Vec::new();
    for _ in 0..end - 1 {
        // end < N, so the payload always fits.
        let _ = payload.push(take(queue));
    }

    let delimiter = take(queue);
    debug_assert_eq!(delimiter, DELIMITER);

    Some(Command::from_code(code, decode_int(&payload)))
}

/// Pop a byte the scan has already proven to be there.
fn take<const N: usize>(queue: &mut ByteQueue<N>) -> u8 {
    match queue.pop() {
        Ok(b) => b,
        Err(e) => {
            debug_assert!(false, "codec popped past scanned frame: {e}");
            DELIMITER
        }
    }
}
