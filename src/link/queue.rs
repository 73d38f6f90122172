//! Ingestion buffer — bounded FIFO byte queue.
//!
//! Inbound message payloads are appended here by the transport's service
//! call and drained one frame at a time by the [`codec`](super::codec).
//!
//! ```text
//!  ingest("A10\nH200") ──▶ [A 1 0 \n H 2 0 0 \n] ──▶ next_command()
//!                          front            back
//! ```
//!
//! Every ingested message is followed by exactly one delimiter, so each
//! message becomes at least one complete frame.  `size() <= N` holds at
//! all times; what happens when a message does not fit is decided by the
//! configured [`OverflowPolicy`].

use core::fmt;

use heapless::Deque;

use crate::config::OverflowPolicy;
use crate::error::BufferError;

/// Frame delimiter byte.
pub const DELIMITER: u8 = b'\n';

/// Default queue capacity (bytes).
pub const DEFAULT_CAPACITY: usize = 300;

/// Fixed-capacity FIFO byte queue.
pub struct ByteQueue<const N: usize> {
    inner: Deque<u8, N>,
    policy: OverflowPolicy,
}

impl<const N: usize> ByteQueue<N> {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            inner: Deque::new(),
            policy,
        }
    }

    /// Append one byte.
    ///
    /// When full: `RejectNew` drops `byte` and returns `Err(Full)`;
    /// `EvictOldest` discards the oldest byte to make room.
    pub fn push(&mut self, byte: u8) -> Result<(), BufferError> {
        if self.inner.is_full() {
            match self.policy {
                OverflowPolicy::RejectNew => return Err(BufferError::Full),
                OverflowPolicy::EvictOldest => {
                    self.inner.pop_front();
                }
            }
        }
        self.inner.push_back(byte).map_err(|_| BufferError::Full)
    }

    /// Remove and return the oldest byte.
    pub fn pop(&mut self) -> Result<u8, BufferError> {
        self.inner.pop_front().ok_or(BufferError::Empty)
    }

    /// Inspect the byte at `index` (0 = oldest) without removing it.
    pub fn peek(&self, index: usize) -> Option<u8> {
        self.inner.iter().nth(index).copied()
    }

    /// Index of the first occurrence of `byte`, scanning from the front.
    pub fn find(&self, byte: u8) -> Option<usize> {
        self.inner.iter().position(|&b| b == byte)
    }

    pub fn size(&self) -> usize {
        self.inner.len()
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn free(&self) -> usize {
        N - self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop `count` bytes from the front (fewer if the queue runs dry).
    pub fn discard(&mut self, count: usize) -> usize {
        let mut dropped = 0;
        while dropped < count && self.inner.pop_front().is_some() {
            dropped += 1;
        }
        dropped
    }

    /// Append a whole inbound message plus one trailing delimiter.
    ///
    /// The message is queued atomically: either every byte and the
    /// delimiter go in, or nothing does.  Under `EvictOldest` whole frames
    /// are evicted from the front until it fits; the return value is the
    /// number of bytes evicted.  A message longer than `N - 1` bytes can
    /// never fit and is rejected with `TooLarge` under either policy.
    pub fn ingest(&mut self, payload: &[u8]) -> Result<usize, BufferError> {
        let needed = payload.len() + 1;
        if needed > N {
            return Err(BufferError::TooLarge);
        }

        let mut evicted = 0;
        if needed > self.free() {
            match self.policy {
                OverflowPolicy::RejectNew => return Err(BufferError::Full),
                OverflowPolicy::EvictOldest => {
                    while needed > self.free() {
                        evicted += self.evict_frame();
                    }
                }
            }
        }

        for &b in payload {
            // Capacity was checked above; these cannot fail.
            let _ = self.inner.push_back(b);
        }
        let _ = self.inner.push_back(DELIMITER);
        Ok(evicted)
    }

    /// Evict the oldest complete frame, or everything if no delimiter is queued.
    fn evict_frame(&mut self) -> usize {
        match self.find(DELIMITER) {
            Some(end) => self.discard(end + 1),
            None => self.discard(self.inner.len()),
        }
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new(OverflowPolicy::RejectNew)
    }
}

/// Renders the queued bytes for debug logs, delimiters shown as `\n`.
impl<const N: usize> fmt::Display for ByteQueue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.inner.iter() {
            match b {
                DELIMITER => f.write_str("\\n")?,
                0x20..=0x7E => write!(f, "{}", b as char)?,
                _ => write!(f, "\\x{:02x}", b)?,
            }
        }
        Ok(())
    }
}
