//! Wraparound-safe millisecond timestamps.
//!
//! Device uptime is carried as a `u32` millisecond counter that wraps
//! after ~49.7 days.  Deadlines are compared through the signed distance
//! between two counter values, so a deadline computed just before the
//! wrap still orders correctly against `now` values just after it.
//! Valid for deadlines less than `i32::MAX` ms (~24.8 days) away.

/// Milliseconds of device uptime (wrapping).
pub type Millis = u32;

/// `now + delta_ms`, wrapping.  Negative deltas produce a deadline in the past.
pub fn deadline_after(now: Millis, delta_ms: i32) -> Millis {
    now.wrapping_add_signed(delta_ms)
}

/// `true` while `now` is strictly before `deadline`.
pub fn is_before(now: Millis, deadline: Millis) -> bool {
    (deadline.wrapping_sub(now) as i32) > 0
}

/// `true` once `now` has reached or passed `deadline`.
pub fn has_reached(now: Millis, deadline: Millis) -> bool {
    !is_before(now, deadline)
}
