//! GPIO / peripheral pin assignments for the servo controller board.
//!
//! Single source of truth — drivers and the bootstrap reference this
//! module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Servo
// ---------------------------------------------------------------------------

/// Servo signal line (LEDC channel 0).
pub const SERVO_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby servos expect a 20 ms frame.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution (bits).  14-bit gives ~1.2 µs pulse steps at 50 Hz.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
