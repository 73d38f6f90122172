//! Hobby servo driver (50 Hz position PWM).
//!
//! Standard servo timing, widened the way most SG90/MG996 parts accept:
//!
//! ```text
//!   0°  → 500 µs
//!  90°  → 1500 µs
//! 180°  → 2500 µs      (period 20 ms)
//! ```
//!
//! Generic over any [`SetDutyCycle`] channel, so the ESP-IDF LEDC driver
//! and host-side fakes plug in the same way.  Detaching drives the
//! output low: no pulses, the servo goes limp.
//!
//! Angles outside the physical 0–180° range are clamped here; the
//! domain's own range check happens before a value ever reaches the
//! driver.

use embedded_hal::pwm::SetDutyCycle;

use crate::pins;

/// Pulse width at 0°.
pub const PULSE_MIN_US: u32 = 500;
/// Pulse width at 180°.
pub const PULSE_MAX_US: u32 = 2_500;
/// 1 / `SERVO_PWM_FREQ_HZ`.
pub const PERIOD_US: u32 = 1_000_000 / pins::SERVO_PWM_FREQ_HZ;

pub const MAX_PHYSICAL_ANGLE: i32 = 180;

/// Pulse width for `angle`, clamped to the physical range.
pub fn pulse_width_us(angle: i32) -> u32 {
    let angle = angle.clamp(0, MAX_PHYSICAL_ANGLE) as u32;
    PULSE_MIN_US + (PULSE_MAX_US - PULSE_MIN_US) * angle / MAX_PHYSICAL_ANGLE as u32
}

pub struct ServoDriver<P> {
    pwm: P,
    attached: bool,
    angle: Option<i32>,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            attached: false,
            angle: None,
        }
    }

    /// Start emitting pulses at the last recorded angle.  With no angle
    /// recorded yet, pulses start on the first [`set_angle`](Self::set_angle).
    pub fn attach(&mut self) -> Result<(), P::Error> {
        if let Some(angle) = self.angle {
            self.write_pulse(angle)?;
        }
        self.attached = true;
        Ok(())
    }

    pub fn detach(&mut self) -> Result<(), P::Error> {
        self.pwm.set_duty_cycle_fully_off()?;
        self.attached = false;
        Ok(())
    }

    /// Record `angle` and, if attached, move there.
    pub fn set_angle(&mut self, angle: i32) -> Result<(), P::Error> {
        let angle = angle.clamp(0, MAX_PHYSICAL_ANGLE);
        if self.attached && self.angle != Some(angle) {
            self.write_pulse(angle)?;
        }
        self.angle = Some(angle);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn channel(&self) -> &P {
        &self.pwm
    }

    /// Last commanded angle after clamping.
    pub fn angle(&self) -> Option<i32> {
        self.angle
    }

    fn write_pulse(&mut self, angle: i32) -> Result<(), P::Error> {
        let max = u32::from(self.pwm.max_duty_cycle());
        let duty = max * pulse_width_us(angle) / PERIOD_US;
        // duty <= max because the pulse never exceeds the period.
        self.pwm.set_duty_cycle(duty as u16)
    }
}
