//! Hardware adapter — bridges the servo driver to the domain port trait.
//!
//! Owns the [`ServoDriver`] and exposes it through [`ServoPort`].  This
//! is the only module in the system that touches the PWM peripheral.
//! On ESP-IDF the channel is an LEDC driver; host tests plug in any
//! `SetDutyCycle` fake.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::ServoPort;
use crate::drivers::servo::ServoDriver;
use crate::error::ActuatorError;

/// Concrete adapter that puts the servo behind the port trait.
pub struct HardwareAdapter<P> {
    servo: ServoDriver<P>,
}

impl<P: SetDutyCycle> HardwareAdapter<P> {
    pub fn new(servo: ServoDriver<P>) -> Self {
        Self { servo }
    }

    pub fn servo(&self) -> &ServoDriver<P> {
        &self.servo
    }
}

fn pwm_failed<E: core::fmt::Debug>(e: E) -> ActuatorError {
    warn!("servo PWM error: {:?}", e);
    ActuatorError::PwmWriteFailed
}

// ── ServoPort implementation ──────────────────────────────────

impl<P: SetDutyCycle> ServoPort for HardwareAdapter<P> {
    fn attach(&mut self) -> Result<(), ActuatorError> {
        self.servo.attach().map_err(pwm_failed)
    }

    fn detach(&mut self) -> Result<(), ActuatorError> {
        self.servo.detach().map_err(pwm_failed)
    }

    fn set_position(&mut self, angle: i32) -> Result<(), ActuatorError> {
        if !self.servo.is_attached() {
            return Err(ActuatorError::NotAttached);
        }
        self.servo.set_angle(angle).map_err(pwm_failed)
    }

    fn is_attached(&self) -> bool {
        self.servo.is_attached()
    }
}
