//! Random-number sources behind [`EntropyPort`].
//!
//! Used for MQTT client identifiers, so quality only needs to be good
//! enough that two devices (or two attempts) rarely collide.
//!
//! - **`target_os = "espidf"`** — `esp_random()`, the hardware RNG.
//! - **all targets** — [`XorShiftEntropy`], deterministic for tests and
//!   simulation.

use crate::app::ports::EntropyPort;

/// Hardware RNG.  True randomness while the radio is on.
#[cfg(target_os = "espidf")]
#[derive(Default)]
pub struct EspEntropy;

#[cfg(target_os = "espidf")]
impl EntropyPort for EspEntropy {
    fn next_u32(&mut self) -> u32 {
        unsafe { esp_idf_svc::sys::esp_random() }
    }
}

/// xorshift32 generator.
pub struct XorShiftEntropy {
    state: u32,
}

impl XorShiftEntropy {
    /// Zero is a fixed point of xorshift, so it is replaced by a constant.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }
}

impl EntropyPort for XorShiftEntropy {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}
