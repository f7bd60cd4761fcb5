//! Randomized scenarios, one module per property family.
//!
//! Each scenario repeats its round many times with random scheduling
//! delays and checks the outcome with [`crate::assertions`].

pub mod correlation;
pub mod delivery;
pub mod lifecycle;

use std::time::Duration;

/// Default number of repetitions per scenario.
pub const ROUNDS: usize = 200;

/// Upper bound of random pauses injected between racing steps.
pub const MAX_PAUSE: Duration = Duration::from_micros(500);
