//! Per-turn wind generation
//!
//! Wind is a mean-reverting random walk: each turn keeps 70% of the previous
//! value and adds fresh Gaussian noise, so gusts change gradually and extreme
//! values decay toward calm.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Wind magnitude limit (either direction)
pub const MAX_WIND: i32 = 30;
/// Std deviation of the opening wind
pub const WIND_STD_DEV: f64 = 10.0;
/// Std deviation of the per-turn change
pub const WIND_CHANGE_STD_DEV: f64 = 5.0;
/// Fraction of the previous wind kept each turn
pub const WIND_REGRESSION: f64 = 0.7;

/// Standard normal sample via the Box–Muller transform
pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // u1 in (0, 1] so ln(u1) stays finite
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn clamp_wind(value: f64) -> i32 {
    let limit = MAX_WIND as f64;
    value.clamp(-limit, limit).round() as i32
}

/// Opening wind for a match
pub fn generate_initial_wind<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    clamp_wind(sample_standard_normal(rng) * WIND_STD_DEV)
}

/// Next turn's wind given the current one
pub fn generate_next_wind<R: Rng + ?Sized>(current: i32, rng: &mut R) -> i32 {
    let regressed = current as f64 * WIND_REGRESSION;
    clamp_wind(regressed + sample_standard_normal(rng) * WIND_CHANGE_STD_DEV)
}

/// Wind source for a match (a disabled model is always calm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindModel {
    pub enabled: bool,
}

impl Default for WindModel {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl WindModel {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn initial<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.enabled {
            generate_initial_wind(rng)
        } else {
            0
        }
    }

    pub fn next<R: Rng + ?Sized>(&self, current: i32, rng: &mut R) -> i32 {
        if self.enabled {
            generate_next_wind(current, rng)
        } else {
            0
        }
    }
}
