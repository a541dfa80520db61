//! Tank Duel - ballistics and combat-resolution core for an artillery duel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (trajectories, terrain, weapons, AI, damage)
//! - `settings`: AI difficulty and match settings
//! - `error`: Typed engine errors
//!
//! Rendering, audio and persistence are external collaborators. They consume
//! the [`sim::GameEvent`] stream and never feed simulation logic back in.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{EngineError, Result};
pub use settings::{AiDifficulty, Settings};

use glam::DVec2;

/// World-space position (x right, y up from the terrain baseline)
pub type Position = DVec2;

/// Engine constants shared by every weapon
pub mod consts {
    /// Default simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;

    /// Downward acceleration, world units/s²
    pub const GRAVITY: f64 = 200.0;
    /// Launch speed per power point (power 100 => 400 units/s)
    pub const POWER_TO_VELOCITY: f64 = 4.0;
    pub const MIN_POWER: f64 = 0.0;
    pub const MAX_POWER: f64 = 100.0;
    /// Horizontal acceleration per wind unit, world units/s²
    pub const WIND_ACCEL_FACTOR: f64 = 1.5;

    /// Tank body box (position is the bottom-centre of the body)
    pub const TANK_WIDTH: f64 = 30.0;
    pub const TANK_HEIGHT: f64 = 15.0;
    /// Distance from turret pivot to muzzle
    pub const BARREL_LENGTH: f64 = 20.0;

    pub const BASE_TANK_HEALTH: f64 = 100.0;
    pub const BASE_TANK_FUEL: f64 = 100.0;
    pub const DEFAULT_TANK_ANGLE: f64 = 45.0;
    pub const DEFAULT_TANK_POWER: f64 = 50.0;

    /// Collision radius of an in-flight projectile
    pub const PROJECTILE_RADIUS: f64 = 3.0;
    /// Below this y a projectile has left the world
    pub const OUT_OF_BOUNDS_MARGIN: f64 = 50.0;
    /// Hard ceiling on a single shot's flight (seconds of sim time)
    pub const MAX_FLIGHT_TIME: f64 = 30.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Convert an input-control angle (0° = up, positive = clockwise) to a
/// physics angle (0° = +x, 90° = +y)
#[inline]
pub fn ui_to_physics_angle(ui_deg: f64) -> f64 {
    normalize_degrees(90.0 - ui_deg)
}

/// Inverse of [`ui_to_physics_angle`], result in (-180, 180]
#[inline]
pub fn physics_to_ui_angle(physics_deg: f64) -> f64 {
    let ui = normalize_degrees(90.0 - physics_deg);
    if ui > 180.0 { ui - 360.0 } else { ui }
}

/// Convert world coordinates (y up) to screen coordinates (y down)
#[inline]
pub fn world_to_screen(pos: Position, screen_height: f64) -> DVec2 {
    DVec2::new(pos.x, screen_height - pos.y)
}

/// Convert screen coordinates (y down) to world coordinates (y up)
#[inline]
pub fn screen_to_world(screen: DVec2, screen_height: f64) -> Position {
    DVec2::new(screen.x, screen_height - screen.y)
}
