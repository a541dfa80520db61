//! Projectile trajectory math
//!
//! Closed-form kinematics under constant gravity and constant wind
//! acceleration. Everything here is a pure function of its inputs.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{Position, normalize_degrees};

/// Shot parameters at the moment of launch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Muzzle position
    pub position: Position,
    /// Physics angle (0° = right, 90° = up)
    pub angle_deg: f64,
    /// Launch power in [0, 100]
    pub power: f64,
    /// Exact launch speed, overriding the power curve. Set on in-flight
    /// relaunches so a shell keeps speed it gained past `MAX_POWER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl LaunchConfig {
    pub fn new(position: Position, angle_deg: f64, power: f64) -> Self {
        Self {
            position,
            angle_deg,
            power,
            speed: None,
        }
        .sanitized()
    }

    /// Relaunch at an exact speed (not limited by the power range)
    pub fn with_speed(position: Position, angle_deg: f64, speed: f64) -> Self {
        Self {
            position,
            angle_deg,
            power: velocity_to_power(speed),
            speed: Some(speed),
        }
        .sanitized()
    }

    /// Launch speed: the explicit speed when set, else the power curve
    #[inline]
    pub fn launch_speed(&self) -> f64 {
        self.speed.unwrap_or_else(|| power_to_velocity(self.power))
    }

    /// Clamp power, wrap angle and replace non-finite values so every input
    /// still yields a trajectory
    pub fn sanitized(&self) -> Self {
        let angle_deg = if self.angle_deg.is_finite() {
            normalize_degrees(self.angle_deg)
        } else {
            DEFAULT_TANK_ANGLE
        };
        let power = if self.power.is_finite() {
            self.power.clamp(MIN_POWER, MAX_POWER)
        } else {
            MIN_POWER
        };
        let position = if self.position.is_finite() {
            self.position
        } else {
            DVec2::ZERO
        };
        let speed = self.speed.filter(|s| s.is_finite()).map(|s| s.max(0.0));
        Self {
            position,
            angle_deg,
            power,
            speed,
        }
    }
}

/// Position and velocity at an instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Position,
    pub velocity: DVec2,
}

/// Fixed power -> launch speed curve
#[inline]
pub fn power_to_velocity(power: f64) -> f64 {
    power.clamp(MIN_POWER, MAX_POWER) * POWER_TO_VELOCITY
}

/// Inverse of [`power_to_velocity`], clamped to the power range
#[inline]
pub fn velocity_to_power(speed: f64) -> f64 {
    (speed / POWER_TO_VELOCITY).clamp(MIN_POWER, MAX_POWER)
}

/// Horizontal acceleration produced by a wind value
#[inline]
pub fn wind_acceleration(wind: i32) -> f64 {
    wind as f64 * WIND_ACCEL_FACTOR
}

/// Launch velocity vector
pub fn initial_velocity(launch: &LaunchConfig) -> DVec2 {
    let speed = launch.launch_speed();
    let theta = launch.angle_deg.to_radians();
    DVec2::new(speed * theta.cos(), speed * theta.sin())
}

/// Position `t` seconds after launch
pub fn position_at(launch: &LaunchConfig, wind: i32, t: f64) -> Position {
    kinematics_at(launch, wind, t).position
}

/// Velocity `t` seconds after launch
pub fn velocity_at(launch: &LaunchConfig, wind: i32, t: f64) -> DVec2 {
    kinematics_at(launch, wind, t).velocity
}

/// Position and velocity `t` seconds after launch (negative `t` clamps to 0)
pub fn kinematics_at(launch: &LaunchConfig, wind: i32, t: f64) -> Kinematics {
    let t = t.max(0.0);
    let v0 = initial_velocity(launch);
    let accel = DVec2::new(wind_acceleration(wind), -GRAVITY);

    Kinematics {
        position: launch.position + v0 * t + 0.5 * accel * t * t,
        velocity: v0 + accel * t,
    }
}

/// Time of the vertical apex (0 when launched level or downward)
pub fn apex_time(launch: &LaunchConfig) -> f64 {
    (initial_velocity(launch).y / GRAVITY).max(0.0)
}

/// Physics heading of a velocity vector, in [0, 360)
#[inline]
pub fn heading_deg(velocity: DVec2) -> f64 {
    normalize_degrees(velocity.y.atan2(velocity.x).to_degrees())
}
