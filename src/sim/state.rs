//! Tank state and outbound simulation events
//!
//! Health and shields are only written by `combat`. Everything else here is
//! placement, aiming and movement.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat::DamageOutcome;
use super::physics::LaunchConfig;
use super::projectile::ImpactEvent;
use super::terrain::TerrainData;
use super::weapons::{DestructionCategory, WeaponType};
use crate::consts::*;
use crate::{EngineError, Position, Result};

/// Fuel spent per world unit driven
pub const FUEL_PER_UNIT: f64 = 1.0;
/// Steepest climb per unit of horizontal travel
pub const MAX_CLIMB_GRADE: f64 = 1.5;

/// Armor fitted at tank creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorType {
    #[default]
    None,
    LightPlating,
    HeavyPlating,
    EnergyShield,
}

impl ArmorType {
    /// Bonus hit points on top of the base hull
    pub fn bonus_health(&self) -> f64 {
        match self {
            ArmorType::None | ArmorType::EnergyShield => 0.0,
            ArmorType::LightPlating => 25.0,
            ArmorType::HeavyPlating => 50.0,
        }
    }

    /// Shield capacity
    pub fn shield_capacity(&self) -> f64 {
        match self {
            ArmorType::EnergyShield => 50.0,
            _ => 0.0,
        }
    }
}

/// A tank in the duel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankState {
    pub id: u32,
    /// Bottom-centre of the hull
    pub position: Position,
    pub health: f64,
    pub max_health: f64,
    pub shield_hp: f64,
    pub max_shield_hp: f64,
    pub armor_type: ArmorType,
    /// Barrel angle (physics convention)
    pub angle: f64,
    /// Shot power in [0, 100]
    pub power: f64,
    pub fuel: f64,
    pub max_fuel: f64,
    pub is_active: bool,
    pub killed_by_weapon: Option<WeaponType>,
}

impl TankState {
    /// Fresh tank at `position` with armor applied to its maxima
    pub fn with_armor(id: u32, position: Position, armor: ArmorType) -> Self {
        let max_health = BASE_TANK_HEALTH + armor.bonus_health();
        let max_shield_hp = armor.shield_capacity();
        Self {
            id,
            position,
            health: max_health,
            max_health,
            shield_hp: max_shield_hp,
            max_shield_hp,
            armor_type: armor,
            angle: DEFAULT_TANK_ANGLE,
            power: DEFAULT_TANK_POWER,
            fuel: BASE_TANK_FUEL,
            max_fuel: BASE_TANK_FUEL,
            is_active: true,
            killed_by_weapon: None,
        }
    }

    /// Place a tank on the terrain surface at column `x`
    pub fn new(id: u32, x: f64, terrain: &TerrainData, armor: ArmorType) -> Result<Self> {
        if !x.is_finite() {
            // NaN would otherwise cast to column 0
            let x = if x == f64::INFINITY { i64::MAX } else { i64::MIN };
            return Err(EngineError::CoordinateOutOfBounds {
                x,
                width: terrain.width,
            });
        }
        let column = x.round() as i64;
        let surface = terrain.try_height_at(column)?;
        Ok(Self::with_armor(id, DVec2::new(column as f64, surface), armor))
    }

    /// Alive and targetable
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.is_active && self.health > 0.0
    }

    /// Centre of the hull box (splash and homing reference point)
    #[inline]
    pub fn center(&self) -> Position {
        self.position + DVec2::new(0.0, TANK_HEIGHT / 2.0)
    }

    #[inline]
    pub fn turret_pivot(&self) -> Position {
        self.position + DVec2::new(0.0, TANK_HEIGHT)
    }

    /// Muzzle position for a barrel at `angle_deg`
    pub fn launch_origin(&self, angle_deg: f64) -> Position {
        let theta = angle_deg.to_radians();
        self.turret_pivot() + DVec2::new(theta.cos(), theta.sin()) * BARREL_LENGTH
    }

    /// Launch parameters from the tank's current aim
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig::new(self.launch_origin(self.angle), self.angle, self.power)
    }

    /// Copy with a new aim. Barrels point at or above the horizon.
    pub fn aimed(&self, angle_deg: f64, power: f64) -> Self {
        let angle = if angle_deg.is_finite() {
            angle_deg.clamp(0.0, 180.0)
        } else {
            self.angle
        };
        let power = if power.is_finite() {
            power.clamp(MIN_POWER, MAX_POWER)
        } else {
            self.power
        };
        Self {
            angle,
            power,
            ..self.clone()
        }
    }

    /// Drive `dx` units along the surface. Movement stops early when fuel runs
    /// out, the slope is too steep, or the hull would leave the map.
    pub fn drive(&self, dx: f64, terrain: &TerrainData) -> Result<Self> {
        if !self.is_alive() {
            return Err(EngineError::TankInactive(self.id));
        }
        let mut x = self.position.x;
        let mut y = terrain.try_height_at(x.round() as i64)?;
        let mut fuel = self.fuel;

        let direction = dx.signum();
        let mut remaining = if dx.is_finite() { dx.abs() } else { 0.0 };
        let min_x = TANK_WIDTH / 2.0;
        let max_x = terrain.width as f64 - 1.0 - TANK_WIDTH / 2.0;

        while remaining > 0.0 {
            let step = remaining.min(1.0);
            let cost = step * FUEL_PER_UNIT;
            if fuel < cost {
                break;
            }
            let next_x = x + direction * step;
            if next_x < min_x || next_x > max_x {
                break;
            }
            let Some(next_y) = terrain.interpolated_height_at(next_x) else {
                break;
            };
            if next_y - y > MAX_CLIMB_GRADE * step {
                log::debug!("Tank {} blocked by slope at x={:.1}", self.id, next_x);
                break;
            }
            x = next_x;
            y = next_y;
            fuel -= cost;
            remaining -= step;
        }

        Ok(Self {
            position: DVec2::new(x, y),
            fuel,
            ..self.clone()
        })
    }

    /// Copy resting on the current surface (after cratering)
    pub fn settled(&self, terrain: &TerrainData) -> Self {
        match terrain.interpolated_height_at(self.position.x) {
            Some(surface) if (surface - self.position.y).abs() > f64::EPSILON => Self {
                position: DVec2::new(self.position.x, surface),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// RNG for the current stream (does not advance)
    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Fresh independent RNG, advancing to the next stream
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = self.to_rng();
        self.stream += 1;
        rng
    }
}

/// Everything the core reports to rendering, audio and persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEvent {
    WeaponFired {
        tank_id: u32,
        weapon_type: WeaponType,
        category: DestructionCategory,
        launch: LaunchConfig,
    },
    ProjectileMoved {
        projectile: usize,
        position: Position,
    },
    Bounced {
        projectile: usize,
        position: Position,
        bounce_count: u32,
        power: f64,
    },
    Retargeted {
        projectile: usize,
        target: Position,
    },
    Impact(ImpactEvent),
    SubmunitionsSpawned {
        count: usize,
        position: Position,
    },
    TerrainDeformed {
        center: Position,
        radius: f64,
        columns: usize,
    },
    Damage(DamageOutcome),
    OutOfBounds {
        projectile: usize,
        position: Position,
        forced: bool,
    },
}
