//! Weapon catalog
//!
//! Every weapon is a row of capability flags. The projectile state machine
//! reads the flags; nothing branches on the weapon identity itself.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Result};

/// Which destruction/visual profile an external animator should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestructionCategory {
    Explosive,
    Ballistic,
    Fire,
}

impl DestructionCategory {
    /// Tag handed to the audio and animation collaborators
    pub fn as_str(&self) -> &'static str {
        match self {
            DestructionCategory::Explosive => "explosive",
            DestructionCategory::Ballistic => "ballistic",
            DestructionCategory::Fire => "fire",
        }
    }
}

/// Static weapon parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponConfig {
    pub name: &'static str,
    /// Simulation clock rate while in flight (pacing only)
    pub speed_multiplier: f64,
    pub splash_radius: f64,
    pub damage: f64,
    /// Terrain bounces before detonating (0 = detonate on contact)
    pub max_bounces: u32,
    pub is_homing: bool,
    /// Fraction of the heading error corrected per tick while homing
    pub tracking_strength: f64,
    /// Secondary explosions spawned at the main impact
    pub submunition_count: u32,
    pub destruction_category: DestructionCategory,
    /// Crater radius relative to the splash radius
    pub crater_scale: f64,
    /// Shop price, reported to the campaign collaborator only
    pub cost: u32,
}

const STANDARD: WeaponConfig = WeaponConfig {
    name: "Standard Shell",
    speed_multiplier: 1.0,
    splash_radius: 30.0,
    damage: 25.0,
    max_bounces: 0,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 0,
    destruction_category: DestructionCategory::Explosive,
    crater_scale: 1.0,
    cost: 0,
};

const HEAVY_ARTILLERY: WeaponConfig = WeaponConfig {
    name: "Heavy Artillery",
    speed_multiplier: 0.8,
    splash_radius: 50.0,
    damage: 40.0,
    max_bounces: 0,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 0,
    destruction_category: DestructionCategory::Explosive,
    crater_scale: 1.2,
    cost: 150,
};

const PRECISION: WeaponConfig = WeaponConfig {
    name: "Precision Round",
    speed_multiplier: 1.3,
    splash_radius: 15.0,
    damage: 35.0,
    max_bounces: 0,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 0,
    destruction_category: DestructionCategory::Ballistic,
    crater_scale: 0.6,
    cost: 120,
};

const CLUSTER_BOMB: WeaponConfig = WeaponConfig {
    name: "Cluster Bomb",
    speed_multiplier: 1.0,
    splash_radius: 20.0,
    damage: 15.0,
    max_bounces: 0,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 5,
    destruction_category: DestructionCategory::Explosive,
    crater_scale: 0.8,
    cost: 200,
};

const NAPALM: WeaponConfig = WeaponConfig {
    name: "Napalm",
    speed_multiplier: 0.9,
    splash_radius: 40.0,
    damage: 20.0,
    max_bounces: 0,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 0,
    destruction_category: DestructionCategory::Fire,
    crater_scale: 0.4,
    cost: 180,
};

const EMP: WeaponConfig = WeaponConfig {
    name: "EMP Blast",
    speed_multiplier: 1.1,
    splash_radius: 45.0,
    damage: 15.0,
    max_bounces: 0,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 0,
    destruction_category: DestructionCategory::Explosive,
    crater_scale: 0.0,
    cost: 160,
};

const BOUNCING_BETTY: WeaponConfig = WeaponConfig {
    name: "Bouncing Betty",
    speed_multiplier: 1.0,
    splash_radius: 25.0,
    damage: 20.0,
    max_bounces: 3,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 0,
    destruction_category: DestructionCategory::Explosive,
    crater_scale: 0.8,
    cost: 140,
};

const BUNKER_BUSTER: WeaponConfig = WeaponConfig {
    name: "Bunker Buster",
    speed_multiplier: 0.9,
    splash_radius: 20.0,
    damage: 50.0,
    max_bounces: 0,
    is_homing: false,
    tracking_strength: 0.0,
    submunition_count: 0,
    destruction_category: DestructionCategory::Ballistic,
    crater_scale: 2.0,
    cost: 250,
};

const HOMING_MISSILE: WeaponConfig = WeaponConfig {
    name: "Homing Missile",
    speed_multiplier: 1.0,
    splash_radius: 25.0,
    damage: 30.0,
    max_bounces: 0,
    is_homing: true,
    tracking_strength: 0.15,
    submunition_count: 0,
    destruction_category: DestructionCategory::Explosive,
    crater_scale: 0.8,
    cost: 300,
};

/// Weapon identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    #[default]
    Standard,
    HeavyArtillery,
    Precision,
    ClusterBomb,
    Napalm,
    Emp,
    BouncingBetty,
    BunkerBuster,
    HomingMissile,
}

impl WeaponType {
    pub const ALL: [WeaponType; 9] = [
        WeaponType::Standard,
        WeaponType::HeavyArtillery,
        WeaponType::Precision,
        WeaponType::ClusterBomb,
        WeaponType::Napalm,
        WeaponType::Emp,
        WeaponType::BouncingBetty,
        WeaponType::BunkerBuster,
        WeaponType::HomingMissile,
    ];

    /// Catalog row for this weapon
    pub fn config(self) -> &'static WeaponConfig {
        match self {
            WeaponType::Standard => &STANDARD,
            WeaponType::HeavyArtillery => &HEAVY_ARTILLERY,
            WeaponType::Precision => &PRECISION,
            WeaponType::ClusterBomb => &CLUSTER_BOMB,
            WeaponType::Napalm => &NAPALM,
            WeaponType::Emp => &EMP,
            WeaponType::BouncingBetty => &BOUNCING_BETTY,
            WeaponType::BunkerBuster => &BUNKER_BUSTER,
            WeaponType::HomingMissile => &HOMING_MISSILE,
        }
    }

    /// Stable string key
    pub fn key(self) -> &'static str {
        match self {
            WeaponType::Standard => "standard",
            WeaponType::HeavyArtillery => "heavy_artillery",
            WeaponType::Precision => "precision",
            WeaponType::ClusterBomb => "cluster_bomb",
            WeaponType::Napalm => "napalm",
            WeaponType::Emp => "emp",
            WeaponType::BouncingBetty => "bouncing_betty",
            WeaponType::BunkerBuster => "bunker_buster",
            WeaponType::HomingMissile => "homing_missile",
        }
    }

    /// Parse a string key. A miss means catalog drift, so it is logged and
    /// returned as an error rather than defaulted.
    pub fn from_key(key: &str) -> Result<Self> {
        match Self::ALL.iter().find(|w| w.key() == key) {
            Some(&weapon) => Ok(weapon),
            None => {
                log::error!("Weapon key '{}' has no catalog entry", key);
                Err(EngineError::UnknownWeapon(key.to_string()))
            }
        }
    }

    #[inline]
    pub fn destruction_category(self) -> DestructionCategory {
        self.config().destruction_category
    }
}
