//! Damage resolution
//!
//! The only code that writes tank health and shields. Direct hits skip the
//! shield; splash hits drain it first.

use serde::{Deserialize, Serialize};

use super::projectile::ImpactEvent;
use super::state::TankState;
use super::weapons::{DestructionCategory, WeaponType};
use crate::Position;

/// Splash damage lost at the edge of the blast (fraction of full damage)
pub const SPLASH_FALLOFF: f64 = 0.5;
/// Credits per point of damage dealt to an enemy
pub const DAMAGE_REWARD_PER_HP: f64 = 1.0;
/// Credits for destroying an enemy
pub const KILL_REWARD: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    Direct,
    Splash,
}

/// Damage applied to one tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankHit {
    pub tank_id: u32,
    pub kind: HitKind,
    pub shield_damage: f64,
    pub health_damage: f64,
    pub killed: bool,
}

impl TankHit {
    #[inline]
    pub fn total(&self) -> f64 {
        self.shield_damage + self.health_damage
    }
}

/// Destruction request for the animation and audio collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankDestroyed {
    pub tank_id: u32,
    pub killer_tank_id: u32,
    pub weapon_type: WeaponType,
    pub destruction_category: DestructionCategory,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningReason {
    Damage,
    Kill,
}

/// Credits owed to a tank's owner, handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Earning {
    pub tank_id: u32,
    pub amount: u32,
    pub reason: EarningReason,
}

/// Everything one impact did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageOutcome {
    pub impact: ImpactEvent,
    pub hits: Vec<TankHit>,
    pub destroyed: Vec<TankDestroyed>,
    pub earnings: Vec<Earning>,
}

/// Apply `amount` to a copy of `tank`. Negative or non-finite amounts do
/// nothing. A kill deactivates the tank and records the weapon.
pub fn apply_damage(
    tank: &TankState,
    amount: f64,
    kind: HitKind,
    weapon: WeaponType,
) -> (TankState, TankHit) {
    let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    let mut next = tank.clone();

    let shield_damage = match kind {
        HitKind::Direct => 0.0,
        HitKind::Splash => amount.min(next.shield_hp.max(0.0)),
    };
    next.shield_hp -= shield_damage;

    let before = next.health;
    next.health = (next.health - (amount - shield_damage)).max(0.0);

    let killed = tank.is_alive() && next.health <= 0.0;
    if killed {
        next.is_active = false;
        next.killed_by_weapon = Some(weapon);
    }

    let hit = TankHit {
        tank_id: tank.id,
        kind,
        shield_damage,
        health_damage: before - next.health,
        killed,
    };
    (next, hit)
}

/// Splash damage at `distance` from the blast centre (0 outside the radius)
pub fn splash_damage(damage: f64, distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 || distance > radius {
        return 0.0;
    }
    (damage * (1.0 - SPLASH_FALLOFF * distance / radius)).round().max(0.0)
}

/// Resolve one detonation against every living tank
pub fn resolve_impact(impact: &ImpactEvent, tanks: &mut [TankState]) -> DamageOutcome {
    let direct = impact.direct_hit_tank();
    let owner = impact.owner_tank_id;
    let mut hits = Vec::new();
    let mut destroyed = Vec::new();
    let mut earnings = Vec::new();

    for tank in tanks.iter_mut().filter(|t| t.is_alive()) {
        let (amount, kind) = if Some(tank.id) == direct {
            (impact.damage, HitKind::Direct)
        } else {
            let distance = tank.center().distance(impact.position);
            (
                splash_damage(impact.damage, distance, impact.radius),
                HitKind::Splash,
            )
        };
        if amount <= 0.0 {
            continue;
        }

        let (next, hit) = apply_damage(tank, amount, kind, impact.weapon_type);
        *tank = next;

        if tank.id != owner {
            let credits = (hit.total() * DAMAGE_REWARD_PER_HP).round() as u32;
            if credits > 0 {
                earnings.push(Earning {
                    tank_id: owner,
                    amount: credits,
                    reason: EarningReason::Damage,
                });
            }
        }

        if hit.killed {
            log::info!(
                "Tank {} destroyed by tank {} ({})",
                tank.id,
                owner,
                impact.weapon_type.key()
            );
            destroyed.push(TankDestroyed {
                tank_id: tank.id,
                killer_tank_id: owner,
                weapon_type: impact.weapon_type,
                destruction_category: impact.destruction_category,
                position: tank.position,
            });
            if tank.id != owner {
                earnings.push(Earning {
                    tank_id: owner,
                    amount: KILL_REWARD,
                    reason: EarningReason::Kill,
                });
            }
        }
        hits.push(hit);
    }

    DamageOutcome {
        impact: impact.clone(),
        hits,
        destroyed,
        earnings,
    }
}
