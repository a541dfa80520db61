//! Deterministic simulation module
//!
//! All ballistics and combat logic lives here. This module must be pure and
//! deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by tank slice order)
//! - No rendering, audio or platform dependencies

pub mod ai;
pub mod collision;
pub mod combat;
pub mod physics;
pub mod projectile;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod weapons;
pub mod wind;

pub use ai::{AiShot, AimSolution, apply_difficulty_variance, plan_shot, select_target, simulate_landing, solve};
pub use collision::{CollisionResult, check_collision, first_tank_hit, is_out_of_bounds, tank_hit};
pub use combat::{
    DamageOutcome, Earning, EarningReason, HitKind, TankDestroyed, TankHit, apply_damage, resolve_impact,
};
pub use physics::{Kinematics, LaunchConfig, kinematics_at, position_at, velocity_at};
pub use projectile::{
    FlightContext, FlightEvent, FlightPhase, ImpactEvent, ImpactKind, ProjectileState, StepResult, Submunition,
    spawn_submunitions,
};
pub use state::{ArmorType, GameEvent, RngState, TankState};
pub use terrain::TerrainData;
pub use tick::{ActiveShot, Battlefield, ShotSummary, fire, resolve_shot, tick};
pub use weapons::{DestructionCategory, WeaponConfig, WeaponType};
pub use wind::{WindModel, generate_initial_wind, generate_next_wind};
