//! Shot driver
//!
//! Steps one shot at a time with a caller-supplied `dt`: projectiles fly,
//! due submunitions go off, and every detonation resolves damage, carves its
//! crater and settles the tanks. Turn order belongs to the caller.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat::{Earning, TankDestroyed, resolve_impact};
use super::projectile::{
    FlightContext, FlightEvent, ImpactEvent, ImpactKind, ProjectileState, SUBMUNITION_MAX_DELAY,
    Submunition, spawn_submunitions,
};
use super::state::{ArmorType, GameEvent, RngState, TankState};
use super::terrain::TerrainData;
use super::weapons::WeaponType;
use super::wind::WindModel;
use crate::consts::*;
use crate::settings::Settings;
use crate::{EngineError, Result};

/// Everything a shot can change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battlefield {
    pub terrain: TerrainData,
    pub tanks: Vec<TankState>,
    /// Wind for the current turn
    pub wind: i32,
    pub wind_model: WindModel,
    /// Simulation clock (seconds)
    pub time: f64,
    pub rng_state: RngState,
}

impl Battlefield {
    /// Battlefield over existing terrain and tanks. The first RNG stream
    /// rolls the opening wind.
    pub fn new(terrain: TerrainData, tanks: Vec<TankState>, wind_model: WindModel, seed: u64) -> Self {
        Self::from_parts(terrain, tanks, wind_model, RngState::new(seed))
    }

    fn from_parts(
        terrain: TerrainData,
        tanks: Vec<TankState>,
        wind_model: WindModel,
        mut rng_state: RngState,
    ) -> Self {
        let wind = wind_model.initial(&mut rng_state.next_rng());
        Self {
            terrain,
            tanks,
            wind,
            wind_model,
            time: 0.0,
            rng_state,
        }
    }

    /// Generate terrain and spread `tank_count` unarmored tanks evenly across
    /// it, each on a flattened pad
    pub fn generate(settings: &Settings, seed: u64, tank_count: usize) -> Result<Self> {
        let mut rng_state = RngState::new(seed);
        let mut terrain = TerrainData::generate(&mut rng_state.next_rng(), &settings.terrain)?;

        let spacing = terrain.width as f64 / (tank_count as f64 + 1.0);
        let tanks = (0..tank_count)
            .map(|i| {
                let x = (spacing * (i as f64 + 1.0)).round();
                terrain.flatten(x, TANK_WIDTH);
                TankState::new(i as u32 + 1, x, &terrain, ArmorType::None)
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Generated {}px battlefield with {} tanks (seed {})",
            terrain.width,
            tanks.len(),
            seed
        );
        Ok(Self::from_parts(
            terrain,
            tanks,
            WindModel::new(settings.wind_enabled),
            rng_state,
        ))
    }

    pub fn tank(&self, id: u32) -> Option<&TankState> {
        self.tanks.iter().find(|t| t.id == id)
    }

    pub fn tank_mut(&mut self, id: u32) -> Option<&mut TankState> {
        self.tanks.iter_mut().find(|t| t.id == id)
    }

    pub fn living_tanks(&self) -> impl Iterator<Item = &TankState> {
        self.tanks.iter().filter(|t| t.is_alive())
    }

    /// At most one tank left standing
    pub fn is_decided(&self) -> bool {
        self.living_tanks().count() <= 1
    }

    /// Advance the wind to the next turn
    pub fn roll_wind(&mut self) -> i32 {
        let mut rng = self.rng_state.next_rng();
        self.wind = self.wind_model.next(self.wind, &mut rng);
        log::debug!("Wind now {}", self.wind);
        self.wind
    }
}

/// One shot in progress
#[derive(Debug, Clone)]
pub struct ActiveShot {
    pub shooter_id: u32,
    pub weapon: WeaponType,
    pub projectiles: Vec<ProjectileState>,
    pub submunitions: Vec<Submunition>,
    rng: Pcg32,
}

impl ActiveShot {
    /// No projectile in flight and no submunition pending
    pub fn is_complete(&self) -> bool {
        self.projectiles.iter().all(|p| !p.is_active) && self.submunitions.iter().all(|s| s.detonated)
    }
}

/// Launch `weapon` from a tank's current aim
pub fn fire(field: &mut Battlefield, tank_id: u32, weapon: WeaponType) -> Result<(ActiveShot, GameEvent)> {
    let tank = field.tank(tank_id).ok_or(EngineError::TankNotFound(tank_id))?;
    if !tank.is_alive() {
        return Err(EngineError::TankInactive(tank_id));
    }
    let launch = tank.launch_config();
    let projectile = ProjectileState::launch(tank_id, weapon, launch, field.time);

    log::info!(
        "Tank {} fires {} at {:.1}° power {:.1} (wind {})",
        tank_id,
        weapon.key(),
        launch.angle_deg,
        launch.power,
        field.wind
    );

    let shot = ActiveShot {
        shooter_id: tank_id,
        weapon,
        projectiles: vec![projectile],
        submunitions: Vec::new(),
        rng: field.rng_state.next_rng(),
    };
    let event = GameEvent::WeaponFired {
        tank_id,
        weapon_type: weapon,
        category: weapon.destruction_category(),
        launch,
    };
    Ok((shot, event))
}

/// Advance the shot by `dt` seconds
pub fn tick(field: &mut Battlefield, shot: &mut ActiveShot, dt: f64) -> Vec<GameEvent> {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    field.time += dt;
    let now = field.time;

    let mut events = Vec::new();
    let mut impacts = Vec::new();

    for (index, projectile) in shot.projectiles.iter_mut().enumerate() {
        if !projectile.is_active {
            continue;
        }
        let ctx = FlightContext {
            terrain: &field.terrain,
            tanks: &field.tanks,
            wind: field.wind,
        };
        let result = projectile.step(&ctx, now);
        *projectile = result.state;

        for event in result.events {
            match event {
                FlightEvent::Moved { position } => events.push(GameEvent::ProjectileMoved {
                    projectile: index,
                    position,
                }),
                FlightEvent::Bounced {
                    position,
                    bounce_count,
                    power,
                } => events.push(GameEvent::Bounced {
                    projectile: index,
                    position,
                    bounce_count,
                    power,
                }),
                FlightEvent::Retargeted { target } => events.push(GameEvent::Retargeted {
                    projectile: index,
                    target,
                }),
                FlightEvent::OutOfBounds { position, forced } => {
                    log::info!("Projectile {} left the battlefield", index);
                    events.push(GameEvent::OutOfBounds {
                        projectile: index,
                        position,
                        forced,
                    })
                }
                FlightEvent::Impact(impact) => impacts.push(impact),
            }
        }
    }

    for sub in shot
        .submunitions
        .iter_mut()
        .filter(|s| !s.detonated && s.start_time <= now)
    {
        sub.detonated = true;
        impacts.push(sub.impact());
    }

    for impact in impacts {
        detonate(field, shot, impact, &mut events);
    }
    events
}

/// Damage, crater, settle, then cluster spawn
fn detonate(field: &mut Battlefield, shot: &mut ActiveShot, impact: ImpactEvent, events: &mut Vec<GameEvent>) {
    log::info!(
        "{} impact ({:?}) at ({:.1}, {:.1})",
        impact.weapon_type.key(),
        impact.kind,
        impact.position.x,
        impact.position.y
    );
    events.push(GameEvent::Impact(impact.clone()));

    let outcome = resolve_impact(&impact, &mut field.tanks);
    events.push(GameEvent::Damage(outcome));

    let config = impact.weapon_type.config();
    let crater = impact.radius * config.crater_scale;
    if crater > 0.0 {
        let columns = field.terrain.carve_crater(impact.position, crater);
        if columns > 0 {
            events.push(GameEvent::TerrainDeformed {
                center: impact.position,
                radius: crater,
                columns,
            });
            for tank in field.tanks.iter_mut() {
                *tank = tank.settled(&field.terrain);
            }
        }
    }

    if impact.kind != ImpactKind::Submunition && config.submunition_count > 0 {
        let subs = spawn_submunitions(&impact, &field.terrain, &mut shot.rng);
        events.push(GameEvent::SubmunitionsSpawned {
            count: subs.len(),
            position: impact.position,
        });
        shot.submunitions.extend(subs);
    }
}

/// What a completed shot did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShotSummary {
    pub events: Vec<GameEvent>,
    pub impacts: Vec<ImpactEvent>,
    pub destroyed: Vec<TankDestroyed>,
    pub earnings: Vec<Earning>,
    /// Simulated seconds from launch to the last detonation
    pub duration: f64,
}

/// Run a shot to completion. The loop is bounded by the projectile flight
/// ceiling; a shot still live past it is dropped with a warning.
pub fn resolve_shot(field: &mut Battlefield, mut shot: ActiveShot, dt: f64) -> ShotSummary {
    let dt = if dt.is_finite() && dt > 0.0 { dt } else { SIM_DT };
    let max_ticks = ((MAX_FLIGHT_TIME + SUBMUNITION_MAX_DELAY) / dt).ceil() as usize + 2;
    let started = field.time;
    let mut summary = ShotSummary::default();

    for _ in 0..max_ticks {
        if shot.is_complete() {
            break;
        }
        for event in tick(field, &mut shot, dt) {
            match &event {
                GameEvent::Impact(impact) => summary.impacts.push(impact.clone()),
                GameEvent::Damage(outcome) => {
                    summary.destroyed.extend(outcome.destroyed.iter().cloned());
                    summary.earnings.extend(outcome.earnings.iter().cloned());
                }
                _ => {}
            }
            summary.events.push(event);
        }
    }
    if !shot.is_complete() {
        log::warn!(
            "Shot from tank {} still live after {} ticks, dropping it",
            shot.shooter_id,
            max_ticks
        );
    }

    summary.duration = field.time - started;
    summary
}
