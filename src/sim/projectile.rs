//! Projectile flight state machine
//!
//! A projectile flies along the closed-form trajectory of its current
//! `LaunchConfig`. Bounces and homing corrections replace the launch config
//! with a fresh one starting at the current point, so position stays
//! continuous while the curve changes.
//!
//! ```text
//! Flying ──tank──────────────▶ Detonated
//!   │ ───terrain (no bounces)─▶ Detonated
//!   │ ───terrain (bounces)────▶ Flying (relaunched)
//!   │ ───homing retarget──────▶ Flying (relaunched)
//!   │ ───proximity fuse───────▶ Detonated
//!   └────bounds / time limit──▶ OutOfBounds
//! ```

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{check_collision, first_tank_hit, is_out_of_bounds};
use super::physics::{LaunchConfig, heading_deg, position_at, velocity_at};
use super::state::TankState;
use super::terrain::TerrainData;
use super::weapons::{DestructionCategory, WeaponConfig, WeaponType};
use crate::Position;
use crate::consts::MAX_FLIGHT_TIME;

/// Seconds after firing before the firer's own hull can be hit
pub const OWNER_GRACE_TIME: f64 = 0.25;
/// Seconds after firing before homing guidance engages
pub const HOMING_ARM_TIME: f64 = 0.4;
/// Proximity fuse arms once the target is this close
pub const HOMING_PROXIMITY_RADIUS: f64 = 30.0;
/// Target moves smaller than this are not reported as a retarget
const RETARGET_EPSILON: f64 = 0.5;

/// Power kept on each bounce
pub const BOUNCE_POWER_RETENTION: f64 = 0.7;
/// Bounces never drop power below this (unless it already was)
pub const MIN_BOUNCE_POWER: f64 = 15.0;
/// Bounced shells leave the ground at least this steeply (degrees)
pub const MIN_BOUNCE_ANGLE: f64 = 15.0;
/// Relaunch offset along the surface normal
const BOUNCE_LIFT: f64 = 0.5;

/// Max path length between collision samples
pub const SUBSTEP_LENGTH: f64 = 2.0;
pub const MAX_SUBSTEPS: usize = 64;

/// Submunition scatter, as a multiple of the main splash radius
pub const SUBMUNITION_SPREAD: f64 = 3.0;
/// Submunition radius and damage relative to the main blast
pub const SUBMUNITION_RADIUS_SCALE: f64 = 0.6;
pub const SUBMUNITION_MIN_DELAY: f64 = 0.02;
pub const SUBMUNITION_MAX_DELAY: f64 = 0.2;

/// What a detonation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactKind {
    Terrain,
    /// Direct hit on a tank body
    Tank { tank_id: u32 },
    /// Homing proximity fuse
    Proximity,
    /// Cluster secondary
    Submunition,
}

/// Terminal detonation handed to the combat resolver and the animators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    pub position: Position,
    pub weapon_type: WeaponType,
    pub destruction_category: DestructionCategory,
    pub owner_tank_id: u32,
    pub kind: ImpactKind,
    pub radius: f64,
    pub damage: f64,
    /// Simulation time of the detonation
    pub time: f64,
}

impl ImpactEvent {
    /// Tank taking a direct hit, if any
    pub fn direct_hit_tank(&self) -> Option<u32> {
        match self.kind {
            ImpactKind::Tank { tank_id } => Some(tank_id),
            _ => None,
        }
    }
}

/// Machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightPhase {
    Flying,
    Detonated,
    OutOfBounds,
}

/// One projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileState {
    pub owner_tank_id: u32,
    pub weapon_type: WeaponType,
    /// Current trajectory (replaced on bounce/retarget)
    pub launch_config: LaunchConfig,
    /// When the current trajectory began
    pub start_time: f64,
    /// When the shot left the barrel
    pub fired_at: f64,
    /// Time of the last step
    pub last_update: f64,
    pub position: Position,
    /// Every sampled position, oldest first
    pub trace_points: Vec<Position>,
    pub bounce_count: u32,
    pub max_bounces: u32,
    pub target_position: Option<Position>,
    pub tracking_strength: f64,
    pub previous_distance_to_target: Option<f64>,
    pub is_active: bool,
    pub phase: FlightPhase,
}

/// World the projectile flies through (read-only)
#[derive(Debug, Clone, Copy)]
pub struct FlightContext<'a> {
    pub terrain: &'a TerrainData,
    pub tanks: &'a [TankState],
    pub wind: i32,
}

/// Transitions reported by a step
#[derive(Debug, Clone, PartialEq)]
pub enum FlightEvent {
    Moved { position: Position },
    Bounced { position: Position, bounce_count: u32, power: f64 },
    Retargeted { target: Position },
    Impact(ImpactEvent),
    OutOfBounds { position: Position, forced: bool },
}

/// Output of [`ProjectileState::step`]
#[derive(Debug, Clone)]
pub struct StepResult {
    pub state: ProjectileState,
    pub events: Vec<FlightEvent>,
}

impl ProjectileState {
    /// Projectile leaving the barrel at `now`
    pub fn launch(owner_tank_id: u32, weapon_type: WeaponType, launch: LaunchConfig, now: f64) -> Self {
        let launch = launch.sanitized();
        let config = weapon_type.config();
        Self {
            owner_tank_id,
            weapon_type,
            launch_config: launch,
            start_time: now,
            fired_at: now,
            last_update: now,
            position: launch.position,
            trace_points: vec![launch.position],
            bounce_count: 0,
            max_bounces: config.max_bounces,
            target_position: None,
            tracking_strength: config.tracking_strength,
            previous_distance_to_target: None,
            is_active: true,
            phase: FlightPhase::Flying,
        }
    }

    #[inline]
    pub fn config(&self) -> &'static WeaponConfig {
        self.weapon_type.config()
    }

    /// Trajectory time at `now` (scaled by the weapon's pacing)
    #[inline]
    fn flight_time(&self, now: f64) -> f64 {
        (now - self.start_time).max(0.0) * self.config().speed_multiplier
    }

    /// Advance to `now`. The receiver is untouched; the next state is returned.
    pub fn step(&self, ctx: &FlightContext<'_>, now: f64) -> StepResult {
        let mut next = self.clone();
        let mut events = Vec::new();
        if !self.is_active {
            return StepResult { state: next, events };
        }
        let now = now.max(self.last_update);

        // Motion stops at the ceiling; a long step still simulates up to it
        let ceiling = self.fired_at + MAX_FLIGHT_TIME;
        if self.last_update >= ceiling {
            events.push(next.expire());
            return StepResult { state: next, events };
        }
        let requested = now;
        let now = now.min(ceiling);

        let config = self.config();
        if config.is_homing && now - self.fired_at >= HOMING_ARM_TIME {
            if let Some(event) = next.retarget(ctx) {
                events.push(event);
            }
        }

        let t0 = next.last_update;
        let end = position_at(&next.launch_config, ctx.wind, next.flight_time(now));
        let substeps = ((end - next.position).length() / SUBSTEP_LENGTH)
            .ceil()
            .clamp(1.0, MAX_SUBSTEPS as f64) as usize;
        let ignore = (now - self.fired_at < OWNER_GRACE_TIME).then_some(self.owner_tank_id);

        for i in 1..=substeps {
            let t = t0 + (now - t0) * i as f64 / substeps as f64;
            let point = position_at(&next.launch_config, ctx.wind, next.flight_time(t));

            // Tanks first: a shell touching hull and ground together is a direct hit
            if let Some(tank) = first_tank_hit(point, ctx.tanks, ignore) {
                next.advance_to(point, t);
                let impact = next.detonate(ImpactKind::Tank { tank_id: tank.id }, point, t);
                events.push(FlightEvent::Impact(impact));
                return StepResult { state: next, events };
            }

            let terrain_hit = check_collision(point, ctx.terrain);
            if terrain_hit.hit {
                if next.bounce_count < next.max_bounces {
                    events.push(next.bounce(terrain_hit.surface_point, ctx, t));
                    return StepResult { state: next, events };
                }
                next.advance_to(terrain_hit.surface_point, t);
                let impact = next.detonate(ImpactKind::Terrain, terrain_hit.surface_point, t);
                events.push(FlightEvent::Impact(impact));
                return StepResult { state: next, events };
            }

            if is_out_of_bounds(point, ctx.terrain) {
                next.advance_to(point, t);
                next.finish(FlightPhase::OutOfBounds);
                events.push(FlightEvent::OutOfBounds {
                    position: point,
                    forced: false,
                });
                return StepResult { state: next, events };
            }
        }

        next.advance_to(end, now);
        events.push(FlightEvent::Moved { position: end });

        if config.is_homing {
            if let Some(impact) = next.check_proximity_fuse(now) {
                events.push(FlightEvent::Impact(impact));
            }
        }

        if next.is_active && requested > ceiling {
            events.push(next.expire());
        }

        StepResult { state: next, events }
    }

    /// Force-terminate after `MAX_FLIGHT_TIME` of flight
    fn expire(&mut self) -> FlightEvent {
        log::warn!(
            "{} from tank {} exceeded {}s of flight, terminating",
            self.weapon_type.key(),
            self.owner_tank_id,
            MAX_FLIGHT_TIME
        );
        self.finish(FlightPhase::OutOfBounds);
        FlightEvent::OutOfBounds {
            position: self.position,
            forced: true,
        }
    }

    fn advance_to(&mut self, point: Position, t: f64) {
        self.position = point;
        self.last_update = t;
        self.trace_points.push(point);
    }

    fn finish(&mut self, phase: FlightPhase) {
        self.is_active = false;
        self.phase = phase;
    }

    fn detonate(&mut self, kind: ImpactKind, point: Position, t: f64) -> ImpactEvent {
        self.finish(FlightPhase::Detonated);
        let config = self.config();
        ImpactEvent {
            position: point,
            weapon_type: self.weapon_type,
            destruction_category: config.destruction_category,
            owner_tank_id: self.owner_tank_id,
            kind,
            radius: config.splash_radius,
            damage: config.damage,
            time: t,
        }
    }

    /// Relaunch off the terrain at `surface`
    fn bounce(&mut self, surface: Position, ctx: &FlightContext<'_>, t: f64) -> FlightEvent {
        let normal = ctx.terrain.surface_normal(surface.x);
        let incoming = velocity_at(&self.launch_config, ctx.wind, self.flight_time(t));
        let reflected = incoming - 2.0 * incoming.dot(normal) * normal;

        let mut angle = heading_deg(reflected);
        if angle > 180.0 {
            angle = 360.0 - angle;
        }
        let angle = angle.clamp(MIN_BOUNCE_ANGLE, 180.0 - MIN_BOUNCE_ANGLE);

        let old_power = self.launch_config.power;
        let power = (old_power * BOUNCE_POWER_RETENTION).max(MIN_BOUNCE_POWER.min(old_power));
        let origin = surface + normal * BOUNCE_LIFT;

        self.launch_config = LaunchConfig::new(origin, angle, power);
        self.start_time = t;
        self.bounce_count += 1;
        self.advance_to(origin, t);

        log::debug!(
            "{} bounce {}/{} at ({:.1}, {:.1}), power {:.1}",
            self.weapon_type.key(),
            self.bounce_count,
            self.max_bounces,
            origin.x,
            origin.y,
            power
        );
        FlightEvent::Bounced {
            position: origin,
            bounce_count: self.bounce_count,
            power,
        }
    }

    /// Steer toward the nearest living enemy. With no enemy the heading is
    /// kept as-is.
    fn retarget(&mut self, ctx: &FlightContext<'_>) -> Option<FlightEvent> {
        let Some(target) = nearest_enemy(self.position, self.owner_tank_id, ctx.tanks) else {
            self.target_position = None;
            self.previous_distance_to_target = None;
            return None;
        };

        let changed = self
            .target_position
            .is_none_or(|prev| prev.distance(target) > RETARGET_EPSILON);
        if changed {
            self.previous_distance_to_target = None;
        }
        self.target_position = Some(target);

        let velocity = velocity_at(
            &self.launch_config,
            ctx.wind,
            self.flight_time(self.last_update),
        );
        let current = heading_deg(velocity);
        let desired = heading_deg(target - self.position);
        let error = (desired - current + 540.0).rem_euclid(360.0) - 180.0;
        let heading = current + error * self.tracking_strength;

        self.launch_config = LaunchConfig::with_speed(self.position, heading, velocity.length());
        self.start_time = self.last_update;

        if changed {
            log::debug!(
                "Homing missile from tank {} locked on ({:.1}, {:.1})",
                self.owner_tank_id,
                target.x,
                target.y
            );
            Some(FlightEvent::Retargeted { target })
        } else {
            None
        }
    }

    /// Detonate once the target distance starts growing after having been
    /// inside the fuse radius. Sampled once per tick, so a coarse tick can
    /// fire slightly past the true closest approach.
    fn check_proximity_fuse(&mut self, now: f64) -> Option<ImpactEvent> {
        let target = self.target_position?;
        let distance = self.position.distance(target);
        let crossed = self
            .previous_distance_to_target
            .is_some_and(|prev| prev <= HOMING_PROXIMITY_RADIUS && distance > prev);
        self.previous_distance_to_target = Some(distance);

        crossed.then(|| self.detonate(ImpactKind::Proximity, self.position, now))
    }
}

/// Centre of the nearest living tank other than `owner`
pub fn nearest_enemy(from: Position, owner: u32, tanks: &[TankState]) -> Option<Position> {
    tanks
        .iter()
        .filter(|t| t.is_alive() && t.id != owner)
        .map(|t| t.center())
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

/// A delayed secondary explosion from a cluster bomb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submunition {
    pub owner_tank_id: u32,
    pub weapon_type: WeaponType,
    pub position: Position,
    pub start_time: f64,
    pub radius: f64,
    pub damage: f64,
    pub detonated: bool,
}

impl Submunition {
    /// Detonation event for this submunition
    pub fn impact(&self) -> ImpactEvent {
        ImpactEvent {
            position: self.position,
            weapon_type: self.weapon_type,
            destruction_category: self.weapon_type.destruction_category(),
            owner_tank_id: self.owner_tank_id,
            kind: ImpactKind::Submunition,
            radius: self.radius,
            damage: self.damage,
            time: self.start_time,
        }
    }
}

/// Scatter the weapon's submunitions around a main impact. Each lands on the
/// surface within `SUBMUNITION_SPREAD` radii horizontally and goes off up to
/// `SUBMUNITION_MAX_DELAY` seconds later.
pub fn spawn_submunitions<R: Rng + ?Sized>(
    impact: &ImpactEvent,
    terrain: &TerrainData,
    rng: &mut R,
) -> Vec<Submunition> {
    let count = impact.weapon_type.config().submunition_count;
    let spread = impact.radius * SUBMUNITION_SPREAD;
    let max_x = (terrain.width - 1) as f64;

    (0..count)
        .map(|_| {
            let offset = if spread > 0.0 {
                rng.random_range(-spread..=spread)
            } else {
                0.0
            };
            let x = (impact.position.x + offset).clamp(0.0, max_x);
            let y = terrain
                .interpolated_height_at(x)
                .unwrap_or(impact.position.y);
            let delay = rng.random_range(SUBMUNITION_MIN_DELAY..=SUBMUNITION_MAX_DELAY);
            Submunition {
                owner_tank_id: impact.owner_tank_id,
                weapon_type: impact.weapon_type,
                position: DVec2::new(x, y),
                start_time: impact.time + delay,
                radius: impact.radius * SUBMUNITION_RADIUS_SCALE,
                damage: impact.damage * SUBMUNITION_RADIUS_SCALE,
                detonated: false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GRAVITY, PROJECTILE_RADIUS, SIM_DT, TANK_HEIGHT};
    use crate::sim::collision::tank_hit;
    use crate::sim::physics::power_to_velocity;
    use crate::sim::state::ArmorType;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn flat() -> TerrainData {
        TerrainData::flat(1000, 600.0, 100.0).unwrap()
    }

    /// Step until terminal, returning the final state and every event
    fn fly(
        mut state: ProjectileState,
        terrain: &TerrainData,
        tanks: &[TankState],
        wind: i32,
    ) -> (ProjectileState, Vec<FlightEvent>) {
        let ctx = FlightContext { terrain, tanks, wind };
        let mut now = state.last_update;
        let mut all = Vec::new();
        for _ in 0..10_000 {
            if !state.is_active {
                break;
            }
            now += SIM_DT;
            let result = state.step(&ctx, now);
            all.extend(result.events);
            state = result.state;
        }
        (state, all)
    }

    fn impacts(events: &[FlightEvent]) -> Vec<&ImpactEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                FlightEvent::Impact(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_standard_shot_hits_terrain() {
        let terrain = flat();
        let launch = LaunchConfig::new(DVec2::new(100.0, 130.0), 45.0, 60.0);
        let (state, events) = fly(
            ProjectileState::launch(1, WeaponType::Standard, launch, 0.0),
            &terrain,
            &[],
            0,
        );
        assert!(!state.is_active);
        assert_eq!(state.phase, FlightPhase::Detonated);
        let hits = impacts(&events);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, ImpactKind::Terrain);
        assert!((hits[0].position.y - 100.0).abs() < 1e-9);
        assert!(hits[0].position.x > 100.0);
    }

    #[test]
    fn test_step_does_not_mutate_input() {
        let terrain = flat();
        let state = ProjectileState::launch(
            1,
            WeaponType::Standard,
            LaunchConfig::new(DVec2::new(100.0, 130.0), 45.0, 60.0),
            0.0,
        );
        let ctx = FlightContext {
            terrain: &terrain,
            tanks: &[],
            wind: 0,
        };
        let result = state.step(&ctx, SIM_DT);
        assert_eq!(state.trace_points.len(), 1);
        assert_eq!(result.state.trace_points.len(), 2);
        assert_ne!(result.state.position, state.position);
    }

    #[test]
    fn test_inactive_step_is_noop() {
        let terrain = flat();
        let mut state = ProjectileState::launch(
            1,
            WeaponType::Standard,
            LaunchConfig::new(DVec2::new(100.0, 130.0), 45.0, 60.0),
            0.0,
        );
        state.is_active = false;
        let ctx = FlightContext {
            terrain: &terrain,
            tanks: &[],
            wind: 0,
        };
        let result = state.step(&ctx, 1.0);
        assert!(result.events.is_empty());
        assert_eq!(result.state.position, state.position);
    }

    #[test]
    fn test_speed_multiplier_keeps_path() {
        let terrain = flat();
        let launch = LaunchConfig::new(DVec2::new(100.0, 130.0), 50.0, 70.0);
        let (slow, _) = fly(
            ProjectileState::launch(1, WeaponType::HeavyArtillery, launch, 0.0),
            &terrain,
            &[],
            5,
        );
        let (fast, _) = fly(
            ProjectileState::launch(1, WeaponType::Precision, launch, 0.0),
            &terrain,
            &[],
            5,
        );
        // Same landing point (up to sampling), different flight duration
        assert!((slow.position.x - fast.position.x).abs() < SUBSTEP_LENGTH + 0.5);
        assert!(slow.last_update > fast.last_update);
    }

    #[test]
    fn test_tank_hit_takes_priority() {
        let terrain = flat();
        let target = TankState::new(2, 300.0, &terrain, ArmorType::None).unwrap();
        // Dropped straight onto the tank: hull and ground are both under it
        let launch = LaunchConfig::new(DVec2::new(300.0, 160.0), 270.0, 10.0);
        let (_, events) = fly(
            ProjectileState::launch(1, WeaponType::Standard, launch, 0.0),
            &terrain,
            &[target],
            0,
        );
        let hits = impacts(&events);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, ImpactKind::Tank { tank_id: 2 });
        assert_eq!(hits[0].direct_hit_tank(), Some(2));
    }

    #[test]
    fn test_tank_wins_same_substep_terrain_tie() {
        // Ground raised flush with the top of the tank's hit box, so the first
        // sample inside the box is also inside the terrain
        let box_top = 100.0 + TANK_HEIGHT + PROJECTILE_RADIUS;
        let mut points = vec![100.0; 1000];
        points[280..=320].iter_mut().for_each(|h| *h = box_top);
        let terrain = TerrainData::new(1000, 600.0, points).unwrap();
        let target = TankState::with_armor(2, DVec2::new(300.0, 100.0), ArmorType::None);

        let launch = LaunchConfig::new(DVec2::new(300.0, 160.0), 270.0, 10.0);
        let (_, events) = fly(
            ProjectileState::launch(1, WeaponType::Standard, launch, 0.0),
            &terrain,
            std::slice::from_ref(&target),
            0,
        );
        let hits = impacts(&events);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, ImpactKind::Tank { tank_id: 2 });
        assert!(check_collision(hits[0].position, &terrain).hit);
        assert!(tank_hit(hits[0].position, &target));
    }

    #[test]
    fn test_owner_grace_period() {
        let terrain = flat();
        let owner = TankState::new(1, 300.0, &terrain, ArmorType::None).unwrap();
        // Fired straight up: the shell falls back onto its own tank
        let launch = owner.aimed(90.0, 40.0).launch_config();
        let (_, events) = fly(
            ProjectileState::launch(1, WeaponType::Standard, launch, 0.0),
            &terrain,
            std::slice::from_ref(&owner),
            0,
        );
        let hits = impacts(&events);
        assert_eq!(hits[0].kind, ImpactKind::Tank { tank_id: 1 });
    }

    #[test]
    fn test_out_of_bounds_sideways() {
        let terrain = flat();
        let launch = LaunchConfig::new(DVec2::new(900.0, 130.0), 30.0, 100.0);
        let (state, events) = fly(
            ProjectileState::launch(1, WeaponType::Standard, launch, 0.0),
            &terrain,
            &[],
            0,
        );
        assert_eq!(state.phase, FlightPhase::OutOfBounds);
        assert!(impacts(&events).is_empty());
        assert!(matches!(
            events.last(),
            Some(FlightEvent::OutOfBounds { forced: false, .. })
        ));
    }

    #[test]
    fn test_flight_ceiling_forces_termination() {
        // Floor far below the launch point and no time to reach it
        let terrain = TerrainData::flat(1000, 600.0, 0.0).unwrap();
        let launch = LaunchConfig::new(DVec2::new(500.0, 10.0), 90.0, 100.0);
        let mut state = ProjectileState::launch(1, WeaponType::Standard, launch, 0.0);
        state.fired_at = -MAX_FLIGHT_TIME;
        let ctx = FlightContext {
            terrain: &terrain,
            tanks: &[],
            wind: 0,
        };
        let result = state.step(&ctx, SIM_DT);
        assert_eq!(result.state.phase, FlightPhase::OutOfBounds);
        assert_eq!(
            result.events,
            vec![FlightEvent::OutOfBounds {
                position: state.position,
                forced: true
            }]
        );
    }

    #[test]
    fn test_long_step_simulates_up_to_ceiling() {
        // One step spanning the whole ceiling still lands the shell
        let terrain = flat();
        let launch = LaunchConfig::new(DVec2::new(100.0, 130.0), 45.0, 60.0);
        let state = ProjectileState::launch(1, WeaponType::Standard, launch, 0.0);
        let ctx = FlightContext {
            terrain: &terrain,
            tanks: &[],
            wind: 0,
        };
        let result = state.step(&ctx, MAX_FLIGHT_TIME + 1.0);
        let hits = impacts(&result.events);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, ImpactKind::Terrain);
        assert!(hits[0].time < 2.5);
        assert_eq!(result.state.phase, FlightPhase::Detonated);
    }

    #[test]
    fn test_ceiling_reached_mid_step() {
        let terrain = TerrainData::flat(1000, 600.0, 0.0).unwrap();
        let launch = LaunchConfig::new(DVec2::new(500.0, 10.0), 90.0, 100.0);
        let mut state = ProjectileState::launch(1, WeaponType::Standard, launch, 0.0);
        state.fired_at = 0.1 - MAX_FLIGHT_TIME;
        let ctx = FlightContext {
            terrain: &terrain,
            tanks: &[],
            wind: 0,
        };
        let result = state.step(&ctx, 1.0);
        let end = result.state.position;
        assert!(end.distance(position_at(&launch, 0, 0.1)) < 1e-6);
        assert!((result.state.last_update - 0.1).abs() < 1e-9);
        assert_eq!(result.state.phase, FlightPhase::OutOfBounds);
        assert_eq!(
            result.events,
            vec![
                FlightEvent::Moved { position: end },
                FlightEvent::OutOfBounds {
                    position: end,
                    forced: true
                }
            ]
        );
    }

    #[test]
    fn test_bouncing_betty_on_flat_ground() {
        let terrain = flat();
        let launch = LaunchConfig::new(DVec2::new(100.0, 130.0), 45.0, 60.0);
        let (state, events) = fly(
            ProjectileState::launch(1, WeaponType::BouncingBetty, launch, 0.0),
            &terrain,
            &[],
            0,
        );

        let bounces: Vec<(u32, f64)> = events
            .iter()
            .filter_map(|e| match e {
                FlightEvent::Bounced {
                    bounce_count, power, ..
                } => Some((*bounce_count, *power)),
                _ => None,
            })
            .collect();
        let max = WeaponType::BouncingBetty.config().max_bounces;
        assert_eq!(bounces.len(), max as usize);
        assert_eq!(state.bounce_count, max);

        let mut last_power = 60.0;
        for (i, &(count, power)) in bounces.iter().enumerate() {
            assert_eq!(count, i as u32 + 1);
            assert!(power <= last_power);
            assert!(power >= MIN_BOUNCE_POWER);
            last_power = power;
        }

        assert!(!state.is_active);
        assert_eq!(impacts(&events).len(), 1);
        assert!(matches!(events.last(), Some(FlightEvent::Impact(_))));
    }

    #[test]
    fn test_bounce_power_floor() {
        let terrain = flat();
        let launch = LaunchConfig::new(DVec2::new(100.0, 130.0), 60.0, 18.0);
        let (_, events) = fly(
            ProjectileState::launch(1, WeaponType::BouncingBetty, launch, 0.0),
            &terrain,
            &[],
            0,
        );
        let powers: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                FlightEvent::Bounced { power, .. } => Some(*power),
                _ => None,
            })
            .collect();
        assert!(!powers.is_empty());
        assert!(powers.iter().all(|&p| (p - MIN_BOUNCE_POWER).abs() < 1e-9));
    }

    #[test]
    fn test_homing_without_enemy_keeps_heading() {
        let terrain = flat();
        let owner = TankState::new(1, 100.0, &terrain, ArmorType::None).unwrap();
        let launch = owner.aimed(50.0, 60.0).launch_config();
        let tanks = [owner];
        let (homing, events) = fly(
            ProjectileState::launch(1, WeaponType::HomingMissile, launch, 0.0),
            &terrain,
            &tanks,
            0,
        );
        let (plain, _) = fly(
            ProjectileState::launch(1, WeaponType::Standard, launch, 0.0),
            &terrain,
            &tanks,
            0,
        );
        assert!(!events.iter().any(|e| matches!(e, FlightEvent::Retargeted { .. })));
        assert!((homing.position - plain.position).length() < 1e-6);
    }

    #[test]
    fn test_homing_steers_onto_target() {
        let terrain = flat();
        let owner = TankState::new(1, 100.0, &terrain, ArmorType::None).unwrap();
        let enemy = TankState::new(2, 500.0, &terrain, ArmorType::None).unwrap();
        let launch = owner.aimed(45.0, 70.0).launch_config();
        let tanks = [owner, enemy.clone()];
        let (state, events) = fly(
            ProjectileState::launch(1, WeaponType::HomingMissile, launch, 0.0),
            &terrain,
            &tanks,
            0,
        );
        assert!(events.iter().any(|e| matches!(e, FlightEvent::Retargeted { .. })));
        assert_eq!(state.target_position, Some(enemy.center()));
        let hits = impacts(&events);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].position.distance(enemy.center()) < 40.0);
    }

    #[test]
    fn test_homing_keeps_speed_past_power_cap() {
        // Diving straight at a target far below: retargeting never turns the
        // missile, so its speed must follow free fall past the launch cap
        let terrain = TerrainData::flat(1000, 3000.0, 10.0).unwrap();
        let enemy = TankState::new(2, 500.0, &terrain, ArmorType::None).unwrap();
        let tanks = [enemy];
        let ctx = FlightContext {
            terrain: &terrain,
            tanks: &tanks,
            wind: 0,
        };
        let launch = LaunchConfig::new(DVec2::new(500.0, 2500.0), 270.0, 100.0);
        let mut missile = ProjectileState::launch(1, WeaponType::HomingMissile, launch, 0.0);
        for i in 1..=60 {
            missile = missile.step(&ctx, i as f64 * SIM_DT).state;
        }
        assert!(missile.is_active);
        assert!(missile.target_position.is_some());

        let speed = velocity_at(&missile.launch_config, 0, missile.flight_time(missile.last_update)).length();
        let trajectory_time = missile.last_update * missile.config().speed_multiplier;
        let free_fall = power_to_velocity(100.0) + GRAVITY * trajectory_time;
        assert!(speed > power_to_velocity(100.0) + 100.0);
        assert!((speed - free_fall).abs() < 1e-6, "{speed} vs {free_fall}");
    }

    #[test]
    fn test_proximity_fuse_on_near_miss() {
        let terrain = flat();
        let owner = TankState::new(1, 100.0, &terrain, ArmorType::None).unwrap();
        let enemy = TankState::new(2, 300.0, &terrain, ArmorType::None).unwrap();
        let launch = LaunchConfig::new(DVec2::new(100.0, 160.0), 0.0, 100.0);
        let mut missile = ProjectileState::launch(1, WeaponType::HomingMissile, launch, 0.0);
        // No steering: the missile sails just over the target
        missile.tracking_strength = 0.0;

        let (state, events) = fly(missile, &terrain, &[owner, enemy.clone()], 0);
        let hits = impacts(&events);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, ImpactKind::Proximity);
        assert!(hits[0].position.distance(enemy.center()) < 35.0);
        assert!(hits[0].position.x > enemy.center().x);
        assert_eq!(state.phase, FlightPhase::Detonated);
    }

    #[test]
    fn test_cluster_submunitions() {
        let terrain = flat();
        let launch = LaunchConfig::new(DVec2::new(100.0, 130.0), 45.0, 60.0);
        let (_, events) = fly(
            ProjectileState::launch(1, WeaponType::ClusterBomb, launch, 0.0),
            &terrain,
            &[],
            0,
        );
        let main = impacts(&events)[0].clone();
        let mut rng = Pcg32::seed_from_u64(8);
        let subs = spawn_submunitions(&main, &terrain, &mut rng);

        assert_eq!(
            subs.len(),
            WeaponType::ClusterBomb.config().submunition_count as usize
        );
        for sub in &subs {
            assert!(sub.start_time > main.time);
            assert!(sub.start_time <= main.time + SUBMUNITION_MAX_DELAY + 1e-12);
            assert!(sub.radius < main.radius);
            assert!((sub.position.x - main.position.x).abs() <= main.radius * SUBMUNITION_SPREAD);
            assert!((sub.position.y - 100.0).abs() < 1e-9);
            assert_eq!(sub.impact().kind, ImpactKind::Submunition);
        }
    }

    #[test]
    fn test_non_cluster_spawns_nothing() {
        let terrain = flat();
        let impact = ImpactEvent {
            position: DVec2::new(500.0, 100.0),
            weapon_type: WeaponType::Standard,
            destruction_category: DestructionCategory::Explosive,
            owner_tank_id: 1,
            kind: ImpactKind::Terrain,
            radius: 30.0,
            damage: 25.0,
            time: 1.0,
        };
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(spawn_submunitions(&impact, &terrain, &mut rng).is_empty());
    }

    #[test]
    fn test_nearest_enemy() {
        let terrain = flat();
        let a = TankState::new(1, 100.0, &terrain, ArmorType::None).unwrap();
        let b = TankState::new(2, 400.0, &terrain, ArmorType::None).unwrap();
        let mut c = TankState::new(3, 150.0, &terrain, ArmorType::None).unwrap();
        let tanks = vec![a.clone(), b.clone(), c.clone()];
        assert_eq!(nearest_enemy(a.center(), 1, &tanks), Some(c.center()));

        c.health = 0.0;
        c.is_active = false;
        let tanks = vec![a.clone(), b.clone(), c];
        assert_eq!(nearest_enemy(a.center(), 1, &tanks), Some(b.center()));
        assert_eq!(nearest_enemy(a.center(), 1, &[a]), None);
    }
}
