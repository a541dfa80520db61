//! AI aiming: coarse-to-fine grid search over (angle, power)
//!
//! Candidates are scored by simulating the shot to its landing point with a
//! lightweight fixed-step loop. Wind is fixed for the turn and terrain is
//! arbitrary, so no analytic inversion is attempted.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{check_collision, is_out_of_bounds};
use super::physics::{LaunchConfig, position_at};
use super::state::TankState;
use super::terrain::TerrainData;
use crate::Position;
use crate::consts::{MAX_POWER, MIN_POWER};
use crate::settings::AiDifficulty;

/// Time step of the landing simulation
pub const LANDING_SIM_STEP: f64 = 0.02;
/// Candidates still airborne after this long are discarded
pub const LANDING_SIM_LIMIT: f64 = 20.0;

const COARSE_ANGLES: (f64, f64, f64) = (20.0, 70.0, 2.0);
const COARSE_POWERS: (f64, f64, f64) = (30.0, 100.0, 5.0);
const FINE_ANGLE_SPAN: i32 = 5;
const FINE_ANGLE_STEP: f64 = 1.0;
const FINE_POWER_SPAN: i32 = 5;
const FINE_POWER_STEP: f64 = 2.0;

/// Best shot found by [`solve`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimSolution {
    /// Physics angle (already mirrored for leftward shots)
    pub angle: f64,
    pub power: f64,
    pub landing_x: f64,
    /// |landing_x - target x|
    pub error: f64,
}

/// A finished AI decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiShot {
    pub angle: f64,
    pub power: f64,
    pub target_id: u32,
    /// Advisory pause before firing
    pub thinking_time_ms: u32,
    /// Search error before difficulty variance
    pub expected_error: f64,
}

/// Where a shot first touches the terrain, or `None` if it leaves the map
/// (or never comes down within `LANDING_SIM_LIMIT`).
pub fn simulate_landing(
    origin: Position,
    angle_deg: f64,
    power: f64,
    wind: i32,
    terrain: &TerrainData,
) -> Option<Position> {
    let launch = LaunchConfig::new(origin, angle_deg, power);
    let steps = (LANDING_SIM_LIMIT / LANDING_SIM_STEP) as usize;
    for i in 1..=steps {
        let point = position_at(&launch, wind, i as f64 * LANDING_SIM_STEP);
        let hit = check_collision(point, terrain);
        if hit.hit {
            return Some(hit.surface_point);
        }
        if is_out_of_bounds(point, terrain) {
            return None;
        }
    }
    None
}

fn grid(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let n = ((end - start) / step).round() as i32;
    (0..=n).map(move |i| start + i as f64 * step)
}

/// Search for the (angle, power) that lands closest to `target`. Angles are
/// searched as rightward elevations and mirrored when the target is to the
/// left. `None` when no candidate lands on the map.
pub fn solve(
    shooter: &TankState,
    target: &TankState,
    terrain: &TerrainData,
    wind: i32,
) -> Option<AimSolution> {
    let target_x = target.position.x;
    let leftward = target_x < shooter.position.x;
    let mirror = |elevation: f64| if leftward { 180.0 - elevation } else { elevation };

    // (elevation, power, landing_x, error)
    let evaluate = |elevation: f64, power: f64| {
        let angle = mirror(elevation);
        simulate_landing(shooter.launch_origin(angle), angle, power, wind, terrain)
            .map(|p| (elevation, power, p.x, (p.x - target_x).abs()))
    };
    let better = |best: Option<(f64, f64, f64, f64)>, candidate: (f64, f64, f64, f64)| match best {
        Some(b) if b.3 <= candidate.3 => Some(b),
        _ => Some(candidate),
    };

    let mut best = None;
    for elevation in grid(COARSE_ANGLES.0, COARSE_ANGLES.1, COARSE_ANGLES.2) {
        for power in grid(COARSE_POWERS.0, COARSE_POWERS.1, COARSE_POWERS.2) {
            if let Some(candidate) = evaluate(elevation, power) {
                best = better(best, candidate);
            }
        }
    }
    let (coarse_angle, coarse_power, _, _) = best?;

    for da in -FINE_ANGLE_SPAN..=FINE_ANGLE_SPAN {
        let elevation = (coarse_angle + da as f64 * FINE_ANGLE_STEP).clamp(0.0, 90.0);
        for dp in -FINE_POWER_SPAN..=FINE_POWER_SPAN {
            let power = (coarse_power + dp as f64 * FINE_POWER_STEP).clamp(MIN_POWER, MAX_POWER);
            if let Some(candidate) = evaluate(elevation, power) {
                best = better(best, candidate);
            }
        }
    }

    best.map(|(elevation, power, landing_x, error)| AimSolution {
        angle: mirror(elevation),
        power,
        landing_x,
        error,
    })
}

/// Add uniform aiming error sized by difficulty, then clamp to the valid
/// barrel and power ranges
pub fn apply_difficulty_variance<R: Rng + ?Sized>(
    solution: AimSolution,
    difficulty: AiDifficulty,
    rng: &mut R,
) -> AimSolution {
    let jitter = |rng: &mut R, spread: f64| {
        if spread > 0.0 {
            rng.random_range(-spread..=spread)
        } else {
            0.0
        }
    };
    let angle = solution.angle + jitter(rng, difficulty.angle_variance());
    let power = solution.power + jitter(rng, difficulty.power_variance());
    AimSolution {
        angle: angle.clamp(0.0, 180.0),
        power: power.clamp(MIN_POWER, MAX_POWER),
        ..solution
    }
}

/// Nearest living tank other than the shooter (by horizontal distance)
pub fn select_target<'a>(shooter: &TankState, tanks: &'a [TankState]) -> Option<&'a TankState> {
    tanks
        .iter()
        .filter(|t| t.is_alive() && t.id != shooter.id)
        .min_by(|a, b| {
            let da = (a.position.x - shooter.position.x).abs();
            let db = (b.position.x - shooter.position.x).abs();
            da.total_cmp(&db)
        })
}

/// Pick a target, solve and apply difficulty error
pub fn plan_shot<R: Rng + ?Sized>(
    shooter: &TankState,
    tanks: &[TankState],
    terrain: &TerrainData,
    wind: i32,
    difficulty: AiDifficulty,
    rng: &mut R,
) -> Option<AiShot> {
    let target = select_target(shooter, tanks)?;
    let Some(solution) = solve(shooter, target, terrain, wind) else {
        log::debug!("Tank {} found no landing shot at tank {}", shooter.id, target.id);
        return None;
    };
    let varied = apply_difficulty_variance(solution, difficulty, rng);
    log::debug!(
        "Tank {} aims at tank {}: {:.1}° @ {:.1} (search error {:.1}px, {})",
        shooter.id,
        target.id,
        varied.angle,
        varied.power,
        solution.error,
        difficulty.as_str()
    );
    Some(AiShot {
        angle: varied.angle,
        power: varied.power,
        target_id: target.id,
        thinking_time_ms: difficulty.thinking_time_ms(),
        expected_error: solution.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ArmorType;
    use glam::DVec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn flat() -> TerrainData {
        TerrainData::flat(1000, 600.0, 100.0).unwrap()
    }

    fn tank(id: u32, x: f64, terrain: &TerrainData) -> TankState {
        TankState::new(id, x, terrain, ArmorType::None).unwrap()
    }

    #[test]
    fn test_landing_on_flat_ground() {
        let t = flat();
        let p = simulate_landing(DVec2::new(100.0, 130.0), 45.0, 50.0, 0, &t).unwrap();
        assert!((p.y - 100.0).abs() < 1e-9);
        assert!(p.x > 100.0);
    }

    #[test]
    fn test_landing_off_map() {
        let t = flat();
        assert!(simulate_landing(DVec2::new(900.0, 130.0), 30.0, 100.0, 0, &t).is_none());
    }

    #[test]
    fn test_solve_flat_calm_rightward() {
        let t = flat();
        let shooter = tank(1, 100.0, &t);
        let target = tank(2, 600.0, &t);
        let s = solve(&shooter, &target, &t, 0).unwrap();

        assert!(s.error < 15.0);
        assert!(s.angle >= 15.0 && s.angle <= 75.0);
        let landing =
            simulate_landing(shooter.launch_origin(s.angle), s.angle, s.power, 0, &t).unwrap();
        assert!((landing.x - 600.0).abs() < 15.0);
    }

    #[test]
    fn test_solve_mirrors_leftward() {
        let t = flat();
        let shooter = tank(1, 700.0, &t);
        let target = tank(2, 300.0, &t);
        let s = solve(&shooter, &target, &t, 0).unwrap();

        assert!(s.angle > 90.0);
        assert!(s.error < 15.0);
        assert!(s.landing_x < shooter.position.x);
    }

    #[test]
    fn test_solve_into_wind() {
        let t = flat();
        let shooter = tank(1, 100.0, &t);
        let target = tank(2, 500.0, &t);
        let calm = solve(&shooter, &target, &t, 0).unwrap();
        let windy = solve(&shooter, &target, &t, -20).unwrap();
        assert!(windy.error < 15.0);
        assert_ne!((calm.angle, calm.power), (windy.angle, windy.power));
    }

    #[test]
    fn test_solve_no_landing() {
        // Every candidate flies off this narrow strip
        let t = TerrainData::flat(40, 300.0, 100.0).unwrap();
        let shooter = TankState::with_armor(1, DVec2::new(15.0, 100.0), ArmorType::None);
        let target = TankState::with_armor(2, DVec2::new(30.0, 100.0), ArmorType::None);
        assert!(solve(&shooter, &target, &t, 0).is_none());
    }

    #[test]
    fn test_variance_bounds() {
        let base = AimSolution {
            angle: 45.0,
            power: 60.0,
            landing_x: 0.0,
            error: 0.0,
        };
        let mut rng = Pcg32::seed_from_u64(3);
        for difficulty in AiDifficulty::ALL {
            for _ in 0..200 {
                let v = apply_difficulty_variance(base, difficulty, &mut rng);
                assert!((v.angle - 45.0).abs() <= difficulty.angle_variance());
                assert!((v.power - 60.0).abs() <= difficulty.power_variance());
            }
        }
    }

    #[test]
    fn test_variance_clamps() {
        let edge = AimSolution {
            angle: 179.0,
            power: 99.5,
            landing_x: 0.0,
            error: 0.0,
        };
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..200 {
            let v = apply_difficulty_variance(edge, AiDifficulty::Easy, &mut rng);
            assert!((0.0..=180.0).contains(&v.angle));
            assert!((MIN_POWER..=MAX_POWER).contains(&v.power));
        }
    }

    #[test]
    fn test_select_target() {
        let t = flat();
        let me = tank(1, 500.0, &t);
        let far = tank(2, 900.0, &t);
        let mut near = tank(3, 400.0, &t);
        let tanks = vec![me.clone(), far.clone(), near.clone()];
        assert_eq!(select_target(&me, &tanks).map(|t| t.id), Some(3));

        near.health = 0.0;
        near.is_active = false;
        let tanks = vec![me.clone(), far, near];
        assert_eq!(select_target(&me, &tanks).map(|t| t.id), Some(2));
        assert!(select_target(&me, std::slice::from_ref(&me)).is_none());
    }

    #[test]
    fn test_plan_shot() {
        let t = flat();
        let tanks = vec![tank(1, 150.0, &t), tank(2, 750.0, &t)];
        let mut rng = Pcg32::seed_from_u64(5);
        let shot = plan_shot(&tanks[0], &tanks, &t, 4, AiDifficulty::Hard, &mut rng).unwrap();
        assert_eq!(shot.target_id, 2);
        assert_eq!(shot.thinking_time_ms, AiDifficulty::Hard.thinking_time_ms());
        assert!(shot.expected_error < 15.0);
        assert!(shot.angle < 90.0);
    }
}
