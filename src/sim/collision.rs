//! Collision tests against terrain, tank bodies and world bounds
//!
//! Pure geometry. Ordering between the tests (tank before terrain before
//! bounds) is decided by the projectile state machine.

use glam::DVec2;

use super::state::TankState;
use super::terrain::TerrainData;
use crate::Position;
use crate::consts::*;

/// Result of a terrain collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether the point is at or below the surface
    pub hit: bool,
    /// Surface point directly under/over the tested point (if hit)
    pub surface_point: Position,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            surface_point: DVec2::ZERO,
        }
    }
}

/// Terrain hit test. Points outside the horizontal bounds never hit; the
/// caller treats those as out-of-bounds instead.
pub fn check_collision(point: Position, terrain: &TerrainData) -> CollisionResult {
    match terrain.interpolated_height_at(point.x) {
        Some(surface) if point.y <= surface => CollisionResult {
            hit: true,
            surface_point: DVec2::new(point.x, surface),
        },
        _ => CollisionResult::miss(),
    }
}

/// Whether a projectile at `point` touches the tank's body box
pub fn tank_hit(point: Position, tank: &TankState) -> bool {
    let half_w = TANK_WIDTH / 2.0 + PROJECTILE_RADIUS;
    let dx = (point.x - tank.position.x).abs();
    let dy = point.y - tank.position.y;
    dx <= half_w && dy >= -PROJECTILE_RADIUS && dy <= TANK_HEIGHT + PROJECTILE_RADIUS
}

/// First living tank hit at `point`, skipping `ignore` (the firer during its
/// grace period). Tanks are checked in slice order.
pub fn first_tank_hit<'a>(
    point: Position,
    tanks: &'a [TankState],
    ignore: Option<u32>,
) -> Option<&'a TankState> {
    tanks
        .iter()
        .filter(|t| t.is_alive() && Some(t.id) != ignore)
        .find(|t| tank_hit(point, t))
}

/// Left or right of the heightmap, or fallen through the floor. Flying above
/// the top edge is allowed; gravity brings the shot back.
#[inline]
pub fn is_out_of_bounds(point: Position, terrain: &TerrainData) -> bool {
    !terrain.contains_x(point.x) || point.y < -OUT_OF_BOUNDS_MARGIN || !point.is_finite()
}
