//! Heightmap terrain
//!
//! One surface height per integer column. There are no overhangs: craters
//! lower columns and any material above a blast collapses straight down.

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::TerrainSettings;
use crate::{EngineError, Position, Result};

/// Per-level decay of midpoint displacement
const DISPLACEMENT_DECAY: f64 = 0.55;
/// Box-filter passes applied after generation
const SMOOTHING_PASSES: usize = 2;

/// A 1-D heightmap
///
/// Deserialization goes through [`TerrainData::new`], so a loaded heightmap
/// holds the same invariants as a constructed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTerrain")]
pub struct TerrainData {
    pub width: usize,
    pub height: f64,
    pub points: Vec<f64>,
}

/// Unchecked wire form of [`TerrainData`]
#[derive(Deserialize)]
struct RawTerrain {
    width: usize,
    height: f64,
    points: Vec<f64>,
}

impl TryFrom<RawTerrain> for TerrainData {
    type Error = EngineError;

    fn try_from(raw: RawTerrain) -> Result<Self> {
        Self::new(raw.width, raw.height, raw.points)
    }
}

impl TerrainData {
    /// Build a heightmap, validating `points.len() == width` and that every
    /// sample lies in `[0, height]`
    pub fn new(width: usize, height: f64, points: Vec<f64>) -> Result<Self> {
        if width == 0 {
            return Err(EngineError::InvalidTerrain("width must be positive".into()));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(EngineError::InvalidTerrain(format!(
                "height must be positive, got {height}"
            )));
        }
        if points.len() != width {
            return Err(EngineError::InvalidTerrain(format!(
                "expected {width} points, got {}",
                points.len()
            )));
        }
        if let Some((x, h)) = points
            .iter()
            .enumerate()
            .find(|(_, h)| !(h.is_finite() && (0.0..=height).contains(*h)))
        {
            return Err(EngineError::InvalidTerrain(format!(
                "column {x} height {h} outside [0, {height}]"
            )));
        }
        Ok(Self {
            width,
            height,
            points,
        })
    }

    /// Level terrain at `level` (clamped into range)
    pub fn flat(width: usize, height: f64, level: f64) -> Result<Self> {
        Self::new(width, height, vec![level.clamp(0.0, height.max(0.0)); width])
    }

    /// Procedural hills via midpoint displacement
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, settings: &TerrainSettings) -> Result<Self> {
        let width = settings.width;
        if width < 2 {
            return Err(EngineError::InvalidTerrain(format!(
                "generated terrain needs at least 2 columns, got {width}"
            )));
        }
        let lo = settings.min_fraction.clamp(0.0, 1.0) * settings.height;
        let hi = settings.max_fraction.clamp(0.0, 1.0) * settings.height;
        if !(lo.is_finite() && hi.is_finite()) || lo > hi {
            return Err(EngineError::InvalidTerrain(format!(
                "surface band [{lo}, {hi}] is empty"
            )));
        }

        let segments = (width - 1).next_power_of_two();
        let mut samples = vec![0.0; segments + 1];
        samples[0] = rng.random_range(lo..=hi);
        samples[segments] = rng.random_range(lo..=hi);

        let mut displacement = (hi - lo) * 0.5 * settings.roughness.clamp(0.0, 1.0);
        let mut step = segments;
        while step > 1 {
            let half = step / 2;
            for mid in (half..segments).step_by(step) {
                let avg = (samples[mid - half] + samples[mid + half]) * 0.5;
                samples[mid] = avg + rng.random_range(-displacement..=displacement);
            }
            displacement *= DISPLACEMENT_DECAY;
            step = half;
        }

        // Resample the power-of-two grid onto `width` columns
        let scale = segments as f64 / (width - 1) as f64;
        let mut points: Vec<f64> = (0..width)
            .map(|x| {
                let s = x as f64 * scale;
                let i = (s.floor() as usize).min(segments - 1);
                let frac = s - i as f64;
                samples[i] + (samples[i + 1] - samples[i]) * frac
            })
            .collect();

        for _ in 0..SMOOTHING_PASSES {
            let prev = points.clone();
            for x in 0..width {
                let l = prev[x.saturating_sub(1)];
                let r = prev[(x + 1).min(width - 1)];
                points[x] = (l + prev[x] + r) / 3.0;
            }
        }
        for h in &mut points {
            *h = h.clamp(lo, hi);
        }

        log::debug!(
            "Generated terrain: {} columns, surface band [{:.0}, {:.0}]",
            width,
            lo,
            hi
        );
        Self::new(width, settings.height, points)
    }

    /// Height of integer column `x`, `None` outside `[0, width)`
    #[inline]
    pub fn height_at(&self, x: i64) -> Option<f64> {
        if x < 0 {
            return None;
        }
        self.points.get(x as usize).copied()
    }

    /// Like [`height_at`](Self::height_at) but reports the contract violation
    pub fn try_height_at(&self, x: i64) -> Result<f64> {
        self.height_at(x).ok_or(EngineError::CoordinateOutOfBounds {
            x,
            width: self.width,
        })
    }

    /// Linearly interpolated surface height at continuous `x`
    pub fn interpolated_height_at(&self, x: f64) -> Option<f64> {
        if !x.is_finite() || x < 0.0 || x >= self.width as f64 {
            return None;
        }
        let i = x.floor() as usize;
        let h0 = self.points[i];
        match self.points.get(i + 1) {
            Some(&h1) => Some(h0 + (h1 - h0) * (x - i as f64)),
            None => Some(h0),
        }
    }

    /// Whether continuous `x` lies over the heightmap
    #[inline]
    pub fn contains_x(&self, x: f64) -> bool {
        x >= 0.0 && x < self.width as f64
    }

    /// Upward unit normal of the surface at `x` (straight up off-map)
    pub fn surface_normal(&self, x: f64) -> DVec2 {
        let max_x = (self.width - 1) as f64;
        let x0 = (x - 1.0).clamp(0.0, max_x);
        let x1 = (x + 1.0).clamp(0.0, max_x);
        match (
            self.interpolated_height_at(x0),
            self.interpolated_height_at(x1),
        ) {
            (Some(h0), Some(h1)) if x1 > x0 => {
                let slope = (h1 - h0) / (x1 - x0);
                DVec2::new(-slope, 1.0).normalize()
            }
            _ => DVec2::Y,
        }
    }

    /// Remove a circle of terrain. Returns the number of columns lowered.
    pub fn carve_crater(&mut self, center: Position, radius: f64) -> usize {
        if radius.is_nan() || radius <= 0.0 || !center.is_finite() {
            return 0;
        }
        let first = (center.x - radius).ceil().max(0.0) as i64;
        let last = (center.x + radius).floor().min((self.width - 1) as f64) as i64;
        let mut changed = 0;

        for x in first..=last {
            let dx = x as f64 - center.x;
            let half_chord = (radius * radius - dx * dx).max(0.0).sqrt();
            let bottom = center.y - half_chord;
            let top = center.y + half_chord;
            let column = &mut self.points[x as usize];

            if *column <= bottom {
                continue;
            }
            let lowered = if *column <= top {
                bottom
            } else {
                // Material above the blast falls into the hole
                *column - 2.0 * half_chord
            };
            let lowered = lowered.max(0.0);
            if lowered < *column {
                *column = lowered;
                changed += 1;
            }
        }
        changed
    }

    /// Level `[center_x - half_width, center_x + half_width]` to its mean
    /// height. Returns the new level, `None` when the pad is off the map.
    pub fn flatten(&mut self, center_x: f64, half_width: f64) -> Option<f64> {
        let first = (center_x - half_width).round().max(0.0) as usize;
        let last = ((center_x + half_width).round() as i64).min(self.width as i64 - 1);
        if last < 0 || first as i64 > last {
            return None;
        }
        let last = last as usize;
        let pad = &mut self.points[first..=last];
        let level = pad.iter().sum::<f64>() / pad.len() as f64;
        pad.fill(level);
        Some(level)
    }
}
