//! Error types for the ballistics engine.

use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures surfaced to the owning turn controller.
///
/// Physics inputs never fail (they are clamped); these cover caller contract
/// violations and data errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Terrain column queried outside `[0, width)`.
    #[error("Coordinate {x} is outside terrain bounds [0, {width})")]
    CoordinateOutOfBounds {
        /// Requested column.
        x: i64,
        /// Terrain width.
        width: usize,
    },

    /// Heightmap violates its invariants.
    #[error("Invalid terrain: {0}")]
    InvalidTerrain(String),

    /// Weapon key with no catalog entry.
    #[error("Unknown weapon type: {0}")]
    UnknownWeapon(String),

    /// No tank with this identifier.
    #[error("Tank not found: {0}")]
    TankNotFound(u32),

    /// Tank exists but is destroyed.
    #[error("Tank {0} is inactive")]
    TankInactive(u32),

    /// Settings could not be parsed or serialized.
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
