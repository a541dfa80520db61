//! Match settings and AI difficulty presets
//!
//! Serialized as JSON by whichever collaborator owns persistence.

use serde::{Deserialize, Serialize};

use crate::Result;

/// AI difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl AiDifficulty {
    pub const ALL: [AiDifficulty; 3] = [AiDifficulty::Easy, AiDifficulty::Medium, AiDifficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiDifficulty::Easy => "easy",
            AiDifficulty::Medium => "medium",
            AiDifficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(AiDifficulty::Easy),
            "medium" | "med" | "normal" => Some(AiDifficulty::Medium),
            "hard" => Some(AiDifficulty::Hard),
            _ => None,
        }
    }

    /// Maximum angle error added to a solved shot (degrees, ±)
    pub fn angle_variance(&self) -> f64 {
        match self {
            AiDifficulty::Easy => 8.0,
            AiDifficulty::Medium => 4.0,
            AiDifficulty::Hard => 1.5,
        }
    }

    /// Maximum power error added to a solved shot (±)
    pub fn power_variance(&self) -> f64 {
        match self {
            AiDifficulty::Easy => 12.0,
            AiDifficulty::Medium => 6.0,
            AiDifficulty::Hard => 2.0,
        }
    }

    /// Advisory "thinking" pause for presentation pacing
    pub fn thinking_time_ms(&self) -> u32 {
        match self {
            AiDifficulty::Easy => 1500,
            AiDifficulty::Medium => 1000,
            AiDifficulty::Hard => 600,
        }
    }
}

/// Procedural terrain parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainSettings {
    /// Number of height columns (world width)
    pub width: usize,
    /// World height
    pub height: f64,
    /// Midpoint displacement roughness (0 = flat, 1 = jagged)
    pub roughness: f64,
    /// Lowest allowed surface as a fraction of height
    pub min_fraction: f64,
    /// Highest allowed surface as a fraction of height
    pub max_fraction: f64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600.0,
            roughness: 0.55,
            min_fraction: 0.15,
            max_fraction: 0.65,
        }
    }
}

/// Match settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Difficulty for every AI-controlled tank
    pub ai_difficulty: AiDifficulty,
    /// When false, wind stays at 0 every turn
    pub wind_enabled: bool,
    /// Terrain generation parameters
    #[serde(default)]
    pub terrain: TerrainSettings,
    /// Fixed seed for reproducible matches (random when absent)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_difficulty: AiDifficulty::Medium,
            wind_enabled: true,
            terrain: TerrainSettings::default(),
            seed: None,
        }
    }
}

impl Settings {
    /// Create settings for a difficulty (other fields default)
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        Self {
            ai_difficulty: difficulty,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings = serde_json::from_str(json)?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
