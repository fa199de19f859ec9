//! Input configuration and the normalized spec derived from it.

use serde::{Deserialize, Serialize};

use crate::models::room::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    None,
    Slightly,
    Moderately,
    Strictly,
}

impl Strictness {
    /// Scalar in [0,1] multiplying cultural-rule penalties.
    pub fn coefficient(self) -> f64 {
        match self {
            Strictness::None => 0.0,
            Strictness::Slightly => 0.33,
            Strictness::Moderately => 0.5,
            Strictness::Strictly => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParkingTag {
    None,
    Single,
    Double,
}

/// Raw submitted project configuration. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub width: f64,
    pub depth: f64,
    pub requirements: Vec<String>,
    pub municipal_authority: String,
    pub cultural_system: String,
    #[serde(default)]
    pub strictness: Option<Strictness>,
    #[serde(default)]
    pub floors: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub parking: Option<ParkingTag>,
}

impl ProjectConfig {
    /// Cheap synchronous validation performed before a job is ever created.
    /// Mirrors `ConfigInvalid` in the error design: non-positive/non-finite
    /// plot dimensions are rejected at the door, never surfaced as a failed
    /// job.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(ConfigError::InvalidPlotDimension { field: "width", value: self.width });
        }
        if !self.depth.is_finite() || self.depth <= 0.0 {
            return Err(ConfigError::InvalidPlotDimension { field: "depth", value: self.depth });
        }
        if let Some(floors) = self.floors
            && floors == 0
        {
            return Err(ConfigError::InvalidFloorCount);
        }
        Ok(())
    }

    pub fn floors(&self) -> u32 {
        self.floors.unwrap_or(1)
    }

    pub fn strictness_coefficient(&self) -> f64 {
        // Normative: omitted strictness is treated as `None` (coefficient 0).
        self.strictness.unwrap_or(Strictness::None).coefficient()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("plot {field} must be a positive, finite number of metres, got {value}")]
    InvalidPlotDimension { field: &'static str, value: f64 },
    #[error("floor count must be at least 1 when specified")]
    InvalidFloorCount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Setbacks {
    pub front: f64,
    pub left: f64,
    pub right: f64,
    pub rear: f64,
}

/// Static per-authority regulatory data. The set of known authorities is
/// closed; unknown tags fall back to the national default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MunicipalProfile {
    pub authority: String,
    pub max_far: f64,
    pub max_ground_coverage: f64,
    pub min_room_sizes: std::collections::HashMap<Classification, f64>,
    pub min_corridor_width: f64,
    pub min_ventilation_ratio: f64,
    pub default_setbacks: Setbacks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRequirement {
    pub classification: Classification,
    pub display_name: String,
    pub minimum_area: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjacencyRelation {
    Adjacent,
    Nearby,
    Separated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacencyPreference {
    pub room_a: String,
    pub room_b: String,
    pub relation: AdjacencyRelation,
}

/// The config plus every field the Input agent derives from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSpec {
    pub plot_width: f64,
    pub plot_depth: f64,
    pub room_requirements: Vec<RoomRequirement>,
    pub municipal_profile: MunicipalProfile,
    pub strictness_coefficient: f64,
    pub adjacency_preferences: Vec<AdjacencyPreference>,
    pub floors: u32,
}
