use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters used to procedurally generate an island.
/// Stored with the island for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub seed: u64,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    /// Island radius as a fraction of the shorter half-extent.
    #[serde(default = "default_falloff_radius")]
    pub falloff_radius: f32,
    #[serde(default = "default_river_count_min")]
    pub river_count_min: u32,
    #[serde(default = "default_river_count_max")]
    pub river_count_max: u32,
    #[serde(default = "default_river_max_steps")]
    pub river_max_steps: u32,
    #[serde(default = "default_spawn_animals")]
    pub spawn_animals: bool,
}

fn default_size() -> u32 {
    128
}
fn default_falloff_radius() -> f32 {
    0.85
}
fn default_river_count_min() -> u32 {
    2
}
fn default_river_count_max() -> u32 {
    4
}
fn default_river_max_steps() -> u32 {
    200
}
fn default_spawn_animals() -> bool {
    true
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams::with_seed(0)
    }
}

impl GenerationParams {
    pub fn with_seed(seed: u64) -> Self {
        GenerationParams {
            seed,
            width: default_size(),
            height: default_size(),
            falloff_radius: default_falloff_radius(),
            river_count_min: default_river_count_min(),
            river_count_max: default_river_count_max(),
            river_max_steps: default_river_max_steps(),
            spawn_animals: default_spawn_animals(),
        }
    }

    /// Load generation parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(16..=1024).contains(&self.width) {
            return Err(format!("width must be 16-1024, got {}", self.width));
        }
        if !(16..=1024).contains(&self.height) {
            return Err(format!("height must be 16-1024, got {}", self.height));
        }
        if !(0.3..=1.0).contains(&self.falloff_radius) {
            return Err(format!(
                "falloff_radius must be 0.3-1.0, got {}",
                self.falloff_radius
            ));
        }
        if self.river_count_max > 16 {
            return Err(format!(
                "river_count_max must be <= 16, got {}",
                self.river_count_max
            ));
        }
        if self.river_count_min > self.river_count_max {
            return Err(format!(
                "river_count_min ({}) must not exceed river_count_max ({})",
                self.river_count_min, self.river_count_max
            ));
        }
        if self.river_max_steps == 0 {
            return Err("river_max_steps must be > 0".to_string());
        }
        Ok(())
    }
}
