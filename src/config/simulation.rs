use serde::Deserialize;
use std::path::Path;

use crate::simulation::notables::NamePools;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u32,
    #[serde(default = "default_max_catchup_ticks")]
    pub max_catchup_ticks: u32,
    #[serde(default = "default_sim_speed")]
    pub sim_speed: f32,
    #[serde(default = "default_chunk_count")]
    pub chunk_count: u32,
    #[serde(default = "default_max_animals")]
    pub max_animals: u32,
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u32,
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u32,
    #[serde(default = "default_days_per_season")]
    pub days_per_season: u32,
    #[serde(default = "default_water_crisis_threshold")]
    pub water_crisis_threshold: f32,
    #[serde(default = "default_random_events")]
    pub random_events: bool,
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u32,
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: u32,
    #[serde(default = "default_snapshot_directory")]
    pub snapshot_directory: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default)]
    pub species_file: Option<String>,
    /// Name pools for notable animals. Built-in pools when absent.
    #[serde(default)]
    pub notable_names: NamePools,
}

fn default_tick_ms() -> u32 {
    100
}
fn default_max_catchup_ticks() -> u32 {
    5
}
fn default_sim_speed() -> f32 {
    1.0
}
fn default_chunk_count() -> u32 {
    10
}
fn default_max_animals() -> u32 {
    200
}
fn default_stats_interval() -> u32 {
    50
}
fn default_ticks_per_day() -> u32 {
    100
}
fn default_days_per_season() -> u32 {
    30
}
fn default_water_crisis_threshold() -> f32 {
    0.12
}
fn default_random_events() -> bool {
    true
}
fn default_snapshot_interval() -> u32 {
    3000
}
fn default_max_snapshots() -> u32 {
    10
}
fn default_snapshot_directory() -> String {
    "./snapshots".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

/// Engine-facing subset of the configuration consumed by every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickParams {
    pub chunk_count: u32,
    pub max_animals: u32,
    pub stats_interval: u32,
    pub ticks_per_day: u32,
    pub days_per_season: u32,
    pub water_crisis_threshold: f32,
    pub random_events: bool,
}

impl Default for TickParams {
    fn default() -> Self {
        TickParams {
            chunk_count: default_chunk_count(),
            max_animals: default_max_animals(),
            stats_interval: default_stats_interval(),
            ticks_per_day: default_ticks_per_day(),
            days_per_season: default_days_per_season(),
            water_crisis_threshold: default_water_crisis_threshold(),
            random_events: default_random_events(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn tick_params(&self) -> TickParams {
        TickParams {
            chunk_count: self.chunk_count,
            max_animals: self.max_animals,
            stats_interval: self.stats_interval,
            ticks_per_day: self.ticks_per_day,
            days_per_season: self.days_per_season,
            water_crisis_threshold: self.water_crisis_threshold,
            random_events: self.random_events,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.tick_ms == 0 {
            errors.push(format!(
                "tick_ms must be > 0, got {}. Example: tick_ms = 100",
                self.tick_ms
            ));
        }

        if self.max_catchup_ticks == 0 {
            errors.push(format!(
                "max_catchup_ticks must be > 0, got {}. Example: max_catchup_ticks = 5",
                self.max_catchup_ticks
            ));
        }

        if !(0.0..=16.0).contains(&self.sim_speed) {
            errors.push(format!(
                "sim_speed must be 0.0-16.0, got {}. Example: sim_speed = 1.0",
                self.sim_speed
            ));
        }

        if self.chunk_count == 0 {
            errors.push(format!(
                "chunk_count must be > 0, got {}. Example: chunk_count = 10",
                self.chunk_count
            ));
        }

        if self.stats_interval == 0 {
            errors.push(format!(
                "stats_interval must be > 0, got {}. Example: stats_interval = 50",
                self.stats_interval
            ));
        }

        if self.ticks_per_day == 0 {
            errors.push(format!(
                "ticks_per_day must be > 0, got {}. Example: ticks_per_day = 100",
                self.ticks_per_day
            ));
        }

        if self.days_per_season == 0 {
            errors.push(format!(
                "days_per_season must be > 0, got {}. Example: days_per_season = 30",
                self.days_per_season
            ));
        }

        if !(0.0..1.0).contains(&self.water_crisis_threshold) {
            errors.push(format!(
                "water_crisis_threshold must be 0.0-1.0 (exclusive), got {}. Example: water_crisis_threshold = 0.12",
                self.water_crisis_threshold
            ));
        }

        if self.snapshot_interval == 0 {
            errors.push(format!(
                "snapshot_interval must be > 0, got {}. Example: snapshot_interval = 3000",
                self.snapshot_interval
            ));
        }

        if self.max_snapshots == 0 {
            errors.push(format!(
                "max_snapshots must be > 0, got {}. Example: max_snapshots = 10",
                self.max_snapshots
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            errors.push(format!(
                "log_format must be \"text\" or \"json\", got '{}'. Example: log_format = \"text\"",
                self.log_format
            ));
        }

        if let Err(e) = self.notable_names.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
