use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherKind {
    Clear,
    Rain,
    Storm,
    Drought,
    Heatwave,
}

impl WeatherKind {
    /// Inclusive-exclusive duration range in ticks.
    pub fn duration_range(self) -> (u32, u32) {
        match self {
            WeatherKind::Clear => (200, 600),
            WeatherKind::Rain => (100, 300),
            WeatherKind::Storm => (50, 150),
            WeatherKind::Drought => (150, 400),
            WeatherKind::Heatwave => (100, 250),
        }
    }
}

/// Island-wide weather. Intensity eases toward the target of the current kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub kind: WeatherKind,
    pub remaining: u32,
    pub intensity: f32,
    pub target_intensity: f32,
}

impl Default for WeatherState {
    fn default() -> Self {
        WeatherState {
            kind: WeatherKind::Clear,
            remaining: 300,
            intensity: 0.0,
            target_intensity: 0.0,
        }
    }
}
