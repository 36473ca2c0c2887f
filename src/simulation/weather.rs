use std::ops::Range;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::world::calendar::Season;
use crate::world::tile::{Field, TileGrid};
use crate::world::weather::{WeatherKind, WeatherState};

const INTENSITY_EASING: f32 = 0.02;

/// Pick the next weather from seasonal odds given a uniform roll in [0, 1).
pub fn next_weather(season: Season, roll: f32) -> WeatherKind {
    match season {
        Season::Spring if roll < 0.4 => WeatherKind::Rain,
        Season::Spring if roll < 0.6 => WeatherKind::Storm,
        Season::Summer if roll < 0.2 => WeatherKind::Heatwave,
        Season::Summer if roll < 0.35 => WeatherKind::Drought,
        Season::Summer if roll < 0.5 => WeatherKind::Storm,
        Season::Autumn if roll < 0.3 => WeatherKind::Rain,
        Season::Autumn if roll < 0.45 => WeatherKind::Storm,
        Season::Winter if roll < 0.25 => WeatherKind::Storm,
        Season::Winter if roll < 0.4 => WeatherKind::Rain,
        _ => WeatherKind::Clear,
    }
}

/// Count down the current weather, rolling a new one when it expires, and
/// ease intensity toward its target. Returns the new kind on a transition.
pub fn update_weather(
    state: &mut WeatherState,
    season: Season,
    rng: &mut ChaCha8Rng,
) -> Option<WeatherKind> {
    state.remaining = state.remaining.saturating_sub(1);
    let mut changed = None;
    if state.remaining == 0 {
        let kind = next_weather(season, rng.r#gen());
        let (lo, hi) = kind.duration_range();
        state.kind = kind;
        state.remaining = rng.gen_range(lo..hi);
        state.target_intensity = if kind == WeatherKind::Clear {
            0.0
        } else {
            0.5 + rng.r#gen::<f32>() * 0.5
        };
        changed = Some(kind);
    }
    state.intensity += (state.target_intensity - state.intensity) * INTENSITY_EASING;
    state.intensity = state.intensity.clamp(0.0, 1.0);
    changed
}

/// Apply the current weather's effects to land cells in the chunk.
pub fn apply_weather(
    grid: &mut TileGrid,
    range: Range<usize>,
    state: &WeatherState,
    rng: &mut ChaCha8Rng,
) {
    let intensity = state.intensity;
    if state.kind == WeatherKind::Clear || intensity <= 0.0 {
        return;
    }
    for i in range {
        if !grid.is_land_at(i) {
            continue;
        }
        match state.kind {
            WeatherKind::Clear => {}
            WeatherKind::Rain => grid.add_at(i, Field::Water, 0.003 * intensity),
            WeatherKind::Storm => {
                grid.add_at(i, Field::Water, 0.006 * intensity);
                if rng.r#gen::<f32>() < 0.002 * intensity {
                    grid.add_at(i, Field::Vegetation, -0.01);
                }
            }
            WeatherKind::Drought => {
                grid.add_at(i, Field::Water, -0.004 * intensity);
                if grid.field_at(i, Field::Water) < 0.05 {
                    grid.add_at(i, Field::Vegetation, -0.001 * intensity);
                }
            }
            WeatherKind::Heatwave => {
                grid.add_at(i, Field::Temperature, 0.002 * intensity);
                grid.add_at(i, Field::Water, -0.002 * intensity);
            }
        }
    }
}
