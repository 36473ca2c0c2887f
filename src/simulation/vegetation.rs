use std::ops::Range;

use crate::world::policy::Governance;
use crate::world::tile::{Biome, Field, TileGrid};

const DROUGHT_WATER: f32 = 0.05;
const FREEZE_TEMPERATURE: f32 = 0.15;
const SPREAD_BELOW: f32 = 0.1;
const SPREAD_SOURCE: f32 = 0.3;

/// Growth condition in [0, 1] from soil, water and closeness to mild temperature.
pub fn growth_condition(soil: f32, water: f32, temperature: f32) -> f32 {
    soil * 0.4 + water * 0.35 + (1.0 - (temperature - 0.5).abs() * 2.0) * 0.25
}

/// Grow, stress and spread vegetation on every non-ocean cell of the chunk.
///
/// `recovery` scales growth; 1.0 outside a water crisis.
pub fn apply_vegetation(
    grid: &mut TileGrid,
    range: Range<usize>,
    governance: &Governance,
    recovery: f32,
) {
    let impact = governance.development_impact();
    for i in range {
        let biome = grid.biome_at(i);
        if biome == Biome::Ocean {
            continue;
        }
        let soil = grid.field_at(i, Field::Soil);
        let water = grid.field_at(i, Field::Water);
        let temperature = grid.field_at(i, Field::Temperature);
        let mut v = grid.field_at(i, Field::Vegetation);

        v += biome.profile().growth_rate * growth_condition(soil, water, temperature) * recovery;
        v -= v * v * 0.003;

        if grid.is_developed_at(i) {
            v -= impact * 0.008;
        }
        if grid.is_protected_at(i) {
            v += 0.001 * governance.enforcement;
        }
        if water < DROUGHT_WATER {
            v -= 0.005;
        }
        if temperature < FREEZE_TEMPERATURE {
            v -= (FREEZE_TEMPERATURE - temperature) * 0.01;
        }

        if v < SPREAD_BELOW {
            let (x, y) = grid.coords(i);
            let (sum, count) = grid
                .neighbors4(x, y)
                .fold((0.0, 0), |(sum, count), (nx, ny)| {
                    (sum + grid.vegetation(nx, ny), count + 1)
                });
            if count > 0 && sum / count as f32 > SPREAD_SOURCE {
                v += 0.002;
            }
        }

        grid.write_at(i, Field::Vegetation, v);
    }
}
