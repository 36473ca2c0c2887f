use std::ops::Range;

use crate::world::calendar::Season;
use crate::world::tile::{Field, TileGrid};

const TEMPERATURE_RELAXATION: f32 = 0.01;
const SEASONAL_RAIN_SCALE: f32 = 0.005;

/// Relax land temperature toward the seasonal target and add seasonal
/// rainfall in wet seasons. The target is the same for every biome.
pub fn apply_climate(grid: &mut TileGrid, range: Range<usize>, season: Season) {
    let (season_temp, rain_mod) = season.climate_mods();
    for i in range {
        if !grid.is_land_at(i) {
            continue;
        }
        let target = 0.5 + season_temp;
        let t = grid.field_at(i, Field::Temperature);
        grid.write_at(i, Field::Temperature, t + (target - t) * TEMPERATURE_RELAXATION);
        if rain_mod > 0.0 {
            grid.add_at(i, Field::Water, rain_mod * SEASONAL_RAIN_SCALE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::Biome;

    fn grid_with_land() -> TileGrid {
        let mut grid = TileGrid::new(4, 1);
        grid.set_elevation(0, 0, 0.5);
        grid.set_elevation(1, 0, 0.5);
        grid.set_temperature(0, 0, 0.1);
        grid.set_temperature(1, 0, 0.9);
        grid
    }

    #[test]
    fn temperature_moves_toward_target() {
        let mut grid = grid_with_land();
        apply_climate(&mut grid, 0..4, Season::Summer);
        assert!(grid.temperature(0, 0) > 0.1);
        assert!(grid.temperature(1, 0) < 0.9);
    }

    #[test]
    fn biome_does_not_shift_the_target() {
        let mut grid = TileGrid::new(3, 1);
        for (x, biome) in [(0, Biome::Desert), (1, Biome::Tundra), (2, Biome::Jungle)] {
            grid.set_elevation(x, 0, 0.5);
            grid.set_biome(x, 0, biome);
            grid.set_temperature(x, 0, 0.5);
        }
        for _ in 0..500 {
            apply_climate(&mut grid, 0..3, Season::Spring);
        }
        for x in 0..3 {
            assert!((grid.temperature(x, 0) - 0.5).abs() < 1e-4, "cell {}", x);
        }

        grid.set_temperature(0, 0, 0.9);
        for _ in 0..1000 {
            apply_climate(&mut grid, 0..3, Season::Summer);
        }
        assert!((grid.temperature(0, 0) - 0.65).abs() < 1e-3);
    }

    #[test]
    fn ocean_untouched() {
        let mut grid = grid_with_land();
        let before = grid.temperature(3, 0);
        apply_climate(&mut grid, 0..4, Season::Winter);
        assert_eq!(grid.temperature(3, 0), before);
        assert_eq!(grid.water(3, 0), 1.0);
    }

    #[test]
    fn spring_rain_wets_land_summer_does_not() {
        let mut grid = grid_with_land();
        let dry = grid.water(0, 0);
        apply_climate(&mut grid, 0..4, Season::Spring);
        let wet = grid.water(0, 0);
        assert!((wet - dry - 0.001).abs() < 1e-6);

        apply_climate(&mut grid, 0..4, Season::Summer);
        assert_eq!(grid.water(0, 0), wet);
    }

    #[test]
    fn only_chunk_cells_change() {
        let mut grid = grid_with_land();
        apply_climate(&mut grid, 1..2, Season::Summer);
        assert_eq!(grid.temperature(0, 0), 0.1);
        assert!(grid.temperature(1, 0) < 0.9);
    }
}
