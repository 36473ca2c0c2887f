use std::ops::Range;

use crate::world::tile::{Field, TileGrid};

const MIN_FLOWING_WATER: f32 = 0.05;

/// Evaporate and route water downhill across 4-neighbors.
///
/// Cells are visited in index order and each transfer lands in the neighbor
/// immediately, so later cells see water that arrived earlier in the same
/// pass. Flow targets may sit outside `range`. Neighbor writes clamp at 1,
/// so water reaching a saturated cell is lost.
pub fn apply_water(grid: &mut TileGrid, range: Range<usize>) {
    for i in range {
        if !grid.is_land_at(i) {
            continue;
        }
        let (x, y) = grid.coords(i);
        let elevation = grid.field_at(i, Field::Elevation);
        let temperature = grid.field_at(i, Field::Temperature);

        let mut water = grid.field_at(i, Field::Water);
        water -= 0.002 + temperature * 0.003;

        let lower: Vec<usize> = grid
            .neighbors4(x, y)
            .filter_map(|(nx, ny)| grid.index(nx, ny))
            .filter(|&n| grid.field_at(n, Field::Elevation) < elevation)
            .collect();
        for n in lower {
            if water <= MIN_FLOWING_WATER {
                break;
            }
            let drop = elevation - grid.field_at(n, Field::Elevation);
            let transfer = (water * 0.1).min(drop * 0.02);
            water -= transfer;
            grid.add_at(n, Field::Water, transfer);
        }

        grid.write_at(i, Field::Water, water);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slope() -> TileGrid {
        // 0.9 | 0.6 | 0.4 | ocean
        let mut grid = TileGrid::new(4, 1);
        for (x, h) in [0.9, 0.6, 0.4].into_iter().enumerate() {
            grid.set_elevation(x as i32, 0, h);
            grid.set_water(x as i32, 0, 0.5);
            grid.set_temperature(x as i32, 0, 0.5);
        }
        grid
    }

    #[test]
    fn water_flows_downhill() {
        let mut grid = slope();
        apply_water(&mut grid, 0..1);
        // high cell lost evaporation plus outflow; lower neighbor gained
        assert!(grid.water(0, 0) < 0.5 - 0.0035);
        assert!(grid.water(1, 0) > 0.5);
    }

    #[test]
    fn water_never_flows_uphill() {
        let mut grid = slope();
        apply_water(&mut grid, 2..3);
        assert_eq!(grid.water(1, 0), 0.5);
        assert_eq!(grid.water(0, 0), 0.5);
    }

    #[test]
    fn flat_land_only_evaporates() {
        let mut grid = TileGrid::new(3, 1);
        for x in 0..3 {
            grid.set_elevation(x, 0, 0.5);
            grid.set_water(x, 0, 0.5);
            grid.set_temperature(x, 0, 0.0);
        }
        apply_water(&mut grid, 0..3);
        for x in 0..3 {
            assert!((grid.water(x, 0) - 0.498).abs() < 1e-6);
        }
    }

    #[test]
    fn dry_cells_do_not_flow() {
        let mut grid = slope();
        grid.set_water(0, 0, 0.04);
        apply_water(&mut grid, 0..1);
        assert_eq!(grid.water(1, 0), 0.5);
    }

    #[test]
    fn water_stays_in_unit_range() {
        let mut grid = slope();
        grid.set_water(0, 0, 0.0);
        grid.set_water(1, 0, 1.0);
        for _ in 0..50 {
            apply_water(&mut grid, 0..4);
        }
        assert!(grid.floats().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
