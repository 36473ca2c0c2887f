use std::ops::Range;

use crate::world::tile::{Field, TileGrid};

/// Water-crisis strength in [0, 1]: zero at or above the ocean-ratio
/// threshold, rising linearly to one as the ocean disappears.
pub fn severity(ocean_ratio: f32, threshold: f32) -> f32 {
    if threshold <= 0.0 || ocean_ratio.is_nan() || ocean_ratio >= threshold {
        return 0.0;
    }
    ((threshold - ocean_ratio.max(0.0)) / threshold).min(1.0)
}

/// Extra evaporation, dieback, erosion and heating on land under a crisis.
pub fn apply_crisis(grid: &mut TileGrid, range: Range<usize>, severity: f32) {
    if severity <= 0.0 {
        return;
    }
    for i in range {
        if !grid.is_land_at(i) {
            continue;
        }
        grid.add_at(i, Field::Water, -0.01 * severity);
        grid.add_at(i, Field::Vegetation, -0.015 * severity);
        grid.add_at(i, Field::Soil, -0.006 * severity);
        grid.add_at(i, Field::Temperature, 0.002 * severity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_scales_below_threshold() {
        assert_eq!(severity(0.5, 0.12), 0.0);
        assert_eq!(severity(0.12, 0.12), 0.0);
        assert!((severity(0.06, 0.12) - 0.5).abs() < 1e-6);
        assert_eq!(severity(0.0, 0.12), 1.0);
        assert_eq!(severity(0.0, 0.0), 0.0);
        assert_eq!(severity(f32::NAN, 0.12), 0.0);
    }

    #[test]
    fn crisis_degrades_land() {
        let mut grid = TileGrid::new(2, 1);
        grid.set_elevation(0, 0, 0.5);
        grid.set_water(0, 0, 0.5);
        grid.set_soil(0, 0, 0.5);
        grid.set_vegetation(0, 0, 0.5);
        let t0 = grid.temperature(0, 0);

        apply_crisis(&mut grid, 0..2, 1.0);
        assert!(grid.water(0, 0) < 0.5);
        assert!(grid.soil(0, 0) < 0.5);
        assert!(grid.vegetation(0, 0) < 0.5);
        assert!(grid.temperature(0, 0) > t0);
        assert_eq!(grid.water(1, 0), 1.0);
    }

    #[test]
    fn no_crisis_no_change() {
        let mut grid = TileGrid::new(2, 1);
        grid.set_elevation(0, 0, 0.5);
        let before = grid.clone();
        apply_crisis(&mut grid, 0..2, 0.0);
        assert_eq!(grid, before);
    }
}
