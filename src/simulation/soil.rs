use std::ops::Range;

use crate::world::policy::Governance;
use crate::world::tile::{Field, TileGrid};

/// Regenerate soil from water and vegetation, pull it toward the biome
/// baseline, and apply land-use pressure.
///
/// `recovery` scales natural regeneration; 1.0 outside a water crisis.
pub fn apply_soil(grid: &mut TileGrid, range: Range<usize>, governance: &Governance, recovery: f32) {
    let impact = governance.development_impact();
    for i in range {
        if !grid.is_land_at(i) {
            continue;
        }
        let water = grid.field_at(i, Field::Water);
        let vegetation = grid.field_at(i, Field::Vegetation);
        let base = grid.biome_at(i).profile().soil_base;
        let mut soil = grid.field_at(i, Field::Soil);

        soil += (water * 0.3 + vegetation * 0.3) * 0.003 * recovery;
        soil += (base - soil) * 0.001;
        if grid.is_developed_at(i) {
            soil -= impact * 0.005;
        }
        if grid.is_protected_at(i) {
            soil += 0.001 * governance.enforcement;
        }

        grid.write_at(i, Field::Soil, soil);
    }
}
