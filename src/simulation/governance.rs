use std::ops::Range;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::world::policy::Governance;
use crate::world::tile::TileGrid;

const DEVELOPMENT_PRESSURE: f32 = 0.7;
const CONSERVATION_PRESSURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LandUseChange {
    pub developed: u32,
    pub restored: u32,
}

/// Stochastic land-use drift driven by policy pressure.
///
/// Under heavy development, open land is occasionally built over. Under
/// strong conservation, developed cells inside protected land occasionally
/// revert.
pub fn apply_land_use(
    grid: &mut TileGrid,
    range: Range<usize>,
    governance: &Governance,
    rng: &mut ChaCha8Rng,
) -> LandUseChange {
    let mut change = LandUseChange::default();
    let develop = governance.development > DEVELOPMENT_PRESSURE;
    let conserve = governance.conservation > CONSERVATION_PRESSURE;
    if !develop && !conserve {
        return change;
    }

    for i in range {
        if !grid.is_land_at(i) {
            continue;
        }
        let developed = grid.is_developed_at(i);
        let protected = grid.is_protected_at(i);
        if develop
            && !developed
            && !protected
            && rng.r#gen::<f32>() < 0.0001 * governance.development
        {
            grid.set_developed_at(i, true);
            change.developed += 1;
        } else if conserve
            && developed
            && protected
            && rng.r#gen::<f32>() < 0.0002 * governance.conservation * governance.enforcement
        {
            grid.set_developed_at(i, false);
            change.restored += 1;
        }
    }
    change
}
