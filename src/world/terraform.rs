use crate::world::tile::{Biome, TileGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SculptDirection {
    Raise,
    Lower,
}

pub const BRUSH_RADIUS: i32 = 3;
pub const SCULPT_STRENGTH: f32 = 0.02;

fn brush_cells(grid: &TileGrid, cx: i32, cy: i32, radius: i32) -> Vec<(i32, i32, f32)> {
    let radius = radius.max(0);
    let mut cells = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (x, y) = (cx + dx, cy + dy);
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist > radius as f32 || !grid.in_bounds(x, y) {
                continue;
            }
            cells.push((x, y, 1.0 - dist / (radius + 1) as f32));
        }
    }
    cells
}

/// Raise or lower terrain under a circular brush with linear falloff.
/// Cells pushed across the shoreline convert between land and ocean.
/// Returns the number of cells that changed side.
pub fn sculpt(
    grid: &mut TileGrid,
    cx: i32,
    cy: i32,
    radius: i32,
    strength: f32,
    direction: SculptDirection,
) -> usize {
    let sign = match direction {
        SculptDirection::Raise => 1.0,
        SculptDirection::Lower => -1.0,
    };
    let mut flipped = 0;
    for (x, y, falloff) in brush_cells(grid, cx, cy, radius) {
        let was_land = grid.is_land(x, y);
        let h = grid.elevation(x, y);
        grid.set_elevation(x, y, h + sign * strength * falloff);
        if grid.is_land(x, y) != was_land {
            flipped += 1;
        }
    }
    flipped
}

/// Paint a land biome onto every land cell under the brush.
pub fn paint_biome(grid: &mut TileGrid, cx: i32, cy: i32, radius: i32, biome: Biome) -> usize {
    if biome == Biome::Ocean {
        return 0;
    }
    brush_cells(grid, cx, cy, radius)
        .into_iter()
        .filter(|&(x, y, _)| grid.set_biome(x, y, biome))
        .count()
}
