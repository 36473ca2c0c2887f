use serde::{Deserialize, Serialize};

use crate::world::tile::TileGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Zone {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let (x1, x2) = (self.x1, self.x2);
        (self.y1..=self.y2).flat_map(move |y| (x1..=x2).map(move |x| (x, y)))
    }
}

/// Rectangular protected areas. Protection is only ever applied to land.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneManager {
    zones: Vec<Zone>,
    next_id: u32,
}

impl ZoneManager {
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Protect the land inside a rectangle given by any two corners.
    /// Returns `None` when the rectangle misses the grid entirely.
    pub fn add_zone(&mut self, grid: &mut TileGrid, ax: i32, ay: i32, bx: i32, by: i32) -> Option<u32> {
        let max_x = grid.width() as i32 - 1;
        let max_y = grid.height() as i32 - 1;
        let (x1, x2) = (ax.min(bx), ax.max(bx));
        let (y1, y2) = (ay.min(by), ay.max(by));
        if x2 < 0 || y2 < 0 || x1 > max_x || y1 > max_y {
            return None;
        }

        let zone = Zone {
            id: self.next_id,
            x1: x1.max(0),
            y1: y1.max(0),
            x2: x2.min(max_x),
            y2: y2.min(max_y),
        };
        self.next_id += 1;

        for (x, y) in zone.cells() {
            if grid.is_land(x, y) {
                grid.set_protected(x, y, true);
            }
        }
        self.zones.push(zone);
        Some(zone.id)
    }

    /// Drop a zone, unprotecting cells no other zone still covers.
    pub fn remove_zone(&mut self, grid: &mut TileGrid, id: u32) -> bool {
        let Some(pos) = self.zones.iter().position(|z| z.id == id) else {
            return false;
        };
        let zone = self.zones.remove(pos);
        for (x, y) in zone.cells() {
            if !self.zones.iter().any(|z| z.contains(x, y)) {
                grid.set_protected(x, y, false);
            }
        }
        true
    }

    /// Flip protection on a single land cell. Returns the new state.
    pub fn toggle_tile(&self, grid: &mut TileGrid, x: i32, y: i32) -> Option<bool> {
        if !grid.in_bounds(x, y) || !grid.is_land(x, y) {
            return None;
        }
        let protected = !grid.is_protected(x, y);
        grid.set_protected(x, y, protected);
        Some(protected)
    }
}
