use serde::{Deserialize, Serialize};

use crate::world::tile::TileGrid;

/// Most structures one island can hold.
pub const MAX_STRUCTURES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    Village,
    Farm,
    Lighthouse,
    Windmill,
}

impl StructureKind {
    pub const ALL: [StructureKind; 4] = [
        StructureKind::Village,
        StructureKind::Farm,
        StructureKind::Lighthouse,
        StructureKind::Windmill,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Village => "Village",
            StructureKind::Farm => "Farm",
            StructureKind::Lighthouse => "Lighthouse",
            StructureKind::Windmill => "Windmill",
        }
    }

    /// Nominal size. The footprint is the square of radius `size / 2`.
    pub fn size(self) -> i32 {
        match self {
            StructureKind::Village => 2,
            StructureKind::Farm => 3,
            StructureKind::Lighthouse | StructureKind::Windmill => 1,
        }
    }

    /// Soil lost per tick under the footprint, before the 0.1 scale.
    pub fn soil_drain(self) -> f32 {
        match self {
            StructureKind::Village => 0.002,
            StructureKind::Farm => 0.003,
            StructureKind::Lighthouse => 0.0,
            StructureKind::Windmill => 0.001,
        }
    }

    /// Vegetation added per tick to the ring around the footprint, before the
    /// 0.01 scale.
    pub fn veg_boost(self) -> f32 {
        match self {
            StructureKind::Farm => 0.01,
            _ => 0.0,
        }
    }

    fn radius(self) -> i32 {
        self.size() / 2
    }
}

impl std::str::FromStr for StructureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StructureKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("Unknown structure '{}'. Expected village, farm, lighthouse or windmill", s)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub kind: StructureKind,
    pub x: i32,
    pub y: i32,
    /// Ticks since placement.
    pub age: u32,
    pub health: f32,
}

impl Structure {
    /// Cells covered by the footprint, including any off the grid.
    fn footprint(&self) -> impl Iterator<Item = (i32, i32)> {
        footprint(self.kind, self.x, self.y)
    }
}

fn footprint(kind: StructureKind, cx: i32, cy: i32) -> impl Iterator<Item = (i32, i32)> {
    let r = kind.radius();
    (-r..=r).flat_map(move |dy| (-r..=r).map(move |dx| (cx + dx, cy + dy)))
}

/// Built structures on one island. Each one develops its footprint and
/// keeps working the land around it every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structures {
    items: Vec<Structure>,
    next_id: u32,
}

impl Structures {
    pub fn items(&self) -> &[Structure] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every footprint cell must be on the grid, on land and undeveloped.
    pub fn can_place(grid: &TileGrid, kind: StructureKind, cx: i32, cy: i32) -> bool {
        footprint(kind, cx, cy)
            .all(|(x, y)| grid.in_bounds(x, y) && grid.is_land(x, y) && !grid.is_developed(x, y))
    }

    /// Build a structure centred on a cell and mark its footprint developed.
    /// Returns `None` for an invalid footprint or when the island is full.
    pub fn place(
        &mut self,
        grid: &mut TileGrid,
        kind: StructureKind,
        cx: i32,
        cy: i32,
    ) -> Option<StructureId> {
        if self.items.len() >= MAX_STRUCTURES || !Self::can_place(grid, kind, cx, cy) {
            return None;
        }
        let structure = Structure {
            id: StructureId(self.next_id),
            kind,
            x: cx,
            y: cy,
            age: 0,
            health: 1.0,
        };
        self.next_id += 1;
        for (x, y) in structure.footprint() {
            grid.set_developed(x, y, true);
        }
        self.items.push(structure);
        Some(structure.id)
    }

    /// One tick of wear: soil drains under each footprint and farms feed
    /// the undeveloped land in a ring around them. Footprints on land stay
    /// developed.
    pub fn simulate(&mut self, grid: &mut TileGrid) {
        for s in &mut self.items {
            s.age = s.age.saturating_add(1);

            // land restoration must not clear a standing footprint
            let drain = s.kind.soil_drain() * 0.1;
            for (x, y) in s.footprint() {
                if !grid.is_land(x, y) {
                    continue;
                }
                grid.set_developed(x, y, true);
                if drain > 0.0 {
                    grid.set_soil(x, y, grid.soil(x, y) - drain);
                }
            }

            let boost = s.kind.veg_boost() * 0.01;
            if boost > 0.0 {
                let range = s.kind.size() + 1;
                let half = s.kind.size() as f32 / 2.0;
                for dy in -range..=range {
                    for dx in -range..=range {
                        if (dx.abs() as f32) <= half && (dy.abs() as f32) <= half {
                            continue;
                        }
                        let (x, y) = (s.x + dx, s.y + dy);
                        if grid.in_bounds(x, y) && grid.is_land(x, y) && !grid.is_developed(x, y) {
                            grid.set_vegetation(x, y, grid.vegetation(x, y) + boost);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land(size: usize) -> TileGrid {
        let mut grid = TileGrid::new(size, size);
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                grid.set_elevation(x, y, 0.5);
                grid.set_soil(x, y, 0.5);
                grid.set_vegetation(x, y, 0.2);
            }
        }
        grid
    }

    #[test]
    fn farm_develops_its_footprint() {
        let mut grid = land(12);
        let mut structures = Structures::default();
        let id = structures.place(&mut grid, StructureKind::Farm, 5, 5).unwrap();
        assert_eq!(id, StructureId(0));
        for y in 4..=6 {
            for x in 4..=6 {
                assert!(grid.is_developed(x, y), "({}, {})", x, y);
            }
        }
        assert!(!grid.is_developed(3, 5));
        assert!(!grid.is_developed(7, 5));
    }

    #[test]
    fn placement_rejects_ocean_edges_and_overlap() {
        let mut grid = land(12);
        grid.set_elevation(9, 9, 0.1);
        let mut structures = Structures::default();

        assert!(structures.place(&mut grid, StructureKind::Farm, 8, 8).is_none());
        assert!(structures.place(&mut grid, StructureKind::Farm, 0, 5).is_none());
        assert!(structures.place(&mut grid, StructureKind::Lighthouse, 20, 20).is_none());

        structures.place(&mut grid, StructureKind::Village, 4, 4).unwrap();
        assert!(structures.place(&mut grid, StructureKind::Windmill, 5, 5).is_none());
        assert!(structures.place(&mut grid, StructureKind::Windmill, 7, 4).is_some());
        assert_eq!(structures.len(), 2);
    }

    #[test]
    fn placement_stops_at_capacity() {
        let mut grid = land(16);
        let mut structures = Structures::default();
        for i in 0..MAX_STRUCTURES as i32 {
            structures
                .place(&mut grid, StructureKind::Windmill, i % 16, i / 16)
                .unwrap();
        }
        assert!(structures.place(&mut grid, StructureKind::Windmill, 10, 10).is_none());
        assert_eq!(structures.len(), MAX_STRUCTURES);
        assert!(!grid.is_developed(10, 10));
    }

    #[test]
    fn structures_drain_soil_under_their_footprint() {
        let mut grid = land(8);
        let mut structures = Structures::default();
        structures.place(&mut grid, StructureKind::Village, 3, 3).unwrap();
        structures.place(&mut grid, StructureKind::Lighthouse, 6, 6).unwrap();
        for _ in 0..100 {
            structures.simulate(&mut grid);
        }
        // 100 ticks of 0.002 * 0.1
        assert!((grid.soil(3, 3) - 0.48).abs() < 1e-4);
        assert!((grid.soil(6, 6) - 0.5).abs() < 1e-6);
        assert!((grid.soil(0, 0) - 0.5).abs() < 1e-6);
        assert_eq!(structures.items()[0].age, 100);
    }

    #[test]
    fn farm_feeds_the_ring_around_it() {
        let mut grid = land(16);
        grid.set_elevation(10, 7, 0.1);
        let mut structures = Structures::default();
        structures.place(&mut grid, StructureKind::Farm, 7, 7).unwrap();
        for _ in 0..100 {
            structures.simulate(&mut grid);
        }
        // ring cell inside the range, off the footprint
        assert!((grid.vegetation(9, 7) - 0.21).abs() < 1e-4);
        assert!((grid.vegetation(3, 3) - 0.21).abs() < 1e-4);
        // beyond the ring, under the farm and at sea
        assert!((grid.vegetation(2, 7) - 0.2).abs() < 1e-6);
        assert!((grid.vegetation(7, 7) - 0.2).abs() < 1e-6);
        assert_eq!(grid.vegetation(10, 7), 0.0);
    }

    #[test]
    fn cleared_footprint_is_developed_again() {
        let mut grid = land(8);
        let mut structures = Structures::default();
        structures.place(&mut grid, StructureKind::Windmill, 4, 4).unwrap();
        grid.set_developed(4, 4, false);
        structures.simulate(&mut grid);
        assert!(grid.is_developed(4, 4));
    }

    #[test]
    fn kinds_parse_by_name() {
        assert_eq!("farm".parse::<StructureKind>(), Ok(StructureKind::Farm));
        assert_eq!("Lighthouse".parse::<StructureKind>(), Ok(StructureKind::Lighthouse));
        assert!("castle".parse::<StructureKind>().is_err());
    }
}
