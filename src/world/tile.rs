use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Elevation at or above which a cell is land.
pub const LAND_THRESHOLD: f32 = 0.3;

const FLOATS_PER_CELL: usize = 5;
const BYTES_PER_CELL: usize = 3;

const BYTE_BIOME: usize = 0;
const BYTE_PROTECTED: usize = 1;
const BYTE_DEVELOPED: usize = 2;

/// 4-neighborhood in scan order: west, east, north, south.
pub const NEIGHBORS4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

// === Enums ===

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Biome {
    Ocean = 0,
    Forest = 1,
    Grassland = 2,
    Desert = 3,
    Tundra = 4,
    Jungle = 5,
}

/// Growth and soil baselines that depend only on the biome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeProfile {
    pub growth_rate: f32,
    pub soil_base: f32,
}

impl Biome {
    pub const ALL: [Biome; 6] = [
        Biome::Ocean,
        Biome::Forest,
        Biome::Grassland,
        Biome::Desert,
        Biome::Tundra,
        Biome::Jungle,
    ];

    pub fn from_u8(value: u8) -> Option<Biome> {
        Biome::ALL.get(value as usize).copied()
    }

    pub fn profile(self) -> BiomeProfile {
        let (growth_rate, soil_base) = match self {
            Biome::Ocean => (0.0, 0.0),
            Biome::Forest => (0.008, 0.7),
            Biome::Grassland => (0.005, 0.5),
            Biome::Desert => (0.001, 0.2),
            Biome::Tundra => (0.002, 0.25),
            Biome::Jungle => (0.012, 0.8),
        };
        BiomeProfile {
            growth_rate,
            soil_base,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Biome::Ocean => "Ocean",
            Biome::Forest => "Forest",
            Biome::Grassland => "Grassland",
            Biome::Desert => "Desert",
            Biome::Tundra => "Tundra",
            Biome::Jungle => "Jungle",
        }
    }
}

/// Continuous per-cell fields, in buffer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Elevation = 0,
    Water = 1,
    Soil = 2,
    Vegetation = 3,
    Temperature = 4,
}

// === Grid ===

/// Flat export form of a grid: field-interleaved float and byte buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRecord {
    pub width: u32,
    pub height: u32,
    pub floats: Vec<f32>,
    pub bytes: Vec<u8>,
}

/// Rectangular island grid.
///
/// Every continuous field is kept in [0, 1]. A cell is Ocean exactly when
/// its elevation is below [`LAND_THRESHOLD`]; `set_elevation` re-derives the
/// dependent fields whenever a write crosses that line.
///
/// Coordinates outside the grid are a caller bug: debug builds panic, release
/// builds read zeroes and drop writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridRecord", into = "GridRecord")]
pub struct TileGrid {
    width: usize,
    height: usize,
    floats: Vec<f32>,
    bytes: Vec<u8>,
}

fn unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

impl TileGrid {
    /// A grid covered entirely by ocean.
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        let mut floats = vec![0.0; size * FLOATS_PER_CELL];
        for i in 0..size {
            floats[i * FLOATS_PER_CELL + Field::Water as usize] = 1.0;
            floats[i * FLOATS_PER_CELL + Field::Temperature as usize] = 0.5;
        }
        TileGrid {
            width,
            height,
            floats,
            bytes: vec![0; size * BYTES_PER_CELL],
        }
    }

    /// Rebuild a grid from exported buffers, rejecting inconsistent input.
    pub fn from_buffers(
        width: usize,
        height: usize,
        floats: Vec<f32>,
        bytes: Vec<u8>,
    ) -> Result<Self, String> {
        let size = width * height;
        if size == 0 {
            return Err(format!("grid must be non-empty, got {}x{}", width, height));
        }
        if floats.len() != size * FLOATS_PER_CELL {
            return Err(format!(
                "float buffer has {} values, expected {} for {}x{}",
                floats.len(),
                size * FLOATS_PER_CELL,
                width,
                height
            ));
        }
        if bytes.len() != size * BYTES_PER_CELL {
            return Err(format!(
                "byte buffer has {} values, expected {} for {}x{}",
                bytes.len(),
                size * BYTES_PER_CELL,
                width,
                height
            ));
        }
        if let Some(pos) = bytes
            .chunks_exact(BYTES_PER_CELL)
            .position(|cell| Biome::from_u8(cell[BYTE_BIOME]).is_none())
        {
            return Err(format!("cell {} has unknown biome byte", pos));
        }
        let floats = floats.into_iter().map(unit).collect();
        Ok(TileGrid {
            width,
            height,
            floats,
            bytes,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn floats(&self) -> &[f32] {
        &self.floats
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn coords(&self, index: usize) -> (i32, i32) {
        ((index % self.width) as i32, (index / self.width) as i32)
    }

    fn checked_index(&self, x: i32, y: i32) -> Option<usize> {
        let index = self.index(x, y);
        debug_assert!(
            index.is_some(),
            "tile ({}, {}) outside {}x{} grid",
            x,
            y,
            self.width,
            self.height
        );
        index
    }

    /// Flattened cell range processed by `chunk_idx` when the grid is split
    /// into `chunk_count` near-equal chunks.
    pub fn chunk_range(&self, chunk_idx: usize, chunk_count: usize) -> Range<usize> {
        let chunks = chunk_count.max(1);
        let chunk_size = self.len().div_ceil(chunks);
        let start = ((chunk_idx % chunks) * chunk_size).min(self.len());
        let end = (start + chunk_size).min(self.len());
        start..end
    }

    // --- Continuous fields ---

    pub fn field_at(&self, index: usize, field: Field) -> f32 {
        self.floats[index * FLOATS_PER_CELL + field as usize]
    }

    pub fn field(&self, x: i32, y: i32, field: Field) -> f32 {
        self.checked_index(x, y)
            .map(|i| self.field_at(i, field))
            .unwrap_or(0.0)
    }

    /// Clamped raw write. Elevation writes through here skip the land/ocean
    /// re-derivation and are reserved for generation.
    pub(crate) fn write_at(&mut self, index: usize, field: Field, value: f32) {
        self.floats[index * FLOATS_PER_CELL + field as usize] = unit(value);
    }

    pub(crate) fn add_at(&mut self, index: usize, field: Field, delta: f32) {
        let current = self.field_at(index, field);
        self.write_at(index, field, current + delta);
    }

    fn write(&mut self, x: i32, y: i32, field: Field, value: f32) {
        if let Some(i) = self.checked_index(x, y) {
            self.write_at(i, field, value);
        }
    }

    pub fn elevation(&self, x: i32, y: i32) -> f32 {
        self.field(x, y, Field::Elevation)
    }

    pub fn water(&self, x: i32, y: i32) -> f32 {
        self.field(x, y, Field::Water)
    }

    pub fn soil(&self, x: i32, y: i32) -> f32 {
        self.field(x, y, Field::Soil)
    }

    pub fn vegetation(&self, x: i32, y: i32) -> f32 {
        self.field(x, y, Field::Vegetation)
    }

    pub fn temperature(&self, x: i32, y: i32) -> f32 {
        self.field(x, y, Field::Temperature)
    }

    pub fn set_water(&mut self, x: i32, y: i32, value: f32) {
        self.write(x, y, Field::Water, value);
    }

    pub fn set_soil(&mut self, x: i32, y: i32, value: f32) {
        self.write(x, y, Field::Soil, value);
    }

    pub fn set_vegetation(&mut self, x: i32, y: i32, value: f32) {
        self.write(x, y, Field::Vegetation, value);
    }

    pub fn set_temperature(&mut self, x: i32, y: i32, value: f32) {
        self.write(x, y, Field::Temperature, value);
    }

    /// Write elevation, converting the cell between land and ocean when the
    /// write crosses [`LAND_THRESHOLD`].
    pub fn set_elevation(&mut self, x: i32, y: i32, value: f32) {
        let Some(i) = self.checked_index(x, y) else {
            return;
        };
        let was_land = self.is_land_at(i);
        self.write_at(i, Field::Elevation, value);
        match (was_land, self.is_land_at(i)) {
            (true, false) => {
                self.set_biome_at(i, Biome::Ocean);
                self.write_at(i, Field::Water, 1.0);
                self.write_at(i, Field::Soil, 0.0);
                self.write_at(i, Field::Vegetation, 0.0);
            }
            (false, true) => {
                self.set_biome_at(i, Biome::Grassland);
                self.write_at(i, Field::Water, 0.15);
                self.write_at(i, Field::Soil, 0.25);
                self.write_at(i, Field::Vegetation, 0.05);
            }
            _ => {}
        }
    }

    // --- Byte fields ---

    fn byte_at(&self, index: usize, offset: usize) -> u8 {
        self.bytes[index * BYTES_PER_CELL + offset]
    }

    pub fn biome_at(&self, index: usize) -> Biome {
        Biome::from_u8(self.byte_at(index, BYTE_BIOME)).unwrap_or(Biome::Ocean)
    }

    pub fn biome(&self, x: i32, y: i32) -> Biome {
        self.checked_index(x, y)
            .map(|i| self.biome_at(i))
            .unwrap_or(Biome::Ocean)
    }

    pub(crate) fn set_biome_at(&mut self, index: usize, biome: Biome) {
        self.bytes[index * BYTES_PER_CELL + BYTE_BIOME] = biome as u8;
    }

    /// Assign a biome. Returns false (and leaves the cell alone) when the
    /// biome contradicts the cell's elevation.
    pub fn set_biome(&mut self, x: i32, y: i32, biome: Biome) -> bool {
        let Some(i) = self.checked_index(x, y) else {
            return false;
        };
        if (biome == Biome::Ocean) == self.is_land_at(i) {
            return false;
        }
        self.set_biome_at(i, biome);
        true
    }

    pub fn is_protected_at(&self, index: usize) -> bool {
        self.byte_at(index, BYTE_PROTECTED) != 0
    }

    pub fn is_developed_at(&self, index: usize) -> bool {
        self.byte_at(index, BYTE_DEVELOPED) != 0
    }

    pub fn is_protected(&self, x: i32, y: i32) -> bool {
        self.checked_index(x, y)
            .is_some_and(|i| self.is_protected_at(i))
    }

    pub fn is_developed(&self, x: i32, y: i32) -> bool {
        self.checked_index(x, y)
            .is_some_and(|i| self.is_developed_at(i))
    }

    pub(crate) fn set_protected_at(&mut self, index: usize, protected: bool) {
        self.bytes[index * BYTES_PER_CELL + BYTE_PROTECTED] = protected as u8;
    }

    pub(crate) fn set_developed_at(&mut self, index: usize, developed: bool) {
        self.bytes[index * BYTES_PER_CELL + BYTE_DEVELOPED] = developed as u8;
    }

    pub fn set_protected(&mut self, x: i32, y: i32, protected: bool) {
        if let Some(i) = self.checked_index(x, y) {
            self.set_protected_at(i, protected);
        }
    }

    pub fn set_developed(&mut self, x: i32, y: i32, developed: bool) {
        if let Some(i) = self.checked_index(x, y) {
            self.set_developed_at(i, developed);
        }
    }

    // --- Land queries ---

    pub fn is_land_at(&self, index: usize) -> bool {
        self.field_at(index, Field::Elevation) >= LAND_THRESHOLD
    }

    pub fn is_land(&self, x: i32, y: i32) -> bool {
        self.checked_index(x, y).is_some_and(|i| self.is_land_at(i))
    }

    pub fn is_ocean(&self, x: i32, y: i32) -> bool {
        !self.is_land(x, y)
    }

    /// In-bounds 4-neighbors in [`NEIGHBORS4`] order.
    pub fn neighbors4(&self, x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        NEIGHBORS4
            .iter()
            .map(move |&(dx, dy)| (x + dx, y + dy))
            .filter(|&(nx, ny)| self.in_bounds(nx, ny))
    }

    /// In-bounds 8-neighbors, rows top to bottom, columns left to right.
    pub fn neighbors8(&self, x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| (x + dx, y + dy))
            .filter(|&(nx, ny)| self.in_bounds(nx, ny))
    }
}

impl TryFrom<GridRecord> for TileGrid {
    type Error = String;

    fn try_from(record: GridRecord) -> Result<Self, Self::Error> {
        TileGrid::from_buffers(
            record.width as usize,
            record.height as usize,
            record.floats,
            record.bytes,
        )
    }
}

impl From<TileGrid> for GridRecord {
    fn from(grid: TileGrid) -> Self {
        GridRecord {
            width: grid.width as u32,
            height: grid.height as u32,
            floats: grid.floats,
            bytes: grid.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land_grid(width: usize, height: usize) -> TileGrid {
        let mut grid = TileGrid::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                grid.set_elevation(x, y, 0.5);
            }
        }
        grid
    }

    #[test]
    fn new_grid_is_all_ocean() {
        let grid = TileGrid::new(8, 4);
        assert_eq!(grid.len(), 32);
        for y in 0..4 {
            for x in 0..8 {
                assert!(grid.is_ocean(x, y));
                assert_eq!(grid.biome(x, y), Biome::Ocean);
                assert_eq!(grid.water(x, y), 1.0);
            }
        }
    }

    #[test]
    fn raising_ocean_becomes_grassland() {
        let mut grid = TileGrid::new(4, 4);
        grid.set_elevation(1, 2, 0.31);
        assert!(grid.is_land(1, 2));
        assert_eq!(grid.biome(1, 2), Biome::Grassland);
        assert_eq!(grid.water(1, 2), 0.15);
        assert_eq!(grid.soil(1, 2), 0.25);
        assert_eq!(grid.vegetation(1, 2), 0.05);
    }

    #[test]
    fn lowering_land_becomes_ocean() {
        let mut grid = land_grid(4, 4);
        grid.set_soil(2, 2, 0.9);
        grid.set_vegetation(2, 2, 0.8);
        grid.set_elevation(2, 2, 0.1);
        assert!(grid.is_ocean(2, 2));
        assert_eq!(grid.biome(2, 2), Biome::Ocean);
        assert_eq!(grid.water(2, 2), 1.0);
        assert_eq!(grid.soil(2, 2), 0.0);
        assert_eq!(grid.vegetation(2, 2), 0.0);
    }

    #[test]
    fn elevation_change_without_crossing_keeps_fields() {
        let mut grid = land_grid(4, 4);
        grid.set_vegetation(0, 0, 0.7);
        grid.set_elevation(0, 0, 0.9);
        assert_eq!(grid.vegetation(0, 0), 0.7);
        assert_eq!(grid.biome(0, 0), Biome::Grassland);
    }

    #[test]
    fn writes_are_clamped_and_nan_sanitized() {
        let mut grid = land_grid(2, 2);
        grid.set_water(0, 0, 3.0);
        grid.set_soil(0, 0, -1.0);
        grid.set_vegetation(0, 0, f32::NAN);
        assert_eq!(grid.water(0, 0), 1.0);
        assert_eq!(grid.soil(0, 0), 0.0);
        assert_eq!(grid.vegetation(0, 0), 0.0);
    }

    #[test]
    fn set_biome_refuses_contradicting_elevation() {
        let mut grid = TileGrid::new(3, 3);
        assert!(!grid.set_biome(1, 1, Biome::Forest));
        assert_eq!(grid.biome(1, 1), Biome::Ocean);

        grid.set_elevation(1, 1, 0.6);
        assert!(!grid.set_biome(1, 1, Biome::Ocean));
        assert!(grid.set_biome(1, 1, Biome::Jungle));
        assert_eq!(grid.biome(1, 1), Biome::Jungle);
    }

    #[test]
    fn neighbors4_fixed_order_and_edges() {
        let grid = TileGrid::new(5, 5);
        let inner: Vec<_> = grid.neighbors4(2, 2).collect();
        assert_eq!(inner, vec![(1, 2), (3, 2), (2, 1), (2, 3)]);

        let corner: Vec<_> = grid.neighbors4(0, 0).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1)]);
    }

    #[test]
    fn neighbors8_row_major_order() {
        let grid = TileGrid::new(5, 5);
        let inner: Vec<_> = grid.neighbors8(2, 2).collect();
        assert_eq!(
            inner,
            vec![(1, 1), (2, 1), (3, 1), (1, 2), (3, 2), (1, 3), (2, 3), (3, 3)]
        );
        assert_eq!(grid.neighbors8(4, 4).count(), 3);
    }

    #[test]
    fn chunks_partition_the_grid() {
        let grid = TileGrid::new(13, 7);
        let mut covered = vec![0u8; grid.len()];
        for chunk in 0..10 {
            for i in grid.chunk_range(chunk, 10) {
                covered[i] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn chunk_index_wraps() {
        let grid = TileGrid::new(16, 16);
        assert_eq!(grid.chunk_range(12, 10), grid.chunk_range(2, 10));
    }

    #[test]
    fn from_buffers_rejects_bad_lengths() {
        let grid = TileGrid::new(4, 4);
        let err = TileGrid::from_buffers(4, 4, vec![0.0; 3], grid.bytes().to_vec()).unwrap_err();
        assert!(err.contains("float buffer"));

        let err = TileGrid::from_buffers(4, 4, grid.floats().to_vec(), vec![0; 5]).unwrap_err();
        assert!(err.contains("byte buffer"));
    }

    #[test]
    fn from_buffers_rejects_unknown_biome() {
        let grid = TileGrid::new(2, 2);
        let mut bytes = grid.bytes().to_vec();
        bytes[3] = 42;
        let err = TileGrid::from_buffers(2, 2, grid.floats().to_vec(), bytes).unwrap_err();
        assert!(err.contains("biome"));
    }

    #[test]
    fn json_export_uses_flat_buffers() {
        let grid = land_grid(3, 2);
        let value = serde_json::to_value(&grid).unwrap();
        assert_eq!(value["width"], 3);
        assert_eq!(value["height"], 2);
        assert_eq!(value["floats"].as_array().unwrap().len(), 30);
        assert_eq!(value["bytes"].as_array().unwrap().len(), 18);

        let restored: TileGrid = serde_json::from_value(value).unwrap();
        assert_eq!(restored, grid);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside")]
    fn out_of_bounds_read_panics_in_debug() {
        let grid = TileGrid::new(4, 4);
        grid.water(4, 0);
    }
}
