use std::collections::BTreeMap;

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::config::generation::GenerationParams;
use crate::world::animal::Sex;
use crate::world::species::SpeciesTable;
use crate::world::tile::*;
use crate::world::Island;

/// Cells carved by one river, source first.
#[derive(Debug, Clone, PartialEq)]
pub struct RiverPath {
    pub cells: Vec<(i32, i32)>,
    pub reached_ocean: bool,
}

#[derive(Debug, Clone)]
pub struct GeneratedTerrain {
    pub grid: TileGrid,
    pub rivers: Vec<RiverPath>,
}

/// River step directions: orthogonal first, then diagonal.
const RIVER_DIRS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

const RIVER_SOURCE_MIN_ELEVATION: f32 = 0.4;
const RIVER_SOURCE_MARGIN: usize = 10;
const RIVER_SOURCE_SPACING: i32 = 8;

/// Generate a terrain grid with the default island shape for `seed`.
pub fn generate(seed: u64) -> TileGrid {
    generate_grid(&GenerationParams::with_seed(seed)).grid
}

/// Generate terrain and rivers. The same parameters always produce the
/// same grid, including seed 0.
pub fn generate_grid(params: &GenerationParams) -> GeneratedTerrain {
    let width = params.width as usize;
    let height = params.height as usize;
    let mut grid = TileGrid::new(width, height);
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    shape_terrain(&mut grid, params);
    assign_biomes(&mut grid, &mut rng);
    let rivers = carve_rivers(&mut grid, params);

    GeneratedTerrain { grid, rivers }
}

/// Generate a complete island session: terrain, rivers and the initial
/// animal population.
///
/// If `params.seed` is 0, a random seed is chosen. The actual seed used
/// is stored in the returned island's `generation_params`.
pub fn generate_island(params: &GenerationParams, species: &SpeciesTable, max_animals: u32) -> Island {
    let seed = if params.seed == 0 {
        rand::thread_rng().r#gen()
    } else {
        params.seed
    };
    let resolved_params = GenerationParams {
        seed,
        ..params.clone()
    };

    let terrain = generate_grid(&resolved_params);
    let mut id_rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(77));
    let id = Uuid::from_bytes(id_rng.r#gen());

    let spawn = resolved_params.spawn_animals;
    let mut island = Island::new(id, format!("Island-{}", seed), resolved_params, terrain.grid);
    if spawn {
        seed_animals(&mut island, species, seed, max_animals);
        island.refresh_stats();
    }
    island
}

fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32) -> f64 {
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut sum = 0.0;
    let mut norm = 0.0;
    for _ in 0..octaves {
        sum += amplitude * noise.get([x * frequency, y * frequency]);
        norm += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    if norm > 0.0 { sum / norm } else { 0.0 }
}

/// Perlin takes a 32-bit seed; fold the high half in so every bit counts.
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

fn smoothstep(f: f32) -> f32 {
    f * f * (3.0 - 2.0 * f)
}

/// Elevation with radial falloff and coast detail, plus altitude-cooled temperature.
/// Moisture is kept in the water channel until biomes are assigned.
fn shape_terrain(grid: &mut TileGrid, params: &GenerationParams) {
    let base_seed = fold_seed(params.seed);
    let elevation_noise = Perlin::new(base_seed);
    let moisture_noise = Perlin::new(base_seed.wrapping_add(1000));
    let temperature_noise = Perlin::new(base_seed.wrapping_add(2000));

    let (width, height) = (grid.width(), grid.height());
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let max_dist = cx.min(cy) * params.falloff_radius;

    for i in 0..grid.len() {
        let (x, y) = grid.coords(i);
        let nx = x as f64 / width as f64;
        let ny = y as f64 / height as f64;

        let mut e = ((fbm(&elevation_noise, nx * 4.0, ny * 4.0, 4) + 1.0) * 0.5) as f32;
        let dist = (x as f32 - cx).hypot(y as f32 - cy);
        let falloff = (1.0 - dist / max_dist).max(0.0);
        e *= smoothstep(falloff);
        e += fbm(&elevation_noise, nx * 8.0, ny * 8.0, 2) as f32 * 0.05;
        let e = e.clamp(0.0, 1.0);

        let m = ((fbm(&moisture_noise, nx * 3.0, ny * 3.0, 3) + 1.0) * 0.5) as f32;

        let mut t = ((fbm(&temperature_noise, nx * 2.0, ny * 2.0, 2) + 1.0) * 0.5) as f32;
        t = 0.3 + t * 0.5;
        if e > LAND_THRESHOLD {
            t -= (e - LAND_THRESHOLD) * 0.3;
        }

        grid.write_at(i, Field::Elevation, e);
        grid.write_at(i, Field::Water, m);
        grid.write_at(i, Field::Temperature, t.clamp(0.05, 0.95));
    }
}

fn classify(temperature: f32, moisture: f32) -> Biome {
    if temperature < 0.3 {
        Biome::Tundra
    } else if temperature > 0.65 && moisture > 0.5 {
        Biome::Jungle
    } else if moisture > 0.55 && temperature < 0.65 {
        Biome::Forest
    } else if moisture < 0.35 && temperature > 0.55 {
        Biome::Desert
    } else {
        Biome::Grassland
    }
}

/// Soil and vegetation ranges seeded on a freshly classified cell.
fn initial_cover(biome: Biome, r: f32) -> (f32, f32) {
    match biome {
        Biome::Ocean => (0.0, 0.0),
        Biome::Tundra => (0.15 + r * 0.15, 0.05 + r * 0.15),
        Biome::Jungle => (0.7 + r * 0.25, 0.6 + r * 0.35),
        Biome::Forest => (0.6 + r * 0.3, 0.5 + r * 0.4),
        Biome::Desert => (0.1 + r * 0.15, r * 0.1),
        Biome::Grassland => (0.4 + r * 0.3, 0.3 + r * 0.3),
    }
}

fn assign_biomes(grid: &mut TileGrid, rng: &mut ChaCha8Rng) {
    for i in 0..grid.len() {
        if !grid.is_land_at(i) {
            grid.set_biome_at(i, Biome::Ocean);
            grid.write_at(i, Field::Water, 1.0);
            grid.write_at(i, Field::Soil, 0.0);
            grid.write_at(i, Field::Vegetation, 0.0);
            continue;
        }
        let moisture = grid.field_at(i, Field::Water);
        let biome = classify(grid.field_at(i, Field::Temperature), moisture);
        let (soil, vegetation) = initial_cover(biome, rng.r#gen::<f32>());
        grid.set_biome_at(i, biome);
        grid.write_at(i, Field::Water, moisture * 0.3);
        grid.write_at(i, Field::Soil, soil);
        grid.write_at(i, Field::Vegetation, vegetation);
    }
}

/// Highest land samples on a stride-4 lattice, away from the border and
/// from each other.
fn river_sources(grid: &TileGrid, count: usize) -> Vec<(i32, i32)> {
    let (width, height) = (grid.width(), grid.height());
    if width <= 2 * RIVER_SOURCE_MARGIN || height <= 2 * RIVER_SOURCE_MARGIN {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for y in (RIVER_SOURCE_MARGIN..height - RIVER_SOURCE_MARGIN).step_by(4) {
        for x in (RIVER_SOURCE_MARGIN..width - RIVER_SOURCE_MARGIN).step_by(4) {
            let (x, y) = (x as i32, y as i32);
            let h = grid.elevation(x, y);
            if grid.is_land(x, y) && h >= RIVER_SOURCE_MIN_ELEVATION {
                candidates.push((h, x, y));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut sources: Vec<(i32, i32)> = Vec::new();
    for (_, x, y) in candidates {
        if sources.len() >= count {
            break;
        }
        let spaced = sources.iter().all(|&(sx, sy)| {
            (sx - x).abs() > RIVER_SOURCE_SPACING || (sy - y).abs() > RIVER_SOURCE_SPACING
        });
        if spaced {
            sources.push((x, y));
        }
    }
    sources
}

fn carve_rivers(grid: &mut TileGrid, params: &GenerationParams) -> Vec<RiverPath> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(5000));
    let span = params.river_count_max.saturating_sub(params.river_count_min) + 1;
    let count = params.river_count_min + rng.gen_range(0..span);

    river_sources(grid, count as usize)
        .into_iter()
        .map(|source| carve_river(grid, source, params.river_max_steps, &mut rng))
        .collect()
}

fn carve_river(
    grid: &mut TileGrid,
    source: (i32, i32),
    max_steps: u32,
    rng: &mut ChaCha8Rng,
) -> RiverPath {
    let mut visited = vec![false; grid.len()];
    let mut cells = Vec::new();
    let mut reached_ocean = false;
    let (mut x, mut y) = source;

    for _ in 0..max_steps {
        let Some(i) = grid.index(x, y) else {
            break;
        };
        if !grid.is_land_at(i) {
            reached_ocean = true;
            break;
        }
        visited[i] = true;
        cells.push((x, y));

        grid.add_at(i, Field::Water, 0.4);
        let h = grid.field_at(i, Field::Elevation);
        grid.write_at(i, Field::Elevation, (h - 0.01).max(LAND_THRESHOLD));
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(n) = grid.index(x + dx, y + dy) {
                    if grid.is_land_at(n) {
                        grid.add_at(n, Field::Soil, 0.1);
                        grid.add_at(n, Field::Water, 0.15);
                    }
                }
            }
        }

        let current = grid.field_at(i, Field::Elevation);
        let open: Vec<(i32, i32, f32)> = RIVER_DIRS
            .iter()
            .filter_map(|&(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                let n = grid.index(nx, ny)?;
                (!visited[n]).then(|| (nx, ny, grid.field_at(n, Field::Elevation)))
            })
            .collect();
        if open.is_empty() {
            break;
        }

        let lowest = open
            .iter()
            .copied()
            .fold(None::<(i32, i32, f32)>, |best, c| match best {
                Some(b) if b.2 <= c.2 => Some(b),
                _ => Some(c),
            });
        (x, y) = match lowest {
            Some((nx, ny, h)) if h < current => (nx, ny),
            _ => {
                let (nx, ny, _) = open[rng.gen_range(0..open.len())];
                (nx, ny)
            }
        };
    }

    RiverPath {
        cells,
        reached_ocean,
    }
}

/// Scatter each species' initial population over well-vegetated land.
fn seed_animals(island: &mut Island, species: &SpeciesTable, seed: u64, max_animals: u32) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(999));
    let habitat: Vec<(i32, i32)> = (0..island.grid.len())
        .filter(|&i| island.grid.is_land_at(i) && island.grid.field_at(i, Field::Vegetation) > 0.2)
        .map(|i| island.grid.coords(i))
        .collect();
    if habitat.is_empty() {
        return;
    }

    for s in species.iter() {
        for _ in 0..s.initial_count {
            let (x, y) = habitat[rng.gen_range(0..habitat.len())];
            let pos = Vec2::new(x as f32 + rng.r#gen::<f32>(), y as f32 + rng.r#gen::<f32>());
            let energy = 0.5 + rng.r#gen::<f32>() * 0.3;
            let sex = if rng.gen_bool(0.5) { Sex::Female } else { Sex::Male };
            if island.spawn_animal(s, pos, energy, sex, max_animals).is_none() {
                return;
            }
        }
    }
}

/// Print a summary of the generated island.
pub fn print_island_summary(island: &Island, species: &SpeciesTable) {
    println!("=== Island Summary ===");
    println!("Name: {}", island.name);
    println!(
        "Grid: {}x{} ({} cells)",
        island.grid.width(),
        island.grid.height(),
        island.grid.len()
    );
    println!("Seed: {}", island.generation_params.seed);
    println!("Tick: {}", island.tick_count);

    let mut biome_counts: BTreeMap<Biome, u32> = BTreeMap::new();
    for i in 0..island.grid.len() {
        *biome_counts.entry(island.grid.biome_at(i)).or_insert(0) += 1;
    }
    println!("\nBiomes:");
    let total = island.grid.len().max(1) as f32;
    for (biome, count) in &biome_counts {
        let pct = *count as f32 / total * 100.0;
        println!("  {:<12} {:>6} ({:.1}%)", biome.name(), count, pct);
    }

    println!("\nAnimals: {}", island.animals.len());
    for (id, count) in &island.stats.population {
        let name = species.get(*id).map(|s| s.name.as_str()).unwrap_or("?");
        println!("  {:<12} {:>5}", name, count);
    }
}
