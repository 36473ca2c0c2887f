use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::world::animal::{AnimalId, Sex};
use crate::world::species::{Species, SpeciesId, SpeciesTable};
use crate::world::tile::{Field, TileGrid};
use crate::world::Island;

pub const EVENT_CHECK_INTERVAL: u64 = 500;
pub const EVENT_COOLDOWN: u64 = 1000;

const MIGRATION_PROBABILITY: f32 = 0.12;
const BLOOM_PROBABILITY: f32 = 0.10;
const DISEASE_PROBABILITY: f32 = 0.06;
const FERTILE_RAIN_PROBABILITY: f32 = 0.08;
const EVENT_KINDS: f32 = 4.0;

/// A random ecological event that fired this tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EcoEvent {
    Migration { species: SpeciesId, arrived: u32 },
    Bloom { x: i32, y: i32, radius: i32, tiles: u32 },
    Disease { species: SpeciesId, affected: u32 },
    FertileRains { tiles: u32 },
}

/// Roll for a random event on check ticks outside the cooldown.
///
/// At most one event is chosen per check. Choosing an event starts the
/// cooldown even when it turns out to have nothing to act on, in which case
/// `None` is returned.
pub fn check_events(
    island: &mut Island,
    species: &SpeciesTable,
    max_animals: u32,
    rng: &mut ChaCha8Rng,
) -> Option<EcoEvent> {
    let tick = island.tick_count;
    if tick % EVENT_CHECK_INTERVAL != 0 {
        return None;
    }
    if island
        .last_event_tick
        .is_some_and(|last| tick.saturating_sub(last) < EVENT_COOLDOWN)
    {
        return None;
    }

    if rng.r#gen::<f32>() < MIGRATION_PROBABILITY / EVENT_KINDS {
        island.last_event_tick = Some(tick);
        return migration(island, species, max_animals, rng);
    }
    if rng.r#gen::<f32>() < BLOOM_PROBABILITY / EVENT_KINDS {
        island.last_event_tick = Some(tick);
        return Some(bloom(&mut island.grid, rng));
    }
    if rng.r#gen::<f32>() < DISEASE_PROBABILITY / EVENT_KINDS {
        island.last_event_tick = Some(tick);
        return disease(island, rng);
    }
    if rng.r#gen::<f32>() < FERTILE_RAIN_PROBABILITY / EVENT_KINDS {
        island.last_event_tick = Some(tick);
        return Some(fertile_rains(&mut island.grid));
    }
    None
}

/// 3-7 animals of one random species arrive on vegetated land.
pub fn migration(
    island: &mut Island,
    species: &SpeciesTable,
    max_animals: u32,
    rng: &mut ChaCha8Rng,
) -> Option<EcoEvent> {
    let all: Vec<_> = species.iter().collect();
    if all.is_empty() {
        return None;
    }
    let kind = all[rng.gen_range(0..all.len())];
    let count = rng.gen_range(3..8);

    let grid = &island.grid;
    let mut sites = Vec::new();
    for y in (0..grid.height() as i32).step_by(4) {
        for x in (0..grid.width() as i32).step_by(4) {
            if grid.is_land(x, y) && grid.vegetation(x, y) > 0.1 {
                sites.push((x, y));
            }
        }
    }
    if sites.is_empty() {
        return None;
    }

    let mut arrived = 0;
    for _ in 0..count {
        let (x, y) = sites[rng.gen_range(0..sites.len())];
        let pos = Vec2::new(x as f32 + rng.r#gen::<f32>(), y as f32 + rng.r#gen::<f32>());
        if spawn_newcomer(island, kind, pos, max_animals, rng).is_some() {
            arrived += 1;
        }
    }
    Some(EcoEvent::Migration {
        species: kind.id,
        arrived,
    })
}

/// Place one animal with randomized starting energy and sex.
pub fn spawn_newcomer(
    island: &mut Island,
    species: &Species,
    pos: Vec2,
    max_animals: u32,
    rng: &mut ChaCha8Rng,
) -> Option<AnimalId> {
    let energy = 0.5 + rng.r#gen::<f32>() * 0.3;
    let sex = if rng.gen_bool(0.5) { Sex::Female } else { Sex::Male };
    island.spawn_animal(species, pos, energy, sex, max_animals)
}

/// Vegetation and soil boost on land within a random disc.
pub fn bloom(grid: &mut TileGrid, rng: &mut ChaCha8Rng) -> EcoEvent {
    let cx = rng.gen_range(0..grid.width().max(1)) as i32;
    let cy = rng.gen_range(0..grid.height().max(1)) as i32;
    let radius = rng.gen_range(10..25);
    let mut tiles = 0;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let Some(i) = grid.index(cx + dx, cy + dy) else {
                continue;
            };
            if !grid.is_land_at(i) {
                continue;
            }
            grid.add_at(i, Field::Vegetation, 0.15);
            grid.add_at(i, Field::Soil, 0.05);
            tiles += 1;
        }
    }
    EcoEvent::Bloom {
        x: cx,
        y: cy,
        radius,
        tiles,
    }
}

/// Sickness in the most populous species once it is large enough.
pub fn disease(island: &mut Island, rng: &mut ChaCha8Rng) -> Option<EcoEvent> {
    if island.animals.len() < 10 {
        return None;
    }
    let mut counts = std::collections::BTreeMap::new();
    for (_, animal) in island.animals.iter() {
        *counts.entry(animal.species).or_insert(0u32) += 1;
    }
    // first species wins ties
    let (target, largest) = counts
        .iter()
        .fold(None, |best: Option<(SpeciesId, u32)>, (&id, &n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((id, n)),
        })?;
    if largest < 8 {
        return None;
    }

    let mut affected = 0;
    for animal in island.animals.iter_mut() {
        if animal.species == target && rng.r#gen::<f32>() < 0.4 {
            animal.energy = (animal.energy - 0.3).max(0.0);
            animal.hunger = (animal.hunger + 0.2).min(1.0);
            affected += 1;
        }
    }
    Some(EcoEvent::Disease {
        species: target,
        affected,
    })
}

/// Water and soil top-up on every land cell with even coordinates.
pub fn fertile_rains(grid: &mut TileGrid) -> EcoEvent {
    let mut tiles = 0;
    for y in (0..grid.height() as i32).step_by(2) {
        for x in (0..grid.width() as i32).step_by(2) {
            let Some(i) = grid.index(x, y) else {
                continue;
            };
            if !grid.is_land_at(i) {
                continue;
            }
            grid.add_at(i, Field::Water, 0.08);
            grid.add_at(i, Field::Soil, 0.03);
            tiles += 1;
        }
    }
    EcoEvent::FertileRains { tiles }
}
