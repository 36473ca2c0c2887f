pub mod animal;
pub mod calendar;
pub mod generation;
pub mod policy;
pub mod species;
pub mod structures;
pub mod terraform;
pub mod tile;
pub mod weather;
pub mod zones;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::generation::GenerationParams;
use crate::simulation::notables::Notables;
use crate::simulation::statistics::{compute_stats, IslandStats};
pub use animal::{Animal, AnimalArena, AnimalId, BehaviorState, DeathCause, Sex};
pub use calendar::{Calendar, Season};
pub use policy::Governance;
pub use species::{Diet, Species, SpeciesId, SpeciesTable};
pub use structures::{Structure, StructureId, StructureKind, Structures};
pub use tile::{Biome, Field, TileGrid, LAND_THRESHOLD};
pub use weather::{WeatherKind, WeatherState};
pub use zones::ZoneManager;

/// Complete session state of one island.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Island {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub generation_params: GenerationParams,
    pub tick_count: u64,
    pub calendar: Calendar,
    pub grid: TileGrid,
    pub animals: AnimalArena,
    pub weather: WeatherState,
    pub governance: Governance,
    pub zones: ZoneManager,
    pub structures: Structures,
    pub notables: Notables,
    /// Predator kills since the current in-game day began.
    pub kills_today: u32,
    pub last_event_tick: Option<u64>,
    #[serde(skip)]
    pub stats: IslandStats,
}

impl Island {
    /// Wrap a grid in a fresh session with default policy, weather and calendar.
    pub fn new(id: Uuid, name: String, generation_params: GenerationParams, grid: TileGrid) -> Self {
        let mut island = Island {
            id,
            name,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
                .to_string(),
            generation_params,
            tick_count: 0,
            calendar: Calendar::default(),
            grid,
            animals: AnimalArena::new(),
            weather: WeatherState::default(),
            governance: Governance::default(),
            zones: ZoneManager::default(),
            structures: Structures::default(),
            notables: Notables::default(),
            kills_today: 0,
            last_event_tick: None,
            stats: IslandStats::default(),
        };
        island.refresh_stats();
        island
    }

    /// Recompute cached derived state after loading or external edits.
    pub fn refresh_stats(&mut self) {
        self.animals.reindex();
        self.stats = compute_stats(self);
    }

    /// Place a new animal if the population is below `max_animals` and the
    /// position lies on the grid.
    pub fn spawn_animal(
        &mut self,
        species: &Species,
        pos: Vec2,
        energy: f32,
        sex: Sex,
        max_animals: u32,
    ) -> Option<AnimalId> {
        if self.animals.len() >= max_animals as usize {
            return None;
        }
        let (x, y) = (pos.x.floor() as i32, pos.y.floor() as i32);
        if !pos.is_finite() || !self.grid.in_bounds(x, y) {
            return None;
        }
        let id = self.animals.allocate_id();
        self.animals
            .insert(Animal::new(id, species.id, pos, energy, sex));
        Some(id)
    }
}
