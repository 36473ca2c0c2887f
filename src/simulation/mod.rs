pub mod animals;
pub mod climate;
pub mod crisis;
pub mod driver;
pub mod events;
pub mod governance;
pub mod notables;
pub mod rng;
pub mod soil;
pub mod statistics;
pub mod vegetation;
pub mod water;
pub mod weather;

use std::ops::Range;
use std::time::Instant;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::simulation::TickParams;
use crate::simulation::animals::{AnimalContext, DeathTally};
use crate::simulation::events::EcoEvent;
use crate::simulation::notables::{NamePools, NotableEvent};
use crate::simulation::rng::{stream_rng, stream_seed, Stream};
use crate::simulation::statistics::{assess_risks, IslandStats, RiskWarning};
use crate::world::animal::{AnimalId, Sex};
use crate::world::species::{SpeciesId, SpeciesTable};
use crate::world::structures::{StructureId, StructureKind};
use crate::world::weather::WeatherKind;
use crate::world::Island;

/// Result of executing a single tick.
#[derive(Debug, Clone)]
pub struct TickResult {
    pub tick: u64,
    pub chunk: Range<usize>,
    pub weather_changed: Option<WeatherKind>,
    pub crisis_severity: f32,
    pub births: u32,
    pub deaths: DeathTally,
    pub event: Option<EcoEvent>,
    /// Naming, milestone and obituary stories from the daily notables pass.
    pub stories: Vec<NotableEvent>,
    /// Present on ticks where statistics were recomputed.
    pub stats: Option<IslandStats>,
    pub warnings: Vec<RiskWarning>,
    /// Phase timings in ms: [Environment, Animals, Events + Statistics]
    pub phase_timings_ms: [f32; 3],
}

/// Execute a single simulation tick on the island.
///
/// Advances the calendar, runs the environmental processes over this tick's
/// chunk of the grid, then the agent pass over every animal, then random
/// events and the daily notables pass. Statistics and collapse warnings are
/// refreshed every `stats_interval` ticks.
pub fn execute_tick(
    island: &mut Island,
    species: &SpeciesTable,
    names: &NamePools,
    params: &TickParams,
) -> TickResult {
    let tick_start = Instant::now();
    let mut phase_timings = [0.0_f32; 3];

    island.tick_count += 1;
    let tick = island.tick_count;
    let seed = island.generation_params.seed;
    let step = island
        .calendar
        .advance(params.ticks_per_day, params.days_per_season);
    if step.new_day {
        island.kills_today = 0;
    }
    if step.new_season {
        info!(tick, season = ?island.calendar.season, year = island.calendar.year, "Season changed");
    }

    let chunk_count = params.chunk_count.max(1) as usize;
    let chunk = island
        .grid
        .chunk_range((tick % chunk_count as u64) as usize, chunk_count);
    let severity = crisis::severity(island.stats.ocean_ratio, params.water_crisis_threshold);
    let recovery = 1.0 - severity;

    // Phase 1: environment over the chunk
    let env_start = Instant::now();
    let season = island.calendar.season;
    climate::apply_climate(&mut island.grid, chunk.clone(), season);

    let mut weather_rng = stream_rng(seed, tick, Stream::Weather);
    let weather_changed = weather::update_weather(&mut island.weather, season, &mut weather_rng);
    if let Some(kind) = weather_changed {
        info!(tick, weather = ?kind, remaining = island.weather.remaining, "Weather changed");
    }
    weather::apply_weather(&mut island.grid, chunk.clone(), &island.weather, &mut weather_rng);

    water::apply_water(&mut island.grid, chunk.clone());
    soil::apply_soil(&mut island.grid, chunk.clone(), &island.governance, recovery);
    vegetation::apply_vegetation(&mut island.grid, chunk.clone(), &island.governance, recovery);

    let mut governance_rng = stream_rng(seed, tick, Stream::Governance);
    let land_use = governance::apply_land_use(
        &mut island.grid,
        chunk.clone(),
        &island.governance,
        &mut governance_rng,
    );
    if land_use.developed > 0 || land_use.restored > 0 {
        debug!(
            tick,
            developed = land_use.developed,
            restored = land_use.restored,
            "Land use changed"
        );
    }
    island.structures.simulate(&mut island.grid);
    crisis::apply_crisis(&mut island.grid, chunk.clone(), severity);
    phase_timings[0] = env_start.elapsed().as_secs_f32() * 1000.0;

    // Phase 2: agents
    let animals_start = Instant::now();
    let ctx = AnimalContext {
        species,
        new_day: step.new_day,
        crisis: severity,
        max_animals: params.max_animals,
    };
    let mut animal_rng = stream_rng(seed, tick, Stream::Animals);
    let report = animals::simulate_animals(island, &ctx, &mut animal_rng);
    if report.skipped > 0 {
        warn!(tick, skipped = report.skipped, "Animals with unknown species skipped");
    }
    for &hunter in &report.hunters {
        island.notables.record_kill(hunter);
    }
    for &parent in &report.parents {
        island.notables.record_birth(parent);
    }
    phase_timings[1] = animals_start.elapsed().as_secs_f32() * 1000.0;

    // Phase 3: events and statistics
    let stats_start = Instant::now();
    let event = if params.random_events {
        let mut event_rng = stream_rng(seed, tick, Stream::Events);
        events::check_events(island, species, params.max_animals, &mut event_rng)
    } else {
        None
    };
    if let Some(event) = &event {
        info!(tick, event = ?event, "Eco event");
        if let EcoEvent::Disease { species: struck, .. } = event {
            island.notables.record_event_survival(*struck, &island.animals);
        }
    }

    let stories = if step.new_day {
        let mut notables_rng = stream_rng(seed, tick, Stream::Notables);
        island
            .notables
            .update(&island.animals, species, names, &mut notables_rng)
    } else {
        Vec::new()
    };
    for story in &stories {
        info!(tick, story = ?story, "Notable");
    }

    let mut stats = None;
    let mut warnings = Vec::new();
    if tick % params.stats_interval.max(1) as u64 == 0 {
        island.refresh_stats();
        let next_severity =
            crisis::severity(island.stats.ocean_ratio, params.water_crisis_threshold);
        if next_severity > 0.0 && severity == 0.0 {
            warn!(
                tick,
                ocean_ratio = island.stats.ocean_ratio,
                severity = next_severity,
                "Water crisis began"
            );
        } else if next_severity == 0.0 && severity > 0.0 {
            info!(tick, ocean_ratio = island.stats.ocean_ratio, "Water crisis ended");
        }
        warnings = assess_risks(&island.stats);
        for warning in &warnings {
            warn!(
                tick,
                kind = ?warning.kind,
                severity = warning.severity,
                "{}",
                warning.message
            );
        }
        stats = Some(island.stats.clone());
    }
    phase_timings[2] = stats_start.elapsed().as_secs_f32() * 1000.0;

    debug!(
        tick,
        chunk_start = chunk.start,
        chunk_end = chunk.end,
        animals = island.animals.len(),
        births = report.births,
        deaths = report.deaths.total(),
        crisis = severity,
        elapsed_ms = tick_start.elapsed().as_secs_f32() * 1000.0,
        "Tick complete"
    );

    TickResult {
        tick,
        chunk,
        weather_changed,
        crisis_severity: severity,
        births: report.births,
        deaths: report.deaths,
        event,
        stories,
        stats,
        warnings,
        phase_timings_ms: phase_timings,
    }
}

/// One running island session: state, the species it was built with and
/// the engine parameters.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub island: Island,
    pub species: SpeciesTable,
    pub params: TickParams,
    names: NamePools,
    spawns: u64,
}

impl Simulation {
    pub fn new(mut island: Island, species: SpeciesTable, params: TickParams) -> Self {
        island.refresh_stats();
        Simulation {
            island,
            species,
            params,
            names: NamePools::default(),
            spawns: 0,
        }
    }

    /// Replace the built-in notable name pools.
    pub fn with_names(mut self, names: NamePools) -> Self {
        self.names = names;
        self
    }

    pub fn advance(&mut self) -> TickResult {
        execute_tick(&mut self.island, &self.species, &self.names, &self.params)
    }

    /// Build a structure centred on (x, y). Returns `None` when the footprint
    /// leaves the grid, touches ocean or developed land, or the island is full.
    pub fn place_structure(&mut self, kind: StructureKind, x: i32, y: i32) -> Option<StructureId> {
        let id = self.island.structures.place(&mut self.island.grid, kind, x, y)?;
        info!(tick = self.island.tick_count, structure = kind.name(), x, y, "Structure built");
        Some(id)
    }

    /// Add an animal at (x, y). Returns `None` for an unknown species, a
    /// position off the grid, or a full population.
    pub fn create_agent(&mut self, species_id: SpeciesId, x: f32, y: f32) -> Option<AnimalId> {
        let species = self.species.get(species_id)?;
        let seed = stream_seed(
            self.island.generation_params.seed,
            self.island.tick_count,
            Stream::Spawn,
        )
        .wrapping_add(self.spawns);
        self.spawns += 1;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let energy = 0.5 + rng.r#gen::<f32>() * 0.3;
        let sex = if rng.gen_bool(0.5) { Sex::Female } else { Sex::Male };
        self.island.spawn_animal(
            species,
            Vec2::new(x, y),
            energy,
            sex,
            self.params.max_animals,
        )
    }

    /// Recompute statistics now rather than waiting for the next interval.
    pub fn compute_stats(&mut self) -> &IslandStats {
        self.island.refresh_stats();
        &self.island.stats
    }
}
