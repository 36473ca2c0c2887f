use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::simulation::SimulationConfig;
use crate::persistence;
use crate::simulation::driver::FixedStepDriver;
use crate::simulation::statistics::{assess_risks, eco_score, EcoRating, IslandStats, RiskWarning};
use crate::simulation::{Simulation, TickResult};
use crate::world::structures::MAX_STRUCTURES;
use crate::world::{
    Calendar, Governance, Island, SpeciesTable, Structure, StructureKind, WeatherState,
};

/// Species table named by the config, or the built-in four.
pub fn load_species(config: &SimulationConfig) -> Result<SpeciesTable, String> {
    match &config.species_file {
        Some(path) => SpeciesTable::from_file(Path::new(path)),
        None => Ok(SpeciesTable::default()),
    }
}

/// Load the island to run: an explicit snapshot or the newest valid one.
fn load_island(config: &SimulationConfig, world_path: Option<&str>) -> Result<Island, String> {
    match world_path {
        Some(path) => {
            eprintln!("Loading island from {}", path);
            persistence::load_snapshot(Path::new(path))
                .map_err(|e| format!("Failed to load snapshot: {}", e))
        }
        None => {
            eprintln!("Loading latest snapshot from {}", config.snapshot_directory);
            persistence::load_latest_valid_snapshot(Path::new(&config.snapshot_directory))
                .map_err(|e| format!("Failed to load snapshot: {}", e))
        }
    }
}

/// Periodic snapshot writer shared by both run modes.
struct Autosave {
    dir: PathBuf,
    interval: u32,
    max_snapshots: usize,
    ticks_since: u32,
    last_saved_tick: Option<u64>,
}

impl Autosave {
    fn new(config: &SimulationConfig) -> Self {
        Autosave {
            dir: PathBuf::from(&config.snapshot_directory),
            interval: config.snapshot_interval,
            max_snapshots: config.max_snapshots as usize,
            ticks_since: 0,
            last_saved_tick: None,
        }
    }

    fn after_tick(&mut self, island: &Island) {
        self.ticks_since += 1;
        if self.interval == 0 || self.ticks_since < self.interval {
            return;
        }
        if self.save(island) {
            self.prune();
        }
    }

    fn prune(&self) {
        if let Err(e) = persistence::prune_snapshots(&self.dir, self.max_snapshots) {
            eprintln!("Warning: snapshot pruning failed: {}", e);
        }
    }

    fn save(&mut self, island: &Island) -> bool {
        match persistence::save_snapshot(island, &self.dir) {
            Ok(path) => {
                self.ticks_since = 0;
                self.last_saved_tick = Some(island.tick_count);
                eprintln!("Snapshot saved: {}", path.display());
                true
            }
            Err(e) => {
                eprintln!("Warning: snapshot save failed: {}", e);
                false
            }
        }
    }

    fn finish(&mut self, island: &Island) {
        if self.last_saved_tick == Some(island.tick_count) {
            return;
        }
        eprintln!("Saving final snapshot...");
        if self.save(island) {
            self.prune();
        }
    }
}

fn log_milestone(sim: &Simulation, result: &TickResult) {
    if result.tick % 1000 != 0 {
        return;
    }
    let stats = &sim.island.stats;
    eprintln!(
        "Tick {} | {:?} day {} | Animals: {} | Vegetation: {:.3} | Ocean: {:.2} | Crisis: {:.2}",
        result.tick,
        sim.island.calendar.season,
        sim.island.calendar.day,
        sim.island.animals.len(),
        stats.avg_vegetation,
        stats.ocean_ratio,
        result.crisis_severity
    );
}

/// Run the simulation on a loaded island.
///
/// With `ticks` set, runs that many ticks as fast as possible. Otherwise
/// ticks are paced by the fixed-step driver until Ctrl-C. Both modes
/// autosave on the configured interval and save once more on exit.
pub async fn run_simulation(
    config: &SimulationConfig,
    species: SpeciesTable,
    world_path: Option<&str>,
    ticks: Option<u64>,
) -> Result<(), String> {
    let island = load_island(config, world_path)?;
    eprintln!(
        "Island loaded: {} ({}x{}), tick {}, {} animals",
        island.name,
        island.grid.width(),
        island.grid.height(),
        island.tick_count,
        island.animals.len()
    );

    let mut sim = Simulation::new(island, species, config.tick_params())
        .with_names(config.notable_names.clone());
    let mut autosave = Autosave::new(config);

    match ticks {
        Some(count) => run_headless(&mut sim, &mut autosave, count),
        None => run_realtime(&mut sim, &mut autosave, config).await,
    }

    autosave.finish(&sim.island);
    eprintln!("Simulation stopped at tick {}", sim.island.tick_count);
    Ok(())
}

fn run_headless(sim: &mut Simulation, autosave: &mut Autosave, count: u64) {
    eprintln!("Running {} ticks headless", count);
    let start = Instant::now();
    for _ in 0..count {
        let result = sim.advance();
        autosave.after_tick(&sim.island);
        log_milestone(sim, &result);
    }
    let secs = start.elapsed().as_secs_f64();
    eprintln!(
        "{} ticks in {:.2}s ({:.0} ticks/s)",
        count,
        secs,
        if secs > 0.0 { count as f64 / secs } else { 0.0 }
    );
}

async fn run_realtime(sim: &mut Simulation, autosave: &mut Autosave, config: &SimulationConfig) {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut driver = FixedStepDriver::from_config(config);
    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_ms.max(1) as u64));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_frame = Instant::now();

    eprintln!(
        "Simulation running (tick: {}ms, speed: {}x, snapshot every {} ticks)",
        config.tick_ms, config.sim_speed, config.snapshot_interval
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                let elapsed_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
                last_frame = now;
                for _ in 0..driver.ticks_for(elapsed_ms) {
                    let result = sim.advance();
                    autosave.after_tick(&sim.island);
                    log_milestone(sim, &result);
                }
            }
            _ = &mut shutdown => {
                eprintln!("\nShutdown signal received");
                break;
            }
        }
    }
}

/// Parse a `X,Y` tile coordinate.
pub fn parse_tile(value: &str) -> Result<(i32, i32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", value))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad x coordinate '{}': {}", x, e))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad y coordinate '{}': {}", y, e))?;
    Ok((x, y))
}

/// Place a structure on the newest island and save the result as a new
/// snapshot.
pub fn build_structure(
    config: &SimulationConfig,
    kind: StructureKind,
    (x, y): (i32, i32),
) -> Result<PathBuf, String> {
    let dir = Path::new(&config.snapshot_directory);
    let mut island = persistence::load_latest_valid_snapshot(dir)
        .map_err(|e| format!("Failed to load snapshot: {}", e))?;
    island
        .structures
        .place(&mut island.grid, kind, x, y)
        .ok_or_else(|| {
            format!(
                "Cannot build a {} at ({}, {}): it needs undeveloped land on the grid and room under the {} structure limit",
                kind.name(),
                x,
                y,
                MAX_STRUCTURES
            )
        })?;
    persistence::save_snapshot(&island, dir).map_err(|e| format!("Cannot save snapshot: {}", e))
}

#[derive(Debug, Serialize)]
pub struct TileReport {
    pub x: i32,
    pub y: i32,
    pub biome: &'static str,
    pub land: bool,
    pub elevation: f32,
    pub water: f32,
    pub soil: f32,
    pub vegetation: f32,
    pub temperature: f32,
    pub protected: bool,
    pub developed: bool,
    pub animals: usize,
}

pub fn tile_report(island: &Island, x: i32, y: i32) -> Result<TileReport, String> {
    let grid = &island.grid;
    if !grid.in_bounds(x, y) {
        return Err(format!(
            "Tile ({}, {}) is outside the {}x{} grid",
            x,
            y,
            grid.width(),
            grid.height()
        ));
    }
    let animals = island
        .animals
        .iter()
        .filter(|(_, a)| a.tile() == (x, y))
        .count();
    Ok(TileReport {
        x,
        y,
        biome: grid.biome(x, y).name(),
        land: grid.is_land(x, y),
        elevation: grid.elevation(x, y),
        water: grid.water(x, y),
        soil: grid.soil(x, y),
        vegetation: grid.vegetation(x, y),
        temperature: grid.temperature(x, y),
        protected: grid.is_protected(x, y),
        developed: grid.is_developed(x, y),
        animals,
    })
}

#[derive(Debug, Serialize)]
pub struct IslandReport {
    pub name: String,
    pub id: String,
    pub seed: u64,
    pub tick: u64,
    pub calendar: Calendar,
    pub weather: WeatherState,
    pub governance: Governance,
    pub population: Vec<(String, u32)>,
    pub structures: Vec<Structure>,
    /// Full names of living notable animals.
    pub notables: Vec<String>,
    pub stats: IslandStats,
    pub eco_score: u8,
    pub rating: EcoRating,
    pub risks: Vec<RiskWarning>,
}

pub fn island_report(island: &Island, species: &SpeciesTable) -> IslandReport {
    let stats = island.stats.clone();
    let score = eco_score(&stats, species);
    let population = stats
        .population
        .iter()
        .map(|(id, count)| {
            let name = species
                .get(*id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("species {}", id.0));
            (name, *count)
        })
        .collect();
    IslandReport {
        name: island.name.clone(),
        id: island.id.to_string(),
        seed: island.generation_params.seed,
        tick: island.tick_count,
        calendar: island.calendar.clone(),
        weather: island.weather.clone(),
        governance: island.governance.clone(),
        population,
        structures: island.structures.items().to_vec(),
        notables: island.notables.iter().map(|(_, n)| n.full_name()).collect(),
        risks: assess_risks(&stats),
        eco_score: score,
        rating: EcoRating::from_score(score),
        stats,
    }
}

/// Inspect a tile or the island summary from the latest snapshot.
pub fn inspect(
    config: &SimulationConfig,
    species: &SpeciesTable,
    tile: Option<(i32, i32)>,
    show_world: bool,
    json: bool,
) -> Result<(), String> {
    let snapshot_dir = Path::new(&config.snapshot_directory);
    let island = persistence::load_latest_valid_snapshot(snapshot_dir)
        .map_err(|e| format!("Failed to load snapshot: {}", e))?;

    if let Some((x, y)) = tile {
        let report = tile_report(&island, x, y)?;
        if json {
            print_json(&report)
        } else {
            print_tile(&report);
            Ok(())
        }
    } else if show_world {
        let report = island_report(&island, species);
        if json {
            print_json(&report)
        } else {
            print_island(&report);
            Ok(())
        }
    } else {
        Err("Specify --tile <X,Y> or --world".to_string())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("JSON error: {}", e))?;
    println!("{}", text);
    Ok(())
}

fn print_tile(tile: &TileReport) {
    println!("=== Tile ({}, {}) ===", tile.x, tile.y);
    println!("Biome: {}{}", tile.biome, if tile.land { "" } else { " (ocean)" });
    println!("Elevation: {:.3}", tile.elevation);
    println!("Water: {:.3}", tile.water);
    println!("Soil: {:.3}", tile.soil);
    println!("Vegetation: {:.3}", tile.vegetation);
    println!("Temperature: {:.3}", tile.temperature);
    println!("Protected: {}", tile.protected);
    println!("Developed: {}", tile.developed);
    println!("Animals here: {}", tile.animals);
}

fn print_island(report: &IslandReport) {
    println!("=== Island: {} ===", report.name);
    println!("ID: {}", report.id);
    println!("Seed: {}", report.seed);
    println!("Tick: {}", report.tick);
    println!(
        "Calendar: year {}, {:?} day {}",
        report.calendar.year, report.calendar.season, report.calendar.day
    );
    println!(
        "Weather: {:?} (intensity {:.2}, {} ticks left)",
        report.weather.kind, report.weather.intensity, report.weather.remaining
    );
    println!();

    let g = &report.governance;
    println!("--- Governance ---");
    println!("  Conservation: {:.2}", g.conservation);
    println!("  Development: {:.2}", g.development);
    println!("  Hunting limit: {}/day", g.hunting_limit);
    println!("  Enforcement: {:.2}", g.enforcement);
    println!("  Taxes: {:.2}", g.taxes);
    println!();

    let s = &report.stats;
    println!("--- Ecology ---");
    println!("  Land tiles: {}", s.land_tiles);
    println!("  Ocean ratio: {:.3}", s.ocean_ratio);
    println!("  Barren ratio: {:.3}", s.barren_ratio);
    println!("  Avg soil: {:.3}", s.avg_soil);
    println!("  Avg vegetation: {:.3}", s.avg_vegetation);
    println!("  Avg water: {:.3}", s.avg_water);
    println!("  Protected: {:.1}%", s.protected_ratio() * 100.0);
    println!("  Developed: {:.1}%", s.developed_ratio() * 100.0);
    println!();

    println!("--- Population ({}) ---", s.total_animals);
    for (name, count) in &report.population {
        println!("  {:<12} {:>5}", name, count);
    }
    println!();

    if !report.structures.is_empty() {
        println!("--- Structures ({}) ---", report.structures.len());
        for st in &report.structures {
            println!("  {:<12} at ({}, {}), age {}", st.kind.name(), st.x, st.y, st.age);
        }
        println!();
    }
    if !report.notables.is_empty() {
        println!("--- Notables ---");
        for name in &report.notables {
            println!("  {}", name);
        }
        println!();
    }

    println!(
        "Eco score: {} ({})",
        report.eco_score,
        report.rating.label()
    );
    if report.risks.is_empty() {
        println!("No collapse risks");
    } else {
        println!("--- Risks ---");
        for risk in &report.risks {
            println!("  [{}] {:?}: {}", risk.severity, risk.kind, risk.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::generation::GenerationParams;
    use crate::world::generation::generate_island;
    use tempfile::TempDir;

    fn config_for(dir: &Path, extra: &str) -> SimulationConfig {
        let toml = format!(
            "snapshot_directory = \"{}\"\n{}",
            dir.display(),
            extra
        );
        SimulationConfig::from_toml_str(&toml, Path::new("sim.toml")).unwrap()
    }

    fn small_island() -> Island {
        let params = GenerationParams {
            width: 32,
            height: 32,
            ..GenerationParams::with_seed(11)
        };
        generate_island(&params, &SpeciesTable::default(), 200)
    }

    #[test]
    fn parse_tile_accepts_pairs() {
        assert_eq!(parse_tile("3,4").unwrap(), (3, 4));
        assert_eq!(parse_tile(" 10 , -2 ").unwrap(), (10, -2));
        assert!(parse_tile("3").is_err());
        assert!(parse_tile("a,4").is_err());
    }

    #[test]
    fn tile_report_rejects_out_of_bounds() {
        let island = small_island();
        assert!(tile_report(&island, 32, 0).is_err());
        let report = tile_report(&island, 0, 0).unwrap();
        assert!(!report.land);
        assert_eq!(report.biome, island.grid.biome(0, 0).name());
    }

    #[test]
    fn island_report_serializes_to_json() {
        let island = small_island();
        let report = island_report(&island, &SpeciesTable::default());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["tick"], 0);
        assert_eq!(value["seed"], 11);
        assert!(value["stats"]["ocean_ratio"].is_number());
        assert!(value["structures"].as_array().unwrap().is_empty());
        assert!(report.eco_score <= 100);
    }

    #[tokio::test]
    async fn headless_run_advances_and_saves() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path(), "snapshot_interval = 25\nmax_snapshots = 2");
        persistence::save_snapshot(&small_island(), dir.path()).unwrap();

        run_simulation(&config, SpeciesTable::default(), None, Some(60))
            .await
            .unwrap();

        let snapshots = persistence::list_snapshots(dir.path()).unwrap();
        assert!(snapshots.len() <= 2);
        assert!(snapshots.iter().any(|s| s.tick == 60));
        let latest = persistence::load_latest_valid_snapshot(dir.path()).unwrap();
        assert_eq!(latest.tick_count, 60);
    }

    #[test]
    fn build_places_on_land_and_refuses_the_sea() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path(), "");
        let island = small_island();
        let (x, y) = (0..island.grid.len())
            .map(|i| island.grid.coords(i))
            .find(|&(x, y)| {
                crate::world::Structures::can_place(&island.grid, StructureKind::Village, x, y)
            })
            .unwrap();
        persistence::save_snapshot(&island, dir.path()).unwrap();

        let err = build_structure(&config, StructureKind::Lighthouse, (0, 0)).unwrap_err();
        assert!(err.contains("Lighthouse"));

        let path = build_structure(&config, StructureKind::Village, (x, y)).unwrap();
        let built = persistence::load_snapshot(&path).unwrap();
        assert_eq!(built.structures.len(), 1);
        assert!(built.grid.is_developed(x, y));
    }

    #[tokio::test]
    async fn run_without_snapshots_fails() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path(), "");
        let err = run_simulation(&config, SpeciesTable::default(), None, Some(1))
            .await
            .unwrap_err();
        assert!(err.contains("islandsim generate"));
    }

    #[test]
    fn load_species_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path(), "");
        assert_eq!(load_species(&config).unwrap().len(), 4);
    }
}
