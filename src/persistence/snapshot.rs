use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::world::Island;

const PREFIX: &str = "island-tick";
const EXTENSION: &str = ".bin";

/// One island snapshot found on disk.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub path: PathBuf,
    pub tick: u64,
    /// Unix seconds at save time.
    pub saved_at: u64,
    pub bytes: u64,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(io::Error),
    Encode(String),
    Decode(String),
    /// Decoded, but the island state is unusable.
    Corrupt { path: PathBuf, reason: String },
    /// The directory holds no snapshot that loads.
    NoIsland(PathBuf),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "snapshot I/O failed: {}", e),
            SnapshotError::Encode(e) => write!(f, "cannot encode island: {}", e),
            SnapshotError::Decode(e) => write!(f, "cannot decode island: {}", e),
            SnapshotError::Corrupt { path, reason } => {
                write!(f, "{} is unusable: {}", path.display(), reason)
            }
            SnapshotError::NoIsland(dir) => write!(
                f,
                "no loadable island in {}. Create one with: islandsim generate",
                dir.display()
            ),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

/// `island-tick{tick}-{unix_secs}.bin`
fn file_name(tick: u64, saved_at: u64) -> String {
    format!("{}{}-{}{}", PREFIX, tick, saved_at, EXTENSION)
}

fn parse_file_name(name: &str) -> Option<(u64, u64)> {
    let (tick, saved_at) = name
        .strip_prefix(PREFIX)?
        .strip_suffix(EXTENSION)?
        .split_once('-')?;
    Some((tick.parse().ok()?, saved_at.parse().ok()?))
}

/// Write the island next to its final name, then rename into place.
/// Cached statistics are not written.
pub fn save_snapshot(island: &Island, snapshot_dir: &Path) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(snapshot_dir)?;

    let saved_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let name = file_name(island.tick_count, saved_at);
    let target = snapshot_dir.join(&name);
    let staging = snapshot_dir.join(format!(".{}.tmp", name));

    let encoded = bincode::serialize(island).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    if let Err(e) = fs::write(&staging, &encoded).and_then(|_| fs::rename(&staging, &target)) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }

    info!(
        path = %target.display(),
        tick = island.tick_count,
        animals = island.animals.len(),
        structures = island.structures.len(),
        bytes = encoded.len(),
        "Snapshot saved"
    );
    Ok(target)
}

/// Every animal and structure must sit on the grid.
fn check_placement(island: &Island) -> Result<(), String> {
    for (_, a) in island.animals.iter() {
        let (x, y) = a.tile();
        if !a.pos.is_finite() || !island.grid.in_bounds(x, y) {
            return Err(format!("animal {} at {:?} is off the grid", a.id, a.pos));
        }
    }
    for s in island.structures.items() {
        if !island.grid.in_bounds(s.x, s.y) {
            return Err(format!(
                "{} {} at ({}, {}) is off the grid",
                s.kind.name(),
                s.id.0,
                s.x,
                s.y
            ));
        }
    }
    Ok(())
}

/// Decode an island, check where its agents and structures stand and
/// rebuild the cached statistics.
pub fn load_snapshot(path: &Path) -> Result<Island, SnapshotError> {
    let data = fs::read(path)?;
    let mut island: Island =
        bincode::deserialize(&data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    check_placement(&island).map_err(|reason| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        reason,
    })?;
    island.refresh_stats();
    Ok(island)
}

/// Snapshots in a directory, newest save first. A missing directory has none.
pub fn list_snapshots(snapshot_dir: &Path) -> Result<Vec<SnapshotInfo>, SnapshotError> {
    if !snapshot_dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(snapshot_dir)? {
        let entry = entry?;
        let Some((tick, saved_at)) = entry.file_name().to_str().and_then(parse_file_name) else {
            continue;
        };
        let meta = entry.metadata()?;
        if meta.is_file() {
            found.push(SnapshotInfo {
                path: entry.path(),
                tick,
                saved_at,
                bytes: meta.len(),
            });
        }
    }
    found.sort_by_key(|s| Reverse((s.saved_at, s.tick)));
    Ok(found)
}

/// Delete all but the `keep` newest snapshots. Returns the deleted paths.
pub fn prune_snapshots(snapshot_dir: &Path, keep: usize) -> Result<Vec<PathBuf>, SnapshotError> {
    let mut deleted = Vec::new();
    for old in list_snapshots(snapshot_dir)?.into_iter().skip(keep) {
        fs::remove_file(&old.path)?;
        deleted.push(old.path);
    }
    Ok(deleted)
}

/// Newest snapshot that loads, skipping unreadable or corrupt ones.
pub fn load_latest_valid_snapshot(snapshot_dir: &Path) -> Result<Island, SnapshotError> {
    for snapshot in list_snapshots(snapshot_dir)? {
        match load_snapshot(&snapshot.path) {
            Ok(island) => return Ok(island),
            Err(e) => warn!(path = %snapshot.path.display(), error = %e, "Skipping snapshot"),
        }
    }
    Err(SnapshotError::NoIsland(snapshot_dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::generation::GenerationParams;
    use crate::config::simulation::TickParams;
    use crate::simulation::Simulation;
    use crate::world::generation::generate_island;
    use crate::world::species::{SpeciesTable, RABBIT};
    use crate::world::structures::{StructureKind, Structures};
    use crate::world::{AnimalArena, Sex};
    use glam::Vec2;
    use tempfile::TempDir;

    fn island(size: u32) -> Island {
        let params = GenerationParams {
            width: size,
            height: size,
            ..GenerationParams::with_seed(42)
        };
        generate_island(&params, &SpeciesTable::default(), 200)
    }

    fn buildable_cell(island: &Island) -> (i32, i32) {
        let grid = &island.grid;
        (0..grid.len())
            .map(|i| grid.coords(i))
            .find(|&(x, y)| Structures::can_place(grid, StructureKind::Farm, x, y))
            .unwrap()
    }

    #[test]
    fn fresh_island_round_trips() {
        let dir = TempDir::new().unwrap();
        let island = island(64);
        let path = save_snapshot(&island, dir.path()).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), island);
    }

    #[test]
    fn running_island_keeps_its_state() {
        let dir = TempDir::new().unwrap();
        let mut sim = Simulation::new(island(64), SpeciesTable::default(), TickParams::default());
        let (x, y) = buildable_cell(&sim.island);
        sim.place_structure(StructureKind::Windmill, x, y).unwrap();
        for _ in 0..120 {
            sim.advance();
        }
        sim.island.governance.conservation = 0.9;
        sim.island.zones.add_zone(&mut sim.island.grid, 20, 20, 30, 30);

        let path = save_snapshot(&sim.island, dir.path()).unwrap();
        let restored = load_snapshot(&path).unwrap();

        assert_eq!(restored.tick_count, 120);
        assert_eq!(restored.calendar, sim.island.calendar);
        assert_eq!(restored.grid, sim.island.grid);
        assert_eq!(restored.governance, sim.island.governance);
        assert_eq!(restored.zones, sim.island.zones);
        assert_eq!(restored.structures, sim.island.structures);
        assert_eq!(restored.structures.items()[0].age, 120);
        assert_eq!(restored.notables, sim.island.notables);
        for ((slot_a, a), (slot_b, b)) in sim.island.animals.iter().zip(restored.animals.iter()) {
            assert_eq!((slot_a, a.id, a.pos, a.energy), (slot_b, b.id, b.pos, b.energy));
            assert_eq!(b.vel, Vec2::ZERO);
        }
        assert_eq!(restored.stats.total_animals as usize, restored.animals.len());
    }

    #[test]
    fn newest_save_is_listed_first_and_pruned_last() {
        let dir = TempDir::new().unwrap();
        let data = bincode::serialize(&island(32)).unwrap();
        for (tick, saved_at) in [(10, 1000), (0, 3000), (30, 2000), (20, 2000)] {
            fs::write(dir.path().join(file_name(tick, saved_at)), &data).unwrap();
        }
        fs::write(dir.path().join(".island-tick99-9999.bin.tmp"), "partial").unwrap();
        fs::write(dir.path().join("notes.txt"), "not an island").unwrap();

        let ticks: Vec<u64> = list_snapshots(dir.path()).unwrap().iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![0, 30, 20, 10]);

        assert_eq!(prune_snapshots(dir.path(), 2).unwrap().len(), 2);
        let ticks: Vec<u64> = list_snapshots(dir.path()).unwrap().iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![0, 30]);
    }

    #[test]
    fn garbage_and_truncated_files_fail_to_decode() {
        let dir = TempDir::new().unwrap();
        let data = bincode::serialize(&island(32)).unwrap();
        let garbage = dir.path().join(file_name(0, 1));
        let truncated = dir.path().join(file_name(0, 2));
        fs::write(&garbage, b"not an island").unwrap();
        fs::write(&truncated, &data[..data.len() / 2]).unwrap();

        assert!(matches!(load_snapshot(&garbage), Err(SnapshotError::Decode(_))));
        assert!(matches!(load_snapshot(&truncated), Err(SnapshotError::Decode(_))));
    }

    #[test]
    fn stray_animal_marks_snapshot_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut island = island(32);
        let table = SpeciesTable::default();
        island.animals = AnimalArena::new();
        island
            .spawn_animal(table.get(RABBIT).unwrap(), Vec2::new(3.0, 3.0), 0.5, Sex::Male, 10)
            .unwrap();
        let slot = island.animals.iter().map(|(slot, _)| slot).next().unwrap();
        island.animals.get_mut(slot).unwrap().pos = Vec2::new(500.0, 3.0);
        let path = save_snapshot(&island, dir.path()).unwrap();

        match load_snapshot(&path) {
            Err(SnapshotError::Corrupt { reason, .. }) => assert!(reason.contains("off the grid")),
            other => panic!("expected a corrupt snapshot, got {:?}", other.map(|i| i.tick_count)),
        }
    }

    #[test]
    fn latest_valid_skips_corrupt_newer_saves() {
        let dir = TempDir::new().unwrap();
        let island = island(32);
        let data = bincode::serialize(&island).unwrap();
        fs::write(dir.path().join(file_name(10, 1000)), &data).unwrap();
        fs::write(dir.path().join(file_name(20, 2000)), b"corrupt").unwrap();

        let restored = load_latest_valid_snapshot(dir.path()).unwrap();
        assert_eq!(restored.id, island.id);
        assert_eq!(restored.grid, island.grid);
    }

    #[test]
    fn directory_without_islands_points_at_generate() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(file_name(10, 1000)), b"corrupt").unwrap();

        let err = load_latest_valid_snapshot(dir.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::NoIsland(_)));
        assert!(err.to_string().contains("islandsim generate"));
        assert!(matches!(
            load_latest_valid_snapshot(&dir.path().join("absent")),
            Err(SnapshotError::NoIsland(_))
        ));
    }
}
