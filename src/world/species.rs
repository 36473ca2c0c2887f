use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub u16);

impl std::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a species eats. Predators name their prey explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diet {
    Herbivore,
    Predator { prey: BTreeSet<SpeciesId> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    pub diet: Diet,
    /// Tiles per tick at full stride.
    pub speed: f32,
    pub sight_range: f32,
    pub hunger_rate: f32,
    pub thirst_rate: f32,
    pub reproduction_threshold: f32,
    /// Ticks between litters.
    pub reproduction_cooldown: u32,
    pub max_age_days: u32,
    pub energy_from_food: f32,
    pub energy_from_water: f32,
    #[serde(default)]
    pub initial_count: u32,
}

impl Species {
    pub fn is_predator(&self) -> bool {
        matches!(self.diet, Diet::Predator { .. })
    }

    pub fn preys_on(&self, other: SpeciesId) -> bool {
        match &self.diet {
            Diet::Predator { prey } => prey.contains(&other),
            Diet::Herbivore => false,
        }
    }
}

#[derive(Deserialize)]
struct SpeciesFile {
    species: Vec<Species>,
}

/// Immutable species definitions shared by every agent of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesTable {
    species: BTreeMap<SpeciesId, Species>,
}

pub const RABBIT: SpeciesId = SpeciesId(0);
pub const DEER: SpeciesId = SpeciesId(1);
pub const WOLF: SpeciesId = SpeciesId(2);
pub const HAWK: SpeciesId = SpeciesId(3);

impl Default for SpeciesTable {
    fn default() -> Self {
        let herbivore = |id, name: &str, speed, sight, hunger, thirst, threshold, cooldown, age, count| Species {
            id,
            name: name.to_string(),
            diet: Diet::Herbivore,
            speed,
            sight_range: sight,
            hunger_rate: hunger,
            thirst_rate: thirst,
            reproduction_threshold: threshold,
            reproduction_cooldown: cooldown,
            max_age_days: age,
            energy_from_food: 0.6,
            energy_from_water: 0.3,
            initial_count: count,
        };
        let predator = |id, name: &str, prey: &[SpeciesId], speed, sight, hunger, cooldown, age, count| Species {
            id,
            name: name.to_string(),
            diet: Diet::Predator {
                prey: prey.iter().copied().collect(),
            },
            speed,
            sight_range: sight,
            hunger_rate: hunger,
            thirst_rate: 0.001,
            reproduction_threshold: 0.85,
            reproduction_cooldown: cooldown,
            max_age_days: age,
            energy_from_food: 0.5,
            energy_from_water: 0.3,
            initial_count: count,
        };

        let species = vec![
            herbivore(RABBIT, "rabbit", 0.25, 6.0, 0.0015, 0.001, 0.75, 300, 40, 12),
            herbivore(DEER, "deer", 0.3, 8.0, 0.001, 0.0012, 0.8, 500, 70, 8),
            predator(WOLF, "wolf", &[RABBIT, DEER], 0.32, 10.0, 0.0012, 800, 90, 3),
            predator(HAWK, "hawk", &[RABBIT], 0.4, 12.0, 0.001, 700, 80, 2),
        ];
        SpeciesTable {
            species: species.into_iter().map(|s| (s.id, s)).collect(),
        }
    }
}

impl SpeciesTable {
    pub fn new(species: Vec<Species>) -> Result<Self, String> {
        let mut errors = Vec::new();
        let mut map: BTreeMap<SpeciesId, Species> = BTreeMap::new();

        for s in species {
            if let Some(prev) = map.get(&s.id) {
                errors.push(format!(
                    "species id {} used by both '{}' and '{}'",
                    s.id.0, prev.name, s.name
                ));
                continue;
            }
            map.insert(s.id, s);
        }

        for s in map.values() {
            if s.name.trim().is_empty() {
                errors.push(format!("species {} has an empty name", s.id));
            }
            if s.speed <= 0.0 {
                errors.push(format!("{}: speed must be > 0, got {}", s.name, s.speed));
            }
            if s.sight_range <= 0.0 {
                errors.push(format!(
                    "{}: sight_range must be > 0, got {}",
                    s.name, s.sight_range
                ));
            }
            for (field, value) in [
                ("hunger_rate", s.hunger_rate),
                ("thirst_rate", s.thirst_rate),
                ("reproduction_threshold", s.reproduction_threshold),
                ("energy_from_food", s.energy_from_food),
                ("energy_from_water", s.energy_from_water),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    errors.push(format!("{}: {} must be 0.0-1.0, got {}", s.name, field, value));
                }
            }
            if s.max_age_days == 0 {
                errors.push(format!("{}: max_age_days must be > 0", s.name));
            }
            if let Diet::Predator { prey } = &s.diet {
                if prey.is_empty() {
                    errors.push(format!("{}: predator must list at least one prey", s.name));
                }
                for p in prey {
                    if !map.contains_key(p) {
                        errors.push(format!("{}: unknown prey species {}", s.name, p.0));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(SpeciesTable { species: map })
        } else {
            Err(errors.join("\n"))
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let file: SpeciesFile =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        Self::new(file.species).map_err(|e| format!("{}: {}", source_path.display(), e))
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Species> {
        self.species.values().find(|s| s.name == name)
    }

    /// Species in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    pub fn ids(&self) -> Vec<SpeciesId> {
        self.species.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}
