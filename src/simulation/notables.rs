use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::world::animal::{Animal, AnimalArena, AnimalId};
use crate::world::species::{SpeciesId, SpeciesTable};

/// Youngest age, in days, at which an animal can earn a name.
pub const MIN_NOTABLE_AGE_DAYS: u32 = 50;

const AGE_MILESTONES: [u32; 4] = [200, 400, 600, 800];
const HUNT_MILESTONES: [u32; 2] = [5, 10];
const OFFSPRING_MILESTONE: u32 = 4;
const SUFFIXED_NAME_ATTEMPTS: usize = 8;

const HERBIVORE_NAMES: [&str; 24] = [
    "Sage", "Willow", "Clover", "Fern", "Birch", "Hazel", "Maple", "Reed", "Thistle", "Briar",
    "Moss", "Ivy", "Holly", "Aspen", "Laurel", "Cedar", "Ember", "Luna", "Bloom", "Gale", "Mist",
    "Cloud", "Dusk", "Dawn",
];

const PREDATOR_NAMES: [&str; 24] = [
    "Shadow", "Fang", "Storm", "Blaze", "Ghost", "Scar", "Flint", "Onyx", "Thunder", "Cinder",
    "Ash", "Raven", "Titan", "Iron", "Ridge", "Thorn", "Hawk", "Vex", "Pike", "Drake", "Frost",
    "Viper", "Dagger", "Stone",
];

/// Names handed out to notable animals, split by diet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NamePools {
    pub herbivore: Vec<String>,
    pub predator: Vec<String>,
}

impl Default for NamePools {
    fn default() -> Self {
        NamePools {
            herbivore: HERBIVORE_NAMES.iter().map(|n| n.to_string()).collect(),
            predator: PREDATOR_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl NamePools {
    fn pool(&self, predator: bool) -> &[String] {
        if predator {
            &self.predator
        } else {
            &self.herbivore
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        for (label, pool) in [("herbivore", &self.herbivore), ("predator", &self.predator)] {
            if pool.is_empty() {
                errors.push(format!(
                    "notable_names.{} must not be empty. Example: {} = [\"Sage\", \"Fern\"]",
                    label, label
                ));
            }
            if pool.iter().any(|n| n.trim().is_empty()) {
                errors.push(format!("notable_names.{} contains a blank name", label));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    AgeDays(u32),
    Hunts(u32),
    Offspring(u32),
}

/// Life record of one named animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notable {
    pub name: String,
    pub species: SpeciesId,
    pub kills: u32,
    pub children: u32,
    pub survived_events: u32,
    /// Age at the last daily update. Kept after death for the obituary.
    pub age_days: u32,
    reached: Vec<Milestone>,
}

impl Notable {
    fn new(name: String, animal: &Animal) -> Self {
        Notable {
            name,
            species: animal.species,
            kills: 0,
            children: 0,
            survived_events: 0,
            age_days: animal.age_days,
            reached: Vec::new(),
        }
    }

    /// Deeds outrank age, and age outranks luck.
    pub fn title(&self) -> &'static str {
        match self {
            n if n.kills >= 10 => "the Apex",
            n if n.kills >= 5 => "the Hunter",
            n if n.children >= 8 => "the Matriarch",
            n if n.children >= 4 => "the Elder",
            n if n.age_days >= 800 => "the Ancient",
            n if n.age_days >= 400 => "the Wise",
            n if n.survived_events >= 2 => "the Survivor",
            _ => "the Notable",
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.title())
    }

    fn pending_milestones(&self) -> Vec<Milestone> {
        let ages = AGE_MILESTONES
            .iter()
            .filter(|&&m| self.age_days >= m)
            .map(|&m| Milestone::AgeDays(m));
        let hunts = HUNT_MILESTONES
            .iter()
            .filter(|&&m| self.kills >= m)
            .map(|&m| Milestone::Hunts(m));
        let offspring = (self.children >= OFFSPRING_MILESTONE)
            .then_some(Milestone::Offspring(OFFSPRING_MILESTONE));
        ages.chain(hunts)
            .chain(offspring)
            .filter(|m| !self.reached.contains(m))
            .collect()
    }
}

/// Something worth telling about a notable animal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "story", rename_all = "snake_case")]
pub enum NotableEvent {
    Named {
        id: AnimalId,
        name: String,
        species: SpeciesId,
        age_days: u32,
    },
    Died {
        id: AnimalId,
        name: String,
        species: SpeciesId,
        age_days: u32,
        kills: u32,
        children: u32,
    },
    Milestone {
        id: AnimalId,
        name: String,
        title: &'static str,
        milestone: Milestone,
    },
}

/// Named animals, at most one living notable per species.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notables {
    entries: BTreeMap<AnimalId, Notable>,
}

impl Notables {
    pub fn get(&self, id: AnimalId) -> Option<&Notable> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimalId, &Notable)> {
        self.entries.iter().map(|(&id, n)| (id, n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_kill(&mut self, hunter: AnimalId) {
        if let Some(n) = self.entries.get_mut(&hunter) {
            n.kills += 1;
        }
    }

    pub fn record_birth(&mut self, parent: AnimalId) {
        if let Some(n) = self.entries.get_mut(&parent) {
            n.children += 1;
        }
    }

    /// Credit every living notable of a species that an event struck.
    pub fn record_event_survival(&mut self, species: SpeciesId, animals: &AnimalArena) {
        for (&id, n) in &mut self.entries {
            if n.species == species && animals.iter().any(|(_, a)| a.id == id) {
                n.survived_events += 1;
            }
        }
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.entries.values().any(|n| n.name == name)
    }

    /// First free name in the pool, else a pool name with a numeric suffix.
    fn pick_name(&self, pool: &[String], rng: &mut ChaCha8Rng) -> Option<String> {
        if let Some(name) = pool.iter().find(|n| !self.name_in_use(n)) {
            return Some(name.clone());
        }
        if pool.is_empty() {
            return None;
        }
        let mut name = String::new();
        for _ in 0..SUFFIXED_NAME_ATTEMPTS {
            let base = &pool[rng.gen_range(0..pool.len())];
            name = format!("{} {}", base, rng.gen_range(1..=99));
            if !self.name_in_use(&name) {
                break;
            }
        }
        Some(name)
    }

    /// Daily bookkeeping: retire the dead, name the most accomplished animal
    /// of each species that has no notable, and report new milestones.
    pub fn update(
        &mut self,
        animals: &AnimalArena,
        species: &SpeciesTable,
        pools: &NamePools,
        rng: &mut ChaCha8Rng,
    ) -> Vec<NotableEvent> {
        let alive: HashMap<AnimalId, &Animal> = animals.iter().map(|(_, a)| (a.id, a)).collect();
        let mut events = Vec::new();

        let dead: Vec<AnimalId> = self
            .entries
            .keys()
            .filter(|id| !alive.contains_key(id))
            .copied()
            .collect();
        for id in dead {
            if let Some(n) = self.entries.remove(&id) {
                events.push(NotableEvent::Died {
                    id,
                    name: n.name,
                    species: n.species,
                    age_days: n.age_days,
                    kills: n.kills,
                    children: n.children,
                });
            }
        }

        for (id, n) in &mut self.entries {
            if let Some(a) = alive.get(id) {
                n.age_days = a.age_days;
            }
        }

        let mut best: BTreeMap<SpeciesId, (&Animal, f32)> = BTreeMap::new();
        for (_, a) in animals.iter() {
            if a.is_dead() || self.entries.contains_key(&a.id) {
                continue;
            }
            let score = a.age_days as f32 * 2.0 + a.energy * 100.0;
            if best.get(&a.species).is_none_or(|&(_, top)| score > top) {
                best.insert(a.species, (a, score));
            }
        }
        for (species_id, (animal, _)) in best {
            if animal.age_days < MIN_NOTABLE_AGE_DAYS
                || self.entries.values().any(|n| n.species == species_id)
            {
                continue;
            }
            let Some(s) = species.get(species_id) else {
                continue;
            };
            let Some(name) = self.pick_name(pools.pool(s.is_predator()), rng) else {
                continue;
            };
            events.push(NotableEvent::Named {
                id: animal.id,
                name: name.clone(),
                species: species_id,
                age_days: animal.age_days,
            });
            self.entries.insert(animal.id, Notable::new(name, animal));
        }

        for (&id, n) in &mut self.entries {
            for milestone in n.pending_milestones() {
                n.reached.push(milestone);
                events.push(NotableEvent::Milestone {
                    id,
                    name: n.name.clone(),
                    title: n.title(),
                    milestone,
                });
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::animal::Sex;
    use crate::world::species::{DEER, RABBIT, WOLF};
    use glam::Vec2;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(9)
    }

    fn add(arena: &mut AnimalArena, species: SpeciesId, age_days: u32, energy: f32) -> AnimalId {
        let id = arena.allocate_id();
        let mut animal = Animal::new(id, species, Vec2::new(1.0, 1.0), energy, Sex::Female);
        animal.age_days = age_days;
        arena.insert(animal);
        id
    }

    fn kill(arena: &mut AnimalArena, id: AnimalId) {
        let slot = arena.slot_of(id).unwrap();
        arena.remove(slot);
    }

    #[test]
    fn best_animal_of_each_species_is_named() {
        let table = SpeciesTable::default();
        let mut arena = AnimalArena::new();
        add(&mut arena, RABBIT, 60, 0.5);
        let elder = add(&mut arena, RABBIT, 90, 0.4);
        let wolf = add(&mut arena, WOLF, 70, 0.6);
        add(&mut arena, DEER, 10, 0.9);

        let mut notables = Notables::default();
        let events = notables.update(&arena, &table, &NamePools::default(), &mut rng());

        assert_eq!(notables.len(), 2);
        assert_eq!(notables.get(elder).unwrap().name, "Sage");
        assert_eq!(notables.get(wolf).unwrap().name, "Shadow");
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, NotableEvent::Named { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn one_notable_per_species() {
        let table = SpeciesTable::default();
        let mut arena = AnimalArena::new();
        let first = add(&mut arena, RABBIT, 60, 0.5);
        let mut notables = Notables::default();
        let pools = NamePools::default();
        notables.update(&arena, &table, &pools, &mut rng());

        add(&mut arena, RABBIT, 500, 1.0);
        notables.update(&arena, &table, &pools, &mut rng());
        assert_eq!(notables.len(), 1);
        assert!(notables.get(first).is_some());
    }

    #[test]
    fn dead_notable_frees_its_name() {
        let table = SpeciesTable::default();
        let mut arena = AnimalArena::new();
        let old = add(&mut arena, RABBIT, 60, 0.5);
        let mut notables = Notables::default();
        let pools = NamePools::default();
        notables.update(&arena, &table, &pools, &mut rng());
        notables.record_kill(old);

        kill(&mut arena, old);
        let heir = add(&mut arena, RABBIT, 55, 0.5);
        let events = notables.update(&arena, &table, &pools, &mut rng());

        assert!(events.iter().any(|e| matches!(
            e,
            NotableEvent::Died { id, age_days: 60, .. } if *id == old
        )));
        assert!(notables.get(old).is_none());
        assert_eq!(notables.get(heir).unwrap().name, "Sage");
    }

    #[test]
    fn exhausted_pool_falls_back_to_suffixed_names() {
        let table = SpeciesTable::default();
        let pools = NamePools {
            herbivore: vec!["Fern".into()],
            ..NamePools::default()
        };
        let mut arena = AnimalArena::new();
        let rabbit = add(&mut arena, RABBIT, 60, 0.5);
        let deer = add(&mut arena, DEER, 60, 0.5);
        let mut notables = Notables::default();
        notables.update(&arena, &table, &pools, &mut rng());

        let first = &notables.get(rabbit).unwrap().name;
        let second = &notables.get(deer).unwrap().name;
        assert_eq!(first, "Fern");
        let suffix: u32 = second.strip_prefix("Fern ").unwrap().parse().unwrap();
        assert!((1..=99).contains(&suffix));
    }

    #[test]
    fn titles_follow_deeds_then_age() {
        let mut arena = AnimalArena::new();
        let id = add(&mut arena, WOLF, 60, 0.5);
        let animal = arena.get(arena.slot_of(id).unwrap()).unwrap();
        let mut n = Notable::new("Fang".into(), animal);
        assert_eq!(n.title(), "the Notable");
        n.survived_events = 2;
        assert_eq!(n.title(), "the Survivor");
        n.age_days = 450;
        assert_eq!(n.title(), "the Wise");
        n.children = 4;
        assert_eq!(n.title(), "the Elder");
        n.children = 8;
        assert_eq!(n.title(), "the Matriarch");
        n.kills = 5;
        assert_eq!(n.title(), "the Hunter");
        n.kills = 12;
        assert_eq!(n.full_name(), "Fang the Apex");
    }

    #[test]
    fn milestones_are_reported_once() {
        let table = SpeciesTable::default();
        let mut arena = AnimalArena::new();
        let wolf = add(&mut arena, WOLF, 210, 0.5);
        let mut notables = Notables::default();
        let pools = NamePools::default();
        notables.update(&arena, &table, &pools, &mut rng());
        for _ in 0..5 {
            notables.record_kill(wolf);
        }
        notables.record_birth(wolf);

        let events = notables.update(&arena, &table, &pools, &mut rng());
        let milestones: Vec<Milestone> = events
            .iter()
            .filter_map(|e| match e {
                NotableEvent::Milestone { milestone, .. } => Some(*milestone),
                _ => None,
            })
            .collect();
        assert_eq!(milestones, vec![Milestone::Hunts(5)]);
        assert!(notables.update(&arena, &table, &pools, &mut rng()).is_empty());
        assert_eq!(notables.get(wolf).unwrap().children, 1);
    }

    #[test]
    fn survival_is_credited_to_living_members_of_the_species() {
        let table = SpeciesTable::default();
        let mut arena = AnimalArena::new();
        let rabbit = add(&mut arena, RABBIT, 60, 0.5);
        let wolf = add(&mut arena, WOLF, 60, 0.5);
        let mut notables = Notables::default();
        notables.update(&arena, &table, &NamePools::default(), &mut rng());

        notables.record_event_survival(RABBIT, &arena);
        assert_eq!(notables.get(rabbit).unwrap().survived_events, 1);
        assert_eq!(notables.get(wolf).unwrap().survived_events, 0);
    }

    #[test]
    fn empty_pools_fail_validation() {
        let pools = NamePools {
            predator: Vec::new(),
            ..NamePools::default()
        };
        let err = pools.validate().unwrap_err();
        assert!(err.contains("notable_names.predator"));
        assert!(NamePools::default().validate().is_ok());
    }
}
