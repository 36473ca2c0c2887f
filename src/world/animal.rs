use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::species::SpeciesId;

/// Stable identity of an animal for its whole life.
pub type AnimalId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn opposite(self) -> Sex {
        match self {
            Sex::Female => Sex::Male,
            Sex::Male => Sex::Female,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    Wander,
    SeekFood,
    SeekWater,
    Flee,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    Dehydration,
    OldAge,
    Predation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub species: SpeciesId,
    pub pos: Vec2,
    #[serde(skip)]
    pub vel: Vec2,
    pub energy: f32,
    pub hunger: f32,
    pub thirst: f32,
    pub fear: f32,
    pub age_days: u32,
    pub sex: Sex,
    /// Ticks until the animal may breed again.
    pub cooldown: i32,
    pub state: BehaviorState,
    #[serde(skip)]
    pub death: Option<DeathCause>,
}

impl Animal {
    pub fn new(id: AnimalId, species: SpeciesId, pos: Vec2, energy: f32, sex: Sex) -> Self {
        Animal {
            id,
            species,
            pos,
            vel: Vec2::ZERO,
            energy: energy.clamp(0.0, 1.0),
            hunger: 0.3,
            thirst: 0.3,
            fear: 0.0,
            age_days: 0,
            sex,
            cooldown: 0,
            state: BehaviorState::Wander,
            death: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.death.is_some()
    }

    /// Integer tile under the animal.
    pub fn tile(&self) -> (i32, i32) {
        (self.pos.x.floor() as i32, self.pos.y.floor() as i32)
    }
}

/// Slot storage for animals.
///
/// Removal frees the slot and leaves every other animal where it was;
/// freed slots are reused last-in first-out. Iteration is in slot order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimalArena {
    slots: Vec<Option<Animal>>,
    free: Vec<u32>,
    next_id: AnimalId,
    #[serde(skip)]
    alive: usize,
}

impl AnimalArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the cached live count after deserialization.
    pub fn reindex(&mut self) {
        self.alive = self.slots.iter().flatten().count();
    }

    pub fn allocate_id(&mut self) -> AnimalId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, animal: Animal) -> u32 {
        self.alive += 1;
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(animal);
            slot
        } else {
            self.slots.push(Some(animal));
            (self.slots.len() - 1) as u32
        }
    }

    pub fn remove(&mut self, slot: u32) -> Option<Animal> {
        let animal = self.slots.get_mut(slot as usize)?.take()?;
        self.free.push(slot);
        self.alive -= 1;
        Some(animal)
    }

    pub fn get(&self, slot: u32) -> Option<&Animal> {
        self.slots.get(slot as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: u32) -> Option<&mut Animal> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }

    pub fn slot_of(&self, id: AnimalId) -> Option<u32> {
        self.iter().find(|(_, a)| a.id == id).map(|(slot, _)| slot)
    }

    /// Live animals with their slots, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Animal)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|a| (i as u32, a)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Animal> {
        self.slots.iter_mut().flatten()
    }

    /// Upper bound (exclusive) on slot indices.
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn len(&self) -> usize {
        self.alive
    }

    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Free every slot whose animal has a recorded death, returning the causes.
    pub fn sweep_dead(&mut self) -> Vec<DeathCause> {
        let dead: Vec<(u32, DeathCause)> = self
            .iter()
            .filter_map(|(slot, a)| a.death.map(|cause| (slot, cause)))
            .collect();
        dead.into_iter()
            .filter_map(|(slot, cause)| self.remove(slot).map(|_| cause))
            .collect()
    }
}
