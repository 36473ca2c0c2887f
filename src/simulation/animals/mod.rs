pub mod spatial;
pub mod steering;

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::world::animal::{Animal, AnimalId, BehaviorState, DeathCause, Sex};
use crate::world::species::{Species, SpeciesId, SpeciesTable};
use crate::world::tile::TileGrid;
use crate::world::Island;
use spatial::{SpatialIndex, DEFAULT_CELL_SIZE};
use steering::Flock;

pub const CATCH_RADIUS: f32 = 1.0;
pub const MATE_RADIUS: f32 = 3.0;
pub const FORAGE_RADIUS: i32 = 4;
pub const WATER_SEARCH_RADIUS: i32 = 6;
const WATER_SOURCE_LEVEL: f32 = 0.3;

const FLEE_FEAR: f32 = 0.5;
const HUNGRY: f32 = 0.6;
const THIRSTY: f32 = 0.6;
const TIRED: f32 = 0.3;
const PREDATOR_HUNGRY: f32 = 0.5;

const GRAZE_HUNGER: f32 = 0.2;
const GRAZE_MIN_VEGETATION: f32 = 0.05;
const GRAZE_BITE: f32 = 0.02;
const DRINK_THIRST: f32 = 0.2;
const DRINK_MIN_WATER: f32 = 0.2;
const DRINK_ENERGY: f32 = 0.02;
const REST_ENERGY: f32 = 0.005;
const KILL_HUNGER_RELIEF: f32 = 0.5;

const NEWBORN_ENERGY: f32 = 0.4;
const MATE_MIN_ENERGY: f32 = 0.4;
const PARENT_COST: f32 = 0.3;
const MATE_COST: f32 = 0.15;

/// Per-tick inputs that do not live on the island.
#[derive(Debug, Clone, Copy)]
pub struct AnimalContext<'a> {
    pub species: &'a SpeciesTable,
    pub new_day: bool,
    /// Water-crisis severity in [0, 1].
    pub crisis: f32,
    pub max_animals: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeathTally {
    pub starvation: u32,
    pub dehydration: u32,
    pub old_age: u32,
    pub predation: u32,
}

impl DeathTally {
    pub fn record(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::Starvation => self.starvation += 1,
            DeathCause::Dehydration => self.dehydration += 1,
            DeathCause::OldAge => self.old_age += 1,
            DeathCause::Predation => self.predation += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.starvation + self.dehydration + self.old_age + self.predation
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnimalReport {
    pub births: u32,
    pub deaths: DeathTally,
    pub kills: u32,
    /// Agents left untouched because their species is not in the table.
    pub skipped: u32,
    /// Predator credited with each kill, in kill order.
    pub hunters: Vec<AnimalId>,
    /// Both parents of each birth.
    pub parents: Vec<AnimalId>,
}

/// Tick-start view of one agent. Perception reads these so that every agent
/// sees the same positions regardless of processing order.
#[derive(Debug, Clone, Copy)]
struct AgentView {
    slot: u32,
    id: AnimalId,
    species: SpeciesId,
    sex: Sex,
    pos: Vec2,
    vel: Vec2,
}

/// What an agent noticed within its sight range.
#[derive(Debug, Default)]
struct Perception {
    fear: f32,
    flee: Vec2,
    /// Nearest live prey: slot, tick-start position and squared distance.
    prey: Option<(u32, Vec2, f32)>,
    flock: Flock,
}

/// Advance every animal by one tick: needs, decisions, movement, feeding,
/// predation and breeding. Dead animals are swept and newborns inserted at
/// the end, so slots of survivors never move within a tick.
pub fn simulate_animals(
    island: &mut Island,
    ctx: &AnimalContext,
    rng: &mut ChaCha8Rng,
) -> AnimalReport {
    let Island {
        grid,
        animals,
        governance,
        kills_today,
        ..
    } = island;

    let views: Vec<AgentView> = animals
        .iter()
        .map(|(slot, a)| AgentView {
            slot,
            id: a.id,
            species: a.species,
            sex: a.sex,
            pos: a.pos,
            vel: a.vel,
        })
        .collect();
    let mut index = SpatialIndex::new(grid.width() as f32, grid.height() as f32, DEFAULT_CELL_SIZE);
    for (k, view) in views.iter().enumerate() {
        index.insert(k, view.pos);
    }

    let recovery = 1.0 - ctx.crisis.clamp(0.0, 1.0);
    let mut report = AnimalReport::default();
    let mut newborns: Vec<Animal> = Vec::new();

    for view in &views {
        let Some(species) = ctx.species.get(view.species) else {
            report.skipped += 1;
            continue;
        };
        let Some(mut me) = animals.get(view.slot).filter(|a| !a.is_dead()).cloned() else {
            continue;
        };

        if let Some(cause) = update_vitals(&mut me, species, ctx) {
            me.death = Some(cause);
            if let Some(slot) = animals.get_mut(view.slot) {
                *slot = me;
            }
            continue;
        }

        let perception = perceive(view, species, ctx.species, &views, &index, |slot| {
            animals.get(slot).is_some_and(|a| !a.is_dead())
        });
        me.fear = perception.fear;

        let hunting_allowed = {
            let (tx, ty) = me.tile();
            let sheltered = grid.in_bounds(tx, ty)
                && grid.is_protected(tx, ty)
                && governance.protection_enforced();
            !sheltered && *kills_today < governance.hunting_limit
        };
        me.state = decide(&me, species, perception.fear, hunting_allowed);

        let desired = desired_velocity(&me, species, &perception, grid, rng);
        let max_speed = species.speed * steering::FLEE_SPEED_FACTOR;
        let flock = perception.flock.force(me.pos, me.vel, species.speed)
            * steering::flock_weight(me.state);
        me.vel = steering::smooth(me.vel, desired + flock, max_speed);
        me.pos += me.vel;
        steering::keep_on_land(grid, &mut me.pos, &mut me.vel, species.speed);

        feed(&mut me, species, grid, recovery);
        if me.state == BehaviorState::Rest {
            me.energy += REST_ENERGY * recovery;
        }

        if species.is_predator() && me.state == BehaviorState::SeekFood && hunting_allowed {
            if let Some((prey_slot, _, d2)) = perception.prey {
                if d2 <= CATCH_RADIUS * CATCH_RADIUS {
                    if let Some(prey) = animals.get_mut(prey_slot).filter(|p| !p.is_dead()) {
                        prey.death = Some(DeathCause::Predation);
                        me.hunger -= KILL_HUNGER_RELIEF;
                        me.energy += species.energy_from_food;
                        *kills_today += 1;
                        report.kills += 1;
                        report.hunters.push(me.id);
                    }
                }
            }
        }

        if me.energy > species.reproduction_threshold
            && me.cooldown <= 0
            && animals.len() + newborns.len() < ctx.max_animals as usize
        {
            let mate = find_mate(view, &views, &index, |slot| {
                animals
                    .get(slot)
                    .is_some_and(|a| !a.is_dead() && a.energy > MATE_MIN_ENERGY)
            });
            if let Some(mate_slot) = mate {
                let offset = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                let mut pos = me.pos + offset;
                clamp_to_grid(grid, &mut pos);
                let sex = if rng.gen_bool(0.5) { Sex::Female } else { Sex::Male };
                let cooldown = species.reproduction_cooldown.min(i32::MAX as u32) as i32;
                newborns.push(Animal::new(animals.allocate_id(), species.id, pos, NEWBORN_ENERGY, sex));
                me.energy -= PARENT_COST;
                me.cooldown = cooldown;
                report.parents.push(me.id);
                if let Some(partner) = animals.get_mut(mate_slot) {
                    partner.energy = (partner.energy - MATE_COST).clamp(0.0, 1.0);
                    partner.cooldown = cooldown;
                    report.parents.push(partner.id);
                }
            }
        }

        clamp_needs(&mut me);
        if let Some(slot) = animals.get_mut(view.slot) {
            *slot = me;
        }
    }

    for cause in animals.sweep_dead() {
        report.deaths.record(cause);
    }
    for baby in newborns {
        animals.insert(baby);
        report.births += 1;
    }
    report
}

/// Age, hunger, thirst and energy drain. Returns a cause when the animal
/// does not survive the tick.
fn update_vitals(me: &mut Animal, species: &Species, ctx: &AnimalContext) -> Option<DeathCause> {
    if ctx.new_day {
        me.age_days = me.age_days.saturating_add(1);
    }
    let crisis = ctx.crisis.clamp(0.0, 1.0);
    me.hunger = (me.hunger + species.hunger_rate).min(1.0);
    me.thirst = (me.thirst + species.thirst_rate + 0.01 * crisis).min(1.0);
    me.energy -= me.hunger * 0.002 + me.thirst * 0.001 + 0.003 * crisis;
    me.cooldown = (me.cooldown - 1).max(0);

    if me.energy <= 0.0 {
        me.energy = 0.0;
        return Some(if me.thirst >= me.hunger {
            DeathCause::Dehydration
        } else {
            DeathCause::Starvation
        });
    }
    if me.age_days > species.max_age_days {
        return Some(DeathCause::OldAge);
    }
    None
}

fn perceive(
    view: &AgentView,
    species: &Species,
    table: &SpeciesTable,
    views: &[AgentView],
    index: &SpatialIndex<usize>,
    alive: impl Fn(u32) -> bool,
) -> Perception {
    let mut perception = Perception::default();
    let sight = species.sight_range.max(0.0);
    index.for_each_within(view.pos, sight, |k, pos, d2| {
        let other = &views[k];
        if other.id == view.id || !alive(other.slot) {
            return;
        }
        if other.species == species.id {
            perception.flock.add(view.pos, pos, other.vel);
            return;
        }
        if species.preys_on(other.species) {
            if perception.prey.is_none_or(|(_, _, best)| d2 < best) {
                perception.prey = Some((other.slot, pos, d2));
            }
            return;
        }
        let threat = table.get(other.species).is_some_and(|s| s.preys_on(species.id));
        if threat && sight > 0.0 {
            let closeness = (1.0 - d2.sqrt() / sight).clamp(0.0, 1.0);
            perception.fear = perception.fear.max(closeness);
            perception.flee += (view.pos - pos).normalize_or_zero() * closeness;
        }
    });
    perception
}

fn decide(me: &Animal, species: &Species, fear: f32, hunting_allowed: bool) -> BehaviorState {
    if species.is_predator() {
        if me.hunger > PREDATOR_HUNGRY && hunting_allowed {
            return BehaviorState::SeekFood;
        }
    } else {
        if fear > FLEE_FEAR {
            return BehaviorState::Flee;
        }
        if me.hunger > HUNGRY {
            return BehaviorState::SeekFood;
        }
    }
    if me.thirst > THIRSTY {
        BehaviorState::SeekWater
    } else if me.energy < TIRED {
        BehaviorState::Rest
    } else {
        BehaviorState::Wander
    }
}

fn desired_velocity(
    me: &Animal,
    species: &Species,
    perception: &Perception,
    grid: &TileGrid,
    rng: &mut ChaCha8Rng,
) -> Vec2 {
    let speed = species.speed;
    match me.state {
        BehaviorState::Flee => {
            perception.flee.normalize_or_zero() * speed * steering::FLEE_SPEED_FACTOR
        }
        BehaviorState::SeekFood if species.is_predator() => match perception.prey {
            Some((_, target, _)) => steering::toward(me.pos, target, speed),
            None => steering::wander(speed, rng),
        },
        BehaviorState::SeekFood => match steering::best_forage(grid, me.pos, FORAGE_RADIUS) {
            Some(target) => steering::toward(me.pos, target, speed),
            None => steering::wander(speed, rng),
        },
        BehaviorState::SeekWater => {
            match steering::nearest_water(grid, me.pos, WATER_SEARCH_RADIUS, WATER_SOURCE_LEVEL) {
                Some(target) => steering::toward(me.pos, target, speed),
                None => steering::wander(speed, rng),
            }
        }
        BehaviorState::Rest => Vec2::ZERO,
        BehaviorState::Wander => steering::wander(speed * 0.5, rng),
    }
}

/// Graze the current cell and drink from it or from adjacent sea.
fn feed(me: &mut Animal, species: &Species, grid: &mut TileGrid, recovery: f32) {
    let (x, y) = me.tile();
    let Some(i) = grid.index(x, y) else {
        return;
    };
    if !species.is_predator() && me.hunger >= GRAZE_HUNGER && grid.is_land_at(i) {
        let v = grid.vegetation(x, y);
        if v > GRAZE_MIN_VEGETATION {
            let bite = v.min(GRAZE_BITE);
            grid.set_vegetation(x, y, v - bite);
            me.hunger -= species.energy_from_food * bite * 10.0;
            me.energy += species.energy_from_food * bite * 5.0 * recovery;
        }
    }
    if me.thirst >= DRINK_THIRST && water_access(grid, x, y) > DRINK_MIN_WATER {
        me.thirst -= species.energy_from_water;
        me.energy += DRINK_ENERGY * recovery;
    }
}

/// Water reachable from a tile: its own, or the sea when standing on the shore.
fn water_access(grid: &TileGrid, x: i32, y: i32) -> f32 {
    let shore = grid.neighbors4(x, y).any(|(nx, ny)| grid.is_ocean(nx, ny));
    if shore { 1.0 } else { grid.water(x, y) }
}

fn find_mate(
    view: &AgentView,
    views: &[AgentView],
    index: &SpatialIndex<usize>,
    eligible: impl Fn(u32) -> bool,
) -> Option<u32> {
    let mut mate = None;
    index.for_each_within(view.pos, MATE_RADIUS, |k, _, _| {
        let other = &views[k];
        if mate.is_none()
            && other.id != view.id
            && other.species == view.species
            && other.sex == view.sex.opposite()
            && eligible(other.slot)
        {
            mate = Some(other.slot);
        }
    });
    mate
}

fn clamp_needs(me: &mut Animal) {
    me.energy = me.energy.clamp(0.0, 1.0);
    me.hunger = me.hunger.clamp(0.0, 1.0);
    me.thirst = me.thirst.clamp(0.0, 1.0);
    me.fear = me.fear.clamp(0.0, 1.0);
}

fn clamp_to_grid(grid: &TileGrid, pos: &mut Vec2) {
    pos.x = pos.x.clamp(0.0, (grid.width() as f32 - 0.001).max(0.0));
    pos.y = pos.y.clamp(0.0, (grid.height() as f32 - 0.001).max(0.0));
}
