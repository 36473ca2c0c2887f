use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::world::animal::BehaviorState;
use crate::world::tile::TileGrid;

const SEPARATION_DISTANCE: f32 = 1.5;
const SEPARATION_WEIGHT: f32 = 1.5;
const ALIGNMENT_WEIGHT: f32 = 1.0;
const COHESION_WEIGHT: f32 = 0.5;

/// Share of the new velocity taken from the desired velocity each tick.
pub const STEERING_RESPONSE: f32 = 0.4;
pub const FLEE_SPEED_FACTOR: f32 = 1.3;
const ARRIVE_DISTANCE: f32 = 0.1;
const SHORE_PUSH: f32 = 0.5;

/// How strongly flocking bends the desired velocity in each state.
pub fn flock_weight(state: BehaviorState) -> f32 {
    match state {
        BehaviorState::Flee => 0.6,
        BehaviorState::Wander => 0.5,
        BehaviorState::SeekFood | BehaviorState::SeekWater => 0.15,
        BehaviorState::Rest => 0.05,
    }
}

/// Running sums for separation, alignment and cohesion over same-species
/// neighbors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flock {
    separation: Vec2,
    velocity_sum: Vec2,
    position_sum: Vec2,
    count: u32,
}

impl Flock {
    pub fn add(&mut self, me: Vec2, other_pos: Vec2, other_vel: Vec2) {
        let offset = me - other_pos;
        let d2 = offset.length_squared();
        if d2 > 0.0 && d2 < SEPARATION_DISTANCE * SEPARATION_DISTANCE {
            self.separation += offset / d2;
        }
        self.velocity_sum += other_vel;
        self.position_sum += other_pos;
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Combined flocking force, capped at `max_speed`.
    pub fn force(&self, me_pos: Vec2, me_vel: Vec2, max_speed: f32) -> Vec2 {
        if self.count == 0 {
            return Vec2::ZERO;
        }
        let n = self.count as f32;
        let alignment = self.velocity_sum / n - me_vel;
        let cohesion = (self.position_sum / n - me_pos).normalize_or_zero() * max_speed;
        let separation = self.separation.normalize_or_zero() * max_speed;
        (separation * SEPARATION_WEIGHT + alignment * ALIGNMENT_WEIGHT + cohesion * COHESION_WEIGHT)
            .clamp_length_max(max_speed)
    }
}

/// Velocity toward `target` at `speed`, or zero once within arrival distance.
pub fn toward(from: Vec2, target: Vec2, speed: f32) -> Vec2 {
    let delta = target - from;
    if delta.length() > ARRIVE_DISTANCE {
        delta.normalize_or_zero() * speed
    } else {
        Vec2::ZERO
    }
}

pub fn wander(speed: f32, rng: &mut ChaCha8Rng) -> Vec2 {
    Vec2::new(
        rng.gen_range(-0.5..0.5) * speed,
        rng.gen_range(-0.5..0.5) * speed,
    ) * 2.0
}

/// Blend the previous velocity with the desired one.
pub fn smooth(velocity: Vec2, desired: Vec2, max_speed: f32) -> Vec2 {
    (velocity * (1.0 - STEERING_RESPONSE) + desired * STEERING_RESPONSE).clamp_length_max(max_speed)
}

/// Keep a moved agent on land inside the grid. Agents that end up off-grid
/// or at sea are nudged toward the island centre and their velocity is reset
/// to point there.
pub fn keep_on_land(grid: &TileGrid, pos: &mut Vec2, vel: &mut Vec2, speed: f32) {
    let (x, y) = (pos.x.floor() as i32, pos.y.floor() as i32);
    if !pos.is_finite() || !grid.in_bounds(x, y) || grid.is_ocean(x, y) {
        let center = Vec2::new(grid.width() as f32 / 2.0, grid.height() as f32 / 2.0);
        if !pos.is_finite() {
            *pos = center;
        }
        let dir = (center - *pos).normalize_or_zero();
        *pos += dir * SHORE_PUSH;
        *vel = dir * speed * 0.5;
    }
    let max_x = (grid.width() as f32 - 0.001).max(0.0);
    let max_y = (grid.height() as f32 - 0.001).max(0.0);
    pos.x = pos.x.clamp(0.0, max_x);
    pos.y = pos.y.clamp(0.0, max_y);
}

/// Land cell with the most vegetation within `radius` tiles, ties broken by
/// scan order.
pub fn best_forage(grid: &TileGrid, pos: Vec2, radius: i32) -> Option<Vec2> {
    let (cx, cy) = (pos.x.floor() as i32, pos.y.floor() as i32);
    let mut best: Option<(f32, i32, i32)> = None;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (x, y) = (cx + dx, cy + dy);
            if !grid.in_bounds(x, y) || !grid.is_land(x, y) {
                continue;
            }
            let v = grid.vegetation(x, y);
            if best.is_none_or(|(bv, _, _)| v > bv) {
                best = Some((v, x, y));
            }
        }
    }
    best.map(|(_, x, y)| Vec2::new(x as f32 + 0.5, y as f32 + 0.5))
}

/// Nearest cell holding more than `min_water` within `radius` tiles.
pub fn nearest_water(grid: &TileGrid, pos: Vec2, radius: i32, min_water: f32) -> Option<Vec2> {
    let (cx, cy) = (pos.x.floor() as i32, pos.y.floor() as i32);
    let mut best: Option<(i32, i32, i32)> = None;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (x, y) = (cx + dx, cy + dy);
            if !grid.in_bounds(x, y) || grid.water(x, y) <= min_water {
                continue;
            }
            let d2 = dx * dx + dy * dy;
            if best.is_none_or(|(bd, _, _)| d2 < bd) {
                best = Some((d2, x, y));
            }
        }
    }
    best.map(|(_, x, y)| Vec2::new(x as f32 + 0.5, y as f32 + 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn island(size: usize, margin: usize) -> TileGrid {
        let mut grid = TileGrid::new(size, size);
        for y in margin..size - margin {
            for x in margin..size - margin {
                grid.set_elevation(x as i32, y as i32, 0.5);
            }
        }
        grid
    }

    #[test]
    fn empty_flock_has_no_force() {
        let flock = Flock::default();
        assert_eq!(flock.force(Vec2::ZERO, Vec2::ONE, 1.0), Vec2::ZERO);
    }

    #[test]
    fn close_neighbor_pushes_away() {
        let mut flock = Flock::default();
        let me = Vec2::new(5.0, 5.0);
        flock.add(me, Vec2::new(5.5, 5.0), Vec2::ZERO);
        let force = flock.force(me, Vec2::ZERO, 1.0);
        assert!(force.x < 0.0);
    }

    #[test]
    fn distant_neighbors_pull_together() {
        let mut flock = Flock::default();
        let me = Vec2::new(0.0, 0.0);
        flock.add(me, Vec2::new(5.0, 0.0), Vec2::ZERO);
        flock.add(me, Vec2::new(5.0, 2.0), Vec2::ZERO);
        let force = flock.force(me, Vec2::ZERO, 1.0);
        assert!(force.x > 0.0);
        assert!(force.length() <= 1.0 + 1e-5);
    }

    #[test]
    fn alignment_follows_neighbor_heading() {
        let mut flock = Flock::default();
        let me = Vec2::new(0.0, 0.0);
        flock.add(me, Vec2::new(0.0, 3.0), Vec2::new(0.0, 0.0));
        flock.add(me, Vec2::new(0.0, -3.0), Vec2::new(0.0, 0.0));
        let still = flock.force(me, Vec2::ZERO, 1.0);
        let mut moving = Flock::default();
        moving.add(me, Vec2::new(0.0, 3.0), Vec2::new(0.5, 0.0));
        moving.add(me, Vec2::new(0.0, -3.0), Vec2::new(0.5, 0.0));
        let aligned = moving.force(me, Vec2::ZERO, 1.0);
        assert!(aligned.x > still.x);
    }

    #[test]
    fn fleeing_flocks_more_than_resting() {
        assert!(flock_weight(BehaviorState::Flee) > flock_weight(BehaviorState::SeekFood));
        assert!(flock_weight(BehaviorState::SeekFood) > flock_weight(BehaviorState::Rest));
    }

    #[test]
    fn toward_stops_on_arrival() {
        assert_eq!(toward(Vec2::ZERO, Vec2::new(0.05, 0.0), 1.0), Vec2::ZERO);
        let v = toward(Vec2::ZERO, Vec2::new(3.0, 4.0), 0.5);
        assert!((v.length() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn smoothing_blends_velocity() {
        let v = smooth(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), 10.0);
        assert!((v - Vec2::new(0.6, 0.4)).length() < 1e-6);
    }

    #[test]
    fn wander_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..100 {
            let v = wander(0.3, &mut rng);
            assert!(v.x.abs() <= 0.3 && v.y.abs() <= 0.3);
        }
    }

    #[test]
    fn agent_at_sea_is_pushed_toward_center() {
        let grid = island(20, 5);
        let mut pos = Vec2::new(1.0, 10.0);
        let mut vel = Vec2::new(-1.0, 0.0);
        keep_on_land(&grid, &mut pos, &mut vel, 0.3);
        assert!(pos.x > 1.0);
        assert!(vel.x > 0.0);
    }

    #[test]
    fn position_clamped_into_grid() {
        let grid = island(20, 0);
        let mut pos = Vec2::new(25.0, -3.0);
        let mut vel = Vec2::ZERO;
        keep_on_land(&grid, &mut pos, &mut vel, 0.3);
        assert!(grid.in_bounds(pos.x.floor() as i32, pos.y.floor() as i32));
    }

    #[test]
    fn forage_finds_lushest_land() {
        let mut grid = island(20, 2);
        grid.set_vegetation(12, 10, 0.9);
        let target = best_forage(&grid, Vec2::new(10.5, 10.5), 4).unwrap();
        assert_eq!(target, Vec2::new(12.5, 10.5));
    }

    #[test]
    fn nearest_water_includes_shore() {
        let grid = island(20, 5);
        let target = nearest_water(&grid, Vec2::new(5.5, 10.5), 6, 0.3).unwrap();
        assert_eq!(target, Vec2::new(4.5, 10.5));
        assert!(nearest_water(&grid, Vec2::new(10.5, 10.5), 2, 0.3).is_none());
    }
}
