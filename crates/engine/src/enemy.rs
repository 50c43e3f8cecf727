//! Enemies walking the path, and the base they attack
//!
//! Enemies follow a fixed list of waypoints at constant speed. An enemy that
//! reaches the last waypoint deals its damage to the base and disappears; an
//! enemy whose health drops to zero is removed on the spot.

use tracing::debug;

use crate::types::WorldPos;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    pub damage: f32,
    /// World units per second
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: u32,
    pub position: WorldPos,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub speed: f32,
    /// Index of the waypoint being walked towards
    next_waypoint: usize,
}

#[derive(Debug, Clone)]
pub struct EnemyRoster {
    path: Vec<WorldPos>,
    enemies: Vec<Enemy>,
    pending: u32,
    next_id: u32,
}

impl EnemyRoster {
    pub fn new(path: Vec<WorldPos>) -> Self {
        Self {
            path,
            enemies: Vec::new(),
            pending: 0,
            next_id: 1,
        }
    }

    pub fn path(&self) -> &[WorldPos] {
        &self.path
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn alive_count(&self) -> usize {
        self.enemies.len()
    }

    /// Enemies announced for the current wave but not spawned yet
    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn set_pending(&mut self, n: u32) {
        self.pending = n;
    }

    /// Nothing pending and nothing alive
    pub fn is_clear(&self) -> bool {
        self.pending == 0 && self.enemies.is_empty()
    }

    /// Put a new enemy at the start of the path
    pub fn spawn(&mut self, stats: EnemyStats) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.pending = self.pending.saturating_sub(1);
        let start = self.path.first().copied().unwrap_or(WorldPos::ZERO);
        self.enemies.push(Enemy {
            id,
            position: start,
            health: stats.health,
            max_health: stats.health,
            damage: stats.damage,
            speed: stats.speed,
            next_waypoint: 1,
        });
        debug!(enemy = id, health = stats.health, "enemy spawned");
        id
    }

    /// Move every enemy `dt` seconds along the path
    ///
    /// Returns the damage dealt by enemies that reached the end.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let mut dealt = 0.0;
        let path = &self.path;
        self.enemies.retain_mut(|e| {
            let mut budget = e.speed * dt;
            while budget > 0.0 {
                let Some(target) = path.get(e.next_waypoint).copied() else {
                    break;
                };
                let to_target = target - e.position;
                let dist = to_target.length();
                if dist <= budget {
                    e.position = target;
                    e.next_waypoint += 1;
                    budget -= dist;
                } else {
                    e.position = e.position + to_target.scale(budget / dist);
                    budget = 0.0;
                }
            }
            if e.next_waypoint >= path.len() {
                dealt += e.damage;
                debug!(enemy = e.id, damage = e.damage, "enemy reached the base");
                return false;
            }
            true
        });
        dealt
    }

    /// Closest living enemy within `range` of `from`
    pub fn closest_in_range(&self, from: WorldPos, range: f32) -> Option<u32> {
        self.enemies
            .iter()
            .map(|e| (e.id, e.position.distance(from)))
            .filter(|(_, d)| *d <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Apply damage; returns true if the enemy died
    pub fn hit(&mut self, id: u32, damage: f32) -> bool {
        let Some(idx) = self.enemies.iter().position(|e| e.id == id) else {
            return false;
        };
        self.enemies[idx].health -= damage;
        if self.enemies[idx].health <= 0.0 {
            self.enemies.swap_remove(idx);
            debug!(enemy = id, "enemy killed");
            return true;
        }
        false
    }

    /// Drop every enemy and pending spawn
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.pending = 0;
    }
}

/// The defended base
#[derive(Debug, Clone, PartialEq)]
pub struct Base {
    pub position: WorldPos,
    health: f32,
    max_health: f32,
}

impl Base {
    pub fn new(position: WorldPos, max_health: f32) -> Self {
        Self {
            position,
            health: max_health,
            max_health,
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path() -> Vec<WorldPos> {
        vec![WorldPos::new(0.0, 5.0), WorldPos::new(0.0, 0.0)]
    }

    fn stats(speed: f32) -> EnemyStats {
        EnemyStats {
            health: 20.0,
            damage: 7.0,
            speed,
        }
    }

    #[test]
    fn test_enemy_walks_and_hits_base() {
        let mut roster = EnemyRoster::new(straight_path());
        roster.set_pending(1);
        roster.spawn(stats(2.0));
        assert_eq!(roster.pending(), 0);

        assert_eq!(roster.advance(1.0), 0.0);
        assert_eq!(roster.enemies()[0].position, WorldPos::new(0.0, 3.0));
        assert_eq!(roster.advance(2.0), 7.0);
        assert!(roster.is_clear());
    }

    #[test]
    fn test_closest_target_wins() {
        let mut roster = EnemyRoster::new(straight_path());
        let far = roster.spawn(stats(1.0));
        roster.advance(2.0);
        let near = roster.spawn(stats(1.0));
        // far is now at y=3, near at y=5
        let turret = WorldPos::new(0.0, 6.0);
        assert_eq!(roster.closest_in_range(turret, 10.0), Some(near));
        assert_eq!(roster.closest_in_range(WorldPos::new(0.0, 2.0), 1.5), Some(far));
        assert_eq!(roster.closest_in_range(WorldPos::new(9.0, 9.0), 1.0), None);
    }

    #[test]
    fn test_hit_kills_at_zero() {
        let mut roster = EnemyRoster::new(straight_path());
        let id = roster.spawn(stats(1.0));
        assert!(!roster.hit(id, 10.0));
        assert!(roster.hit(id, 10.0));
        assert_eq!(roster.alive_count(), 0);
        assert!(!roster.hit(id, 10.0));
    }

    #[test]
    fn test_base_health_floors_at_zero() {
        let mut base = Base::new(WorldPos::ZERO, 10.0);
        base.take_damage(4.0);
        assert_eq!(base.health(), 6.0);
        base.take_damage(40.0);
        assert_eq!(base.health(), 0.0);
        assert!(base.is_destroyed());
    }
}
