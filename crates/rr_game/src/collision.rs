//! Overlap detection between the runner and the track entities.
//!
//! Everything is axis-aligned boxes in world space. There is no response:
//! a hit only raises an event (score or game over). Bonus hits recycle the ring
//! on the spot so it cannot be collected twice.

use glam::Vec3;

use crate::events::GameEvent;
use crate::pool::{EntityRole, TrackEntityPool};
use crate::score::Scoreboard;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn translated(self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    #[allow(dead_code)]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Touching faces count as overlap.
    pub fn intersects(&self, other: &Aabb3) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

#[derive(Debug, Default)]
pub struct CollisionDetector {
    checks: u64,
}

impl CollisionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `check` calls since creation.
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Test `character` against every entity in slot order. Stops at the first
    /// obstacle, since that ends the run.
    pub fn check(
        &mut self,
        character: &Aabb3,
        pool: &mut TrackEntityPool,
        score: &mut Scoreboard,
    ) -> Vec<GameEvent> {
        self.checks += 1;
        let mut events = Vec::new();

        for index in 0..pool.len() {
            let Some(entity) = pool.entity(index) else {
                continue;
            };
            if !entity.world_bounds(pool.scroll_offset()).intersects(character) {
                continue;
            }

            let (slot, kind) = (entity.slot, entity.kind);
            match entity.role() {
                EntityRole::Bonus => {
                    let total = score.add_bonus();
                    pool.recycle(index);
                    log::debug!("Collected {kind} in slot {slot}, score {total}");
                    events.push(GameEvent::BonusCollected { slot, score: total });
                }
                EntityRole::Obstacle => {
                    let (final_score, high_score) = score.record_game_over();
                    log::info!(
                        "Hit {kind} in slot {slot}: score {final_score}, high score {high_score}"
                    );
                    events.push(GameEvent::GameOver {
                        slot,
                        kind,
                        score: final_score,
                        high_score,
                    });
                    break;
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackConfig;
    use crate::pool::EntityKind;

    fn unit_box_at(center: Vec3) -> Aabb3 {
        Aabb3::from_center_half_extents(center, Vec3::splat(0.5))
    }

    /// Character box standing in the middle lane at the world origin.
    fn runner_box() -> Aabb3 {
        Aabb3::new(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 1.8, 0.5))
    }

    fn pool_with(kinds: &[EntityKind]) -> TrackEntityPool {
        let config = TrackConfig {
            entity_count: kinds.len(),
            guaranteed_rings: 0,
            ..TrackConfig::default()
        };
        let mut pool = TrackEntityPool::with_kinds(config, Some(3), kinds);
        // Park everything far down the track.
        for i in 0..pool.len() {
            pool.entity_mut(i).expect("entity").position.z = -1000.0 - i as f32 * 50.0;
        }
        pool
    }

    /// Put entity `index` at the runner's world position.
    fn move_onto_runner(pool: &mut TrackEntityPool, index: usize) {
        let scroll = pool.scroll_offset();
        let entity = pool.entity_mut(index).expect("entity");
        entity.position.x = 0.0;
        entity.position.z = -scroll;
    }

    #[test]
    fn overlapping_boxes_intersect() {
        let a = unit_box_at(Vec3::ZERO);
        assert!(a.intersects(&unit_box_at(Vec3::new(0.9, 0.0, 0.0))));
        assert!(a.intersects(&unit_box_at(Vec3::new(1.0, 0.0, 0.0))));
        assert!(!a.intersects(&unit_box_at(Vec3::new(1.1, 0.0, 0.0))));
        assert!(!a.intersects(&unit_box_at(Vec3::new(0.0, 0.0, -2.0))));
    }

    #[test]
    fn translated_keeps_size() {
        let b = unit_box_at(Vec3::ZERO).translated(Vec3::new(0.0, 0.0, -200.0));
        assert_eq!(b.size(), Vec3::ONE);
        assert_eq!(b.min.z, -200.5);
        assert!(b.is_valid());
    }

    #[test]
    fn no_contact_means_no_events() {
        let mut pool = pool_with(&[EntityKind::Ring, EntityKind::Box]);
        let mut score = Scoreboard::default();
        let mut detector = CollisionDetector::new();
        assert!(detector.check(&runner_box(), &mut pool, &mut score).is_empty());
        assert_eq!(score.score, 0);
        assert_eq!(detector.checks(), 1);
    }

    #[test]
    fn bonus_hit_scores_once_and_recycles_behind_last_slot() {
        let mut pool = pool_with(&[EntityKind::Ring, EntityKind::Box, EntityKind::Sphere]);
        move_onto_runner(&mut pool, 0);
        let last_depth = pool.last_slot_depth();

        let mut score = Scoreboard::default();
        let mut detector = CollisionDetector::new();
        let events = detector.check(&runner_box(), &mut pool, &mut score);

        assert_eq!(events, vec![GameEvent::BonusCollected { slot: 0, score: 1 }]);
        assert_eq!(score.score, 1);
        let ring = pool.entity(0).expect("ring");
        assert!(ring.position.z < last_depth);

        // Recycled far away, so a second check does not score again.
        assert!(detector.check(&runner_box(), &mut pool, &mut score).is_empty());
        assert_eq!(score.score, 1);
    }

    #[test]
    fn obstacle_hit_ends_run_and_updates_high_score() {
        let mut pool = pool_with(&[EntityKind::Ring, EntityKind::Box]);
        move_onto_runner(&mut pool, 1);

        let mut score = Scoreboard {
            score: 4,
            high_score: 2,
        };
        let events = CollisionDetector::new().check(&runner_box(), &mut pool, &mut score);
        assert_eq!(
            events,
            vec![GameEvent::GameOver {
                slot: 1,
                kind: EntityKind::Box,
                score: 4,
                high_score: 4
            }]
        );
        assert_eq!(score.high_score, 4);
    }

    #[test]
    fn high_score_keeps_previous_best() {
        let mut pool = pool_with(&[EntityKind::Sphere]);
        move_onto_runner(&mut pool, 0);
        let mut score = Scoreboard {
            score: 1,
            high_score: 9,
        };
        let events = CollisionDetector::new().check(&runner_box(), &mut pool, &mut score);
        assert!(matches!(
            events.as_slice(),
            [GameEvent::GameOver {
                score: 1,
                high_score: 9,
                ..
            }]
        ));
    }

    #[test]
    fn raised_bomb_only_hits_airborne_runner() {
        let mut pool = pool_with(&[EntityKind::Bomb]);
        move_onto_runner(&mut pool, 0);
        let mut score = Scoreboard::default();
        let mut detector = CollisionDetector::new();

        assert!(detector.check(&runner_box(), &mut pool, &mut score).is_empty());

        let airborne = runner_box().translated(Vec3::new(0.0, 3.0, 0.0));
        let events = detector.check(&airborne, &mut pool, &mut score);
        assert!(matches!(events.as_slice(), [GameEvent::GameOver { .. }]));
    }
}
