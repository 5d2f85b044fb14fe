//! Fixed-size pool of track entities (rings, boxes, spheres, bombs).
//!
//! Entities live in a container that scrolls toward the viewer along +z. Each
//! one keeps a stable slot index for its whole life; once it scrolls past the
//! viewer it is re-placed behind the current last slot instead of being
//! destroyed. Respawn depth for slot `k` is
//!
//! ```text
//! last_slot_depth - k * slot_spacing - U(gap_min, gap_max)
//! ```
//!
//! so slots stay in depth buckets of their own no matter how many times they
//! recycle.

use std::fmt;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::collision::Aabb3;
use crate::config::TrackConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Ring,
    Box,
    Sphere,
    Bomb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRole {
    Bonus,
    Obstacle,
}

impl EntityKind {
    pub const ALL: &'static [EntityKind] = &[
        EntityKind::Ring,
        EntityKind::Box,
        EntityKind::Sphere,
        EntityKind::Bomb,
    ];

    pub fn role(self) -> EntityRole {
        match self {
            Self::Ring => EntityRole::Bonus,
            Self::Box | Self::Sphere | Self::Bomb => EntityRole::Obstacle,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ring => "ring",
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Bomb => "bomb",
        }
    }

    /// Height of the entity's center above the ground.
    pub fn rest_height(self) -> f32 {
        match self {
            Self::Ring => 1.2,
            Self::Box => 1.0,
            Self::Sphere => 0.8,
            Self::Bomb => 3.5,
        }
    }

    /// Half size of the collision box. Spinning kinds use a cube so the box
    /// does not depend on the current rotation.
    pub fn half_extents(self) -> Vec3 {
        match self {
            Self::Ring => Vec3::splat(0.6),
            Self::Box => Vec3::splat(1.0),
            Self::Sphere => Vec3::splat(0.8),
            Self::Bomb => Vec3::splat(0.7),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntity {
    pub kind: EntityKind,
    pub slot: usize,
    /// Position inside the scrolling container.
    pub position: Vec3,
    /// Euler angles in radians, only touched by idle spin.
    #[allow(dead_code)]
    pub rotation: Vec3,
}

impl TrackEntity {
    fn new(kind: EntityKind, slot: usize) -> Self {
        Self {
            kind,
            slot,
            position: Vec3::new(0.0, kind.rest_height(), 0.0),
            rotation: Vec3::ZERO,
        }
    }

    pub fn role(&self) -> EntityRole {
        self.kind.role()
    }

    pub fn world_z(&self, scroll_offset: f32) -> f32 {
        self.position.z + scroll_offset
    }

    pub fn world_bounds(&self, scroll_offset: f32) -> Aabb3 {
        Aabb3::from_center_half_extents(self.position, self.kind.half_extents())
            .translated(Vec3::new(0.0, 0.0, scroll_offset))
    }
}

pub struct TrackEntityPool {
    entities: Vec<TrackEntity>,
    scroll_offset: f32,
    rng: StdRng,
    config: TrackConfig,
}

impl TrackEntityPool {
    /// Build and populate the pool. `seed` makes placement reproducible.
    pub fn new(config: TrackConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut pool = Self {
            entities: Vec::with_capacity(config.entity_count),
            scroll_offset: config.initial_scroll_offset,
            rng,
            config,
        };
        pool.spawn_initial(pool.config.entity_count);
        pool
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[allow(dead_code)]
    pub fn entities(&self) -> &[TrackEntity] {
        &self.entities
    }

    pub fn entity(&self, index: usize) -> Option<&TrackEntity> {
        self.entities.get(index)
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Replace the pool contents with `count` fresh entities. The first
    /// `guaranteed_rings` slots are rings, the rest draw a kind at random.
    pub fn spawn_initial(&mut self, count: usize) {
        self.entities.clear();
        for slot in 0..count {
            let kind = if slot < self.config.guaranteed_rings {
                EntityKind::Ring
            } else {
                EntityKind::ALL
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(EntityKind::Ring)
            };
            self.entities.push(TrackEntity::new(kind, slot));
            self.place_entity(slot, self.initial_reference(slot));
        }
        log::debug!(
            "Spawned {} entities: {:?}",
            count,
            self.entities.iter().map(|e| e.kind.name()).collect::<Vec<_>>()
        );
    }

    /// Pick a random lane and a depth a random gap behind `reference_z`.
    pub fn place_entity(&mut self, index: usize, reference_z: f32) {
        let x = self.config.lanes.choose(&mut self.rng).copied().unwrap_or(0.0);
        let gap = self
            .rng
            .gen_range(self.config.spawn_gap_min..self.config.spawn_gap_max);
        if let Some(entity) = self.entities.get_mut(index) {
            entity.position.x = x;
            entity.position.z = reference_z - gap;
        }
    }

    fn initial_reference(&self, slot: usize) -> f32 {
        -(slot as f32 * self.config.slot_spacing)
    }

    /// Local z of the entity holding the highest slot index. Ties go to the
    /// deepest (minimum z) one. An empty pool yields 0.
    pub fn last_slot_depth(&self) -> f32 {
        let Some(max_slot) = self.entities.iter().map(|e| e.slot).max() else {
            log::warn!("Last-slot depth requested on an empty pool, using z = 0");
            return 0.0;
        };
        self.entities
            .iter()
            .filter(|e| e.slot == max_slot)
            .map(|e| e.position.z)
            .fold(f32::INFINITY, f32::min)
    }

    /// Re-place entity `index` behind the last slot, keeping slot and kind.
    pub fn recycle(&mut self, index: usize) {
        let Some(slot) = self.entities.get(index).map(|e| e.slot) else {
            return;
        };
        let reference = self.last_slot_depth() - slot as f32 * self.config.slot_spacing;
        self.place_entity(index, reference);
        log::trace!(
            "Recycled slot {} to z {:.1}",
            slot,
            self.entities[index].position.z
        );
    }

    /// Recycle every entity whose world z is past `threshold_z`. Entities are
    /// handled in order, so a recycled last slot moves the reference for the
    /// ones after it. Returns the recycled slots.
    pub fn recycle_if_passed(&mut self, threshold_z: f32) -> Vec<usize> {
        let mut recycled = Vec::new();
        for index in 0..self.entities.len() {
            let entity = &self.entities[index];
            if entity.world_z(self.scroll_offset) > threshold_z {
                recycled.push(entity.slot);
                self.recycle(index);
            }
        }
        recycled
    }

    /// Advance one tick: scroll, idle spin, then recycle.
    pub fn tick(&mut self, dt: f32) -> Vec<usize> {
        self.scroll_offset += dt * self.config.object_speed;

        let ring_spin = dt * self.config.ring_spin_rate;
        let bomb_spin = dt * self.config.bomb_spin_rate;
        for entity in &mut self.entities {
            match entity.kind {
                EntityKind::Bomb => entity.rotation.x += bomb_spin,
                EntityKind::Ring => entity.rotation.y += ring_spin,
                EntityKind::Box | EntityKind::Sphere => {}
            }
        }

        self.recycle_if_passed(self.config.recycle_threshold_z)
    }

    /// Back to the start of a run: initial scroll and a fresh set of entities.
    pub fn reset(&mut self) {
        self.scroll_offset = self.config.initial_scroll_offset;
        self.spawn_initial(self.config.entity_count);
    }

    #[cfg(test)]
    pub(crate) fn with_kinds(config: TrackConfig, seed: Option<u64>, kinds: &[EntityKind]) -> Self {
        let mut pool = Self::new(config, seed);
        for (entity, &kind) in pool.entities.iter_mut().zip(kinds) {
            entity.kind = kind;
            entity.position.y = kind.rest_height();
        }
        pool
    }

    #[cfg(test)]
    pub(crate) fn entity_mut(&mut self, index: usize) -> Option<&mut TrackEntity> {
        self.entities.get_mut(index)
    }

    #[cfg(test)]
    pub(crate) fn set_scroll_offset(&mut self, offset: f32) {
        self.scroll_offset = offset;
    }
}
