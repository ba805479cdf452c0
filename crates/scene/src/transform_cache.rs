use glam::{Mat4, Vec3};
use keystone_common::Entity;
use keystone_common::math::translation_of;
use keystone_ecs::Transform;
use std::collections::HashMap;
use std::rc::Rc;

use crate::hooks::{EventQueue, TransformEvent};
use crate::scene::Scene;

/// Counters for cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub recomputes: u64,
}

#[derive(Debug, Clone, Copy)]
struct CachedWorld {
    matrix: Mat4,
    dirty: bool,
}

/// Lazily computed world matrices keyed by entity.
///
/// The cache never decides entity lifetime. It learns about Transform changes
/// through the scene's hooks: the scene pushes onto a queue it holds weakly,
/// and the cache drains that queue at the start of every query.
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: HashMap<Entity, CachedWorld>,
    pending: Rc<EventQueue>,
    stats: CacheStats,
}

impl TransformCache {
    /// A detached cache. Changes must be reported with [`TransformCache::mark_dirty`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache subscribed to `scene`'s Transform hooks.
    pub fn attach(scene: &mut Scene) -> Self {
        let cache = Self::new();
        cache.subscribe(scene);
        cache
    }

    /// Subscribe to another scene's hooks. Dropping the cache unsubscribes.
    pub fn subscribe(&self, scene: &mut Scene) {
        scene.subscribe_transform_queue(Rc::downgrade(&self.pending));
    }

    /// Mark `entity` and all of its descendants stale.
    pub fn mark_dirty(&mut self, scene: &Scene, entity: Entity) {
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.entries.get_mut(&current) {
                entry.dirty = true;
            }
            stack.extend_from_slice(scene.children(current));
        }
    }

    pub fn get_world_transform(&mut self, scene: &Scene, entity: Entity) -> Mat4 {
        self.apply_pending(scene);
        self.world_matrix(scene, entity)
    }

    pub fn world_translation(&mut self, scene: &Scene, entity: Entity) -> Vec3 {
        translation_of(&self.get_world_transform(scene, entity))
    }

    /// True when the next query for `entity` would recompute. Pending hook
    /// notifications are not applied by this call.
    pub fn is_dirty(&self, entity: Entity) -> bool {
        self.entries.get(&entity).is_none_or(|entry| entry.dirty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached matrix. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.borrow_mut().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Recompute every stale world matrix and drop entries for dead entities.
    pub fn refresh(&mut self, scene: &Scene) {
        let _span =
            tracing::info_span!("transform_refresh", entries = self.entries.len()).entered();
        self.apply_pending(scene);

        let before = self.entries.len();
        self.entries.retain(|entity, _| scene.is_valid(*entity));
        let purged = before - self.entries.len();

        let stale: Vec<Entity> = scene
            .storage::<Transform>()
            .map(|storage| {
                storage
                    .entities()
                    .filter(|entity| scene.is_valid(*entity) && self.is_dirty(*entity))
                    .collect()
            })
            .unwrap_or_default();
        for entity in &stale {
            self.world_matrix(scene, *entity);
        }

        tracing::debug!(recomputed = stale.len(), purged, "transform cache refreshed");
    }

    fn apply_pending(&mut self, scene: &Scene) {
        let events: Vec<TransformEvent> = self.pending.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                TransformEvent::Added(entity) | TransformEvent::Modified(entity) => {
                    self.mark_dirty(scene, entity);
                }
                TransformEvent::Removed(entity) => {
                    self.entries.remove(&entity);
                    for &child in scene.children(entity) {
                        self.mark_dirty(scene, child);
                    }
                }
            }
        }
    }

    /// Walks up to the nearest clean ancestor, then composes back down,
    /// caching every matrix on the way.
    fn world_matrix(&mut self, scene: &Scene, entity: Entity) -> Mat4 {
        if !scene.is_valid(entity) {
            return Mat4::IDENTITY;
        }

        let mut stale = Vec::new();
        let mut world = Mat4::IDENTITY;
        let mut current = entity;
        loop {
            if let Some(entry) = self.entries.get(&current).filter(|entry| !entry.dirty) {
                self.stats.hits += 1;
                world = entry.matrix;
                break;
            }
            if !scene.has_component::<Transform>(current) {
                break;
            }
            stale.push(current);
            let parent = scene.parent(current);
            if !scene.has_component::<Transform>(parent) {
                break;
            }
            current = parent;
        }

        for &link in stale.iter().rev() {
            let local = scene
                .get_component::<Transform>(link)
                .map_or(Mat4::IDENTITY, Transform::local_matrix);
            world *= local;
            let entry = CachedWorld {
                matrix: world,
                dirty: false,
            };
            self.entries.insert(link, entry);
            self.stats.recomputes += 1;
            tracing::trace!(entity = %link, "recomputed world matrix");
        }
        world
    }
}
