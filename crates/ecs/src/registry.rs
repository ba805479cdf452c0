use keystone_common::Entity;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Allocates and recycles entity handles.
///
/// Ids start at 1. Destroying an entity bumps the generation stored for its
/// id and queues the id for reuse; reuse bumps the generation once more, so
/// any handle captured before the destroy stays stale forever.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    /// Indexed by `id - 1`.
    slots: Vec<Slot>,
    free_ids: VecDeque<u32>,
    live: usize,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh handle, reusing the oldest freed id when one exists.
    pub fn create(&mut self) -> Entity {
        let entity = if let Some(id) = self.free_ids.pop_front() {
            let slot = &mut self.slots[id as usize - 1];
            slot.generation = slot.generation.wrapping_add(1);
            slot.alive = true;
            Entity::new(id, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                alive: true,
            });
            Entity::new(self.slots.len() as u32, 0)
        };
        self.live += 1;
        tracing::trace!(id = entity.id, generation = entity.generation, "entity created");
        entity
    }

    /// Invalidate `entity`. Returns false if it was not live.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_valid(entity) {
            return false;
        }
        let slot = &mut self.slots[entity.id as usize - 1];
        slot.generation = slot.generation.wrapping_add(1);
        slot.alive = false;
        self.free_ids.push_back(entity.id);
        self.live -= 1;
        tracing::trace!(id = entity.id, generation = entity.generation, "entity destroyed");
        true
    }

    pub fn is_valid(&self, entity: Entity) -> bool {
        if entity.id == 0 {
            return false;
        }
        self.slots
            .get(entity.id as usize - 1)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    /// Live entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| Entity::new(index as u32 + 1, slot.generation))
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of ids ever allocated (live or free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_id_is_one_with_generation_zero() {
        let mut registry = EntityRegistry::new();
        let e = registry.create();
        assert_eq!(e, Entity::new(1, 0));
        assert!(registry.is_valid(e));
        assert_eq!(registry.create(), Entity::new(2, 0));
    }

    #[test]
    fn sentinel_and_unallocated_are_invalid() {
        let mut registry = EntityRegistry::new();
        registry.create();
        assert!(!registry.is_valid(Entity::INVALID));
        assert!(!registry.is_valid(Entity::new(2, 0)));
        assert!(!registry.is_valid(Entity::new(1, 1)));
    }

    #[test]
    fn destroy_twice_fails() {
        let mut registry = EntityRegistry::new();
        let e = registry.create();
        assert!(registry.destroy(e));
        assert!(!registry.is_valid(e));
        assert!(!registry.destroy(e));
    }

    #[test]
    fn reuse_bumps_generation() {
        let mut registry = EntityRegistry::new();
        let old = registry.create();
        registry.destroy(old);
        let new = registry.create();
        assert_eq!(new.id, old.id);
        assert!(new.generation > old.generation);
        assert!(registry.is_valid(new));
        assert!(!registry.is_valid(old));
    }

    #[test]
    fn freed_ids_reused_oldest_first() {
        let mut registry = EntityRegistry::new();
        let a = registry.create();
        let b = registry.create();
        let c = registry.create();
        registry.destroy(b);
        registry.destroy(a);
        assert_eq!(registry.create().id, b.id);
        assert_eq!(registry.create().id, a.id);
        assert_eq!(registry.create().id, c.id + 1);
    }

    #[test]
    fn stale_handles_never_revive() {
        let mut registry = EntityRegistry::new();
        let mut captured = Vec::new();
        for _ in 0..20 {
            let e = registry.create();
            captured.push(e);
            registry.destroy(e);
        }
        let current = registry.create();
        assert!(registry.is_valid(current));
        for stale in captured {
            assert!(!registry.is_valid(stale), "{stale:?} should be stale");
        }
    }

    #[test]
    fn freed_slot_generation_is_not_forgeable() {
        let mut registry = EntityRegistry::new();
        let e = registry.create();
        registry.destroy(e);
        // The bumped generation has not been handed out yet.
        assert!(!registry.is_valid(Entity::new(e.id, e.generation + 1)));
    }

    #[test]
    fn iter_and_len_track_live_entities() {
        let mut registry = EntityRegistry::new();
        let a = registry.create();
        let b = registry.create();
        let c = registry.create();
        registry.destroy(b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.capacity(), 3);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![a, c]);
        registry.destroy(a);
        registry.destroy(c);
        assert!(registry.is_empty());
    }
}
