//! Per-frame systems driven in registration order.

use glam::Mat4;
use keystone_common::Entity;
use std::any::Any;

use crate::scene::Scene;
use crate::transform_cache::TransformCache;

/// A unit of per-frame work over a [`Scene`].
pub trait System: Any {
    fn name(&self) -> &str;

    fn initialize(&mut self, _scene: &mut Scene) {}

    fn update(&mut self, _scene: &mut Scene, _dt: f32) {}

    fn shutdown(&mut self, _scene: &mut Scene) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Owns systems and runs their lifecycle stages in the order they were added.
#[derive(Default)]
pub struct SystemManager {
    systems: Vec<Box<dyn System>>,
}

impl SystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_system<S: System>(&mut self, system: S) -> &mut S {
        tracing::debug!(system = system.name(), "registered system");
        self.systems.push(Box::new(system));
        self.systems
            .last_mut()
            .and_then(|system| system.as_any_mut().downcast_mut::<S>())
            .expect("system just pushed has type S")
    }

    /// First registered system of type `S`.
    pub fn get_system<S: System>(&self) -> Option<&S> {
        self.systems
            .iter()
            .find_map(|system| system.as_any().downcast_ref::<S>())
    }

    pub fn get_system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems
            .iter_mut()
            .find_map(|system| system.as_any_mut().downcast_mut::<S>())
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Drop all systems without running `shutdown`.
    pub fn clear(&mut self) {
        self.systems.clear();
    }

    pub fn initialize(&mut self, scene: &mut Scene) {
        for system in &mut self.systems {
            tracing::debug!(system = system.name(), "initializing system");
            system.initialize(scene);
        }
    }

    pub fn update(&mut self, scene: &mut Scene, dt: f32) {
        for system in &mut self.systems {
            system.update(scene, dt);
        }
    }

    pub fn shutdown(&mut self, scene: &mut Scene) {
        for system in &mut self.systems {
            tracing::debug!(system = system.name(), "shutting down system");
            system.shutdown(scene);
        }
    }
}

impl std::fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.systems.iter().map(|system| system.name()))
            .finish()
    }
}

/// Keeps world matrices fresh once per frame.
#[derive(Debug, Default)]
pub struct TransformSystem {
    cache: Option<TransformCache>,
}

impl TransformSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache(&self) -> Option<&TransformCache> {
        self.cache.as_ref()
    }

    pub fn mark_dirty(&mut self, scene: &Scene, entity: Entity) {
        if let Some(cache) = self.cache.as_mut() {
            cache.mark_dirty(scene, entity);
        }
    }

    /// Identity until the system has been initialized.
    pub fn get_world_transform(&mut self, scene: &Scene, entity: Entity) -> Mat4 {
        match self.cache.as_mut() {
            Some(cache) => cache.get_world_transform(scene, entity),
            None => Mat4::IDENTITY,
        }
    }
}

impl System for TransformSystem {
    fn name(&self) -> &str {
        "TransformSystem"
    }

    fn initialize(&mut self, scene: &mut Scene) {
        self.cache = Some(TransformCache::attach(scene));
    }

    fn update(&mut self, scene: &mut Scene, _dt: f32) {
        if let Some(cache) = self.cache.as_mut() {
            cache.refresh(scene);
        }
    }

    fn shutdown(&mut self, _scene: &mut Scene) {
        self.cache = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
