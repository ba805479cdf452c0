use glam::Mat4;
use keystone_common::Entity;
use keystone_common::math::{decompose_trs, translation_of};
use keystone_ecs::{Component, ComponentStorage, EntityRegistry, Name, Storages, Transform, Visible};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Weak;

use crate::config::{ReparentMode, SceneConfig};
use crate::hooks::{EventQueue, TransformEvent, TransformHooks};

/// Entities, their components and the parent/child graph.
///
/// Every query and mutation is gated on the entity being live; a stale or
/// null handle makes queries return nothing and mutations return `false`.
/// Adding, removing or modifying a [`Transform`] and changing a parent edge
/// notify the registered Transform hooks after the change is applied.
pub struct Scene {
    config: SceneConfig,
    registry: EntityRegistry,
    storages: Storages,
    parents: HashMap<Entity, Entity>,
    children: HashMap<Entity, Vec<Entity>>,
    hooks: TransformHooks,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            config,
            registry: EntityRegistry::new(),
            storages: Storages::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            hooks: TransformHooks::default(),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn set_reparent_mode(&mut self, mode: ReparentMode) {
        self.config.reparent = mode;
    }

    // --- Entity lifecycle ---

    /// Create an entity with a default [`Visible`] and, unless `name` is empty
    /// or the configured placeholder, a [`Name`].
    pub fn create_entity(&mut self, name: &str) -> Entity {
        let entity = self.registry.create();
        if !name.is_empty() && name != self.config.default_entity_name {
            self.add_component(entity, Name::new(name));
        }
        self.add_component(entity, Visible::default());
        tracing::debug!(%entity, name, "created entity");
        entity
    }

    /// Destroy `entity` and its whole subtree, leaves first.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.registry.is_valid(entity) {
            tracing::trace!(%entity, "destroy rejected: invalid entity");
            return false;
        }

        self.detach(entity);

        // Reversed pre-order visits every child before its parent.
        let mut doomed = vec![entity];
        doomed.extend(self.descendants(entity));

        let mut destroyed = false;
        for &current in doomed.iter().rev() {
            self.children.remove(&current);
            self.parents.remove(&current);

            let had_transform = self.has_component::<Transform>(current);
            self.storages.remove_entity(current);
            if had_transform {
                self.hooks.notify(TransformEvent::Removed(current));
            }

            tracing::debug!(entity = %current, "destroyed entity");
            destroyed = self.registry.destroy(current);
        }
        destroyed
    }

    /// Destroy every entity.
    pub fn clear(&mut self) {
        for root in self.roots() {
            self.destroy_entity(root);
        }
    }

    pub fn is_valid(&self, entity: Entity) -> bool {
        self.registry.is_valid(entity)
    }

    /// Live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.registry.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    // --- Components ---

    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if !self.registry.is_valid(entity) {
            return false;
        }
        let added = self.storages.get_or_create::<T>().insert(entity, component);
        if added && is_transform::<T>() {
            self.hooks.notify(TransformEvent::Added(entity));
        }
        added
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        if !self.registry.is_valid(entity) {
            return false;
        }
        let removed = self
            .storages
            .get_mut::<T>()
            .and_then(|storage| storage.remove(entity))
            .is_some();
        if removed && is_transform::<T>() {
            self.hooks.notify(TransformEvent::Removed(entity));
        }
        removed
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.registry.is_valid(entity) {
            return None;
        }
        self.storages.get::<T>()?.get(entity)
    }

    /// Mutable access. Changes made through this reference are not announced
    /// to hooks; use [`Scene::modify_component`] or
    /// [`Scene::mark_transform_dirty`] for Transforms.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.registry.is_valid(entity) {
            return None;
        }
        self.storages.get_mut::<T>()?.get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Run `f` on the component. For a Transform the local matrix is marked
    /// dirty and the modified hooks fire afterwards.
    pub fn modify_component<T, F>(&mut self, entity: Entity, f: F) -> bool
    where
        T: Component,
        F: FnOnce(&mut T),
    {
        let Some(component) = self.get_component_mut::<T>(entity) else {
            return false;
        };
        f(component);

        let any: &mut dyn Any = component;
        if let Some(transform) = any.downcast_mut::<Transform>() {
            transform.mark_dirty();
            self.hooks.notify(TransformEvent::Modified(entity));
        }
        true
    }

    /// Announce an in-place Transform edit (e.g. from a gizmo drag).
    pub fn mark_transform_dirty(&mut self, entity: Entity) -> bool {
        match self.get_component::<Transform>(entity) {
            Some(transform) => {
                transform.mark_dirty();
                self.hooks.notify(TransformEvent::Modified(entity));
                true
            }
            None => false,
        }
    }

    /// Visit every live entity carrying `T`. Order is stable but meaningless.
    pub fn for_each<T: Component>(&self, mut f: impl FnMut(Entity, &T)) {
        let Some(storage) = self.storages.get::<T>() else {
            return;
        };
        for (entity, component) in storage.iter() {
            if self.registry.is_valid(entity) {
                f(entity, component);
            }
        }
    }

    pub fn for_each_mut<T: Component>(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        let registry = &self.registry;
        let Some(storage) = self.storages.get_mut::<T>() else {
            return;
        };
        for (entity, component) in storage.iter_mut() {
            if registry.is_valid(entity) {
                f(entity, component);
            }
        }
    }

    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages.get::<T>()
    }

    /// Type names of the components on `entity`, unordered.
    pub fn component_names(&self, entity: Entity) -> Vec<&'static str> {
        if !self.registry.is_valid(entity) {
            return Vec::new();
        }
        self.storages.component_names(entity)
    }

    // --- Hierarchy ---

    /// Make `parent` the parent of `child`.
    ///
    /// Rejected without touching anything if either entity is invalid, if
    /// they are the same entity, or if `parent` is a descendant of `child`.
    /// When both carry a Transform the child's world matrix is preserved by
    /// re-deriving its local transform according to [`SceneConfig::reparent`].
    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> bool {
        if !self.registry.is_valid(child) || !self.registry.is_valid(parent) {
            tracing::trace!(%child, %parent, "set_parent rejected: invalid entity");
            return false;
        }
        if child == parent {
            tracing::trace!(%child, "set_parent rejected: self-parenting");
            return false;
        }
        if self.is_ancestor(child, parent) {
            tracing::trace!(%child, %parent, "set_parent rejected: would create a cycle");
            return false;
        }

        let preserved_world = (self.has_component::<Transform>(child)
            && self.has_component::<Transform>(parent))
        .then(|| self.compute_world_matrix(child));

        let old_parent = self.detach(child);
        self.parents.insert(child, parent);
        self.children.entry(parent).or_default().push(child);

        if let Some(child_world) = preserved_world {
            let parent_world = self.compute_world_matrix(parent);
            self.rebase_local(child, parent_world.inverse() * child_world);
        }

        tracing::debug!(%child, %parent, "reparented");
        self.hooks.notify(TransformEvent::Modified(child));
        if let Some(old) = old_parent.filter(|old| *old != parent) {
            self.hooks.notify(TransformEvent::Modified(old));
        }
        self.hooks.notify(TransformEvent::Modified(parent));
        true
    }

    /// Detach `child` from its parent, keeping its world transform.
    /// Returns false if it is invalid or has no parent.
    pub fn clear_parent(&mut self, child: Entity) -> bool {
        if !self.registry.is_valid(child) {
            return false;
        }
        let Some(old_parent) = self.parents.get(&child).copied() else {
            return false;
        };

        let preserved_world = self
            .has_component::<Transform>(child)
            .then(|| self.compute_world_matrix(child));
        self.detach(child);
        if let Some(child_world) = preserved_world {
            self.rebase_local(child, child_world);
        }

        tracing::debug!(%child, parent = %old_parent, "unparented");
        self.hooks.notify(TransformEvent::Modified(child));
        self.hooks.notify(TransformEvent::Modified(old_parent));
        true
    }

    /// `Entity::INVALID` when `entity` has no parent.
    pub fn parent(&self, entity: Entity) -> Entity {
        self.parents.get(&entity).copied().unwrap_or(Entity::INVALID)
    }

    /// Direct children in attach order.
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.children.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if `ancestor` appears on the parent chain above `entity`.
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = entity;
        while let Some(&parent) = self.parents.get(&current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// All descendants of `entity`, depth-first pre-order.
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack: Vec<Entity> = self.children(entity).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Live entities without a parent, in id order.
    pub fn roots(&self) -> Vec<Entity> {
        self.registry
            .iter()
            .filter(|entity| !self.parents.contains_key(entity))
            .collect()
    }

    /// First entity whose [`Name`] matches. With duplicate names which one
    /// is returned is unspecified.
    pub fn find_entity_by_name(&self, name: &str) -> Entity {
        self.storages
            .get::<Name>()
            .and_then(|storage| {
                storage
                    .iter()
                    .find(|(entity, n)| n.as_str() == name && self.registry.is_valid(*entity))
                    .map(|(entity, _)| entity)
            })
            .unwrap_or(Entity::INVALID)
    }

    // --- Transforms ---

    /// Uncached world matrix. A parent contributes only if it has a Transform.
    pub fn compute_world_matrix(&self, entity: Entity) -> Mat4 {
        if !self.has_component::<Transform>(entity) {
            return Mat4::IDENTITY;
        }

        let mut chain = vec![entity];
        let mut current = entity;
        loop {
            let parent = self.parent(current);
            if !self.has_component::<Transform>(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        chain.iter().rev().fold(Mat4::IDENTITY, |world, &link| {
            let local = self
                .get_component::<Transform>(link)
                .map_or(Mat4::IDENTITY, Transform::local_matrix);
            world * local
        })
    }

    // --- Hooks ---

    pub fn on_transform_added(&mut self, hook: impl FnMut(Entity) + 'static) {
        self.hooks.on_added(Box::new(hook));
    }

    pub fn on_transform_removed(&mut self, hook: impl FnMut(Entity) + 'static) {
        self.hooks.on_removed(Box::new(hook));
    }

    pub fn on_transform_modified(&mut self, hook: impl FnMut(Entity) + 'static) {
        self.hooks.on_modified(Box::new(hook));
    }

    pub(crate) fn subscribe_transform_queue(&mut self, queue: Weak<EventQueue>) {
        self.hooks.subscribe_queue(queue);
    }

    /// Registered hooks plus live queue subscribers.
    pub(crate) fn transform_subscriber_count(&self) -> usize {
        self.hooks.len()
    }

    // --- Internals ---

    /// Remove the parent edge of `child`, returning the old parent.
    fn detach(&mut self, child: Entity) -> Option<Entity> {
        let parent = self.parents.remove(&child)?;
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|sibling| *sibling != child);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
        Some(parent)
    }

    fn rebase_local(&mut self, entity: Entity, local: Mat4) {
        let mode = self.config.reparent;
        let Some(transform) = self.get_component_mut::<Transform>(entity) else {
            return;
        };
        match mode {
            ReparentMode::PreserveTranslation => {
                transform.set_position(translation_of(&local));
            }
            ReparentMode::PreserveWorld => {
                let (position, rotation, scale) = decompose_trs(&local);
                transform.position = position;
                transform.rotation = rotation;
                transform.scale = scale;
                transform.mark_dirty();
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("entities", &self.registry.len())
            .field("storages", &self.storages)
            .field("parent_edges", &self.parents.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

fn is_transform<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<Transform>()
}
