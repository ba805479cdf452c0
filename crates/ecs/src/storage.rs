use keystone_common::Entity;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

/// Anything cloneable with a static lifetime can be stored as a component.
pub trait Component: Clone + 'static {}

impl<T: Clone + 'static> Component for T {}

/// All components of one kind, keyed by entity.
///
/// BTreeMap keeps iteration order stable between mutations. Entries are not
/// checked against any registry.
#[derive(Debug, Clone)]
pub struct ComponentStorage<T> {
    components: BTreeMap<Entity, T>,
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
        }
    }
}

impl<T: Component> ComponentStorage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the component for `entity`.
    pub fn insert(&mut self, entity: Entity, component: T) -> bool {
        self.components.insert(entity, component);
        true
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.components.remove(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.components.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components.iter().map(|(entity, component)| (*entity, component))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.components
            .iter_mut()
            .map(|(entity, component)| (*entity, component))
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.components.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }
}

/// Object-safe view of a [`ComponentStorage`] with its type erased.
pub trait ErasedStorage {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains_entity(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn len(&self) -> usize {
        ComponentStorage::len(self)
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One storage per component type, created on first insert.
#[derive(Default)]
pub struct Storages {
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl Storages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<ComponentStorage<T>>())
    }

    pub fn get_or_create<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("storage registered under a foreign TypeId")
    }

    /// Strip `entity` from every storage. Returns how many held it.
    pub fn remove_entity(&mut self, entity: Entity) -> usize {
        self.storages
            .values_mut()
            .map(|storage| storage.remove_entity(entity))
            .filter(|removed| *removed)
            .count()
    }

    /// Type names of every component `entity` carries, unordered.
    pub fn component_names(&self, entity: Entity) -> Vec<&'static str> {
        self.storages
            .values()
            .filter(|storage| storage.contains_entity(entity))
            .map(|storage| storage.component_name())
            .collect()
    }

    /// Number of component kinds that have a storage.
    pub fn kinds(&self) -> usize {
        self.storages.len()
    }
}

impl std::fmt::Debug for Storages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.storages
                    .values()
                    .map(|storage| (storage.component_name(), storage.len())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(i32);

    #[derive(Debug, Clone, PartialEq)]
    struct Tag;

    #[test]
    fn insert_overwrites() {
        let mut storage = ComponentStorage::new();
        let e = Entity::new(1, 0);
        assert!(storage.insert(e, Health(10)));
        assert!(storage.insert(e, Health(20)));
        assert_eq!(storage.get(e), Some(&Health(20)));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let mut storage = ComponentStorage::new();
        let e = Entity::new(1, 0);
        assert!(storage.remove(e).is_none());
        storage.insert(e, Health(1));
        assert_eq!(storage.remove(e), Some(Health(1)));
        assert!(!storage.contains(e));
    }

    #[test]
    fn generations_are_separate_keys() {
        let mut storage = ComponentStorage::new();
        storage.insert(Entity::new(1, 0), Health(1));
        assert!(storage.get(Entity::new(1, 1)).is_none());
    }

    #[test]
    fn iteration_is_stable_between_mutations() {
        let mut storage = ComponentStorage::new();
        for id in [5, 2, 9, 1] {
            storage.insert(Entity::new(id, 0), Health(id as i32));
        }
        let first: Vec<_> = storage.entities().collect();
        let second: Vec<_> = storage.iter().map(|(e, _)| e).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn iter_mut_updates_in_place() {
        let mut storage = ComponentStorage::new();
        storage.insert(Entity::new(1, 0), Health(1));
        storage.insert(Entity::new(2, 0), Health(2));
        for (_, health) in storage.iter_mut() {
            health.0 *= 10;
        }
        assert_eq!(storage.get(Entity::new(2, 0)), Some(&Health(20)));
    }

    #[test]
    fn storages_create_on_demand() {
        let mut storages = Storages::new();
        assert!(storages.get::<Health>().is_none());
        storages.get_or_create::<Health>().insert(Entity::new(1, 0), Health(3));
        assert_eq!(storages.kinds(), 1);
        assert_eq!(
            storages.get::<Health>().and_then(|s| s.get(Entity::new(1, 0))),
            Some(&Health(3))
        );
        assert!(storages.get::<Tag>().is_none());
    }

    #[test]
    fn remove_entity_strips_every_kind() {
        let mut storages = Storages::new();
        let e = Entity::new(1, 0);
        let other = Entity::new(2, 0);
        storages.get_or_create::<Health>().insert(e, Health(3));
        storages.get_or_create::<Tag>().insert(e, Tag);
        storages.get_or_create::<Tag>().insert(other, Tag);

        assert_eq!(storages.remove_entity(e), 2);
        assert!(storages.component_names(e).is_empty());
        assert_eq!(storages.component_names(other).len(), 1);
        assert_eq!(storages.remove_entity(e), 0);
    }

    #[test]
    fn erased_storage_reports_type_name() {
        let storage = ComponentStorage::<Health>::new();
        let erased: &dyn ErasedStorage = &storage;
        assert!(erased.component_name().ends_with("Health"));
        assert!(erased.is_empty());
    }
}
