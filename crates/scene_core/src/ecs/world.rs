//! ECS World implementation
//!
//! The world owns the entity registry and one dense storage per component
//! type. Storages are created lazily the first time a component type is
//! added, all with the capacities the world was built with.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use super::components::TransformComponent;
use super::systems::TransformHierarchy;
use super::{Component, ComponentStorage, EcsError, Entity, EntityRegistry};
use crate::config::CoreConfig;

/// Type-erased view of a [`ComponentStorage`]
///
/// Lets the world hold storages of different component types in one map and
/// strip an entity from all of them on destruction.
pub trait ErasedStorage: Send + Sync {
    /// Drop the entity's component if it has one
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Number of live components
    fn len(&self) -> usize;

    /// Whether the storage holds no components
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component type name, for diagnostics
    fn component_name(&self) -> &'static str;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.try_remove(entity).is_ok()
    }

    fn len(&self) -> usize {
        ComponentStorage::len(self)
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// ECS World containing all entities and components
pub struct World {
    registry: EntityRegistry,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
    component_capacity: usize,
}

impl World {
    /// Create a world with the configured capacities
    pub fn new(config: &CoreConfig) -> Self {
        Self::with_capacity(config.max_entities, config.max_components_per_type)
    }

    /// Create a world holding up to `max_entities` entities and
    /// `max_components_per_type` components of each type
    ///
    /// # Panics
    /// Panics if either capacity is zero or the entity capacity does not fit
    /// in an entity id.
    pub fn with_capacity(max_entities: usize, max_components_per_type: usize) -> Self {
        assert!(max_components_per_type > 0, "component capacity must be positive");
        Self {
            registry: EntityRegistry::new(max_entities),
            storages: HashMap::new(),
            component_capacity: max_components_per_type,
        }
    }

    /// Create a new entity
    ///
    /// # Panics
    /// Panics if the entity pool is exhausted.
    pub fn create_entity(&mut self) -> Entity {
        self.registry.create()
    }

    /// Create a new entity, reporting pool exhaustion
    pub fn try_create_entity(&mut self) -> Result<Entity, EcsError> {
        self.registry.try_create()
    }

    /// Destroy an entity and every component it owns
    ///
    /// Children of a destroyed transform become roots.
    ///
    /// # Panics
    /// Panics if the entity is not alive.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if let Err(err) = self.try_destroy_entity(entity) {
            panic!("{err}");
        }
    }

    /// Destroy an entity, reporting a dead id
    pub fn try_destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.ensure_alive(entity)?;

        if self.has_component::<TransformComponent>(entity) {
            self.hierarchy().try_unlink(entity)?;
        }
        let mut removed = 0;
        for storage in self.storages.values_mut() {
            if storage.remove_entity(entity) {
                log::trace!("destroy {:?}: dropped {}", entity, storage.component_name());
                removed += 1;
            }
        }
        log::debug!("Destroyed {:?} ({} components)", entity, removed);

        self.registry.try_destroy(entity)
    }

    /// Whether the entity is currently alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Entity registry
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Attach a component to an entity
    ///
    /// # Panics
    /// Panics if the entity is dead, already has a `T`, or the `T` storage
    /// is full.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) {
        if let Err(err) = self.try_add_component(entity, component) {
            panic!("{err}");
        }
    }

    /// Attach a component, reporting precondition failures
    pub fn try_add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        self.ensure_alive(entity)?;
        self.storage_mut::<T>().try_add(entity, component)
    }

    /// Detach and return an entity's component
    ///
    /// Removing a transform also unlinks the entity from the hierarchy.
    ///
    /// # Panics
    /// Panics if the entity is dead or has no `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> T {
        match self.try_remove_component(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Detach and return an entity's component, reporting precondition failures
    pub fn try_remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        self.ensure_alive(entity)?;
        if TypeId::of::<T>() == TypeId::of::<TransformComponent>() && self.has_component::<T>(entity) {
            self.hierarchy().try_unlink(entity)?;
        }
        self.storage_mut::<T>().try_remove(entity)
    }

    /// Get an entity's component
    ///
    /// # Panics
    /// Panics if the entity is dead or has no `T`.
    pub fn get_component<T: Component>(&self, entity: Entity) -> &T {
        match self.try_get_component(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get an entity's component, reporting precondition failures
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.ensure_alive(entity)?;
        match self.storage::<T>() {
            Some(storage) => storage.try_get(entity),
            None => Err(EcsError::MissingComponent { entity, component: type_name::<T>() }),
        }
    }

    /// Get an entity's component mutably
    ///
    /// Transforms are not handed out here; use [`World::hierarchy`].
    ///
    /// # Panics
    /// Panics if the entity is dead, has no `T`, or `T` is a transform.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        match self.try_get_component_mut(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get an entity's component mutably, reporting precondition failures
    pub fn try_get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.ensure_alive(entity)?;
        if TypeId::of::<T>() == TypeId::of::<TransformComponent>() {
            return Err(EcsError::HierarchyOwned { entity, component: type_name::<T>() });
        }
        let storage = self
            .storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut::<ComponentStorage<T>>());
        match storage {
            Some(storage) => storage.try_get_mut(entity),
            None => Err(EcsError::MissingComponent { entity, component: type_name::<T>() }),
        }
    }

    /// Whether a live entity has a `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.is_alive(entity) && self.storage::<T>().is_some_and(|storage| storage.has(entity))
    }

    /// Storage for `T`, if any `T` was ever added
    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    /// Storage for `T`, created empty on first use
    ///
    /// Crate-internal: writing transforms here would bypass hierarchy links.
    ///
    /// ```compile_fail
    /// use scene_core::prelude::*;
    ///
    /// let mut world = World::default();
    /// world.storage_mut::<TransformComponent>();
    /// ```
    pub(crate) fn storage_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let entity_capacity = self.registry.capacity();
        let component_capacity = self.component_capacity;
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                log::debug!("Created {} storage", type_name::<T>());
                Box::new(ComponentStorage::<T>::new(entity_capacity, component_capacity))
            });

        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(storage) => storage,
            None => unreachable!("storage for {} registered under another type", type_name::<T>()),
        }
    }

    /// Transform hierarchy over this world's transforms
    pub fn hierarchy(&mut self) -> TransformHierarchy<'_> {
        TransformHierarchy::new(self.storage_mut::<TransformComponent>())
    }

    /// Number of component types with a storage
    pub fn storage_count(&self) -> usize {
        self.storages.len()
    }

    fn ensure_alive(&self, entity: Entity) -> Result<(), EcsError> {
        if self.registry.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::NotAlive(entity))
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}
