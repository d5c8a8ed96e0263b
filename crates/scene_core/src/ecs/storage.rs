//! Dense component storage
//!
//! Components of one type live in a contiguous array. A sparse table keyed
//! by entity index records each entity's slot in that array.
//!
//! Removal swaps the last live component into the freed slot, so the order of
//! components changes and any reference taken before a removal must be
//! re-fetched by entity afterwards. The borrow checker enforces this for
//! references; indices obtained from iteration have no such protection.

use std::any::type_name;

use super::{Component, EcsError, Entity};

/// Dense storage for a single component type
pub struct ComponentStorage<T: Component> {
    /// Live components, packed at the front
    dense: Vec<T>,
    /// Owner of each dense slot
    owners: Vec<Entity>,
    /// Entity index -> dense slot
    slots: Vec<Option<u32>>,
    /// Maximum number of live components
    capacity: usize,
}

impl<T: Component> ComponentStorage<T> {
    /// Create storage addressing `entity_capacity` entity ids and holding up
    /// to `component_capacity` components
    pub fn new(entity_capacity: usize, component_capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(component_capacity),
            owners: Vec::with_capacity(component_capacity),
            slots: vec![None; entity_capacity],
            capacity: component_capacity,
        }
    }

    /// Whether the entity owns a component in this storage
    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    /// Get the entity's component
    ///
    /// # Panics
    /// Panics if the entity has no component here.
    pub fn get(&self, entity: Entity) -> &T {
        match self.try_get(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get the entity's component, or report it missing
    pub fn try_get(&self, entity: Entity) -> Result<&T, EcsError> {
        self.slot(entity)
            .map(|slot| &self.dense[slot])
            .ok_or_else(|| Self::missing(entity))
    }

    /// Get the entity's component mutably
    ///
    /// # Panics
    /// Panics if the entity has no component here.
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        match self.try_get_mut(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get the entity's component mutably, or report it missing
    pub fn try_get_mut(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        match self.slot(entity) {
            Some(slot) => Ok(&mut self.dense[slot]),
            None => Err(Self::missing(entity)),
        }
    }

    /// Attach a component to an entity
    ///
    /// # Panics
    /// Panics if the entity already has one, lies outside the entity range,
    /// or the storage is full.
    pub fn add(&mut self, entity: Entity, value: T) {
        if let Err(err) = self.try_add(entity, value) {
            panic!("{err}");
        }
    }

    /// Attach a component to an entity, reporting precondition failures
    pub fn try_add(&mut self, entity: Entity, mut value: T) -> Result<(), EcsError> {
        let Some(sparse) = self.slots.get(entity.index()) else {
            return Err(EcsError::OutOfRange { entity, capacity: self.slots.len() });
        };
        if sparse.is_some() {
            return Err(EcsError::DuplicateComponent { entity, component: type_name::<T>() });
        }
        if self.dense.len() >= self.capacity {
            return Err(EcsError::StorageFull { component: type_name::<T>(), capacity: self.capacity });
        }

        let slot = u32::try_from(self.dense.len())
            .map_err(|_| EcsError::StorageFull { component: type_name::<T>(), capacity: self.capacity })?;

        value.attach(entity);
        self.slots[entity.index()] = Some(slot);
        self.dense.push(value);
        self.owners.push(entity);
        Ok(())
    }

    /// Detach and return an entity's component
    ///
    /// # Panics
    /// Panics if the entity has no component here.
    pub fn remove(&mut self, entity: Entity) -> T {
        match self.try_remove(entity) {
            Ok(component) => component,
            Err(err) => panic!("{err}"),
        }
    }

    /// Detach and return an entity's component, or report it missing
    pub fn try_remove(&mut self, entity: Entity) -> Result<T, EcsError> {
        let slot = self.slot(entity).ok_or_else(|| Self::missing(entity))?;

        self.slots[entity.index()] = None;
        let removed = self.dense.swap_remove(slot);
        self.owners.swap_remove(slot);

        // The former last element now sits in `slot`
        if let Some(&moved) = self.owners.get(slot) {
            self.slots[moved.index()] = Some(slot as u32);
        }

        Ok(removed)
    }

    /// Iterate over live components with their owners
    ///
    /// Order is storage order, not entity order, and changes on removal.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterate mutably over live components with their owners
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }

    /// Owners of the live components, in storage order
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    /// Live components, in storage order
    pub fn values(&self) -> &[T] {
        &self.dense
    }

    /// Number of live components
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the storage is empty
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Maximum number of live components
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every component
    pub fn clear(&mut self) {
        for owner in self.owners.drain(..) {
            self.slots[owner.index()] = None;
        }
        self.dense.clear();
    }

    #[inline]
    fn slot(&self, entity: Entity) -> Option<usize> {
        self.slots
            .get(entity.index())
            .copied()
            .flatten()
            .map(|slot| slot as usize)
    }

    fn missing(entity: Entity) -> EcsError {
        EcsError::MissingComponent { entity, component: type_name::<T>() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(i32);

    impl Component for Health {}

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Tagged {
        owner: Option<Entity>,
        label: &'static str,
    }

    impl Component for Tagged {
        fn attach(&mut self, entity: Entity) {
            self.owner = Some(entity);
        }
    }

    fn entity(id: u32) -> Entity {
        Entity::new(id)
    }

    #[test]
    fn test_add_then_get() {
        let mut storage = ComponentStorage::new(16, 16);
        storage.add(entity(3), Health(42));

        assert!(storage.has(entity(3)));
        assert_eq!(storage.get(entity(3)), &Health(42));
        assert!(!storage.has(entity(4)));
    }

    #[test]
    fn test_add_records_owner() {
        let mut storage = ComponentStorage::new(16, 16);
        storage.add(entity(5), Tagged { owner: None, label: "crate" });

        assert_eq!(storage.get(entity(5)).owner, Some(entity(5)));
        assert_eq!(storage.get(entity(5)).label, "crate");
    }

    #[test]
    fn test_remove_compacts_and_keeps_values() {
        let mut storage = ComponentStorage::new(16, 16);
        storage.add(entity(1), Health(10));
        storage.add(entity(2), Health(20));
        storage.add(entity(3), Health(30));

        assert_eq!(storage.remove(entity(1)), Health(10));

        assert!(!storage.has(entity(1)));
        assert_eq!(storage.get(entity(2)), &Health(20));
        assert_eq!(storage.get(entity(3)), &Health(30));
        assert_eq!(storage.len(), 2);
        // Last element moved into the hole
        assert_eq!(storage.entities(), &[entity(3), entity(2)]);
    }

    #[test]
    fn test_remove_last_element() {
        let mut storage = ComponentStorage::new(4, 4);
        storage.add(entity(0), Health(1));
        storage.remove(entity(0));

        assert!(storage.is_empty());
        storage.add(entity(0), Health(2));
        assert_eq!(storage.get(entity(0)), &Health(2));
    }

    #[test]
    fn test_iteration_covers_exactly_live_components() {
        let mut storage = ComponentStorage::new(16, 16);
        for id in 0..6 {
            storage.add(entity(id), Health(id as i32));
        }
        storage.remove(entity(2));
        storage.remove(entity(4));

        let mut seen: Vec<_> = storage.iter().map(|(e, h)| (e.id(), h.0)).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![(0, 0), (1, 1), (3, 3), (5, 5)]);

        // Restartable
        assert_eq!(storage.iter().count(), 4);

        for (_, health) in storage.iter_mut() {
            health.0 *= 10;
        }
        assert_eq!(storage.get(entity(5)), &Health(50));
    }

    #[test]
    fn test_precondition_errors() {
        let mut storage = ComponentStorage::new(4, 2);
        storage.add(entity(0), Health(0));

        assert!(matches!(
            storage.try_add(entity(0), Health(1)),
            Err(EcsError::DuplicateComponent { .. })
        ));
        assert!(matches!(
            storage.try_add(entity(9), Health(1)),
            Err(EcsError::OutOfRange { capacity: 4, .. })
        ));
        storage.add(entity(1), Health(1));
        assert!(matches!(
            storage.try_add(entity(2), Health(2)),
            Err(EcsError::StorageFull { capacity: 2, .. })
        ));
        assert!(matches!(
            storage.try_remove(entity(3)),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(storage.try_get(entity(3)).is_err());
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn test_get_missing_panics() {
        let storage: ComponentStorage<Health> = ComponentStorage::new(4, 4);
        storage.get(entity(1));
    }

    #[test]
    fn test_clear() {
        let mut storage = ComponentStorage::new(8, 8);
        storage.add(entity(1), Health(1));
        storage.add(entity(6), Health(6));
        storage.clear();

        assert!(storage.is_empty());
        assert!(!storage.has(entity(6)));
    }
}
