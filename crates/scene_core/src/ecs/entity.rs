//! Entity identifiers and the fixed-capacity entity registry

use serde::{Deserialize, Serialize};

use super::EcsError;

/// Entity identifier
///
/// Identifiers are recycled after destruction. Code that keeps an `Entity`
/// across frames must check [`EntityRegistry::is_alive`] before trusting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    id: u32,
}

impl Entity {
    /// Create an entity handle from a raw id
    pub const fn new(id: u32) -> Self {
        Self { id }
    }

    /// Get the entity ID
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Index of this entity in per-entity tables
    pub const fn index(&self) -> usize {
        self.id as usize
    }
}

/// Allocates and recycles entity ids from a fixed-size pool.
///
/// Both `create` and `destroy` are O(1): destroyed ids go on a LIFO free
/// list and are handed out again before any never-used id.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    alive: Vec<bool>,
    free: Vec<u32>,
    next_unused: u32,
    live_count: usize,
}

impl EntityRegistry {
    /// Create a registry that can hold `capacity` live entities
    ///
    /// # Panics
    /// Panics if `capacity` is zero or does not fit in a 32-bit id.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "entity capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "entity capacity {capacity} does not fit a 32-bit id"
        );

        Self {
            alive: vec![false; capacity],
            free: Vec::with_capacity(capacity),
            next_unused: 0,
            live_count: 0,
        }
    }

    /// Allocate a new entity
    ///
    /// # Panics
    /// Panics when the pool is exhausted.
    pub fn create(&mut self) -> Entity {
        match self.try_create() {
            Ok(entity) => entity,
            Err(err) => panic!("{err}"),
        }
    }

    /// Allocate a new entity, reporting exhaustion as an error
    pub fn try_create(&mut self) -> Result<Entity, EcsError> {
        let id = if let Some(id) = self.free.pop() {
            id
        } else if (self.next_unused as usize) < self.alive.len() {
            let id = self.next_unused;
            self.next_unused += 1;
            id
        } else {
            return Err(EcsError::CapacityExhausted { capacity: self.capacity() });
        };

        self.alive[id as usize] = true;
        self.live_count += 1;
        Ok(Entity::new(id))
    }

    /// Return an entity to the pool
    ///
    /// # Panics
    /// Panics if the entity is not live.
    pub fn destroy(&mut self, entity: Entity) {
        if let Err(err) = self.try_destroy(entity) {
            panic!("{err}");
        }
    }

    /// Return an entity to the pool, reporting a dead id as an error
    pub fn try_destroy(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::NotAlive(entity));
        }

        self.alive[entity.index()] = false;
        self.free.push(entity.id());
        self.live_count -= 1;
        Ok(())
    }

    /// Whether the id currently names a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Whether no entity is live
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Maximum number of live entities
    pub fn capacity(&self) -> usize {
        self.alive.len()
    }
}
