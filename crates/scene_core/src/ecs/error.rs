//! Precondition failures reported by the ECS layer
//!
//! These are programming errors in calling code. The plain operations
//! (`add`, `get`, `create`, ...) panic with the error text; the `try_*`
//! forms hand the same value back to callers that want to recover.

use super::Entity;

/// ECS precondition violation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Every entity id in the pool is in use
    #[error("entity pool exhausted (capacity {capacity})")]
    CapacityExhausted {
        /// Pool size
        capacity: usize,
    },

    /// The entity was never created or has been destroyed
    #[error("entity {0:?} is not alive")]
    NotAlive(Entity),

    /// The entity already owns a component of this type
    #[error("entity {entity:?} already has a {component} component")]
    DuplicateComponent {
        /// Offending entity
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// The entity has no component of this type
    #[error("entity {entity:?} has no {component} component")]
    MissingComponent {
        /// Offending entity
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// The entity id lies beyond the storage's entity capacity
    #[error("entity {entity:?} is outside the storage range (capacity {capacity})")]
    OutOfRange {
        /// Offending entity
        entity: Entity,
        /// Entity capacity of the storage
        capacity: usize,
    },

    /// The storage already holds its maximum number of components
    #[error("{component} storage is full (capacity {capacity})")]
    StorageFull {
        /// Component type name
        component: &'static str,
        /// Component capacity of the storage
        capacity: usize,
    },

    /// Parenting would make an entity its own ancestor
    #[error("making {child:?} a child of {parent:?} would create a cycle")]
    HierarchyCycle {
        /// Requested parent
        parent: Entity,
        /// Requested child
        child: Entity,
    },

    /// Transforms are written through the hierarchy so parent links stay intact
    #[error("{component} of entity {entity:?} can only be changed through World::hierarchy")]
    HierarchyOwned {
        /// Offending entity
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// An entity cannot be parented to itself
    #[error("entity {0:?} cannot be its own parent")]
    SelfParent(Entity),
}
