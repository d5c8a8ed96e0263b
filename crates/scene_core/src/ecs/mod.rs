//! Entity-Component-System implementation
//!
//! Entities are recycled integer ids from a fixed pool; each component type
//! lives in its own dense storage owned by the [`World`].

pub mod component;
pub mod components;
pub mod entity;
pub mod error;
pub mod storage;
pub mod systems;
pub mod world;

pub use component::Component;
pub use entity::{Entity, EntityRegistry};
pub use error::EcsError;
pub use storage::ComponentStorage;
pub use systems::TransformHierarchy;
pub use world::{ErasedStorage, World};
