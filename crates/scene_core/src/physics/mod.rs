//! Physics module for collision detection and response
//!
//! Narrow-phase detection between oriented boxes and spheres, plus a minimal
//! penetration response. Not a rigid-body simulation.

pub mod collision;
pub mod collision_layers;
pub mod collision_system;
pub mod response;

pub use collision::{BoundingSphere, ColliderShape, OrientedBox, ShapeKind, WorldSpaceShape};
pub use collision_layers::CollisionLayers;
pub use collision_system::{CollisionDetector, CollisionEvent, CollisionPair};
pub use response::resolve_penetrations;
