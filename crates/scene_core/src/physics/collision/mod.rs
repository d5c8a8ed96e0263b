//! Narrow-phase collision geometry
//!
//! Follows Game Engine Architecture 3rd Edition (GEA 13.3.4):
//! - **Model Space Storage**: Collision shapes stored in local coordinates
//! - **On-Demand Transformation**: Shapes transformed to world space only during tests
//!
//! - [`primitives`] - World-space spheres and oriented boxes
//! - [`shape`] - Model-space collider shapes and their world-space form
//! - [`narrow_phase`] - Pairwise overlap tests producing separation vectors

pub mod narrow_phase;
pub mod primitives;
pub mod shape;

pub use primitives::{BoundingSphere, OrientedBox};
pub use shape::{ColliderShape, ShapeKind, WorldSpaceShape};
