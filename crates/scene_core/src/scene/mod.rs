//! Visibility: bounding volumes, view frusta and the static BVH
//!
//! ## Architecture
//!
//! ```text
//! ECS World (BoundsComponent + TransformComponent)
//!      ↓
//! SpatialCuller ── static ──→ Bvh (rebuilt on demand)
//!      │
//!      └──────── dynamic ──→ per-entity frustum test
//! ```
//!
//! [`SceneGraph`] is the common query interface; [`SimpleListGraph`] answers
//! the same queries by brute force.

mod bvh;
mod culling;
mod scene_graph;

pub use bvh::{Bvh, BvhItem, BvhNode, BvhNodeKind};
pub use culling::{CameraView, CullStats, SpatialCuller};
pub use scene_graph::{Aabb, Frustum, Plane, SceneGraph, SimpleListGraph};
