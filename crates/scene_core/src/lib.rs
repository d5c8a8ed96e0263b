//! # Scene Core
//!
//! Simulation core for a real-time 3D scene runtime.
//!
//! ## Features
//!
//! - **ECS Storage**: Entity registry with recycled ids and dense per-type component arrays
//! - **Transform Hierarchy**: Parent/child transforms with dirty-flag propagation
//! - **Collision Detection**: Oriented boxes and spheres via the separating axis theorem
//! - **Visibility Culling**: Static BVH plus per-entity frustum tests for dynamic bounds
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_core::prelude::*;
//!
//! let mut simulation = Simulation::new(CoreConfig::with_capacity(64));
//!
//! let world = simulation.world_mut();
//! let floor = world.create_entity();
//! world.add_component(floor, TransformComponent::identity());
//! world.add_component(floor, ColliderComponent::new_static(ColliderShape::cuboid(Vec3::new(10.0, 0.5, 10.0))));
//!
//! let ball = world.create_entity();
//! world.add_component(ball, TransformComponent::from_translation(Vec3::new(0.0, 1.2, 0.0)));
//! world.add_component(ball, ColliderComponent::new(ColliderShape::sphere(1.0)));
//! world.add_component(ball, BoundsComponent::cuboid(Vec3::new(1.0, 1.0, 1.0), false));
//!
//! let report = simulation.step();
//! assert_eq!(report.collision_events, 2);
//!
//! let camera = CameraView::perspective(16.0 / 9.0, 1.0, 0.1, 100.0, Mat4::new_translation(&Vec3::new(0.0, 2.0, 10.0)));
//! assert_eq!(simulation.visible_entities(&camera), vec![ball]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod physics;
pub mod scene;

mod simulation;

pub use simulation::{Simulation, StepReport};

#[cfg(test)]
mod tests;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, CoreConfig, CullingConfig},
        ecs::{
            components::{BoundsComponent, ColliderComponent, TransformComponent},
            Component, EcsError, Entity, TransformHierarchy, World,
        },
        foundation::math::{Mat4, Quat, Transform, Vec3},
        physics::{ColliderShape, CollisionDetector, CollisionEvent, CollisionLayers},
        scene::{Aabb, CameraView, Frustum, SceneGraph, SpatialCuller},
        Simulation, StepReport,
    };
}
