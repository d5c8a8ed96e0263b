//! Frustum culling over the ECS world
//!
//! Static bounds are baked into a [`Bvh`] by [`SpatialCuller::rebuild_static`];
//! dynamic bounds move every frame and are tested one by one in
//! [`SpatialCuller::cull`]. Both read the cached world matrices, so the
//! hierarchy should be updated first.

use super::bvh::{Bvh, BvhItem};
use super::scene_graph::{Aabb, Frustum};
use crate::config::CullingConfig;
use crate::ecs::components::{BoundsComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::Mat4;

/// Camera parameters for a visibility query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Projection matrix (camera space to clip space)
    pub projection: Mat4,
    /// Camera placement in world space
    pub camera_to_world: Mat4,
}

impl CameraView {
    /// Camera at `camera_to_world` with the given projection
    pub fn new(projection: Mat4, camera_to_world: Mat4) -> Self {
        Self { projection, camera_to_world }
    }

    /// Perspective camera at `camera_to_world`
    pub fn perspective(aspect: f32, fov_y: f32, near: f32, far: f32, camera_to_world: Mat4) -> Self {
        Self::new(Mat4::new_perspective(aspect, fov_y, near, far), camera_to_world)
    }

    /// World-space view frustum
    pub fn frustum(&self) -> Frustum {
        Frustum::from_camera(&self.projection, &self.camera_to_world)
    }
}

/// Counters from one [`SpatialCuller::cull`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Entities in the static tree
    pub static_candidates: usize,
    /// BVH nodes visited
    pub nodes_visited: usize,
    /// Dynamic entities tested individually
    pub dynamic_tested: usize,
    /// Entities reported visible
    pub visible: usize,
}

/// BVH for static geometry plus per-entity tests for everything else
#[derive(Debug, Default)]
pub struct SpatialCuller {
    bvh: Bvh,
    config: CullingConfig,
}

impl SpatialCuller {
    /// Create a culler with an empty static tree
    pub fn new(config: CullingConfig) -> Self {
        Self { bvh: Bvh::default(), config }
    }

    /// Rebuild the static tree from every static [`BoundsComponent`]
    ///
    /// The new tree is built completely before it replaces the old one.
    /// Returns the number of entities in it.
    pub fn rebuild_static(&mut self, world: &World) -> usize {
        let items: Vec<BvhItem> = bounds_in_world(world)
            .filter(|(_, bounds)| bounds.is_static)
            .map(|(entity, bounds)| BvhItem::new(entity, world_bounds(world, entity, bounds)))
            .collect();

        let bvh = Bvh::build(items);
        log::info!("Rebuilt static BVH with {} entities (depth {})", bvh.len(), bvh.depth());
        self.bvh = bvh;
        self.bvh.len()
    }

    /// Append every entity whose bounds intersect `frustum` to `visible`
    ///
    /// Static entities come from the tree in traversal order, followed by
    /// dynamic entities in storage order. With dynamic testing disabled
    /// every dynamic entity is appended.
    pub fn cull(&self, world: &World, frustum: &Frustum, visible: &mut Vec<Entity>) -> CullStats {
        let start = visible.len();
        let mut stats = CullStats {
            static_candidates: self.bvh.len(),
            nodes_visited: self.bvh.cull(frustum, visible),
            ..CullStats::default()
        };

        for (entity, bounds) in bounds_in_world(world).filter(|(_, bounds)| !bounds.is_static) {
            if !self.config.test_dynamic_entities {
                visible.push(entity);
                continue;
            }
            stats.dynamic_tested += 1;
            if frustum.intersects_aabb(&world_bounds(world, entity, bounds)) {
                visible.push(entity);
            }
        }

        stats.visible = visible.len() - start;
        log::trace!("Culling: {:?}", stats);
        stats
    }

    /// Static tree
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Culling settings
    pub fn config(&self) -> &CullingConfig {
        &self.config
    }
}

fn bounds_in_world(world: &World) -> impl Iterator<Item = (Entity, &BoundsComponent)> {
    world.storage::<BoundsComponent>().into_iter().flat_map(|storage| storage.iter())
}

// Entities without a transform keep their bounds as given
fn world_bounds(world: &World, entity: Entity, bounds: &BoundsComponent) -> Aabb {
    match world.try_get_component::<TransformComponent>(entity) {
        Ok(transform) => bounds.world_bounds(transform.world_matrix()),
        Err(_) => bounds.local,
    }
}
