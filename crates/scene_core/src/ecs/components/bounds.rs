//! Bounding volume consumed by the spatial culler

use serde::{Deserialize, Serialize};

use crate::ecs::{Component, Entity};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::Aabb;

/// Model-space bounding box of a renderable entity
///
/// Static bounds go into the BVH on the next static rebuild. Dynamic bounds
/// are frustum-tested individually every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsComponent {
    #[serde(skip)]
    entity: Option<Entity>,

    /// Bounding box in model space
    pub local: Aabb,

    /// Whether the entity belongs in the static BVH
    #[serde(default)]
    pub is_static: bool,
}

impl Component for BoundsComponent {
    fn attach(&mut self, entity: Entity) {
        self.entity = Some(entity);
    }
}

impl BoundsComponent {
    /// Dynamic bounds
    pub fn new(local: Aabb) -> Self {
        Self { entity: None, local, is_static: false }
    }

    /// Static bounds
    pub fn new_static(local: Aabb) -> Self {
        Self { entity: None, local, is_static: true }
    }

    /// Bounds of a box with the given half extents around the origin
    pub fn cuboid(half_extents: Vec3, is_static: bool) -> Self {
        Self { entity: None, local: Aabb::new(Vec3::zeros(), half_extents), is_static }
    }

    /// Owning entity, once attached to a storage
    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// World-space box under the given world matrix
    pub fn world_bounds(&self, world: &Mat4) -> Aabb {
        self.local.transformed(world)
    }
}
