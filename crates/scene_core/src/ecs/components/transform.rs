//! Transform component for the ECS system
//!
//! Holds the authored local TRS values, the cached world matrix and the
//! entity's links in the transform hierarchy. Only the local TRS values are
//! authored data; everything else is maintained by
//! [`TransformHierarchy`](crate::ecs::systems::TransformHierarchy), which is
//! also the only way to mutate a transform once it is attached. That keeps
//! the dirty flag and the Euler copy of the rotation honest.

use serde::{Deserialize, Serialize};

use crate::ecs::{Component, Entity};
use crate::foundation::math::{Mat4, Quat, Transform as MathTransform, Vec3};

/// ECS Transform component
///
/// The world matrix is valid whenever `is_dirty()` is false. New transforms
/// start dirty with an identity world matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformRecord", into = "TransformRecord")]
pub struct TransformComponent {
    entity: Option<Entity>,

    translation: Vec3,
    rotation: Quat,
    /// Euler copy of `rotation` (roll, pitch, yaw in radians)
    euler: Vec3,
    scale: Vec3,

    world_matrix: Mat4,
    dirty: bool,

    pub(crate) parent: Option<Entity>,
    pub(crate) children: Vec<Entity>,
}

/// Persisted form of a transform: the authored local TRS values only
#[derive(Serialize, Deserialize)]
struct TransformRecord {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl From<TransformRecord> for TransformComponent {
    fn from(record: TransformRecord) -> Self {
        Self::from_trs(record.translation, record.rotation, record.scale)
    }
}

impl From<TransformComponent> for TransformRecord {
    fn from(transform: TransformComponent) -> Self {
        Self {
            translation: transform.translation,
            rotation: transform.rotation,
            scale: transform.scale,
        }
    }
}

impl Component for TransformComponent {
    fn attach(&mut self, entity: Entity) {
        self.entity = Some(entity);
        // Hierarchy links belong to the storage the value lives in
        self.parent = None;
        self.children.clear();
        self.dirty = true;
        self.sync_euler();
    }
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            entity: None,
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            euler: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            world_matrix: Mat4::identity(),
            dirty: true,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl TransformComponent {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from translation only
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create from full transform specification
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self {
            translation,
            rotation,
            scale,
            ..Default::default()
        };
        transform.sync_euler();
        transform
    }

    /// Builder pattern: Set rotation from quaternion
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self.sync_euler();
        self
    }

    /// Builder pattern: Set rotation from Euler angles (radians)
    pub fn with_rotation_euler(mut self, roll: f32, pitch: f32, yaw: f32) -> Self {
        self.rotation = Quat::from_euler_angles(roll, pitch, yaw);
        self.euler = Vec3::new(roll, pitch, yaw);
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Owning entity, once attached to a storage
    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// Local translation
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Local rotation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local rotation as Euler angles (roll, pitch, yaw in radians)
    pub fn rotation_euler(&self) -> Vec3 {
        self.euler
    }

    /// Local scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Cached world matrix (stale while dirty)
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Whether the world matrix needs recomputing
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Parent entity, `None` for roots
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Child entities in insertion order
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Local TRS matrix
    pub fn local_matrix(&self) -> Mat4 {
        MathTransform {
            position: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
        .to_matrix()
    }

    pub(crate) fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    pub(crate) fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.sync_euler();
    }

    pub(crate) fn set_rotation_euler(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler_angles(euler.x, euler.y, euler.z);
        self.euler = euler;
    }

    pub(crate) fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub(crate) fn set_local(&mut self, local: &MathTransform) {
        self.translation = local.position;
        self.scale = local.scale;
        self.set_rotation(local.rotation);
    }

    pub(crate) fn set_world_matrix(&mut self, matrix: Mat4) {
        self.world_matrix = matrix;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn sync_euler(&mut self) {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        self.euler = Vec3::new(roll, pitch, yaw);
    }
}
