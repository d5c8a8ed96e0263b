//! Collision detection components for ECS
//!
//! Based on Game Engine Architecture 3rd Edition:
//! - Section 13.3: Collision Detection System
//! - Section 16.2: Component-based architecture

use serde::{Deserialize, Serialize};

use crate::ecs::{Component, Entity};
use crate::physics::collision::ColliderShape;
use crate::physics::CollisionLayers;

/// Component that marks an entity as having collision detection enabled
///
/// Static colliders never move; pairs of two static colliders are never
/// tested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderComponent {
    #[serde(skip)]
    entity: Option<Entity>,

    /// The collision shape, in model space
    pub shape: ColliderShape,

    /// Static (immovable) collider
    #[serde(default)]
    pub is_static: bool,

    /// Collision layer bitmask (what layer is this entity on?)
    /// See GEA 13.3.8: Collision filtering via layers
    #[serde(default)]
    pub layer: CollisionLayers,

    /// Collision mask (what layers can this entity collide with?)
    #[serde(default)]
    pub mask: CollisionLayers,
}

impl Component for ColliderComponent {
    fn attach(&mut self, entity: Entity) {
        self.entity = Some(entity);
    }
}

impl ColliderComponent {
    /// Create a new dynamic collider on every layer
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            entity: None,
            shape,
            is_static: false,
            layer: CollisionLayers::all(),
            mask: CollisionLayers::all(),
        }
    }

    /// Create a new static collider on every layer
    pub fn new_static(shape: ColliderShape) -> Self {
        Self::new(shape).as_static()
    }

    /// Create a collider with specific layer and mask
    pub fn with_layers(mut self, layer: CollisionLayers, mask: CollisionLayers) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    /// Mark the collider static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Owning entity, once attached to a storage
    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// Whether two colliders are tested against each other at all
    pub fn may_collide_with(&self, other: &ColliderComponent) -> bool {
        !(self.is_static && other.is_static)
            && CollisionLayers::should_collide(self.layer, self.mask, other.layer, other.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_static_pairs_are_skipped() {
        let wall = ColliderComponent::new_static(ColliderShape::cuboid(Vec3::new(1.0, 1.0, 1.0)));
        let floor = ColliderComponent::new_static(ColliderShape::cuboid(Vec3::new(5.0, 0.1, 5.0)));
        let ball = ColliderComponent::new(ColliderShape::sphere(0.5));

        assert!(!wall.may_collide_with(&floor));
        assert!(ball.may_collide_with(&wall));
        assert!(wall.may_collide_with(&ball));
    }

    #[test]
    fn test_layer_filtering() {
        let player = ColliderComponent::new(ColliderShape::sphere(0.5))
            .with_layers(CollisionLayers::PLAYER, CollisionLayers::ENVIRONMENT);
        let pickup = ColliderComponent::new(ColliderShape::sphere(0.25))
            .with_layers(CollisionLayers::PICKUP, CollisionLayers::PLAYER);

        assert!(!player.may_collide_with(&pickup));
    }

    #[test]
    fn test_serde_defaults() {
        let shape = ColliderShape::sphere(2.0).with_offset(Vec3::y());
        let text = format!("(shape: {})", ron::to_string(&shape).unwrap());
        let collider: ColliderComponent = ron::from_str(&text).unwrap();

        assert_eq!(collider.shape, shape);
        assert!(!collider.is_static);
        assert_eq!(collider.layer, CollisionLayers::all());
        assert_eq!(collider.entity(), None);
    }
}
