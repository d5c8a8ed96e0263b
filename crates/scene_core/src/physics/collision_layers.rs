//! Collision layer system for filtering collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.8:
//! "Most games need to filter collisions... This is typically done via
//! collision layers or groups."

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Collision layer bitmask
    ///
    /// A collider sits on one or more layers and carries a mask of the layers
    /// it reacts to. Bits 8-31 are free for application-defined layers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CollisionLayers: u32 {
        /// Player character layer
        const PLAYER = 1 << 0;
        /// Enemy character layer
        const ENEMY = 1 << 1;
        /// Projectiles (bullets, missiles, etc.)
        const PROJECTILE = 1 << 2;
        /// Static environment geometry
        const ENVIRONMENT = 1 << 3;
        /// Trigger volumes
        const TRIGGER = 1 << 4;
        /// Debris and small physics objects
        const DEBRIS = 1 << 5;
        /// Vehicles
        const VEHICLE = 1 << 6;
        /// Pickups and collectibles
        const PICKUP = 1 << 7;

        // Application-defined layers
        const _ = !0;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::all()
    }
}

impl CollisionLayers {
    /// Check if two colliders should be tested against each other
    ///
    /// A's layer must be in B's mask AND B's layer must be in A's mask.
    ///
    /// # Example
    /// ```
    /// use scene_core::physics::CollisionLayers;
    ///
    /// let should_collide = CollisionLayers::should_collide(
    ///     CollisionLayers::PLAYER,
    ///     CollisionLayers::ENEMY | CollisionLayers::ENVIRONMENT,
    ///     CollisionLayers::ENEMY,
    ///     CollisionLayers::PLAYER | CollisionLayers::PROJECTILE,
    /// );
    /// assert!(should_collide);
    /// ```
    pub fn should_collide(
        layer_a: CollisionLayers,
        mask_a: CollisionLayers,
        layer_b: CollisionLayers,
        mask_b: CollisionLayers,
    ) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }

    /// Application-defined layer `bit` (8..=31)
    ///
    /// # Panics
    /// Panics if `bit` is one of the engine-reserved bits or out of range.
    pub fn custom(bit: u32) -> Self {
        assert!((8..32).contains(&bit), "custom collision layer bit {bit} outside 8..=31");
        Self::from_bits_retain(1 << bit)
    }
}
