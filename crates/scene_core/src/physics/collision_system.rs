//! Core collision detection system
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13.
//!
//! The detector reads settled world matrices from the [`World`], tests every
//! eligible pair of colliders and keeps the resulting events until the next
//! call. Events come in mirrored pairs so that listeners on either entity
//! see a push-out direction for their own side.

use std::collections::HashSet;

use super::collision::{narrow_phase, WorldSpaceShape};
use crate::config::CollisionConfig;
use crate::ecs::components::{ColliderComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;

/// Collision pair representing two entities that are colliding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Entity with the smaller id
    pub entity_a: Entity,
    /// Entity with the larger id
    pub entity_b: Entity,
}

impl CollisionPair {
    /// Create a new collision pair (always stores smaller entity ID first for consistency)
    pub fn new(entity_a: Entity, entity_b: Entity) -> Self {
        if entity_a.id() < entity_b.id() {
            Self { entity_a, entity_b }
        } else {
            Self { entity_a: entity_b, entity_b: entity_a }
        }
    }

    /// Whether the pair involves `entity`
    pub fn contains(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }
}

/// One side of a detected overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Entity the separation vector applies to
    pub entity_a: Entity,
    /// The other entity
    pub entity_b: Entity,
    /// Whether the shapes overlap
    pub is_colliding: bool,
    /// World-space translation of `entity_a` that resolves the overlap,
    /// pointing from B towards A's side
    pub separation: Vec3,
}

impl CollisionEvent {
    /// The same contact seen from `entity_b`
    pub fn mirrored(&self) -> Self {
        Self {
            entity_a: self.entity_b,
            entity_b: self.entity_a,
            is_colliding: self.is_colliding,
            separation: -self.separation,
        }
    }

    /// Overlap depth
    pub fn depth(&self) -> f32 {
        self.separation.magnitude()
    }
}

struct Candidate<'w> {
    entity: Entity,
    collider: &'w ColliderComponent,
    shape: WorldSpaceShape,
}

/// Narrow-phase collision detector over a [`World`]
///
/// Pairs are tested exhaustively; there is no broad phase.
pub struct CollisionDetector {
    config: CollisionConfig,
    events: Vec<CollisionEvent>,
    current_pairs: HashSet<CollisionPair>,
    previous_pairs: HashSet<CollisionPair>,
    pairs_tested: usize,
}

impl CollisionDetector {
    /// Create a detector with the given tuning
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            events: Vec::new(),
            current_pairs: HashSet::new(),
            previous_pairs: HashSet::new(),
            pairs_tested: 0,
        }
    }

    /// Detector tuning
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Test every eligible pair and replace the previous results
    ///
    /// Entities need both a transform and a collider. World matrices are read
    /// as cached, so the hierarchy must be updated first. Pairs of static
    /// colliders and pairs filtered out by collision layers are skipped.
    pub fn check_collisions(&mut self, world: &World) -> &[CollisionEvent] {
        std::mem::swap(&mut self.current_pairs, &mut self.previous_pairs);
        self.current_pairs.clear();
        self.events.clear();
        self.pairs_tested = 0;

        let (Some(colliders), Some(transforms)) = (
            world.storage::<ColliderComponent>(),
            world.storage::<TransformComponent>(),
        ) else {
            return &self.events;
        };

        let candidates: Vec<Candidate<'_>> = colliders
            .iter()
            .filter_map(|(entity, collider)| {
                let transform = transforms.try_get(entity).ok()?;
                Some(Candidate {
                    entity,
                    collider,
                    shape: collider.shape.to_world_space(transform.world_matrix()),
                })
            })
            .collect();

        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                if !a.collider.may_collide_with(b.collider) {
                    continue;
                }
                self.pairs_tested += 1;

                if let Some(separation) = self.test_pair(a, b) {
                    log::trace!("{:?} x {:?}: separation {:?}", a.entity, b.entity, separation);
                    let event = CollisionEvent {
                        entity_a: a.entity,
                        entity_b: b.entity,
                        is_colliding: true,
                        separation,
                    };
                    self.events.push(event);
                    self.events.push(event.mirrored());
                    self.current_pairs.insert(CollisionPair::new(a.entity, b.entity));
                }
            }
        }

        log::debug!(
            "Collision pass: {} colliders, {} pairs tested, {} contacts",
            candidates.len(),
            self.pairs_tested,
            self.current_pairs.len()
        );
        &self.events
    }

    /// Separation vector for `a`, with the narrow phase run in shape-kind order
    fn test_pair(&self, a: &Candidate<'_>, b: &Candidate<'_>) -> Option<Vec3> {
        let epsilon = self.config.degenerate_axis_epsilon;
        if a.shape.kind() <= b.shape.kind() {
            narrow_phase::dispatch(&a.shape, &b.shape, epsilon)
        } else {
            narrow_phase::dispatch(&b.shape, &a.shape, epsilon).map(|separation| -separation)
        }
    }

    /// Events from the last pass, mirrored pairs adjacent
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    /// Events seen from `entity`'s side
    pub fn events_for(&self, entity: Entity) -> impl Iterator<Item = &CollisionEvent> + '_ {
        self.events.iter().filter(move |event| event.entity_a == entity)
    }

    /// Whether `entity` overlapped anything in the last pass
    pub fn is_colliding(&self, entity: Entity) -> bool {
        self.current_pairs.iter().any(|pair| pair.contains(entity))
    }

    /// Pairs overlapping now that did not in the previous pass
    pub fn collision_entered(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self.current_pairs.difference(&self.previous_pairs).copied().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Pairs that overlapped in the previous pass but no longer do
    pub fn collision_exited(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self.previous_pairs.difference(&self.current_pairs).copied().collect();
        pairs.sort_unstable();
        pairs
    }

    /// All current collision pairs
    pub fn current_pairs(&self) -> &HashSet<CollisionPair> {
        &self.current_pairs
    }

    /// Pairs handed to the narrow phase in the last pass
    pub fn pairs_tested(&self) -> usize {
        self.pairs_tested
    }

    /// Forget all results, including the previous-pass pairs
    pub fn clear(&mut self) {
        self.events.clear();
        self.current_pairs.clear();
        self.previous_pairs.clear();
        self.pairs_tested = 0;
    }
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::ColliderShape;
    use crate::physics::CollisionLayers;
    use approx::assert_relative_eq;

    fn spawn(world: &mut World, position: Vec3, collider: ColliderComponent) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_translation(position));
        world.add_component(entity, collider);
        entity
    }

    fn unit_box() -> ColliderComponent {
        ColliderComponent::new(ColliderShape::cuboid(Vec3::new(0.5, 0.5, 0.5)))
    }

    #[test]
    fn test_boxes_report_mirrored_events() {
        let mut world = World::with_capacity(8, 8);
        let a = spawn(&mut world, Vec3::zeros(), unit_box());
        let b = spawn(&mut world, Vec3::new(0.8, 0.0, 0.0), unit_box());
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        let events = detector.check_collisions(&world).to_vec();

        assert_eq!(events.len(), 2);
        assert_eq!((events[0].entity_a, events[0].entity_b), (a, b));
        assert_relative_eq!(events[0].separation, Vec3::new(-0.2, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(events[1], events[0].mirrored());
        assert!(events.iter().all(|event| event.is_colliding));
    }

    #[test]
    fn test_unsettled_transforms_are_read_as_cached() {
        let mut world = World::with_capacity(8, 8);
        spawn(&mut world, Vec3::zeros(), unit_box());
        spawn(&mut world, Vec3::new(5.0, 0.0, 0.0), unit_box());

        // Both world matrices are still identity
        let mut detector = CollisionDetector::default();
        assert_eq!(detector.check_collisions(&world).len(), 2);

        world.hierarchy().update();
        assert!(detector.check_collisions(&world).is_empty());
    }

    #[test]
    fn test_sphere_box_order_is_restored() {
        let mut world = World::with_capacity(8, 8);
        let sphere = spawn(
            &mut world,
            Vec3::new(1.0, 0.0, 0.0),
            ColliderComponent::new(ColliderShape::sphere(0.75)),
        );
        let cube = spawn(&mut world, Vec3::zeros(), unit_box());
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        detector.check_collisions(&world);

        // The sphere is pushed out along +X, the box along -X
        let from_sphere: Vec<_> = detector.events_for(sphere).collect();
        assert_eq!(from_sphere.len(), 1);
        assert_eq!(from_sphere[0].entity_b, cube);
        assert_relative_eq!(from_sphere[0].separation, Vec3::new(0.25, 0.0, 0.0), epsilon = 1e-6);

        let from_cube: Vec<_> = detector.events_for(cube).collect();
        assert_relative_eq!(from_cube[0].separation, Vec3::new(-0.25, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_static_and_filtered_pairs_are_skipped() {
        let mut world = World::with_capacity(8, 8);
        let wall = unit_box().as_static().with_layers(CollisionLayers::ENVIRONMENT, CollisionLayers::all());
        spawn(&mut world, Vec3::zeros(), wall.clone());
        spawn(&mut world, Vec3::new(0.5, 0.0, 0.0), wall);
        spawn(
            &mut world,
            Vec3::new(0.2, 0.0, 0.0),
            unit_box().with_layers(CollisionLayers::DEBRIS, CollisionLayers::PLAYER),
        );
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        assert!(detector.check_collisions(&world).is_empty());
        assert_eq!(detector.pairs_tested(), 0);
    }

    #[test]
    fn test_entered_and_exited() {
        let mut world = World::with_capacity(8, 8);
        let a = spawn(&mut world, Vec3::zeros(), unit_box());
        let b = spawn(&mut world, Vec3::new(3.0, 0.0, 0.0), unit_box());
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        detector.check_collisions(&world);
        assert!(detector.collision_entered().is_empty());

        world.hierarchy().set_translation(b, Vec3::new(0.9, 0.0, 0.0));
        world.hierarchy().update();
        detector.check_collisions(&world);
        assert_eq!(detector.collision_entered(), vec![CollisionPair::new(a, b)]);
        assert!(detector.is_colliding(a));

        detector.check_collisions(&world);
        assert!(detector.collision_entered().is_empty());

        world.hierarchy().set_translation(b, Vec3::new(3.0, 0.0, 0.0));
        world.hierarchy().update();
        detector.check_collisions(&world);
        assert_eq!(detector.collision_exited(), vec![CollisionPair::new(b, a)]);
        assert!(!detector.is_colliding(b));
    }

    #[test]
    fn test_entities_without_transform_are_ignored() {
        let mut world = World::with_capacity(8, 8);
        spawn(&mut world, Vec3::zeros(), unit_box());
        let loose = world.create_entity();
        world.add_component(loose, unit_box());
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        assert!(detector.check_collisions(&world).is_empty());
    }
}
