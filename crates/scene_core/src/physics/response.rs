//! Minimal penetration response
//!
//! Pushes dynamic colliders apart along their separation vectors. There is
//! no velocity, mass or iteration here: one call moves each dynamic entity
//! once by the sum of its pushes, and the hierarchy must be updated again
//! before the new positions are visible.

use std::collections::BTreeMap;

use super::collision_system::CollisionEvent;
use crate::ecs::components::{ColliderComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;

/// Translate dynamic colliders out of the overlaps in `events`
///
/// Each event moves its `entity_a` when that collider is dynamic: by the full
/// separation vector against a static collider, by half of it against a
/// dynamic one (the mirrored event moves the other half). A pushed entity
/// carries its descendants along, so a descendant only moves by what its own
/// push adds to that of its nearest pushed ancestor. The remainder is
/// converted into the parent's space before it is added to the local
/// translation. Returns the number of entities moved.
pub fn resolve_penetrations(world: &mut World, events: &[CollisionEvent]) -> usize {
    let is_dynamic = |world: &World, entity: Entity| {
        world
            .try_get_component::<ColliderComponent>(entity)
            .is_ok_and(|collider| !collider.is_static)
    };

    let mut pushes: BTreeMap<Entity, Vec3> = BTreeMap::new();
    for event in events.iter().filter(|event| event.is_colliding) {
        if !is_dynamic(world, event.entity_a) {
            continue;
        }
        let share = if is_dynamic(world, event.entity_b) { 0.5 } else { 1.0 };
        *pushes.entry(event.entity_a).or_insert_with(Vec3::zeros) += event.separation * share;
    }

    let mut moves = Vec::with_capacity(pushes.len());
    for (&entity, &push) in &pushes {
        let Ok(transform) = world.try_get_component::<TransformComponent>(entity) else {
            continue;
        };
        let push = push - inherited_push(world, &pushes, transform.parent());
        let local_push = match transform.parent() {
            None => push,
            Some(parent) => {
                let parent_world = *world.get_component::<TransformComponent>(parent).world_matrix();
                match parent_world.try_inverse() {
                    Some(inverse) => inverse.transform_vector(&push),
                    None => {
                        log::warn!("Cannot push {:?}: parent {:?} has a singular world matrix", entity, parent);
                        continue;
                    }
                }
            }
        };
        moves.push((entity, transform.translation() + local_push));
    }

    let mut hierarchy = world.hierarchy();
    for &(entity, translation) in &moves {
        hierarchy.set_translation(entity, translation);
    }
    log::debug!("Penetration response moved {} entities", moves.len());
    moves.len()
}

/// World-space push the nearest pushed ancestor applies to its whole subtree
fn inherited_push(world: &World, pushes: &BTreeMap<Entity, Vec3>, mut ancestor: Option<Entity>) -> Vec3 {
    while let Some(entity) = ancestor {
        if let Some(push) = pushes.get(&entity) {
            return *push;
        }
        ancestor = world
            .try_get_component::<TransformComponent>(entity)
            .ok()
            .and_then(TransformComponent::parent);
    }
    Vec3::zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::ColliderShape;
    use crate::physics::CollisionDetector;
    use approx::assert_relative_eq;

    fn spawn_box(world: &mut World, x: f32, is_static: bool) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_translation(Vec3::new(x, 0.0, 0.0)));
        let mut collider = ColliderComponent::new(ColliderShape::cuboid(Vec3::new(0.5, 0.5, 0.5)));
        collider.is_static = is_static;
        world.add_component(entity, collider);
        entity
    }

    fn translation(world: &World, entity: Entity) -> Vec3 {
        world.get_component::<TransformComponent>(entity).translation()
    }

    #[test]
    fn test_dynamic_against_static_moves_fully() {
        let mut world = World::with_capacity(8, 8);
        let wall = spawn_box(&mut world, 0.0, true);
        let crate_box = spawn_box(&mut world, 0.8, false);
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        let events = detector.check_collisions(&world).to_vec();

        assert_eq!(resolve_penetrations(&mut world, &events), 1);
        assert_eq!(translation(&world, wall), Vec3::zeros());
        assert_relative_eq!(translation(&world, crate_box), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert!(world.get_component::<TransformComponent>(crate_box).is_dirty());
    }

    #[test]
    fn test_two_dynamic_boxes_split_the_push() {
        let mut world = World::with_capacity(8, 8);
        let a = spawn_box(&mut world, 0.0, false);
        let b = spawn_box(&mut world, 0.8, false);
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        let events = detector.check_collisions(&world).to_vec();

        assert_eq!(resolve_penetrations(&mut world, &events), 2);
        assert_relative_eq!(translation(&world, a), Vec3::new(-0.1, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(translation(&world, b), Vec3::new(0.9, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_push_is_converted_into_parent_space() {
        let mut world = World::with_capacity(8, 8);
        let wall = spawn_box(&mut world, 0.0, true);
        let pivot = world.create_entity();
        world.add_component(pivot, TransformComponent::identity().with_uniform_scale(2.0));
        let child = spawn_box(&mut world, 0.4, false);
        world.hierarchy().add_child(pivot, child);
        world.hierarchy().update();

        // Child is a 2x2x2 box centered at world x = 0.8, deep in the wall
        let mut detector = CollisionDetector::default();
        let events = detector.check_collisions(&world).to_vec();
        assert!(events.iter().any(|event| event.entity_a == wall));

        resolve_penetrations(&mut world, &events);
        world.hierarchy().update();

        // Pushed until the faces touch at x = 0.5
        let world_x = world.hierarchy().world_matrix(child).m14;
        assert_relative_eq!(world_x, 1.5, epsilon = 1e-5);
        assert_relative_eq!(translation(&world, child).x, world_x / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_child_of_pushed_parent_is_not_pushed_twice() {
        let mut world = World::with_capacity(8, 8);
        let wall = world.create_entity();
        world.add_component(wall, TransformComponent::identity());
        world.add_component(wall, ColliderComponent::new_static(ColliderShape::cuboid(Vec3::new(0.5, 0.5, 5.0))));
        let parent = spawn_box(&mut world, 0.8, false);
        // Child sits clear of its parent along z but overlaps the wall
        let child = world.create_entity();
        world.add_component(child, TransformComponent::from_translation(Vec3::new(0.0, 0.0, 1.5)));
        world.add_component(child, ColliderComponent::new(ColliderShape::cuboid(Vec3::new(0.5, 0.5, 0.5))));
        world.hierarchy().add_child(parent, child);
        world.hierarchy().update();

        let mut detector = CollisionDetector::default();
        let events = detector.check_collisions(&world).to_vec();
        assert_eq!(events.len(), 4);

        assert_eq!(resolve_penetrations(&mut world, &events), 2);
        world.hierarchy().update();

        assert_relative_eq!(world.hierarchy().world_matrix(parent).m14, 1.0, epsilon = 1e-5);
        assert_relative_eq!(world.hierarchy().world_matrix(child).m14, 1.0, epsilon = 1e-5);
        assert_relative_eq!(translation(&world, child), Vec3::new(0.0, 0.0, 1.5), epsilon = 1e-5);
    }
}
