//! Transform hierarchy
//!
//! Parent/child links live on the [`TransformComponent`]s themselves as plain
//! entity ids. This view owns every change to them, along with the local TRS
//! writes, so that the dirty invariant holds: a transform's cached world
//! matrix is valid whenever it is not dirty, and mutating a transform
//! dirties its whole subtree.
//!
//! Per frame, [`TransformHierarchy::update`] walks every tree from its root in
//! pre-order and recomputes `parent.world * T * R * S` for dirty nodes only.

use crate::ecs::components::TransformComponent;
use crate::ecs::{ComponentStorage, EcsError, Entity};
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};

/// Mutable view over the transform storage
pub struct TransformHierarchy<'a> {
    transforms: &'a mut ComponentStorage<TransformComponent>,
}

impl<'a> TransformHierarchy<'a> {
    /// Wrap a transform storage
    pub fn new(transforms: &'a mut ComponentStorage<TransformComponent>) -> Self {
        Self { transforms }
    }

    /// Set local translation and dirty the subtree
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn set_translation(&mut self, entity: Entity, translation: Vec3) {
        fatal(self.try_set_translation(entity, translation));
    }

    /// Set local translation, reporting a missing transform
    pub fn try_set_translation(&mut self, entity: Entity, translation: Vec3) -> Result<(), EcsError> {
        self.modify(entity, |t| t.set_translation(translation))
    }

    /// Set local rotation and dirty the subtree
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn set_rotation(&mut self, entity: Entity, rotation: Quat) {
        fatal(self.try_set_rotation(entity, rotation));
    }

    /// Set local rotation, reporting a missing transform
    pub fn try_set_rotation(&mut self, entity: Entity, rotation: Quat) -> Result<(), EcsError> {
        self.modify(entity, |t| t.set_rotation(rotation))
    }

    /// Set local rotation from Euler angles (roll, pitch, yaw in radians)
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn set_rotation_euler(&mut self, entity: Entity, euler: Vec3) {
        fatal(self.try_set_rotation_euler(entity, euler));
    }

    /// Set local rotation from Euler angles, reporting a missing transform
    pub fn try_set_rotation_euler(&mut self, entity: Entity, euler: Vec3) -> Result<(), EcsError> {
        self.modify(entity, |t| t.set_rotation_euler(euler))
    }

    /// Set local scale and dirty the subtree
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn set_scale(&mut self, entity: Entity, scale: Vec3) {
        fatal(self.try_set_scale(entity, scale));
    }

    /// Set local scale, reporting a missing transform
    pub fn try_set_scale(&mut self, entity: Entity, scale: Vec3) -> Result<(), EcsError> {
        self.modify(entity, |t| t.set_scale(scale))
    }

    /// Overwrite the cached world matrix without touching the dirty flag
    ///
    /// The local TRS values are left as they are; the next mutation of this
    /// transform or an ancestor recomputes the world matrix from them.
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn set_global_matrix(&mut self, entity: Entity, matrix: Mat4) {
        fatal(self.try_set_global_matrix(entity, matrix));
    }

    /// Overwrite the cached world matrix, reporting a missing transform
    pub fn try_set_global_matrix(&mut self, entity: Entity, matrix: Mat4) -> Result<(), EcsError> {
        self.transforms.try_get_mut(entity)?.set_world_matrix(matrix);
        Ok(())
    }

    /// Recompute every dirty world matrix, parents before children
    ///
    /// Returns the number of matrices recomputed; zero when nothing was dirty.
    pub fn update(&mut self) -> usize {
        let roots = self.roots();
        let recomputed: usize = roots
            .into_iter()
            .map(|root| self.update_node(root, None))
            .sum();

        if recomputed > 0 {
            log::debug!("Transform update: recomputed {} world matrices", recomputed);
        }
        recomputed
    }

    fn update_node(&mut self, entity: Entity, parent_world: Option<&Mat4>) -> usize {
        let Ok(transform) = self.transforms.try_get_mut(entity) else {
            return 0;
        };

        let mut recomputed = 0;
        if transform.is_dirty() {
            let local = transform.local_matrix();
            let world = match parent_world {
                Some(parent) => parent * local,
                None => local,
            };
            transform.set_world_matrix(world);
            transform.mark_clean();
            recomputed += 1;
        }

        // Children are re-read by index: recursion needs the storage mutably
        let world = *transform.world_matrix();
        let child_count = transform.children.len();
        for index in 0..child_count {
            let child = self.transforms.get(entity).children[index];
            recomputed += self.update_node(child, Some(&world));
        }
        recomputed
    }

    /// Parent `child` under `parent`, keeping its local TRS values
    ///
    /// # Panics
    /// Panics if either entity has no transform or the link would make an
    /// entity its own ancestor.
    pub fn add_child(&mut self, parent: Entity, child: Entity) {
        fatal(self.try_add_child(parent, child));
    }

    /// Parent `child` under `parent`, keeping its local TRS values
    pub fn try_add_child(&mut self, parent: Entity, child: Entity) -> Result<(), EcsError> {
        self.validate_link(parent, child)?;
        self.link(parent, child);
        Ok(())
    }

    /// Parent `child` under `parent`, keeping its world transform
    ///
    /// The new local TRS is decomposed from `inverse(parent.world) * child.world`.
    /// If the parent's world matrix cannot be inverted the local values are
    /// kept unchanged.
    ///
    /// # Panics
    /// Panics on the same preconditions as [`add_child`](Self::add_child).
    pub fn add_child_keep_world(&mut self, parent: Entity, child: Entity) {
        fatal(self.try_add_child_keep_world(parent, child));
    }

    /// Parent `child` under `parent`, keeping its world transform
    pub fn try_add_child_keep_world(&mut self, parent: Entity, child: Entity) -> Result<(), EcsError> {
        self.validate_link(parent, child)?;

        let parent_world = self.resolved_world(parent)?;
        let child_world = self.resolved_world(child)?;
        match parent_world.try_inverse() {
            Some(inverse) => {
                let local = Transform::from_matrix(&(inverse * child_world));
                self.transforms.get_mut(child).set_local(&local);
            }
            None => log::warn!(
                "Parent {:?} has a singular world matrix; {:?} keeps its local transform",
                parent,
                child
            ),
        }

        self.link(parent, child);
        Ok(())
    }

    /// Make `entity` a root, keeping its local TRS values
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn detach(&mut self, entity: Entity) {
        fatal(self.try_detach(entity));
    }

    /// Make `entity` a root, reporting a missing transform
    pub fn try_detach(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.detach_from_parent(entity)?;
        self.mark_subtree_dirty(entity);
        Ok(())
    }

    /// Cut every link of `entity`: it leaves its parent and its children
    /// become dirty roots
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn unlink(&mut self, entity: Entity) {
        fatal(self.try_unlink(entity));
    }

    /// Cut every link of `entity`, reporting a missing transform
    pub fn try_unlink(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.detach_from_parent(entity)?;

        let children = std::mem::take(&mut self.transforms.get_mut(entity).children);
        for child in children {
            if let Ok(transform) = self.transforms.try_get_mut(child) {
                transform.parent = None;
            }
            self.mark_subtree_dirty(child);
        }
        self.transforms.get_mut(entity).mark_dirty();
        Ok(())
    }

    /// Cached world matrix
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn world_matrix(&self, entity: Entity) -> Mat4 {
        *self.transforms.get(entity).world_matrix()
    }

    /// Cached world matrix, reporting a missing transform
    pub fn try_world_matrix(&self, entity: Entity) -> Result<Mat4, EcsError> {
        Ok(*self.transforms.try_get(entity)?.world_matrix())
    }

    /// Parent of `entity`, `None` for roots
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.transforms.get(entity).parent()
    }

    /// Children of `entity` in insertion order
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.transforms.get(entity).children()
    }

    /// Whether the entity's world matrix is stale
    ///
    /// # Panics
    /// Panics if the entity has no transform.
    pub fn is_dirty(&self, entity: Entity) -> bool {
        self.transforms.get(entity).is_dirty()
    }

    /// Every transform without a parent, in storage order
    pub fn roots(&self) -> Vec<Entity> {
        self.transforms
            .iter()
            .filter(|(_, transform)| transform.parent.is_none())
            .map(|(entity, _)| entity)
            .collect()
    }

    fn modify(&mut self, entity: Entity, write: impl FnOnce(&mut TransformComponent)) -> Result<(), EcsError> {
        write(self.transforms.try_get_mut(entity)?);
        self.mark_subtree_dirty(entity);
        Ok(())
    }

    fn mark_subtree_dirty(&mut self, entity: Entity) {
        let Ok(transform) = self.transforms.try_get_mut(entity) else {
            return;
        };
        transform.mark_dirty();

        let child_count = transform.children.len();
        for index in 0..child_count {
            let child = self.transforms.get(entity).children[index];
            self.mark_subtree_dirty(child);
        }
    }

    fn validate_link(&self, parent: Entity, child: Entity) -> Result<(), EcsError> {
        self.transforms.try_get(child)?;
        self.transforms.try_get(parent)?;
        if parent == child {
            return Err(EcsError::SelfParent(child));
        }

        // Walk up from the new parent: meeting `child` means a cycle
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(EcsError::HierarchyCycle { parent, child });
            }
            ancestor = self.transforms.get(current).parent;
        }
        Ok(())
    }

    fn link(&mut self, parent: Entity, child: Entity) {
        // Both transforms were checked by validate_link
        if self.detach_from_parent(child).is_ok() {
            self.transforms.get_mut(parent).children.push(child);
            self.transforms.get_mut(child).parent = Some(parent);
            self.mark_subtree_dirty(child);
            log::trace!("Linked {:?} under {:?}", child, parent);
        }
    }

    fn detach_from_parent(&mut self, entity: Entity) -> Result<(), EcsError> {
        let transform = self.transforms.try_get_mut(entity)?;
        if let Some(old_parent) = transform.parent.take() {
            if let Ok(parent) = self.transforms.try_get_mut(old_parent) {
                parent.children.retain(|&c| c != entity);
            }
        }
        Ok(())
    }

    /// World matrix as `update` would compute it right now
    fn resolved_world(&self, entity: Entity) -> Result<Mat4, EcsError> {
        let transform = self.transforms.try_get(entity)?;
        if !transform.is_dirty() {
            return Ok(*transform.world_matrix());
        }
        Ok(match transform.parent {
            Some(parent) => self.resolved_world(parent)? * transform.local_matrix(),
            None => transform.local_matrix(),
        })
    }
}

fn fatal(result: Result<(), EcsError>) {
    if let Err(err) = result {
        panic!("{err}");
    }
}
