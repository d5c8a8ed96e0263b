//! Bounding volume hierarchy over static geometry
//!
//! The tree is built once from a list of world-space boxes and never edited;
//! when static geometry changes a new tree is built and swapped in whole.
//! Nodes live in one arena and refer to their children by index.
//!
//! Build: split at the median of box centers along an axis that cycles
//! X, Y, Z with depth. The result is balanced, so its depth is
//! `ceil(log2(n)) + 1` for `n` leaves.

use super::scene_graph::{Aabb, Frustum, SceneGraph};
use crate::ecs::Entity;

/// An entity and its world-space bounds, as handed to [`Bvh::build`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhItem {
    /// The entity
    pub entity: Entity,
    /// World-space bounds
    pub bounds: Aabb,
}

impl BvhItem {
    /// Pair an entity with its bounds
    pub fn new(entity: Entity, bounds: Aabb) -> Self {
        Self { entity, bounds }
    }
}

/// What a node holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhNodeKind {
    /// Exactly one entity
    Leaf(Entity),
    /// Two children, as arena indices
    Internal {
        /// Lower half of the split
        left: u32,
        /// Upper half of the split
        right: u32,
    },
}

/// A node of the hierarchy
///
/// An internal node's bounds are the merge of its children's bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    /// Bounds of everything below this node
    pub bounds: Aabb,
    /// Leaf or internal
    pub kind: BvhNodeKind,
}

/// Immutable binary BVH
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<u32>,
    depth: usize,
    leaf_count: usize,
}

impl Bvh {
    /// Build a balanced tree over `items`
    ///
    /// # Panics
    /// Panics if the `2n - 1` nodes for `n` items cannot be indexed by `u32`.
    pub fn build(mut items: Vec<BvhItem>) -> Self {
        assert!(
            u32::try_from(items.len().saturating_mul(2)).is_ok(),
            "{} items exceed the BVH node index range",
            items.len()
        );
        let mut bvh = Self {
            nodes: Vec::with_capacity(items.len().saturating_mul(2)),
            root: None,
            depth: 0,
            leaf_count: items.len(),
        };
        if !items.is_empty() {
            let root = bvh.build_node(&mut items, 0);
            bvh.root = Some(root);
        }

        log::debug!(
            "Built BVH: {} leaves, {} nodes, depth {}",
            bvh.leaf_count,
            bvh.nodes.len(),
            bvh.depth
        );
        bvh
    }

    fn build_node(&mut self, items: &mut [BvhItem], depth: usize) -> u32 {
        self.depth = self.depth.max(depth + 1);

        if let [item] = items {
            return self.push(BvhNode {
                bounds: item.bounds,
                kind: BvhNodeKind::Leaf(item.entity),
            });
        }

        let axis = depth % 3;
        // Stable: items with equal centers keep their input order
        items.sort_by(|a, b| a.bounds.center[axis].total_cmp(&b.bounds.center[axis]));
        let (lower, upper) = items.split_at_mut(items.len() / 2);

        let left = self.build_node(lower, depth + 1);
        let right = self.build_node(upper, depth + 1);
        let bounds = self.nodes[left as usize].bounds.merge(&self.nodes[right as usize].bounds);
        self.push(BvhNode {
            bounds,
            kind: BvhNodeKind::Internal { left, right },
        })
    }

    fn push(&mut self, node: BvhNode) -> u32 {
        let Ok(index) = u32::try_from(self.nodes.len()) else {
            unreachable!("node count is bounded in Bvh::build");
        };
        self.nodes.push(node);
        index
    }

    /// Append every entity whose leaf box passes the frustum test
    ///
    /// Subtrees whose merged box fails are pruned without visiting their
    /// children. Returns the number of nodes visited.
    pub fn cull(&self, frustum: &Frustum, visible: &mut Vec<Entity>) -> usize {
        match self.root {
            Some(root) => self.cull_node(root, frustum, visible),
            None => 0,
        }
    }

    fn cull_node(&self, index: u32, frustum: &Frustum, visible: &mut Vec<Entity>) -> usize {
        let node = &self.nodes[index as usize];
        if !frustum.intersects_aabb(&node.bounds) {
            return 1;
        }
        match node.kind {
            BvhNodeKind::Leaf(entity) => {
                visible.push(entity);
                1
            }
            BvhNodeKind::Internal { left, right } => {
                1 + self.cull_node(left, frustum, visible) + self.cull_node(right, frustum, visible)
            }
        }
    }

    /// Number of levels; 0 for an empty tree, 1 for a single leaf
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of entities (leaves)
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Whether the tree holds no entities
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Bounds of the whole tree
    pub fn root_bounds(&self) -> Option<Aabb> {
        self.root.map(|root| self.nodes[root as usize].bounds)
    }

    /// Root node
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.map(|root| &self.nodes[root as usize])
    }

    /// Node by arena index
    pub fn node(&self, index: u32) -> Option<&BvhNode> {
        self.nodes.get(index as usize)
    }
}

impl SceneGraph for Bvh {
    fn query_visible(&self, frustum: &Frustum) -> Vec<Entity> {
        let mut visible = Vec::new();
        self.cull(frustum, &mut visible);
        visible
    }

    fn entity_count(&self) -> usize {
        self.len()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}
