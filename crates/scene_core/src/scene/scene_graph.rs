//! Scene graph trait and bounding-volume math
//!
//! Provides pluggable spatial data structures for visibility queries.
//! Following Game Engine Architecture Chapter 11.2.7.4 - Scene Graphs.

use serde::{Deserialize, Serialize};

use crate::ecs::Entity;
use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Center of the box
    pub center: Vec3,
    /// Half size along each axis (non-negative)
    pub half_extents: Vec3,
}

impl Aabb {
    /// Create a box from its center and half extents
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self { center, half_extents }
    }

    /// Create a box from its minimum and maximum corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Smallest box containing both boxes
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb::from_min_max(self.min().inf(&other.min()), self.max().sup(&other.max()))
    }

    /// Box enclosing this one after an affine transform
    ///
    /// Each world half extent is the sum of the local half extents weighted
    /// by the absolute rotation-scale entries.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let linear = matrix.fixed_view::<3, 3>(0, 0).abs();
        Aabb {
            center: matrix.transform_point(&Point3::from(self.center)).coords,
            half_extents: linear * self.half_extents,
        }
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extents.x
            && offset.y <= self.half_extents.y
            && offset.z <= self.half_extents.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        let distance = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        distance.x <= reach.x && distance.y <= reach.y && distance.z <= reach.z
    }
}

/// Plane `normal . p + distance = 0`, positive on the normal's side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal, or zero for a degenerate plane
    pub normal: Vec3,
    /// Signed distance term
    pub distance: f32,
}

/// Normals shorter than this cannot be normalized
const DEGENERATE_NORMAL: f32 = 1e-12;

impl Plane {
    /// A plane with a zero normal: every point lies on it, so every box passes
    pub fn accept_all() -> Self {
        Self { normal: Vec3::zeros(), distance: 0.0 }
    }

    /// Create a plane from a normal and distance, normalizing both
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self::from_coefficients(Vec4::new(normal.x, normal.y, normal.z, distance))
    }

    /// Create a plane from `(a, b, c, d)` with `ax + by + cz + d = 0`
    ///
    /// A zero-length normal yields [`Plane::accept_all`].
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.magnitude();
        if length < DEGENERATE_NORMAL {
            return Self::accept_all();
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Plane coefficients `(a, b, c, d)`
    pub fn coefficients(&self) -> Vec4 {
        Vec4::new(self.normal.x, self.normal.y, self.normal.z, self.distance)
    }

    /// Calculate signed distance from plane to point
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Re-express the plane in another space
    ///
    /// `to_current` maps points of the target space into the plane's current
    /// space (for a camera-space plane going to world space, that is the
    /// view matrix). Coefficients transform by its transpose.
    pub fn transformed(&self, to_current: &Mat4) -> Plane {
        Plane::from_coefficients(to_current.transpose() * self.coefficients())
    }

    /// Whether any part of the box lies on or in front of the plane
    pub fn aabb_on_or_in_front(&self, aabb: &Aabb) -> bool {
        let radius = aabb.half_extents.dot(&self.normal.abs());
        radius >= -self.signed_distance(aabb.center)
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far; normals point inwards
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract the six planes of a projection matrix (Gribb-Hartmann)
    ///
    /// Each plane is the w row plus or minus one of the x, y, z rows, so the
    /// planes live in whatever space the matrix takes its input from: camera
    /// space for a projection, world space for a view-projection. Clip
    /// depth is assumed to run over `-w..w`.
    pub fn from_projection(projection: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { projection.row(i).transpose() };
        let (x, y, z, w) = (row(0), row(1), row(2), row(3));

        Self::new([
            Plane::from_coefficients(w + x),
            Plane::from_coefficients(w - x),
            Plane::from_coefficients(w + y),
            Plane::from_coefficients(w - y),
            Plane::from_coefficients(w + z),
            Plane::from_coefficients(w - z),
        ])
    }

    /// World-space frustum from a combined view-projection matrix
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        Self::from_projection(view_projection)
    }

    /// Move a camera-space frustum into world space
    ///
    /// A singular camera matrix leaves the frustum unchanged.
    pub fn transformed(&self, camera_to_world: &Mat4) -> Self {
        let Some(view) = camera_to_world.try_inverse() else {
            log::warn!("Camera matrix is not invertible; frustum left in camera space");
            return self.clone();
        };
        Self::new(self.planes.map(|plane| plane.transformed(&view)))
    }

    /// World-space frustum of a camera
    pub fn from_camera(projection: &Mat4, camera_to_world: &Mat4) -> Self {
        Self::from_projection(projection).transformed(camera_to_world)
    }

    /// Check if an AABB is inside or intersects the frustum
    ///
    /// Conservative: a box near a frustum corner may pass although it lies
    /// outside.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| plane.aabb_on_or_in_front(aabb))
    }
}

/// Trait for spatial data structures used in scene management
///
/// Allows pluggable scene graph implementations (list, BVH, octree, ...).
/// Following Game Engine Architecture Chapter 11.2.7.4 pattern.
pub trait SceneGraph: Send + Sync {
    /// Query all entities visible within a frustum
    fn query_visible(&self, frustum: &Frustum) -> Vec<Entity>;

    /// Get the total number of entities in the scene graph
    fn entity_count(&self) -> usize;

    /// Clear all entities from the scene graph
    fn clear(&mut self);
}

/// Simple list-based scene graph (no spatial optimization)
///
/// Tests every box against the frustum. This is the reference answer the
/// BVH must reproduce, and fine for small scenes.
#[derive(Debug, Default)]
pub struct SimpleListGraph {
    /// List of entities with their bounding volumes
    entities: Vec<(Entity, Aabb)>,
}

impl SimpleListGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity with its world-space bounds
    pub fn add(&mut self, entity: Entity, bounds: Aabb) {
        self.entities.push((entity, bounds));
    }

    /// Remove an entity
    pub fn remove(&mut self, entity: Entity) {
        self.entities.retain(|(e, _)| *e != entity);
    }

    /// Replace an entity's bounds
    pub fn update(&mut self, entity: Entity, bounds: Aabb) {
        if let Some(entry) = self.entities.iter_mut().find(|(e, _)| *e == entity) {
            entry.1 = bounds;
        }
    }
}

impl FromIterator<(Entity, Aabb)> for SimpleListGraph {
    fn from_iter<I: IntoIterator<Item = (Entity, Aabb)>>(iter: I) -> Self {
        Self { entities: iter.into_iter().collect() }
    }
}

impl SceneGraph for SimpleListGraph {
    fn query_visible(&self, frustum: &Frustum) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|(_, bounds)| frustum.intersects_aabb(bounds))
            .map(|(entity, _)| *entity)
            .collect()
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    fn unit_cube(center: Vec3) -> Aabb {
        Aabb::new(center, Vec3::new(0.5, 0.5, 0.5))
    }

    fn perspective() -> Mat4 {
        Mat4::new_perspective(16.0 / 9.0, std::f32::consts::FRAC_PI_3, 0.1, 100.0)
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = Aabb::from_min_max(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(aabb.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let aabb1 = Aabb::from_min_max(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = Aabb::from_min_max(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let aabb3 = Aabb::from_min_max(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(aabb1.intersects(&aabb2));
        assert!(!aabb1.intersects(&aabb3));
    }

    #[test]
    fn test_aabb_merge() {
        let merged = unit_cube(Vec3::zeros()).merge(&unit_cube(Vec3::new(3.0, 1.0, 0.0)));

        assert_relative_eq!(merged.min(), Vec3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(merged.max(), Vec3::new(3.5, 1.5, 0.5));
    }

    #[test]
    fn test_aabb_transformed_encloses_rotated_box() {
        let matrix = Mat4::new_translation(&Vec3::new(0.0, 5.0, 0.0))
            * Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4).to_homogeneous();
        let bounds = unit_cube(Vec3::zeros()).transformed(&matrix);

        let half_diagonal = 0.5 * 2.0_f32.sqrt();
        assert_relative_eq!(bounds.center, Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(bounds.half_extents, Vec3::new(half_diagonal, half_diagonal, 0.5), epsilon = 1e-6);
    }

    #[test]
    fn test_plane_normalizes() {
        let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), 4.0);

        assert_relative_eq!(plane.normal, Vec3::y());
        assert_relative_eq!(plane.signed_distance(Vec3::new(3.0, 1.0, 0.0)), 3.0);
    }

    #[test]
    fn test_degenerate_plane_accepts_everything() {
        let plane = Plane::from_coefficients(Vec4::new(0.0, 0.0, 0.0, -5.0));

        assert_eq!(plane, Plane::accept_all());
        assert!(plane.aabb_on_or_in_front(&unit_cube(Vec3::new(-100.0, 0.0, 0.0))));
    }

    #[test]
    fn test_aabb_straddling_plane_passes() {
        let plane = Plane::new(Vec3::x(), 0.0);

        assert!(plane.aabb_on_or_in_front(&unit_cube(Vec3::new(-0.4, 0.0, 0.0))));
        assert!(plane.aabb_on_or_in_front(&unit_cube(Vec3::new(-0.5, 0.0, 0.0))));
        assert!(!plane.aabb_on_or_in_front(&unit_cube(Vec3::new(-0.6, 0.0, 0.0))));
    }

    #[test]
    fn test_frustum_accept_and_reject() {
        // Camera at the origin looking down -Z
        let frustum = Frustum::from_projection(&perspective());

        assert!(frustum.intersects_aabb(&unit_cube(Vec3::new(0.0, 0.0, -10.0))));
        assert!(!frustum.intersects_aabb(&unit_cube(Vec3::new(0.0, 0.0, 10.0))));
        assert!(!frustum.intersects_aabb(&unit_cube(Vec3::new(500.0, 0.0, -10.0))));
        assert!(!frustum.intersects_aabb(&unit_cube(Vec3::new(0.0, 0.0, -200.0))));
        // Straddling the near plane still counts
        assert!(frustum.intersects_aabb(&unit_cube(Vec3::new(0.0, 0.0, 0.3))));
    }

    #[test]
    fn test_camera_transform_matches_view_projection() {
        let camera_to_world = Mat4::new_translation(&Vec3::new(10.0, 2.0, 0.0))
            * Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2).to_homogeneous();
        let view = camera_to_world.try_inverse().unwrap();

        let from_camera = Frustum::from_camera(&perspective(), &camera_to_world);
        let from_view_projection = Frustum::from_view_projection(&(perspective() * view));

        for (a, b) in from_camera.planes.iter().zip(from_view_projection.planes.iter()) {
            assert_relative_eq!(a.normal, b.normal, epsilon = 1e-4);
            assert_relative_eq!(a.distance, b.distance, epsilon = 1e-3);
        }

        // Turned to look down -X from x = 10
        assert!(from_camera.intersects_aabb(&unit_cube(Vec3::new(0.0, 2.0, 0.0))));
        assert!(!from_camera.intersects_aabb(&unit_cube(Vec3::new(20.0, 2.0, 0.0))));
    }

    #[test]
    fn test_simple_list_graph() {
        let mut graph: SimpleListGraph = [
            (Entity::new(0), unit_cube(Vec3::new(0.0, 0.0, -5.0))),
            (Entity::new(1), unit_cube(Vec3::new(0.0, 0.0, 5.0))),
        ]
        .into_iter()
        .collect();
        let frustum = Frustum::from_projection(&perspective());

        assert_eq!(graph.query_visible(&frustum), vec![Entity::new(0)]);

        graph.update(Entity::new(1), unit_cube(Vec3::new(1.0, 0.0, -5.0)));
        assert_eq!(graph.query_visible(&frustum), vec![Entity::new(0), Entity::new(1)]);

        graph.remove(Entity::new(0));
        assert_eq!(graph.entity_count(), 1);
        graph.clear();
        assert_eq!(graph.entity_count(), 0);
    }
}
