//! High-level collision shape abstractions
//!
//! Shapes are stored in model space on the collider and transformed to world
//! space on demand during collision tests.

use serde::{Deserialize, Serialize};

use super::primitives::{BoundingSphere, OrientedBox};
use crate::foundation::math::{basis_axes, max_axis_scale, Mat4, Point3, Vec3};
use crate::scene::Aabb;

/// Collision shape types (stored in MODEL SPACE)
/// GEA 13.3.4: "Store collision shapes in model space, transform on-the-fly during tests"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Box with a center offset from the entity origin
    Box {
        /// Offset of the box center in model space
        center: Vec3,
        /// Half size along each model axis
        half_extents: Vec3,
    },
    /// Sphere with a center offset from the entity origin
    Sphere {
        /// Offset of the sphere center in model space
        center: Vec3,
        /// Model-space radius
        radius: f32,
    },
}

/// Shape discriminant, ordered for narrow-phase dispatch
///
/// Pair tests are written once per unordered combination with the lower
/// kind first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeKind {
    /// [`ColliderShape::Box`]
    Box = 0,
    /// [`ColliderShape::Sphere`]
    Sphere = 1,
}

impl ColliderShape {
    /// Box centered on the entity origin
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box { center: Vec3::zeros(), half_extents }
    }

    /// Sphere centered on the entity origin
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { center: Vec3::zeros(), radius }
    }

    /// Move the shape's center away from the entity origin
    pub fn with_offset(self, offset: Vec3) -> Self {
        match self {
            Self::Box { half_extents, .. } => Self::Box { center: offset, half_extents },
            Self::Sphere { radius, .. } => Self::Sphere { center: offset, radius },
        }
    }

    /// Dispatch discriminant
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box { .. } => ShapeKind::Box,
            Self::Sphere { .. } => ShapeKind::Sphere,
        }
    }

    /// Model-space center offset
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Box { center, .. } | Self::Sphere { center, .. } => *center,
        }
    }

    /// Model-space bounding box
    pub fn local_bounds(&self) -> Aabb {
        match *self {
            Self::Box { center, half_extents } => Aabb::new(center, half_extents),
            Self::Sphere { center, radius } => {
                Aabb::new(center, Vec3::new(radius, radius, radius))
            }
        }
    }

    /// Transform this shape to world space
    ///
    /// Box half extents are scaled by the lengths of the matrix's basis
    /// columns; sphere radii by the largest of them, so a non-uniformly
    /// scaled sphere is conservatively enclosed.
    pub fn to_world_space(&self, world: &Mat4) -> WorldSpaceShape {
        match *self {
            Self::Box { center, half_extents } => {
                let (axes, scale) = basis_axes(world);
                WorldSpaceShape::Box(OrientedBox::new(
                    transform_point(world, center),
                    axes,
                    half_extents.component_mul(&scale),
                ))
            }
            Self::Sphere { center, radius } => WorldSpaceShape::Sphere(BoundingSphere::new(
                transform_point(world, center),
                radius * max_axis_scale(world),
            )),
        }
    }
}

fn transform_point(matrix: &Mat4, point: Vec3) -> Vec3 {
    matrix.transform_point(&Point3::from(point)).coords
}

/// World-space collision shape (temporary, for testing only)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldSpaceShape {
    /// World-space oriented box
    Box(OrientedBox),
    /// World-space sphere
    Sphere(BoundingSphere),
}

impl WorldSpaceShape {
    /// Dispatch discriminant
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box(_) => ShapeKind::Box,
            Self::Sphere(_) => ShapeKind::Sphere,
        }
    }

    /// Get center position
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Box(obb) => obb.center,
            Self::Sphere(sphere) => sphere.center,
        }
    }

    /// World-axis aligned box enclosing the shape
    pub fn bounds(&self) -> Aabb {
        match self {
            Self::Box(obb) => Aabb::new(
                obb.center,
                Vec3::new(
                    obb.projected_radius(&Vec3::x()),
                    obb.projected_radius(&Vec3::y()),
                    obb.projected_radius(&Vec3::z()),
                ),
            ),
            Self::Sphere(sphere) => Aabb::new(
                sphere.center,
                Vec3::new(sphere.radius, sphere.radius, sphere.radius),
            ),
        }
    }
}
