//! Narrow-phase shape tests
//!
//! GEA 13.3.4: "The narrow phase performs detailed shape-to-shape tests."
//!
//! Every test returns the separation vector for its first argument: the
//! world-space translation that, applied to the first shape, removes the
//! overlap with the second. `None` means the shapes do not overlap. Touching
//! shapes (zero overlap) do not collide.

use super::primitives::{BoundingSphere, OrientedBox};
use super::shape::WorldSpaceShape;
use crate::foundation::math::Vec3;

/// Below this squared distance two points are treated as coincident
const COINCIDENT_EPSILON_SQ: f32 = 1e-12;

/// Run the test for a pair already ordered by [`ShapeKind`](super::ShapeKind)
///
/// Returns `None` for combinations without a test, which is also how the
/// detector treats shape kinds it does not know.
pub fn dispatch(a: &WorldSpaceShape, b: &WorldSpaceShape, axis_epsilon: f32) -> Option<Vec3> {
    match (a, b) {
        (WorldSpaceShape::Box(a), WorldSpaceShape::Box(b)) => box_box(a, b, axis_epsilon),
        (WorldSpaceShape::Box(a), WorldSpaceShape::Sphere(b)) => box_sphere(a, b),
        (WorldSpaceShape::Sphere(a), WorldSpaceShape::Sphere(b)) => sphere_sphere(a, b),
        _ => None,
    }
}

/// Separating axis test between two oriented boxes
///
/// Candidate axes in test order: A's three face normals, B's three face
/// normals, then the nine cross products `a[i] x b[j]` (row-major). Cross
/// products whose squared length is below `axis_epsilon` come from (nearly)
/// parallel edges and are skipped. The axis with the smallest overlap wins;
/// on ties the earlier axis is kept.
pub fn box_box(a: &OrientedBox, b: &OrientedBox, axis_epsilon: f32) -> Option<Vec3> {
    let offset = a.center - b.center;
    let mut best_axis = Vec3::zeros();
    let mut best_overlap = f32::INFINITY;

    let face_axes = a.axes.iter().chain(b.axes.iter()).copied();
    let edge_axes = a.axes.iter().flat_map(|axis_a| {
        b.axes.iter().filter_map(move |axis_b| {
            let cross = axis_a.cross(axis_b);
            let length_sq = cross.magnitude_squared();
            (length_sq >= axis_epsilon).then(|| cross / length_sq.sqrt())
        })
    });

    for axis in face_axes.chain(edge_axes) {
        let overlap = a.projected_radius(&axis) + b.projected_radius(&axis) - offset.dot(&axis).abs();
        if overlap <= 0.0 {
            log::trace!("SAT: separating axis {:?}", axis);
            return None;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = axis;
        }
    }

    // Point from B towards A; a zero projection keeps the axis as tested
    if offset.dot(&best_axis) < 0.0 {
        best_axis = -best_axis;
    }
    Some(best_axis * best_overlap)
}

/// Closest-point test between an oriented box and a sphere
///
/// When the sphere center lies inside the box there is no usable delta, so
/// the sphere is pushed out through the face with the least penetration
/// (lowest axis index on ties, positive side when the center sits on the
/// mid-plane).
pub fn box_sphere(obb: &OrientedBox, sphere: &BoundingSphere) -> Option<Vec3> {
    let closest = obb.closest_point(sphere.center);
    let delta = sphere.center - closest;
    let distance_sq = delta.magnitude_squared();

    if distance_sq > COINCIDENT_EPSILON_SQ {
        if distance_sq >= sphere.radius * sphere.radius {
            return None;
        }
        let distance = distance_sq.sqrt();
        // Box moves away from the sphere
        return Some(-delta / distance * (sphere.radius - distance));
    }

    let local = obb.to_local(sphere.center);
    let mut best_axis = 0;
    let mut best_depth = f32::INFINITY;
    for i in 0..3 {
        let depth = obb.half_extents[i] - local[i].abs();
        if depth < best_depth {
            best_depth = depth;
            best_axis = i;
        }
    }

    let push = if local[best_axis] < 0.0 { -obb.axes[best_axis] } else { obb.axes[best_axis] };
    Some(-push * (best_depth + sphere.radius))
}

/// Center distance test between two spheres
///
/// Coincident centers collide with a zero separation vector.
pub fn sphere_sphere(a: &BoundingSphere, b: &BoundingSphere) -> Option<Vec3> {
    let delta = a.center - b.center;
    let radius_sum = a.radius + b.radius;
    let distance_sq = delta.magnitude_squared();

    if distance_sq >= radius_sum * radius_sum {
        return None;
    }
    if distance_sq <= COINCIDENT_EPSILON_SQ {
        return Some(Vec3::zeros());
    }
    let distance = distance_sq.sqrt();
    Some(delta / distance * (radius_sum - distance))
}
