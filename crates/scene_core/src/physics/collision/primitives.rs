//! World-space collision primitives
//!
//! Temporary shapes built from a collider and its entity's world matrix for
//! the duration of a narrow-phase test.

use crate::foundation::math::Vec3;

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether the point lies strictly inside the sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).magnitude_squared() < self.radius * self.radius
    }
}

/// Oriented bounding box
///
/// `axes` are unit length and mutually orthogonal for any transform without
/// shear. `half_extents[i]` is measured along `axes[i]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// World-space center
    pub center: Vec3,
    /// World-space unit axes
    pub axes: [Vec3; 3],
    /// Half size along each axis
    pub half_extents: Vec3,
}

impl OrientedBox {
    /// Create a box from its center, axes and half extents
    pub fn new(center: Vec3, axes: [Vec3; 3], half_extents: Vec3) -> Self {
        Self { center, axes, half_extents }
    }

    /// World-axis aligned box
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, [Vec3::x(), Vec3::y(), Vec3::z()], half_extents)
    }

    /// Half length of the box's shadow on a unit axis
    #[inline]
    pub fn projected_radius(&self, axis: &Vec3) -> f32 {
        self.axes
            .iter()
            .zip(self.half_extents.iter())
            .map(|(box_axis, extent)| extent * box_axis.dot(axis).abs())
            .sum()
    }

    /// Coordinates of a world point in the box's frame (relative to center)
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        let offset = point - self.center;
        Vec3::new(
            offset.dot(&self.axes[0]),
            offset.dot(&self.axes[1]),
            offset.dot(&self.axes[2]),
        )
    }

    /// Point of the box (surface or interior) closest to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = self.to_local(point);
        (0..3).fold(self.center, |closest, i| {
            let extent = self.half_extents[i];
            closest + self.axes[i] * local[i].clamp(-extent, extent)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    #[test]
    fn test_projected_radius_rotated() {
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let axes = [rotation * Vec3::x(), rotation * Vec3::y(), rotation * Vec3::z()];
        let obb = OrientedBox::new(Vec3::zeros(), axes, Vec3::new(1.0, 1.0, 1.0));

        // A unit cube turned 45 degrees shows its diagonal along X
        assert_relative_eq!(obb.projected_radius(&Vec3::x()), 2.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(obb.projected_radius(&Vec3::z()), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_closest_point_clamps_to_surface() {
        let obb = OrientedBox::axis_aligned(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.5, 0.5, 0.5));

        assert_relative_eq!(
            obb.closest_point(Vec3::new(3.0, 0.2, -4.0)),
            Vec3::new(1.5, 0.2, -0.5)
        );
        // Interior points are their own closest point
        assert_relative_eq!(obb.closest_point(Vec3::new(1.1, 0.1, 0.0)), Vec3::new(1.1, 0.1, 0.0));
    }

    #[test]
    fn test_sphere_contains_point() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        assert!(sphere.contains_point(Vec3::new(0.5, 0.5, 0.0)));
        assert!(!sphere.contains_point(Vec3::new(1.0, 0.0, 0.0)));
    }
}
