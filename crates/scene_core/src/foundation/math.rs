//! Math utilities and types
//!
//! Provides fundamental math types shared by the hierarchy, collision and
//! culling layers.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    UnitQuaternion,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Basis columns shorter than this are treated as collapsed.
const DEGENERATE_AXIS_LENGTH: f32 = 1e-8;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Convert to a transformation matrix (T * R * S)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix into translation, rotation and scale.
    ///
    /// Shear is discarded. A collapsed basis column yields a zero scale on
    /// that axis and leaves the rotation to the remaining columns.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = matrix_translation(matrix);
        let (axes, scale) = basis_axes(matrix);

        let mut rotation_matrix = Mat3::from_columns(&axes);
        // A mirrored basis is folded into a negative X scale so the
        // remaining 3x3 stays a proper rotation.
        let mut scale = scale;
        if rotation_matrix.determinant() < 0.0 {
            scale.x = -scale.x;
            rotation_matrix.set_column(0, &(-axes[0]));
        }
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Split the upper 3x3 of an affine matrix into unit axes and axis lengths.
///
/// Columns with (near) zero length fall back to the matching world axis with
/// a length of zero, so callers always receive three usable directions.
pub fn basis_axes(matrix: &Mat4) -> ([Vec3; 3], Vec3) {
    let mut axes = [Vec3::x(), Vec3::y(), Vec3::z()];
    let mut lengths = Vec3::zeros();

    for (i, axis) in axes.iter_mut().enumerate() {
        let column = Vec3::new(matrix[(0, i)], matrix[(1, i)], matrix[(2, i)]);
        let length = column.magnitude();
        if length > DEGENERATE_AXIS_LENGTH {
            *axis = column / length;
            lengths[i] = length;
        }
    }

    (axes, lengths)
}

/// Largest scale factor applied by the matrix along any basis axis
pub fn max_axis_scale(matrix: &Mat4) -> f32 {
    let (_, lengths) = basis_axes(matrix);
    lengths.max()
}

/// Translation part of an affine matrix
pub fn matrix_translation(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}
