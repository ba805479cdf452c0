//! Small TRS helpers over `glam`.
//!
//! Rotations are Euler angles in radians applied as `Rz * Ry * Rx`
//! (intrinsic Z-Y-X), and matrices use the column-vector convention, so a
//! local matrix is `T * R * S`.

use glam::{EulerRot, Mat4, Quat, Vec3};

pub const DEFAULT_EPSILON: f32 = 1e-4;

/// Quaternion for a `Rz * Ry * Rx` Euler rotation.
pub fn euler_to_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::ZYX, rotation.z, rotation.y, rotation.x)
}

/// Inverse of [`euler_to_quat`].
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    Vec3::new(x, y, z)
}

pub fn compose_trs(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, euler_to_quat(rotation), position)
}

/// Splits an affine matrix into `(position, euler rotation, scale)`.
///
/// Shear cannot be represented and is dropped.
pub fn decompose_trs(matrix: &Mat4) -> (Vec3, Vec3, Vec3) {
    let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
    (translation, quat_to_euler(rotation), scale)
}

pub fn translation_of(matrix: &Mat4) -> Vec3 {
    matrix.w_axis.truncate()
}

pub fn approx_eq(a: Vec3, b: Vec3, epsilon: f32) -> bool {
    a.abs_diff_eq(b, epsilon)
}
