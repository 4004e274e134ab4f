//! 4x4 matrix helpers for node transforms.
//!
//! Matrices are stored as 16 floats in column-major order, the layout
//! graphics APIs and glTF use: elements 12, 13 and 14 hold the translation.
//! Read as row-major the same array is the row-vector form of the transform,
//! so composing a child with its parent is the plain row-by-column product
//! `local * parent`.

use num_traits::Float;

pub type Mat4 = [f32; 16];

pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Standard 4x4 product, `result[r][c] = sum_k lhs[r][k] * rhs[k][c]`.
pub fn multiply(lhs: &Mat4, rhs: &Mat4) -> Mat4 {
    let mut result = [0.0f32; 16];
    for row in 0..4 {
        for col in 0..4 {
            let mut sum = 0.0;
            for step in 0..4 {
                sum += lhs[row * 4 + step] * rhs[step * 4 + col];
            }
            result[row * 4 + col] = sum;
        }
    }
    result
}

/// Translation part of a matrix.
pub fn translation(m: &Mat4) -> [f32; 3] {
    [m[12], m[13], m[14]]
}

/// Builds a matrix from scale, rotation (as the column-major 3x3 basis) and
/// translation. Column `i` of the basis is scaled by `scale[i]`.
fn compose(basis: [[f32; 3]; 3], scale: [f32; 3], t: [f32; 3]) -> Mat4 {
    [
        basis[0][0] * scale[0], basis[0][1] * scale[0], basis[0][2] * scale[0], 0.0,
        basis[1][0] * scale[1], basis[1][1] * scale[1], basis[1][2] * scale[1], 0.0,
        basis[2][0] * scale[2], basis[2][1] * scale[2], basis[2][2] * scale[2], 0.0,
        t[0], t[1], t[2], 1.0,
    ]
}

/// Rotation basis for a unit quaternion `[x, y, z, w]`.
///
/// Returns the three columns of the rotation matrix.
pub fn quat_to_basis(q: [f32; 4]) -> [[f32; 3]; 3] {
    let [x, y, z, w] = q;
    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y + z * w),
            2.0 * (x * z - y * w),
        ],
        [
            2.0 * (x * y - z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z + x * w),
        ],
        [
            2.0 * (x * z + y * w),
            2.0 * (y * z - x * w),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

/// Matrix from scale, quaternion rotation and translation (scale applied
/// first, then rotation, then translation).
pub fn from_scale_rotation_translation(scale: [f32; 3], rotation: [f32; 4], t: [f32; 3]) -> Mat4 {
    compose(quat_to_basis(rotation), scale, t)
}

/// Rotation basis for Euler angles in radians, X applied first, then Y,
/// then Z.
pub fn euler_xyz_to_basis<T: Float>(angles: [T; 3]) -> [[f32; 3]; 3] {
    let to_f32 = |v: T| v.to_f32().unwrap_or(0.0);
    let (sx, cx) = (to_f32(angles[0].sin()), to_f32(angles[0].cos()));
    let (sy, cy) = (to_f32(angles[1].sin()), to_f32(angles[1].cos()));
    let (sz, cz) = (to_f32(angles[2].sin()), to_f32(angles[2].cos()));

    // Columns of Rz * Ry * Rx.
    [
        [cz * cy, sz * cy, -sy],
        [cz * sy * sx - sz * cx, sz * sy * sx + cz * cx, cy * sx],
        [cz * sy * cx + sz * sx, sz * sy * cx - cz * sx, cy * cx],
    ]
}

/// Matrix from translation, Euler rotation in degrees (XYZ order) and scale.
pub fn from_euler_degrees(t: [f64; 3], rotation_degrees: [f64; 3], scale: [f64; 3]) -> Mat4 {
    let radians = rotation_degrees.map(f64::to_radians);
    compose(
        euler_xyz_to_basis(radians),
        scale.map(|v| v as f32),
        t.map(|v| v as f32),
    )
}

/// Component-wise comparison within `epsilon`.
pub fn approx_eq(a: &Mat4, b: &Mat4, epsilon: f32) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= epsilon)
}
