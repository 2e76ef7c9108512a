//! Column-major 3x3 / 4x4 affine algebra.
//!
//! Composition follows mathematical order: `a ∘ b` applies `b` first, then `a`.
//! `set_*` methods overwrite the receiver and return it for chaining; the other
//! operations leave the receiver untouched and return a new value.
//! Angles are in degrees.

use std::ops::Mul;

use glam::{DVec3, DVec4};

use crate::error::TransformError;

/// Column-major index of (row, col) in a 4x4 matrix.
#[inline]
const fn idx4(row: usize, col: usize) -> usize {
    col * 4 + row
}

#[inline]
const fn idx3(row: usize, col: usize) -> usize {
    col * 3 + row
}

/// Linear part of an axis-angle rotation as a column-major 3x3.
/// A zero axis yields NaN entries.
fn axis_angle3(axis: DVec3, angle_deg: f64) -> [f64; 9] {
    let len = axis.length();
    let (x, y, z) = (axis.x / len, axis.y / len, axis.z / len);
    let (s, c) = angle_deg.to_radians().sin_cos();
    let t = 1.0 - c;
    [
        t * x * x + c,
        t * x * y + s * z,
        t * x * z - s * y,
        t * x * y - s * z,
        t * y * y + c,
        t * y * z + s * x,
        t * x * z + s * y,
        t * y * z - s * x,
        t * z * z + c,
    ]
}

/// 4x4 matrix, column-major: column `i` is `[4i..4i+3]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4 {
    e: [f64; 16],
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        e: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub const fn from_cols_array(e: [f64; 16]) -> Self {
        Self { e }
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        *Self::identity().set_translation(x, y, z)
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Self {
        *Self::identity().set_scaling(x, y, z)
    }

    /// Rotation about `axis` by `angle_deg`. The axis is normalized first;
    /// a zero-length axis produces NaN entries (see [`Matrix4::try_rotation`]).
    pub fn rotation(axis: DVec3, angle_deg: f64) -> Self {
        *Self::identity().set_rotation_by_axis(axis, angle_deg)
    }

    /// Checked variant of [`Matrix4::rotation`].
    pub fn try_rotation(axis: DVec3, angle_deg: f64) -> Result<Self, TransformError> {
        if axis.length_squared() == 0.0 || !axis.is_finite() {
            return Err(TransformError::ZeroLengthAxis);
        }
        Ok(Self::rotation(axis, angle_deg))
    }

    pub fn rotation_x(angle_deg: f64) -> Self {
        Self::rotation(DVec3::X, angle_deg)
    }

    pub fn rotation_y(angle_deg: f64) -> Self {
        Self::rotation(DVec3::Y, angle_deg)
    }

    pub fn rotation_z(angle_deg: f64) -> Self {
        Self::rotation(DVec3::Z, angle_deg)
    }

    #[inline]
    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.e[idx4(row, col)]
    }

    /// Raw column-major elements.
    #[inline]
    pub fn to_cols_array(&self) -> [f64; 16] {
        self.e
    }

    /// Column-major `f32` layout for uniform upload.
    pub fn to_gpu_array(&self) -> [f32; 16] {
        self.e.map(|v| v as f32)
    }

    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::IDENTITY;
        self
    }

    pub fn set_translation(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        *self = Self::IDENTITY;
        self.e[12] = x;
        self.e[13] = y;
        self.e[14] = z;
        self
    }

    pub fn set_scaling(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        *self = Self::IDENTITY;
        self.e[0] = x;
        self.e[5] = y;
        self.e[10] = z;
        self
    }

    pub fn set_rotation_by_axis(&mut self, axis: DVec3, angle_deg: f64) -> &mut Self {
        let r = axis_angle3(axis, angle_deg);
        *self = Self::IDENTITY;
        for col in 0..3 {
            for row in 0..3 {
                self.e[idx4(row, col)] = r[idx3(row, col)];
            }
        }
        self
    }

    pub fn set_transpose(&mut self) -> &mut Self {
        *self = self.transpose();
        self
    }

    /// `self = self ∘ m` (`m` is applied first).
    pub fn set_multiply_to_the_right(&mut self, m: &Matrix4) -> &mut Self {
        *self = compose4(self, m);
        self
    }

    /// `self = m ∘ self` (`self` is applied first).
    pub fn set_multiply_to_the_left(&mut self, m: &Matrix4) -> &mut Self {
        *self = compose4(m, self);
        self
    }

    /// `self = m1 ∘ m2 ∘ … ∘ mn`; the last matrix is applied first.
    /// An empty list yields the identity.
    pub fn set_multiply_matrices(&mut self, matrices: &[&Matrix4]) -> &mut Self {
        *self = matrices
            .iter()
            .fold(Self::IDENTITY, |acc, m| compose4(&acc, m));
        self
    }

    #[inline]
    pub fn copy(&self) -> Self {
        *self
    }

    pub fn transpose(&self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[idx4(col, row)] = self.e[idx4(row, col)];
            }
        }
        Self { e: out }
    }

    pub fn multiply_to_the_right(&self, m: &Matrix4) -> Self {
        compose4(self, m)
    }

    pub fn multiply_to_the_left(&self, m: &Matrix4) -> Self {
        compose4(m, self)
    }

    /// Transforms a point (w = 1).
    pub fn multiply_vector3(&self, v: DVec3) -> DVec3 {
        self.multiply_vector4(v.extend(1.0)).truncate()
    }

    /// Transforms a direction (w = 0), ignoring translation.
    pub fn multiply_direction3(&self, v: DVec3) -> DVec3 {
        self.multiply_vector4(v.extend(0.0)).truncate()
    }

    pub fn multiply_vector4(&self, v: DVec4) -> DVec4 {
        let e = &self.e;
        DVec4::new(
            e[0] * v.x + e[4] * v.y + e[8] * v.z + e[12] * v.w,
            e[1] * v.x + e[5] * v.y + e[9] * v.z + e[13] * v.w,
            e[2] * v.x + e[6] * v.y + e[10] * v.z + e[14] * v.w,
            e[3] * v.x + e[7] * v.y + e[11] * v.z + e[15] * v.w,
        )
    }

    /// Linear 3x3 part (rotation and scale).
    pub fn upper_left3(&self) -> Matrix3 {
        let mut out = [0.0; 9];
        for col in 0..3 {
            for row in 0..3 {
                out[idx3(row, col)] = self.e[idx4(row, col)];
            }
        }
        Matrix3::from_cols_array(out)
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        compose4(&self, &rhs)
    }
}

impl Mul<&Matrix4> for &Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: &Matrix4) -> Matrix4 {
        compose4(self, rhs)
    }
}

fn compose4(a: &Matrix4, b: &Matrix4) -> Matrix4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[idx4(row, col)] = (0..4)
                .map(|k| a.e[idx4(row, k)] * b.e[idx4(k, col)])
                .sum();
        }
    }
    Matrix4 { e: out }
}

/// 3x3 matrix, column-major: column `i` is `[3i..3i+2]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3 {
    e: [f64; 9],
}

impl Matrix3 {
    pub const IDENTITY: Self = Self {
        e: [
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ],
    };

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub const fn from_cols_array(e: [f64; 9]) -> Self {
        Self { e }
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Self {
        *Self::identity().set_scaling(x, y, z)
    }

    pub fn rotation(axis: DVec3, angle_deg: f64) -> Self {
        *Self::identity().set_rotation_by_axis(axis, angle_deg)
    }

    #[inline]
    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.e[idx3(row, col)]
    }

    #[inline]
    pub fn to_cols_array(&self) -> [f64; 9] {
        self.e
    }

    pub fn to_gpu_array(&self) -> [f32; 9] {
        self.e.map(|v| v as f32)
    }

    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::IDENTITY;
        self
    }

    pub fn set_scaling(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        *self = Self::IDENTITY;
        self.e[0] = x;
        self.e[4] = y;
        self.e[8] = z;
        self
    }

    pub fn set_rotation_by_axis(&mut self, axis: DVec3, angle_deg: f64) -> &mut Self {
        self.e = axis_angle3(axis, angle_deg);
        self
    }

    pub fn set_transpose(&mut self) -> &mut Self {
        *self = self.transpose();
        self
    }

    pub fn set_multiply_to_the_right(&mut self, m: &Matrix3) -> &mut Self {
        *self = compose3(self, m);
        self
    }

    pub fn set_multiply_to_the_left(&mut self, m: &Matrix3) -> &mut Self {
        *self = compose3(m, self);
        self
    }

    pub fn transpose(&self) -> Self {
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[idx3(col, row)] = self.e[idx3(row, col)];
            }
        }
        Self { e: out }
    }

    pub fn multiply_to_the_right(&self, m: &Matrix3) -> Self {
        compose3(self, m)
    }

    pub fn multiply_to_the_left(&self, m: &Matrix3) -> Self {
        compose3(m, self)
    }

    pub fn multiply_vector3(&self, v: DVec3) -> DVec3 {
        let e = &self.e;
        DVec3::new(
            e[0] * v.x + e[3] * v.y + e[6] * v.z,
            e[1] * v.x + e[4] * v.y + e[7] * v.z,
            e[2] * v.x + e[5] * v.y + e[8] * v.z,
        )
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: Matrix3) -> Matrix3 {
        compose3(&self, &rhs)
    }
}

fn compose3(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [0.0; 9];
    for col in 0..3 {
        for row in 0..3 {
            out[idx3(row, col)] = (0..3)
                .map(|k| a.e[idx3(row, k)] * b.e[idx3(k, col)])
                .sum();
        }
    }
    Matrix3 { e: out }
}
