//! Quaternion values for bone rotations.
//!
//! `Quat` is the scalar-first `(w, x, y, z)` shape rotation curves and offset
//! tables use; the math runs on `nalgebra` quaternions. Composition is the
//! Hamilton product: `a * b` applies `b` first, then `a`.

use std::fmt;
use std::ops::{Mul, MulAssign};

use approx::AbsDiffEq;
use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Default tolerance for approximate comparisons.
pub const QUAT_EPSILON: f64 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Build from a `[w, x, y, z]` array.
    #[inline]
    pub const fn from_array(q: [f64; 4]) -> Self {
        Self::new(q[0], q[1], q[2], q[3])
    }

    #[inline]
    pub const fn to_array(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    #[inline]
    pub fn to_nalgebra(self) -> Quaternion<f64> {
        Quaternion::new(self.w, self.x, self.y, self.z)
    }

    /// Rotation of `angle` radians about `axis`. A zero axis yields the identity.
    pub fn from_axis_angle(axis: [f64; 3], angle: f64) -> Self {
        match Unit::try_new(Vector3::from(axis), 0.0) {
            Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle).into(),
            None => Self::IDENTITY,
        }
    }

    #[inline]
    pub fn from_axis_degrees(axis: [f64; 3], degrees: f64) -> Self {
        Self::from_axis_angle(axis, degrees.to_radians())
    }

    #[inline]
    pub fn dot(self, other: Quat) -> f64 {
        self.to_nalgebra().dot(&other.to_nalgebra())
    }

    #[inline]
    pub fn norm_squared(self) -> f64 {
        self.to_nalgebra().norm_squared()
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.to_nalgebra().norm()
    }

    /// Unit-length copy, or `None` for a zero or non-finite quaternion.
    pub fn try_normalize(self) -> Option<Quat> {
        if !self.is_finite() {
            return None;
        }
        UnitQuaternion::try_new(self.to_nalgebra(), 0.0).map(Quat::from)
    }

    #[inline]
    pub fn conjugate(self) -> Self {
        self.to_nalgebra().conjugate().into()
    }

    /// Inverse of a unit quaternion.
    #[inline]
    pub fn inverse(self) -> Self {
        UnitQuaternion::new_unchecked(self.to_nalgebra())
            .inverse()
            .into()
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[inline]
    pub fn is_unit(self, eps: f64) -> bool {
        (self.norm_squared() - 1.0).abs() <= eps
    }

    /// Component-wise comparison within `eps`. `q` and `-q` are NOT treated
    /// as equal: keyframe values are compared, not rotations.
    pub fn abs_diff_eq(self, other: Quat, eps: f64) -> bool {
        self.to_nalgebra().abs_diff_eq(&other.to_nalgebra(), eps)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Quat {
    type Output = Quat;

    #[inline]
    fn mul(self, rhs: Quat) -> Quat {
        (self.to_nalgebra() * rhs.to_nalgebra()).into()
    }
}

impl MulAssign for Quat {
    #[inline]
    fn mul_assign(&mut self, rhs: Quat) {
        *self = *self * rhs;
    }
}

impl From<Quaternion<f64>> for Quat {
    fn from(q: Quaternion<f64>) -> Self {
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl From<UnitQuaternion<f64>> for Quat {
    fn from(q: UnitQuaternion<f64>) -> Self {
        q.into_inner().into()
    }
}

impl From<Quat> for Quaternion<f64> {
    fn from(q: Quat) -> Self {
        q.to_nalgebra()
    }
}

impl From<[f64; 4]> for Quat {
    fn from(q: [f64; 4]) -> Self {
        Self::from_array(q)
    }
}

impl From<Quat> for [f64; 4] {
    fn from(q: Quat) -> Self {
        q.to_array()
    }
}

impl fmt::Display for Quat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Quat (w={:.4}, x={:.4}, y={:.4}, z={:.4})>",
            self.w, self.x, self.y, self.z
        )
    }
}
