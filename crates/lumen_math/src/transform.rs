// Rotation and shading helpers for DVec3.
//
// Rotations are rigid rotations about the coordinate axes through the world
// origin, expressed in degrees.

use glam::DMat3;

use crate::{Ray, Vec3};

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Extension trait for Vec3 with the operations the tracer relies on.
pub trait Vec3Ext {
    /// Normalize, returning a zero-length vector unchanged instead of NaN.
    fn normalized(self) -> Vec3;

    /// Rotate about the X axis by `degrees`.
    fn rotated_x(self, degrees: f64) -> Vec3;

    /// Rotate about the Y axis by `degrees`.
    fn rotated_y(self, degrees: f64) -> Vec3;

    /// Rotate about the Z axis by `degrees`.
    fn rotated_z(self, degrees: f64) -> Vec3;

    /// Rotate about `axis` by `degrees`.
    fn rotated(self, axis: Axis, degrees: f64) -> Vec3;

    /// Mirror this direction about `normal`.
    fn reflect_about(self, normal: Vec3) -> Vec3;

    /// Bend this unit direction through a surface with relative index `eta`.
    ///
    /// Returns `None` on total internal reflection (negative discriminant).
    fn try_refract(self, normal: Vec3, eta: f64) -> Option<Vec3>;
}

impl Vec3Ext for Vec3 {
    fn normalized(self) -> Vec3 {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self / len
        }
    }

    fn rotated_x(self, degrees: f64) -> Vec3 {
        DMat3::from_rotation_x(degrees.to_radians()) * self
    }

    fn rotated_y(self, degrees: f64) -> Vec3 {
        DMat3::from_rotation_y(degrees.to_radians()) * self
    }

    fn rotated_z(self, degrees: f64) -> Vec3 {
        DMat3::from_rotation_z(degrees.to_radians()) * self
    }

    fn rotated(self, axis: Axis, degrees: f64) -> Vec3 {
        match axis {
            Axis::X => self.rotated_x(degrees),
            Axis::Y => self.rotated_y(degrees),
            Axis::Z => self.rotated_z(degrees),
        }
    }

    fn reflect_about(self, normal: Vec3) -> Vec3 {
        self - 2.0 * self.dot(normal) * normal
    }

    fn try_refract(self, normal: Vec3, eta: f64) -> Option<Vec3> {
        let cos_i = (-self).dot(normal).min(1.0);
        let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
        if k < 0.0 {
            return None;
        }
        Some(eta * self + (eta * cos_i - k.sqrt()) * normal)
    }
}

/// Accumulated per-axis rotation state of a primitive, in degrees.
///
/// The three angles are applied as independent rotations, not folded into a
/// single matrix: world to local undoes Z, then Y, then X; local to world
/// applies X, then Y, then Z. Zero angles are skipped entirely so unrotated
/// primitives see the ray bit-for-bit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Orientation {
    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Accumulate `degrees` on one axis.
    pub fn rotate(&mut self, axis: Axis, degrees: f64) {
        match axis {
            Axis::X => self.x += degrees,
            Axis::Y => self.y += degrees,
            Axis::Z => self.z += degrees,
        }
    }

    /// Map a world-space point or vector into the unrotated local frame.
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        let mut v = v;
        if self.z != 0.0 {
            v = v.rotated_z(-self.z);
        }
        if self.y != 0.0 {
            v = v.rotated_y(-self.y);
        }
        if self.x != 0.0 {
            v = v.rotated_x(-self.x);
        }
        v
    }

    /// Map a local-frame vector (typically a normal) back to world space.
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        let mut v = v;
        if self.x != 0.0 {
            v = v.rotated_x(self.x);
        }
        if self.y != 0.0 {
            v = v.rotated_y(self.y);
        }
        if self.z != 0.0 {
            v = v.rotated_z(self.z);
        }
        v
    }

    /// Both ray components through [`Orientation::to_local`].
    ///
    /// Rotations preserve length, so a parameter `t` found on the local ray
    /// is valid on the world ray.
    pub fn to_local_ray(&self, ray: &Ray) -> Ray {
        if self.is_identity() {
            return *ray;
        }
        Ray::new(self.to_local(ray.origin), self.to_local(ray.direction))
    }
}
