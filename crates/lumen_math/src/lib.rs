//! Lumen math kernel.
//!
//! Double precision vectors (re-exported from glam), rays, intervals,
//! bounding boxes and the per-axis rotation helpers used by every primitive.

pub use glam::{DMat3, DVec2, DVec3};

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{Axis, Orientation, Vec3Ext};

/// Points and vectors share one type; arithmetic between them is glam's.
pub type Vec3 = DVec3;

/// Surface (u, v) coordinates.
pub type Vec2 = DVec2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_point_vector_algebra() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let q = Vec3::new(4.0, 6.0, 3.0);
        let d = q - p;
        assert_eq!(d, Vec3::new(3.0, 4.0, 0.0));
        assert_eq!(d.length(), 5.0);
        assert_eq!(p + d, q);
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(p * Vec3::new(2.0, 0.5, -1.0), Vec3::new(2.0, 1.0, -3.0));
        assert_eq!(p.dot(q), 4.0 + 12.0 + 9.0);
    }
}
