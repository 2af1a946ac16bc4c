//! Triangle primitive using the Möller-Trumbore test.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Ray, Vec2, Vec3, Vec3Ext};

use crate::hittable::SurfaceHit;
use crate::primitive::{GeometryError, GeometryResult, Shape};

/// A triangle hittable from either side; UV are the barycentric (u, v).
#[derive(Debug, Clone)]
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    material: Arc<Material>,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<Material>) -> GeometryResult<Self> {
        if (v1 - v0).cross(v2 - v0).length_squared() < 1e-24 {
            return Err(GeometryError::DegenerateTriangle);
        }
        Ok(Self { v0, v1, v2, material })
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(self.v2 - self.v0).normalized()
    }
}

impl Shape for Triangle {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        const EPSILON: f64 = 1e-8;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        Some(SurfaceHit::new(t, ray.at(t), self.normal(), Vec2::new(u, v)))
    }

    fn translate(&mut self, offset: Vec3) {
        self.v0 += offset;
        self.v1 += offset;
        self.v2 += offset;
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        self.v0 = self.v0.rotated(axis, degrees);
        self.v1 = self.v1.rotated(axis, degrees);
        self.v2 = self.v2.rotated(axis, degrees);
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Triangle {
        Triangle::new(
            Vec3::new(-1.0, -1.0, -2.0),
            Vec3::new(1.0, -1.0, -2.0),
            Vec3::new(0.0, 1.0, -2.0),
            Arc::new(Material::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_triangle_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = triangle().intersect(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-9);
        assert!((hit.normal - Vec3::Z).length() < 1e-9);
        assert!(hit.uv.x >= 0.0 && hit.uv.y >= 0.0 && hit.uv.x + hit.uv.y <= 1.0);
    }

    #[test]
    fn test_triangle_miss() {
        let ray = Ray::new(Vec3::new(2.0, 2.0, 0.0), Vec3::NEG_Z);
        assert!(triangle().intersect(&ray, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::X);
        assert!(triangle().intersect(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_degenerate_rejected() {
        let result = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Arc::new(Material::default()));
        assert_eq!(result.unwrap_err(), GeometryError::DegenerateTriangle);
    }
}
