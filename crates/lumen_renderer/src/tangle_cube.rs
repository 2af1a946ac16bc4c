//! Tangle cube: the quartic implicit surface
//! `x⁴ - 5x² + y⁴ - 5y² + z⁴ - 5z² + 11.8 = 0`.
//!
//! The field is sampled along the ray inside a bounding box, and the first
//! sign change is refined by bisection.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Aabb, Axis, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{gradient_normal, spherical_uv, SurfaceHit};
use crate::primitive::{positive, GeometryResult, Shape};

const SAMPLES: usize = 256;
const BISECTION_STEPS: usize = 20;
const MARCH_STEPS: usize = 256;
const SURFACE_EPSILON: f64 = 1e-4;
/// `size` maps to this many field units.
const FIELD_SCALE: f64 = 1.5;
/// Bounding box half-size per unit of `size`; the surface reaches ~1.511.
const BOUND_FACTOR: f64 = 1.6;

#[derive(Debug, Clone)]
pub struct TangleCube {
    center: Vec3,
    size: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl TangleCube {
    pub fn new(center: Vec3, size: f64, material: Arc<Material>) -> GeometryResult<Self> {
        Ok(Self {
            center,
            size: positive("size", size)?,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Field value at a point relative to the local center; negative inside.
    pub fn field(&self, rel: Vec3) -> f64 {
        let p = rel * (FIELD_SCALE / self.size);
        let term = |c: f64| {
            let c2 = c * c;
            c2 * c2 - 5.0 * c2
        };
        term(p.x) + term(p.y) + term(p.z) + 11.8
    }

    /// First parameter in `[start, end]` where the field crosses zero.
    fn find_root(&self, ray: &Ray, center: Vec3, start: f64, end: f64) -> Option<f64> {
        let field_at = |t: f64| self.field(ray.at(t) - center);
        let step = (end - start) / SAMPLES as f64;

        let mut prev_t = start;
        let mut prev = field_at(start);
        for i in 1..=SAMPLES {
            let t = start + step * i as f64;
            let value = field_at(t);
            if prev.signum() != value.signum() {
                let (mut lo, mut hi) = (prev_t, t);
                for _ in 0..BISECTION_STEPS {
                    let mid = 0.5 * (lo + hi);
                    if field_at(mid).signum() == prev.signum() {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                return Some(0.5 * (lo + hi));
            }
            prev_t = t;
            prev = value;
        }

        // Thin features can hide between samples
        let dir_len = ray.direction.length();
        let mut t = start;
        for _ in 0..MARCH_STEPS {
            if t > end {
                break;
            }
            let value = field_at(t);
            if value.abs() < SURFACE_EPSILON {
                return Some(t);
            }
            t += (value.abs() * 0.1).max(1e-3) * self.size / FIELD_SCALE / dir_len;
        }
        None
    }
}

impl Shape for TangleCube {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let center = self.center;

        let bounds = Aabb::from_center(center, Vec3::splat(BOUND_FACTOR * self.size));
        let (t_enter, t_exit) = bounds.slab(&local_ray)?;
        let start = t_enter.max(ray_t.min);
        let end = t_exit.min(ray_t.max);
        if start >= end {
            return None;
        }

        let t = self.find_root(&local_ray, center, start, end)?;
        if !ray_t.surrounds(t) {
            return None;
        }

        let rel = local_ray.at(t) - center;
        let local_normal = gradient_normal(rel, 1e-4 * self.size, rel, |p| self.field(p));
        let normal = self.orientation.to_world(local_normal).normalized();
        let uv = spherical_uv(rel.normalized());
        Some(SurfaceHit::new(t, ray.at(t), normal, uv))
    }

    fn translate(&mut self, offset: Vec3) {
        self.center += offset;
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        self.center = self.center.rotated(axis, degrees);
        self.orientation.rotate(axis, degrees);
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> TangleCube {
        TangleCube::new(Vec3::ZERO, 1.5, Arc::new(Material::default())).unwrap()
    }

    // y = z = sqrt(2.5) minimizes both terms, leaving x⁴ - 5x² - 0.7 = 0
    fn lobe_root() -> f64 {
        ((5.0 + 27.8f64.sqrt()) / 2.0).sqrt()
    }

    #[test]
    fn test_field_sign() {
        let cube = cube();
        let c = 2.5f64.sqrt();
        assert!(cube.field(Vec3::new(0.0, c, c)) < 0.0);
        assert!(cube.field(Vec3::ZERO) > 0.0);
        assert!(cube.field(Vec3::splat(5.0)) > 0.0);
    }

    #[test]
    fn test_hit_through_lobes() {
        let c = 2.5f64.sqrt();
        let ray = Ray::new(Vec3::new(-5.0, c, c), Vec3::X);
        let hit = cube().intersect(&ray, Interval::new(0.0, 20.0)).unwrap();
        assert!((hit.t - (5.0 - lobe_root())).abs() < 1e-5, "t = {}", hit.t);
        assert!(hit.normal.dot(Vec3::NEG_X) > 0.999);
    }

    #[test]
    fn test_miss_along_axis() {
        // The field stays positive on the coordinate axes
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(cube().intersect(&ray, Interval::new(0.0, 20.0)).is_none());
    }

    #[test]
    fn test_size_scales_surface() {
        let c = 2.5f64.sqrt() * 2.0;
        let big = TangleCube::new(Vec3::ZERO, 3.0, Arc::new(Material::default())).unwrap();
        let ray = Ray::new(Vec3::new(-10.0, c, c), Vec3::X);
        let hit = big.intersect(&ray, Interval::new(0.0, 20.0)).unwrap();
        assert!((hit.t - (10.0 - 2.0 * lobe_root())).abs() < 1e-4);
    }

    #[test]
    fn test_small_cube_matches_scaled_normal() {
        let scale = 1e-3;
        let c = 2.5f64.sqrt();
        let reference = cube()
            .intersect(&Ray::new(Vec3::new(-5.0, c, 0.9 * c), Vec3::X), Interval::new(0.0, 20.0))
            .unwrap();

        let small = TangleCube::new(Vec3::ZERO, 1.5 * scale, Arc::new(Material::default())).unwrap();
        let ray = Ray::new(Vec3::new(-5.0, c, 0.9 * c) * scale, Vec3::X);
        let hit = small.intersect(&ray, Interval::new(0.0, 1.0)).unwrap();
        assert!((hit.t - reference.t * scale).abs() < 1e-8);
        assert!((hit.normal - reference.normal).length() < 1e-6);
    }

    #[test]
    fn test_translate() {
        let c = 2.5f64.sqrt();
        let mut cube = cube();
        cube.translate(Vec3::new(0.0, 0.0, 7.0));
        let ray = Ray::new(Vec3::new(-5.0, c, c + 7.0), Vec3::X);
        assert!(cube.intersect(&ray, Interval::new(0.0, 20.0)).is_some());
    }
}
