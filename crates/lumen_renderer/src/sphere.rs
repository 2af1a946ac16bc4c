//! Sphere primitive.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{spherical_uv, SurfaceHit};
use crate::primitive::{positive, GeometryResult, Shape};

/// A sphere. Rotation only turns its texture.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64, material: Arc<Material>) -> GeometryResult<Self> {
        Ok(Self {
            center,
            radius: positive("radius", radius)?,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Shape for Sphere {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        if a < 1e-24 {
            return None;
        }
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let point = ray.at(root);
        let normal = ((point - self.center) / self.radius).normalized();
        let uv = spherical_uv(self.orientation.to_local(normal));
        Some(SurfaceHit::new(root, point, normal, uv))
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

    fn unit_sphere() -> Sphere {
        Sphere::new(Vec3::ZERO, 1.0, Arc::new(Material::default())).unwrap()
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        let hit = sphere.intersect(&ray, Interval::new(0.0, 10.0)).unwrap();

        assert!((hit.t - 4.0).abs() < 1e-9);
        assert!((hit.point - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-9);
        assert!((hit.normal - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_sphere();
        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::NEG_X);
        assert!(sphere.intersect(&ray, Interval::new(0.0, 10.0)).is_none());
    }

    #[test]
    fn test_sphere_from_inside_takes_far_root() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        let hit = sphere.intersect(&ray, Interval::new(1e-3, f64::INFINITY)).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-9);
        assert!((hit.normal - Vec3::Y).length() < 1e-9);
    }

    #[test]
    fn test_sphere_respects_range() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(sphere.intersect(&ray, Interval::new(0.0, 3.5)).is_none());
    }

    #[test]
    fn test_non_unit_direction_scales_t() {
        let sphere = unit_sphere();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let hit = sphere.intersect(&ray, Interval::new(0.0, 10.0)).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        assert!(Sphere::new(Vec3::ZERO, -1.0, Arc::new(Material::default())).is_err());
        assert!(Sphere::new(Vec3::ZERO, 0.0, Arc::new(Material::default())).is_err());
    }

    #[test]
    fn test_rotation_moves_center_about_origin() {
        let mut sphere = Sphere::new(Vec3::X, 0.5, Arc::new(Material::default())).unwrap();
        sphere.rotate(Axis::Z, 90.0);
        assert!((sphere.center() - Vec3::Y).length() < 1e-9);
    }
}
