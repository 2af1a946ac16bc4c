//! Infinite plane primitive.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Ray, Vec3, Vec3Ext};

use crate::hittable::{perpendicular_frame, wrap_uv, SurfaceHit};
use crate::primitive::{unit_axis, GeometryResult, Shape};

/// Plane through `position` with unit `normal`. UV tiles once per world unit.
#[derive(Debug, Clone)]
pub struct Plane {
    position: Vec3,
    normal: Vec3,
    material: Arc<Material>,
}

impl Plane {
    pub fn new(position: Vec3, normal: Vec3, material: Arc<Material>) -> GeometryResult<Self> {
        Ok(Self {
            position,
            normal: unit_axis(normal)?,
            material,
        })
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl Shape for Plane {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < 1e-8 {
            return None;
        }

        let t = (self.position - ray.origin).dot(self.normal) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let point = ray.at(t);
        let (tangent, bitangent) = perpendicular_frame(self.normal);
        let local = point - self.position;
        let uv = wrap_uv(local.dot(tangent), local.dot(bitangent));
        Some(SurfaceHit::new(t, point, self.normal, uv))
    }

    fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        self.position = self.position.rotated(axis, degrees);
        self.normal = self.normal.rotated(axis, degrees).normalized();
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}
