//! Box primitive.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Aabb, Axis, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{clamp_uv, SurfaceHit};
use crate::primitive::{positive, GeometryResult, Shape};

/// A box given by its center and half extents, axis-aligned in its local frame.
#[derive(Debug, Clone)]
pub struct Cuboid {
    center: Vec3,
    half_extents: Vec3,
    orientation: Orientation,
    material: Arc<Material>,
}

impl Cuboid {
    pub fn new(center: Vec3, half_extents: Vec3, material: Arc<Material>) -> GeometryResult<Self> {
        positive("half width", half_extents.x)?;
        positive("half height", half_extents.y)?;
        positive("half depth", half_extents.z)?;
        Ok(Self {
            center,
            half_extents,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Outward normal and face UV of a point on the box surface, in box units.
fn face_normal_uv(rel: Vec3) -> (Vec3, f64, f64) {
    let abs = rel.abs();
    let to_unit = |x: f64| (x + 1.0) * 0.5;

    if abs.x >= abs.y && abs.x >= abs.z {
        (Vec3::new(rel.x.signum(), 0.0, 0.0), to_unit(rel.z), to_unit(rel.y))
    } else if abs.y >= abs.z {
        (Vec3::new(0.0, rel.y.signum(), 0.0), to_unit(rel.x), to_unit(rel.z))
    } else {
        (Vec3::new(0.0, 0.0, rel.z.signum()), to_unit(rel.x), to_unit(rel.y))
    }
}

impl Shape for Cuboid {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let local_center = self.center;
        let bounds = Aabb::from_center(local_center, self.half_extents);

        let (t_enter, t_exit) = bounds.slab(&local_ray)?;
        let t = if ray_t.surrounds(t_enter) {
            t_enter
        } else if ray_t.surrounds(t_exit) {
            t_exit
        } else {
            return None;
        };

        let rel = (local_ray.at(t) - local_center) / self.half_extents;
        let (local_normal, u, v) = face_normal_uv(rel);
        let normal = self.orientation.to_world(local_normal).normalized();
        Some(SurfaceHit::new(t, ray.at(t), normal, clamp_uv(u, v)))
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
