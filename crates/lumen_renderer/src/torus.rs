//! Torus, sphere traced against its exact distance field.

use std::f64::consts::PI;
use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{perpendicular_frame, sphere_span, turn_fraction, wrap_uv, SurfaceHit};
use crate::primitive::{positive, unit_axis, GeometryResult, Shape};

const MAX_STEPS: usize = 512;

/// Torus around `axis` through `center`: a tube of radius `minor` swept
/// along a circle of radius `major`.
#[derive(Debug, Clone)]
pub struct Torus {
    center: Vec3,
    axis: Vec3,
    major: f64,
    minor: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl Torus {
    pub fn new(
        center: Vec3,
        axis: Vec3,
        major: f64,
        minor: f64,
        material: Arc<Material>,
    ) -> GeometryResult<Self> {
        Ok(Self {
            center,
            axis: unit_axis(axis)?,
            major: positive("major radius", major)?,
            minor: positive("minor radius", minor)?,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn world_axis(&self) -> Vec3 {
        self.orientation.to_world(self.axis)
    }

    /// Signed distance from a point, given relative to the local center.
    fn sdf(&self, rel: Vec3) -> f64 {
        let h = rel.dot(self.axis);
        let radial = (rel - self.axis * h).length();
        (radial - self.major).hypot(h) - self.minor
    }

    /// Closest point of the tube's core circle.
    fn core_point(&self, rel: Vec3) -> Vec3 {
        let h = rel.dot(self.axis);
        let radial = rel - self.axis * h;
        let len = radial.length();
        if len < 1e-12 {
            let (tangent, _) = perpendicular_frame(self.axis);
            return tangent * self.major;
        }
        radial * (self.major / len)
    }
}

impl Shape for Torus {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let center = self.center;
        let bound = self.major + self.minor;

        // Bounding sphere gives the only interval worth marching
        let (mut t, t_end) = sphere_span(&local_ray, center, bound, ray_t)?;

        let dir_len = local_ray.direction.length();
        let epsilon = 1e-7 * bound;
        let min_step = 1e-4 * self.minor;
        let mut found = None;

        for _ in 0..MAX_STEPS {
            let distance = self.sdf(local_ray.at(t) - center).abs();
            if distance < epsilon && ray_t.surrounds(t) {
                found = Some(t);
                break;
            }
            // Starting on the surface needs a nudge to get off it
            t += if distance < epsilon {
                min_step / dir_len
            } else {
                distance / dir_len
            };
            if t >= t_end {
                return None;
            }
        }

        let t = found?;
        let rel = local_ray.at(t) - center;
        let core = self.core_point(rel);
        let local_normal = (rel - core).normalized();

        let (tangent, bitangent) = perpendicular_frame(self.axis);
        let u = turn_fraction(core, tangent, bitangent);
        let tube = rel - core;
        let v = (tube.dot(self.axis).atan2(tube.dot(core / self.major)) + PI) / (2.0 * PI);

        let normal = self.orientation.to_world(local_normal).normalized();
        Some(SurfaceHit::new(t, ray.at(t), normal, wrap_uv(u, v)))
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
