//! Finite (capped) and infinite double cones.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{
    clamp_uv, disc_t, disc_uv, perpendicular_frame, solve_quadratic, turn_fraction, wrap_uv,
    Nearest, SurfaceHit,
};
use crate::primitive::{positive, unit_axis, GeometryError, GeometryResult, Shape};

/// Roots of the double cone `(cp·axis)² = cos²·|cp|²` with `cp = p - apex`.
fn cone_roots(ray: &Ray, apex: Vec3, axis: Vec3, cos2: f64) -> Option<(f64, f64)> {
    let co = ray.origin - apex;
    let d_axis = ray.direction.dot(axis);
    let co_axis = co.dot(axis);

    let a = d_axis * d_axis - cos2 * ray.direction.dot(ray.direction);
    let b = 2.0 * (d_axis * co_axis - cos2 * co.dot(ray.direction));
    let c = co_axis * co_axis - cos2 * co.dot(co);
    solve_quadratic(a, b, c)
}

/// Outward normal of the cone surface at offset `cp` from the apex.
fn cone_normal(cp: Vec3, axis: Vec3, cos2: f64) -> Vec3 {
    let n = cp * cos2 - axis * cp.dot(axis);
    if n.length_squared() < 1e-24 {
        return -axis;
    }
    n.normalize()
}

/// Cone with its tip at `apex`, opening along `axis` to a base disc of
/// `radius` at distance `height`.
#[derive(Debug, Clone)]
pub struct Cone {
    apex: Vec3,
    axis: Vec3,
    radius: f64,
    height: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl Cone {
    pub fn new(
        apex: Vec3,
        axis: Vec3,
        radius: f64,
        height: f64,
        material: Arc<Material>,
    ) -> GeometryResult<Self> {
        Ok(Self {
            apex,
            axis: unit_axis(axis)?,
            radius: positive("radius", radius)?,
            height: positive("height", height)?,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn world_axis(&self) -> Vec3 {
        self.orientation.to_world(self.axis)
    }

    fn cos2(&self) -> f64 {
        let h2 = self.height * self.height;
        h2 / (h2 + self.radius * self.radius)
    }
}

impl Shape for Cone {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let apex = self.apex;
        let axis = self.axis;
        let cos2 = self.cos2();
        let mut nearest = Nearest::new(ray_t);

        if let Some((t0, t1)) = cone_roots(&local_ray, apex, axis, cos2) {
            let (tangent, bitangent) = perpendicular_frame(axis);
            for t in [t0, t1] {
                let cp = local_ray.at(t) - apex;
                let h = cp.dot(axis);
                // The far nappe solves the same quadratic
                if !(0.0..=self.height).contains(&h) {
                    continue;
                }
                let u = turn_fraction(cp - axis * h, tangent, bitangent);
                nearest.offer(t, cone_normal(cp, axis, cos2), clamp_uv(u, h / self.height));
            }
        }

        let base = apex + axis * self.height;
        if let Some(t) = disc_t(&local_ray, base, axis, self.radius) {
            let uv = disc_uv(local_ray.at(t), base, axis, self.radius);
            nearest.offer(t, axis, uv);
        }

        let (t, local_normal, uv) = nearest.best()?;
        let normal = self.orientation.to_world(local_normal).normalized();
        Some(SurfaceHit::new(t, ray.at(t), normal, uv))
    }

    fn translate(&mut self, offset: Vec3) {
        self.apex += offset;
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        self.apex = self.apex.rotated(axis, degrees);
        self.orientation.rotate(axis, degrees);
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

/// Unbounded double cone with half-angle `angle` (degrees) around `axis`.
#[derive(Debug, Clone)]
pub struct InfiniteCone {
    apex: Vec3,
    axis: Vec3,
    angle: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl InfiniteCone {
    pub fn new(apex: Vec3, axis: Vec3, angle: f64, material: Arc<Material>) -> GeometryResult<Self> {
        if !(angle > 0.0 && angle < 90.0) {
            return Err(GeometryError::ConeAngle(angle));
        }
        Ok(Self {
            apex,
            axis: unit_axis(axis)?,
            angle,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn world_axis(&self) -> Vec3 {
        self.orientation.to_world(self.axis)
    }
}

impl Shape for InfiniteCone {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let apex = self.apex;
        let cos2 = self.angle.to_radians().cos().powi(2);

        let (t0, t1) = cone_roots(&local_ray, apex, self.axis, cos2)?;
        let t = if ray_t.surrounds(t0) {
            t0
        } else if ray_t.surrounds(t1) {
            t1
        } else {
            return None;
        };

        let cp = local_ray.at(t) - apex;
        let h = cp.dot(self.axis);
        let (tangent, bitangent) = perpendicular_frame(self.axis);
        let uv = wrap_uv(turn_fraction(cp - self.axis * h, tangent, bitangent), h.abs() / 10.0);

        let local_normal = cone_normal(cp, self.axis, cos2);
        let normal = self.orientation.to_world(local_normal).normalized();
        Some(SurfaceHit::new(t, ray.at(t), normal, uv))
    }

    fn translate(&mut self, offset: Vec3) {
        self.apex += offset;
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        self.apex = self.apex.rotated(axis, degrees);
        self.orientation.rotate(axis, degrees);
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}
