//! Capped and infinite cylinders.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{
    clamp_uv, disc_t, disc_uv, perpendicular_frame, solve_quadratic, turn_fraction, wrap_uv,
    Nearest, SurfaceHit,
};
use crate::primitive::{positive, unit_axis, GeometryResult, Shape};

/// Roots of the infinite cylinder of `radius` around the line `center + s*axis`.
fn lateral_roots(ray: &Ray, center: Vec3, axis: Vec3, radius: f64) -> Option<(f64, f64)> {
    let oc = ray.origin - center;
    let d_axis = ray.direction.dot(axis);
    let oc_axis = oc.dot(axis);

    let a = ray.direction.dot(ray.direction) - d_axis * d_axis;
    let b = 2.0 * (oc.dot(ray.direction) - oc_axis * d_axis);
    let c = oc.dot(oc) - oc_axis * oc_axis - radius * radius;
    solve_quadratic(a, b, c)
}

/// Cylinder standing on the disc at `base`, extending `height` along `axis`,
/// closed at both ends.
#[derive(Debug, Clone)]
pub struct Cylinder {
    base: Vec3,
    axis: Vec3,
    radius: f64,
    height: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl Cylinder {
    pub fn new(
        base: Vec3,
        axis: Vec3,
        radius: f64,
        height: f64,
        material: Arc<Material>,
    ) -> GeometryResult<Self> {
        Ok(Self {
            base,
            axis: unit_axis(axis)?,
            radius: positive("radius", radius)?,
            height: positive("height", height)?,
            orientation: Orientation::default(),
            material,
        })
    }

    /// Current axis direction in world space.
    pub fn world_axis(&self) -> Vec3 {
        self.orientation.to_world(self.axis)
    }
}

impl Shape for Cylinder {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let base = self.base;
        let axis = self.axis;
        let mut nearest = Nearest::new(ray_t);

        if let Some((t0, t1)) = lateral_roots(&local_ray, base, axis, self.radius) {
            let (tangent, bitangent) = perpendicular_frame(axis);
            for t in [t0, t1] {
                let rel = local_ray.at(t) - base;
                let h = rel.dot(axis);
                if !(0.0..=self.height).contains(&h) {
                    continue;
                }
                let radial = rel - axis * h;
                let uv = clamp_uv(turn_fraction(radial, tangent, bitangent), h / self.height);
                nearest.offer(t, radial / self.radius, uv);
            }
        }

        let top = base + axis * self.height;
        for (center, normal) in [(base, -axis), (top, axis)] {
            if let Some(t) = disc_t(&local_ray, center, normal, self.radius) {
                let uv = disc_uv(local_ray.at(t), center, axis, self.radius);
                nearest.offer(t, normal, uv);
            }
        }

        let (t, local_normal, uv) = nearest.best()?;
        let normal = self.orientation.to_world(local_normal).normalized();
        Some(SurfaceHit::new(t, ray.at(t), normal, uv))
    }

    fn translate(&mut self, offset: Vec3) {
        self.base += offset;
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        self.base = self.base.rotated(axis, degrees);
        self.orientation.rotate(axis, degrees);
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

/// Cylinder of `radius` around the infinite line through `center` along `axis`.
#[derive(Debug, Clone)]
pub struct InfiniteCylinder {
    center: Vec3,
    axis: Vec3,
    radius: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl InfiniteCylinder {
    pub fn new(center: Vec3, axis: Vec3, radius: f64, material: Arc<Material>) -> GeometryResult<Self> {
        Ok(Self {
            center,
            axis: unit_axis(axis)?,
            radius: positive("radius", radius)?,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn world_axis(&self) -> Vec3 {
        self.orientation.to_world(self.axis)
    }
}

impl Shape for InfiniteCylinder {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let center = self.center;

        let (t0, t1) = lateral_roots(&local_ray, center, self.axis, self.radius)?;
        let t = if ray_t.surrounds(t0) {
            t0
        } else if ray_t.surrounds(t1) {
            t1
        } else {
            return None;
        };

        let rel = local_ray.at(t) - center;
        let h = rel.dot(self.axis);
        let radial = rel - self.axis * h;
        let (tangent, bitangent) = perpendicular_frame(self.axis);
        let uv = wrap_uv(turn_fraction(radial, tangent, bitangent), h.abs());

        let normal = self.orientation.to_world(radial / self.radius).normalized();
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
