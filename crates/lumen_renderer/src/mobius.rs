//! Möbius strip.
//!
//! The strip is the surface
//! `((R + s·cos(θ/2))·cosθ, (R + s·cos(θ/2))·sinθ, s·sin(θ/2))` for
//! `θ ∈ [0, 2π)`, `s ∈ [-w, w]`, lying around the local Z axis. A grid of
//! surface samples seeds Newton iterations on `origin + t·dir = P(θ, s)`.

use std::f64::consts::TAU;
use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, DMat3, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{clamp_uv, sphere_span, SurfaceHit};
use crate::primitive::{positive, GeometryResult, Shape};

const THETA_SAMPLES: usize = 100;
const WIDTH_SAMPLES: usize = 10;
const NEWTON_STEPS: usize = 10;

#[derive(Debug, Clone)]
pub struct MobiusStrip {
    center: Vec3,
    radius: f64,
    half_width: f64,
    thickness: f64,
    orientation: Orientation,
    material: Arc<Material>,
}

impl MobiusStrip {
    pub fn new(
        center: Vec3,
        radius: f64,
        half_width: f64,
        thickness: f64,
        material: Arc<Material>,
    ) -> GeometryResult<Self> {
        Ok(Self {
            center,
            radius: positive("radius", radius)?,
            half_width: positive("half width", half_width)?,
            thickness: positive("thickness", thickness)?,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    fn point(&self, theta: f64, s: f64) -> Vec3 {
        let ring = self.radius + s * (theta / 2.0).cos();
        Vec3::new(ring * theta.cos(), ring * theta.sin(), s * (theta / 2.0).sin())
    }

    /// Partial derivatives with respect to θ and s.
    fn tangents(&self, theta: f64, s: f64) -> (Vec3, Vec3) {
        let (half_sin, half_cos) = (theta / 2.0).sin_cos();
        let (sin, cos) = theta.sin_cos();
        let ring = self.radius + s * half_cos;

        let d_theta = Vec3::new(
            -ring * sin - 0.5 * s * half_sin * cos,
            ring * cos - 0.5 * s * half_sin * sin,
            0.5 * s * half_cos,
        );
        let d_s = Vec3::new(half_cos * cos, half_cos * sin, half_sin);
        (d_theta, d_s)
    }

    /// Newton refinement of a seed; returns (t, θ, s) on the surface.
    fn refine(&self, ray: &Ray, mut t: f64, mut theta: f64, mut s: f64) -> Option<(f64, f64, f64)> {
        let tolerance = 1e-10 * (self.radius + self.half_width);

        for _ in 0..NEWTON_STEPS {
            let residual = ray.at(t) - self.point(theta, s);
            if residual.length() < tolerance {
                return Some((t, theta, s));
            }

            let (d_theta, d_s) = self.tangents(theta, s);
            let jacobian = DMat3::from_cols(ray.direction, -d_theta, -d_s);
            if jacobian.determinant().abs() < 1e-12 {
                return None;
            }
            let delta = jacobian.inverse() * -residual;
            t += delta.x;
            theta += delta.y;
            s += delta.z;
        }

        let residual = ray.at(t) - self.point(theta, s);
        (residual.length() < tolerance * 1e3).then_some((t, theta, s))
    }
}

/// Bring θ into [0, 2π), flipping s when crossing the seam.
fn canonical(theta: f64, s: f64) -> (f64, f64) {
    let theta = theta.rem_euclid(2.0 * TAU);
    if theta >= TAU {
        (theta - TAU, -s)
    } else {
        (theta, s)
    }
}

impl Shape for MobiusStrip {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let world_ray = self.orientation.to_local_ray(ray);
        let center = self.center;
        // Work relative to the strip center
        let local_ray = Ray::new(world_ray.origin - center, world_ray.direction);

        let bound = self.radius + self.half_width + self.thickness / 2.0;
        let (start, end) = sphere_span(&local_ray, Vec3::ZERO, bound, ray_t)?;

        let dir_len2 = local_ray.direction.length_squared();
        let spacing = (TAU * (self.radius + self.half_width) / THETA_SAMPLES as f64)
            .max(2.0 * self.half_width / (WIDTH_SAMPLES - 1) as f64);
        let capture2 = spacing.max(self.thickness / 2.0).powi(2);

        let mut best: Option<(f64, f64, f64)> = None;
        for i in 0..THETA_SAMPLES {
            let theta = TAU * i as f64 / THETA_SAMPLES as f64;
            for j in 0..WIDTH_SAMPLES {
                let s = -self.half_width + 2.0 * self.half_width * j as f64 / (WIDTH_SAMPLES - 1) as f64;
                let sample = self.point(theta, s);

                let to_sample = sample - local_ray.origin;
                let t_seed = to_sample.dot(local_ray.direction) / dir_len2;
                if (local_ray.at(t_seed) - sample).length_squared() > capture2 {
                    continue;
                }

                let Some((t, theta, s)) = self.refine(&local_ray, t_seed, theta, s) else {
                    continue;
                };
                if s.abs() > self.half_width || t < start - bound || t > end + bound {
                    continue;
                }
                if best.map_or(true, |(best_t, _, _)| t < best_t) {
                    best = Some((t, theta, s));
                }
            }
        }

        let (t_mid, theta, s) = best?;
        let (theta, s) = canonical(theta, s);
        let (d_theta, d_s) = self.tangents(theta, s);
        // One-sided surface: the normal always faces the ray
        let mut local_normal = d_theta.cross(d_s).normalized();

        // Step back from the mid-surface to the face the ray meets first
        let dir = local_ray.direction / dir_len2.sqrt();
        let cos = local_normal.dot(dir);
        if cos > 0.0 {
            local_normal = -local_normal;
        }
        let offset = (self.thickness / 2.0) / cos.abs().max(0.1);
        let t = t_mid - offset / dir_len2.sqrt();
        if !ray_t.surrounds(t) {
            return None;
        }

        let uv = clamp_uv(theta / TAU, (s + self.half_width) / (2.0 * self.half_width));
        let normal = self.orientation.to_world(local_normal).normalized();
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
