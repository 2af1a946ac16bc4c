//! Klein bottle shell, ray marched against a distance estimate.
//!
//! Two immersions are available. The classic one is a pair of half shells
//! swept around the local Z axis; the figure-8 one is a tube whose cross
//! section twists once per turn. Either is thickened by `thickness`.

use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Orientation, Ray, Vec3, Vec3Ext};

use crate::hittable::{gradient_normal, sphere_span, spherical_uv, SurfaceHit};
use crate::primitive::{positive, GeometryResult, Shape};

const MAX_STEPS: usize = 256;
const HIT_DISTANCE: f64 = 1e-3;
const MIN_STEP: f64 = 1e-4;

// Classic immersion
const GRID: usize = 16;
const REFINE_STEPS: usize = 6;
const SWEEP: f64 = 0.8;
const LOBE: f64 = 0.3;

// Figure-8 immersion
const RING: f64 = 1.0;
const TUBE: f64 = 0.2;
const WOBBLE: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct KleinBottle {
    center: Vec3,
    scale: f64,
    thickness: f64,
    figure8: bool,
    orientation: Orientation,
    material: Arc<Material>,
}

impl KleinBottle {
    pub fn new(
        center: Vec3,
        scale: f64,
        thickness: f64,
        figure8: bool,
        material: Arc<Material>,
    ) -> GeometryResult<Self> {
        Ok(Self {
            center,
            scale: positive("scale", scale)?,
            thickness: positive("thickness", thickness)?,
            figure8,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn is_figure8(&self) -> bool {
        self.figure8
    }

    /// Signed distance estimate for a point relative to the local center.
    pub fn distance_estimate(&self, rel: Vec3) -> f64 {
        let q = rel / self.scale;
        let surface = if self.figure8 {
            figure8_distance(q)
        } else {
            classic_distance(q)
        };
        surface * self.scale - self.thickness
    }

    fn bound(&self) -> f64 {
        2.0 * self.scale + self.thickness
    }
}

/// Point and partial derivatives of the classic immersion at (u, v).
fn classic_patch(u: f64, v: f64) -> (Vec3, Vec3, Vec3) {
    let (lobe, sign) = if u < PI { (1.0 + LOBE, 1.0) } else { (1.0 - LOBE, -1.0) };
    let (su, cu) = u.sin_cos();
    let (sv, cv) = v.sin_cos();
    let ring = 1.0 + lobe * cv;

    let point = Vec3::new(SWEEP * cu * ring, SWEEP * su * ring, sign * LOBE * sv);
    let du = Vec3::new(-SWEEP * su * ring, SWEEP * cu * ring, 0.0);
    let dv = Vec3::new(-SWEEP * lobe * cu * sv, -SWEEP * lobe * su * sv, sign * LOBE * cv);
    (point, du, dv)
}

/// Distance to the classic surface: nearest grid sample, then Gauss-Newton
/// on (u, v) within that sample's half shell.
fn classic_distance(q: Vec3) -> f64 {
    let mut best = (f64::MAX, 0.0, 0.0);
    for i in 0..GRID {
        let u = TAU * i as f64 / GRID as f64;
        for j in 0..GRID {
            let v = TAU * j as f64 / GRID as f64;
            let d2 = (q - classic_patch(u, v).0).length_squared();
            if d2 < best.0 {
                best = (d2, u, v);
            }
        }
    }

    let (mut d2, mut u, mut v) = best;
    let (lo, hi) = if u < PI { (0.0, PI - 1e-9) } else { (PI, TAU) };
    for _ in 0..REFINE_STEPS {
        let (point, du, dv) = classic_patch(u, v);
        let r = q - point;
        let (a11, a12, a22) = (du.dot(du), du.dot(dv), dv.dot(dv));
        let det = a11 * a22 - a12 * a12;
        if det.abs() < 1e-12 {
            break;
        }
        let (b1, b2) = (du.dot(r), dv.dot(r));
        let step_u = ((a22 * b1 - a12 * b2) / det).clamp(-0.5, 0.5);
        let step_v = ((a11 * b2 - a12 * b1) / det).clamp(-0.5, 0.5);

        let next_u = (u + step_u).clamp(lo, hi);
        let next_v = v + step_v;
        let next_d2 = (q - classic_patch(next_u, next_v).0).length_squared();
        if next_d2 >= d2 {
            break;
        }
        (d2, u, v) = (next_d2, next_u, next_v);
    }
    d2.sqrt()
}

fn figure8_distance(q: Vec3) -> f64 {
    let rho = q.x.hypot(q.y);
    let phi = q.y.atan2(q.x);
    let u = phi / 2.0;
    let v = q.z.atan2(rho - RING);

    let spread = (v.cos() + 1.0) / 2.0;
    let core = Vec3::new(
        RING * u.cos() * spread,
        RING * u.sin() * spread,
        RING * v.sin() / 2.0,
    );
    (q - core).length() - TUBE - WOBBLE * (2.0 * phi).sin() * v.sin()
}

impl Shape for KleinBottle {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let center = self.center;
        let (mut t, t_end) = sphere_span(&local_ray, center, self.bound(), ray_t)?;
        let dir_len = local_ray.direction.length();

        for _ in 0..MAX_STEPS {
            if t >= t_end {
                return None;
            }
            let rel = local_ray.at(t) - center;
            let distance = self.distance_estimate(rel);

            if distance < HIT_DISTANCE {
                if !ray_t.surrounds(t) {
                    return None;
                }
                let local_normal = gradient_normal(rel, 1e-4 * self.scale, rel, |p| self.distance_estimate(p));
                let normal = self.orientation.to_world(local_normal).normalized();
                let uv = spherical_uv(rel.normalized());
                return Some(SurfaceHit::new(t, ray.at(t), normal, uv));
            }

            t += distance.max(MIN_STEP) / dir_len;
        }
        None
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
