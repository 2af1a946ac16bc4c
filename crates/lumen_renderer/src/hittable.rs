//! Hit records shared by every primitive.

use std::f64::consts::PI;

use lumen_core::Material;
use lumen_math::{Interval, Ray, Vec2, Vec3, Vec3Ext};

use crate::primitive::Primitive;

/// Largest UV component handed to material sampling.
const UV_MAX: f64 = 1.0 - 1e-9;

/// Raw geometric result of a shape's intersection routine.
///
/// `normal` is the outward world-space unit normal; orienting it against the
/// ray is left to [`HitInfo::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub t: f64,
    pub point: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl SurfaceHit {
    pub fn new(t: f64, point: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            t,
            point,
            normal,
            uv,
        }
    }
}

/// Record of a ray-primitive intersection, consumed by shading.
#[derive(Debug, Clone, Copy)]
pub struct HitInfo<'a> {
    /// Ray parameter of the hit
    pub distance: f64,
    pub point: Vec3,
    /// Unit normal, always pointing against the incoming ray
    pub normal: Vec3,
    pub uv: Vec2,
    /// Whether the ray hit the outside of the surface
    pub front_face: bool,
    /// The primitive whose material shades this hit
    pub primitive: &'a Primitive,
}

impl<'a> HitInfo<'a> {
    pub fn new(ray: &Ray, surface: SurfaceHit, primitive: &'a Primitive) -> Self {
        let mut hit = Self {
            distance: surface.t,
            point: surface.point,
            normal: surface.normal,
            uv: surface.uv,
            front_face: true,
            primitive,
        };
        hit.set_face_normal(ray, surface.normal);
        hit
    }

    /// Set the face normal based on ray direction and outward normal.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        // If the ray and normal point in the same direction, we're inside
        self.front_face = ray.direction.dot(outward_normal) < 0.0;

        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    /// Same hit attributed to another primitive.
    pub fn with_primitive(self, primitive: &'a Primitive) -> Self {
        Self { primitive, ..self }
    }

    pub fn material(&self) -> &'a Material {
        self.primitive.material()
    }
}

/// Tracks the closest local-frame candidate among several surface patches.
pub(crate) struct Nearest {
    ray_t: Interval,
    best: Option<(f64, Vec3, Vec2)>,
}

impl Nearest {
    pub(crate) fn new(ray_t: Interval) -> Self {
        Self { ray_t, best: None }
    }

    pub(crate) fn offer(&mut self, t: f64, normal: Vec3, uv: Vec2) {
        if !self.ray_t.surrounds(t) {
            return;
        }
        if self.best.map_or(true, |(best, _, _)| t < best) {
            self.best = Some((t, normal, uv));
        }
    }

    pub(crate) fn best(self) -> Option<(f64, Vec3, Vec2)> {
        self.best
    }
}

/// Real roots of `a t² + b t + c`, ascending.
///
/// A near-zero leading coefficient or a negative discriminant gives `None`.
pub(crate) fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if a.abs() < 1e-12 {
        return None;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();
    let t0 = (-b - sqrtd) / (2.0 * a);
    let t1 = (-b + sqrtd) / (2.0 * a);
    Some(if t0 <= t1 { (t0, t1) } else { (t1, t0) })
}

/// Part of `ray_t` spent inside the sphere at `center`, if any.
pub(crate) fn sphere_span(ray: &Ray, center: Vec3, radius: f64, ray_t: Interval) -> Option<(f64, f64)> {
    let oc = ray.origin - center;
    let d = ray.direction;
    let (enter, exit) = solve_quadratic(d.dot(d), 2.0 * oc.dot(d), oc.dot(oc) - radius * radius)?;
    let start = enter.max(ray_t.min);
    let end = exit.min(ray_t.max);
    if start >= end {
        return None;
    }
    Some((start, end))
}

/// Ray parameter where `ray` meets the disc at `center` facing `normal`.
pub(crate) fn disc_t(ray: &Ray, center: Vec3, normal: Vec3, radius: f64) -> Option<f64> {
    let denom = normal.dot(ray.direction);
    if denom.abs() < 1e-8 {
        return None;
    }
    let t = (center - ray.origin).dot(normal) / denom;
    if (ray.at(t) - center).length_squared() > radius * radius {
        return None;
    }
    Some(t)
}

/// Planar UV of a point on a disc, centered at (0.5, 0.5).
pub(crate) fn disc_uv(p: Vec3, center: Vec3, axis: Vec3, radius: f64) -> Vec2 {
    let (tangent, bitangent) = perpendicular_frame(axis);
    let local = p - center;
    clamp_uv(
        0.5 + local.dot(tangent) / (2.0 * radius),
        0.5 + local.dot(bitangent) / (2.0 * radius),
    )
}

/// Keep UV coordinates inside [0, 1).
pub(crate) fn clamp_uv(u: f64, v: f64) -> Vec2 {
    Vec2::new(u.clamp(0.0, UV_MAX), v.clamp(0.0, UV_MAX))
}

/// Wrap UV coordinates into [0, 1).
pub(crate) fn wrap_uv(u: f64, v: f64) -> Vec2 {
    clamp_uv(u.rem_euclid(1.0), v.rem_euclid(1.0))
}

/// UV of a unit direction on a sphere: u around +Y from +X, v down from +Y.
pub(crate) fn spherical_uv(dir: Vec3) -> Vec2 {
    let theta = (-dir.y).clamp(-1.0, 1.0).acos();
    let phi = (-dir.z).atan2(dir.x) + PI;
    clamp_uv(phi / (2.0 * PI), theta / PI)
}

/// Angle of `p` around an axis, as a fraction of a full turn in [0, 1).
pub(crate) fn turn_fraction(p: Vec3, tangent: Vec3, bitangent: Vec3) -> f64 {
    let angle = p.dot(bitangent).atan2(p.dot(tangent));
    (angle + PI) / (2.0 * PI)
}

/// An orthonormal pair perpendicular to unit vector `axis`.
pub(crate) fn perpendicular_frame(axis: Vec3) -> (Vec3, Vec3) {
    let helper = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = helper.cross(axis).normalized();
    let bitangent = axis.cross(tangent);
    (tangent, bitangent)
}

/// Central-difference gradient of a scalar field, normalized.
///
/// Falls back to `fallback` when the field is flat at `p`.
pub(crate) fn gradient_normal(p: Vec3, eps: f64, fallback: Vec3, field: impl Fn(Vec3) -> f64) -> Vec3 {
    let dx = Vec3::new(eps, 0.0, 0.0);
    let dy = Vec3::new(0.0, eps, 0.0);
    let dz = Vec3::new(0.0, 0.0, eps);
    let gradient = Vec3::new(
        field(p + dx) - field(p - dx),
        field(p + dy) - field(p - dy),
        field(p + dz) - field(p - dz),
    );
    if gradient.length_squared() < 1e-20 {
        return fallback.normalized();
    }
    gradient.normalize()
}
