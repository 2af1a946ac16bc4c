//! Ray-marched fractals.
//!
//! Every family is a distance estimator evaluated relative to the fractal's
//! center, marched with an adaptive step inside a bounding sphere.

use std::sync::Arc;

use glam::DVec4;
use lumen_core::Material;
use lumen_math::{Axis, Interval, Orientation, Ray, Vec2, Vec3, Vec3Ext};

use crate::hittable::{gradient_normal, sphere_span, spherical_uv, SurfaceHit};
use crate::primitive::{positive, GeometryError, GeometryResult, Shape};

const MAX_STEPS: usize = 300;
const MIN_STEP: f64 = 1e-4;
const BASE_STEP_FACTOR: f64 = 0.5;

/// Which distance estimator a [`Fractal`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FractalKind {
    /// Mandelbrot set in the XY plane, extruded into a thin slab along Z
    Mandelbrot,
    /// Julia set for `constant.xy`, extruded like [`FractalKind::Mandelbrot`]
    Julia,
    Mandelbulb,
    Mandelbox,
    Menger,
    Sierpinski,
    /// Julia set over quaternions; `constant` is (real, i, j, k)
    QuaternionJulia,
}

impl FractalKind {
    pub const ALL: [FractalKind; 7] = [
        FractalKind::Mandelbrot,
        FractalKind::Julia,
        FractalKind::Mandelbulb,
        FractalKind::Mandelbox,
        FractalKind::Menger,
        FractalKind::Sierpinski,
        FractalKind::QuaternionJulia,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FractalKind::Mandelbrot => "mandelbrot",
            FractalKind::Julia => "julia",
            FractalKind::Mandelbulb => "mandelbulb",
            FractalKind::Mandelbox => "mandelbox",
            FractalKind::Menger => "menger",
            FractalKind::Sierpinski => "sierpinski",
            FractalKind::QuaternionJulia => "quaternion_julia",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Default (iterations, bailout, power, constant).
    fn defaults(&self) -> (u32, f64, f64, DVec4) {
        match self {
            FractalKind::Mandelbrot => (50, 4.0, 2.0, DVec4::ZERO),
            FractalKind::Julia => (50, 4.0, 2.0, DVec4::new(-0.8, 0.156, 0.0, 0.0)),
            FractalKind::Mandelbulb => (10, 2.0, 8.0, DVec4::ZERO),
            FractalKind::Mandelbox => (15, 100.0, 2.0, DVec4::ZERO),
            FractalKind::Menger => (5, 0.0, 3.0, DVec4::ZERO),
            FractalKind::Sierpinski => (10, 0.0, 2.0, DVec4::ZERO),
            FractalKind::QuaternionJulia => (12, 4.0, 2.0, DVec4::new(-0.2, 0.6, 0.2, 0.0)),
        }
    }
}

/// A fractal of the given kind, enclosed by a sphere of `radius` about
/// `center`.
#[derive(Debug, Clone)]
pub struct Fractal {
    kind: FractalKind,
    center: Vec3,
    radius: f64,
    iterations: u32,
    bailout: f64,
    /// Exponent for the escape-time families, scale for the folding ones
    power: f64,
    constant: DVec4,
    orientation: Orientation,
    material: Arc<Material>,
}

impl Fractal {
    pub fn new(kind: FractalKind, center: Vec3, radius: f64, material: Arc<Material>) -> GeometryResult<Self> {
        let (iterations, bailout, power, constant) = kind.defaults();
        Ok(Self {
            kind,
            center,
            radius: positive("bounding radius", radius)?,
            iterations,
            bailout,
            power,
            constant,
            orientation: Orientation::default(),
            material,
        })
    }

    pub fn with_iterations(mut self, iterations: u32) -> GeometryResult<Self> {
        if iterations == 0 {
            return Err(GeometryError::NonPositive {
                name: "iterations",
                value: 0.0,
            });
        }
        self.iterations = iterations;
        Ok(self)
    }

    pub fn with_bailout(mut self, bailout: f64) -> GeometryResult<Self> {
        self.bailout = positive("bailout", bailout)?;
        Ok(self)
    }

    pub fn with_power(mut self, power: f64) -> GeometryResult<Self> {
        self.power = positive("power", power)?;
        Ok(self)
    }

    /// Julia constant; the complex families read only x and y.
    pub fn with_constant(mut self, constant: DVec4) -> Self {
        self.constant = constant;
        self
    }

    pub fn kind(&self) -> FractalKind {
        self.kind
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Estimated distance from a point given relative to the center.
    pub fn distance_estimate(&self, p: Vec3) -> f64 {
        match self.kind {
            FractalKind::Mandelbrot => {
                let c = Vec2::new(p.x, p.y);
                let planar = escape_time_2d(Vec2::ZERO, c, self.iterations, self.bailout, self.power, true);
                planar.max(p.z.abs() - SLAB_HALF_THICKNESS).max(1e-5)
            }
            FractalKind::Julia => {
                let c = Vec2::new(self.constant.x, self.constant.y);
                let z0 = Vec2::new(p.x, p.y);
                let planar = escape_time_2d(z0, c, self.iterations, self.bailout, self.power, false);
                planar.max(p.z.abs() - SLAB_HALF_THICKNESS).max(5e-4)
            }
            FractalKind::Mandelbulb => mandelbulb(p, self.iterations, self.bailout, self.power),
            FractalKind::Mandelbox => mandelbox(p, self.iterations, self.bailout, self.power),
            FractalKind::Menger => menger(p, self.iterations.min(6)),
            FractalKind::Sierpinski => sierpinski(p, self.iterations.min(10), self.power),
            FractalKind::QuaternionJulia => {
                quaternion_julia(p, self.constant, self.iterations, self.bailout, self.power)
            }
        }
    }
}

/// Half thickness of the slab the planar sets are extruded into.
const SLAB_HALF_THICKNESS: f64 = 0.1;

/// Complex power in polar form.
fn complex_pow(z: Vec2, n: f64) -> Vec2 {
    let r = z.length();
    if r < 1e-300 {
        return Vec2::ZERO;
    }
    let theta = z.y.atan2(z.x) * n;
    let rn = r.powf(n);
    Vec2::new(rn * theta.cos(), rn * theta.sin())
}

fn complex_mul(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x * b.x - a.y * b.y, a.x * b.y + a.y * b.x)
}

/// Escape-time distance to a planar Mandelbrot (`mandelbrot`) or Julia set.
///
/// Mandelbrot starts at `z = 0` with `c` the point; Julia starts at the
/// point with a fixed `c`.
fn escape_time_2d(z0: Vec2, c: Vec2, iterations: u32, bailout: f64, power: f64, mandelbrot: bool) -> f64 {
    let mut z = z0;
    let mut dz = Vec2::new(1.0, 0.0);

    for i in 0..iterations {
        dz = complex_mul(complex_pow(z, power - 1.0) * power, dz);
        if mandelbrot {
            dz.x += 1.0;
        }
        z = complex_pow(z, power) + c;

        let r = z.length();
        if r > bailout {
            let dr = dz.length().max(1e-10);
            let smooth = 0.2 + 0.8 * f64::from(i) / f64::from(iterations);
            return 0.5 * r.ln() * r / dr * smooth;
        }
    }
    // Bounded orbit: treat as inside
    0.0
}

fn mandelbulb(p: Vec3, iterations: u32, bailout: f64, power: f64) -> f64 {
    let mut z = p;
    let mut dr = 1.0;
    let mut r = z.length();

    for _ in 0..iterations {
        r = z.length();
        if r > bailout {
            break;
        }
        if r < 1e-12 {
            return 0.0;
        }

        let theta = (z.z / r).clamp(-1.0, 1.0).acos() * power;
        let phi = z.y.atan2(z.x) * power;
        dr = r.powf(power - 1.0) * power * dr + 1.0;

        let zr = r.powf(power);
        z = Vec3::new(theta.sin() * phi.cos(), phi.sin() * theta.sin(), theta.cos()) * zr + p;
    }

    if r < 1e-12 {
        return 0.0;
    }
    0.5 * r.ln() * r / dr
}

fn mandelbox(p: Vec3, iterations: u32, bailout: f64, scale: f64) -> f64 {
    const FOLDING_LIMIT: f64 = 1.0;
    const MIN_RADIUS2: f64 = 0.25;
    const FIXED_RADIUS2: f64 = 1.0;

    let mut z = p;
    let mut dr = 1.0;
    for _ in 0..iterations {
        // Box fold
        z = z.clamp(Vec3::splat(-FOLDING_LIMIT), Vec3::splat(FOLDING_LIMIT)) * 2.0 - z;

        // Sphere fold
        let r2 = z.length_squared();
        if r2 < MIN_RADIUS2 {
            let factor = FIXED_RADIUS2 / MIN_RADIUS2;
            z *= factor;
            dr *= factor;
        } else if r2 < FIXED_RADIUS2 {
            let factor = FIXED_RADIUS2 / r2;
            z *= factor;
            dr *= factor;
        }

        z = z * scale + p;
        dr = dr * scale.abs() + 1.0;

        if z.length() > bailout {
            break;
        }
    }
    z.length() / dr.abs()
}

fn box_distance(p: Vec3, half: Vec3) -> f64 {
    let q = p.abs() - half;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
}

fn menger(p: Vec3, iterations: u32) -> f64 {
    let mut d = box_distance(p, Vec3::ONE);
    let mut s = 1.0;

    for _ in 0..iterations {
        let a = (p * s).rem_euclid(Vec3::splat(2.0)) - Vec3::ONE;
        s *= 3.0;
        let r = (Vec3::ONE - a.abs() * 3.0).abs();

        let da = r.x.max(r.y);
        let db = r.y.max(r.z);
        let dc = r.z.max(r.x);
        let cross = (da.min(db).min(dc) - 1.0) / s;
        d = d.max(cross);
    }
    d
}

fn sierpinski(p: Vec3, iterations: u32, scale: f64) -> f64 {
    const OFFSET: f64 = 1.0;

    let mut z = p;
    for _ in 0..iterations {
        if z.x + z.y < 0.0 {
            (z.x, z.y) = (-z.y, -z.x);
        }
        if z.x + z.z < 0.0 {
            (z.x, z.z) = (-z.z, -z.x);
        }
        if z.y + z.z < 0.0 {
            (z.y, z.z) = (-z.z, -z.y);
        }
        z = z * scale - Vec3::splat(OFFSET * (scale - 1.0));
    }
    z.length() * scale.powi(-(iterations as i32))
}

/// Quaternion power in polar form; `q` is (real, i, j, k).
fn quaternion_pow(q: DVec4, n: f64) -> DVec4 {
    let r = q.length();
    if r < 1e-12 {
        return DVec4::ZERO;
    }
    let imaginary = Vec3::new(q.y, q.z, q.w);
    let im_len = imaginary.length();
    let theta = im_len.atan2(q.x) * n;
    let rn = r.powf(n);
    let axis = if im_len < 1e-12 { Vec3::ZERO } else { imaginary / im_len };
    let im = axis * (rn * theta.sin());
    DVec4::new(rn * theta.cos(), im.x, im.y, im.z)
}

fn quaternion_julia(p: Vec3, c: DVec4, iterations: u32, bailout: f64, power: f64) -> f64 {
    let mut q = DVec4::new(p.x, p.y, p.z, 0.0);
    let mut dr = 1.0;
    let mut r = q.length();

    for _ in 0..iterations {
        dr *= power * r.powf(power - 1.0);
        q = quaternion_pow(q, power) + c;
        r = q.length();
        if r > bailout {
            break;
        }
    }

    if r <= 1.0 || dr < 1e-300 {
        return 0.0;
    }
    0.5 * r * r.ln() / dr
}

impl Shape for Fractal {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let local_ray = self.orientation.to_local_ray(ray);
        let center = self.center;
        let (mut t, t_end) = sphere_span(&local_ray, center, self.radius, ray_t)?;

        let dir_len = local_ray.direction.length();
        let epsilon = 0.001 * (self.radius / 10.0);
        let mut last_distance = f64::MAX;
        let mut steps_since_reduction = 0;

        for _ in 0..MAX_STEPS {
            if t >= t_end {
                return None;
            }
            let distance = self.distance_estimate(local_ray.at(t) - center).max(1e-10);

            let mut factor = BASE_STEP_FACTOR;
            if steps_since_reduction > 5 {
                factor = (factor * 1.1).min(0.8);
            }
            if distance < epsilon * 5.0 {
                factor = 0.1;
                steps_since_reduction = 0;
            }

            if distance < epsilon && ray_t.surrounds(t) {
                let rel = local_ray.at(t) - center;
                let local_normal = gradient_normal(rel, 1e-4 * self.radius, rel, |p| self.distance_estimate(p));
                let normal = self.orientation.to_world(local_normal).normalized();
                let uv = spherical_uv(rel.normalized());
                return Some(SurfaceHit::new(t, ray.at(t), normal, uv));
            }

            if distance < last_distance {
                steps_since_reduction += 1;
            } else {
                factor *= 0.5;
                steps_since_reduction = 0;
            }
            last_distance = distance;

            t += (distance * factor).max(MIN_STEP) / dir_len;
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
