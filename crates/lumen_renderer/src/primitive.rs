//! The primitive sum type and the contract every shape implements.

use std::fmt;
use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Ray, Vec3};
use thiserror::Error;

use crate::composite::{Composite, Decorated};
use crate::cone::{Cone, InfiniteCone};
use crate::cuboid::Cuboid;
use crate::cylinder::{Cylinder, InfiniteCylinder};
use crate::fractal::Fractal;
use crate::hittable::{HitInfo, SurfaceHit};
use crate::klein_bottle::KleinBottle;
use crate::mobius::MobiusStrip;
use crate::plane::Plane;
use crate::sphere::Sphere;
use crate::tangle_cube::TangleCube;
use crate::torus::Torus;
use crate::triangle::Triangle;

/// Invalid shape parameters, reported while the scene is built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("axis must have non-zero length")]
    ZeroAxis,

    #[error("cone half-angle must be in (0, 90) degrees, got {0}")]
    ConeAngle(f64),

    #[error("triangle vertices are collinear")]
    DegenerateTriangle,

    #[error("composite primitive has no children")]
    EmptyComposite,
}

pub type GeometryResult<T> = Result<T, GeometryError>;

pub(crate) fn positive(name: &'static str, value: f64) -> GeometryResult<f64> {
    if !value.is_finite() {
        return Err(GeometryError::NonFinite { name, value });
    }
    if value <= 0.0 {
        return Err(GeometryError::NonPositive { name, value });
    }
    Ok(value)
}

pub(crate) fn unit_axis(axis: Vec3) -> GeometryResult<Vec3> {
    let len = axis.length();
    if !len.is_finite() || len < 1e-12 {
        return Err(GeometryError::ZeroAxis);
    }
    Ok(axis / len)
}

/// Behavior shared by every shape: a hit test and rigid transforms.
///
/// Rotations are about the world axes through the origin, in degrees. A shape
/// bakes its anchor point into the rotation and accumulates the angle for its
/// orientation. Hit tests compare the ray, taken into the local frame, with
/// the stored anchor as-is, so a rotated shape is drawn at the anchor turned
/// once more by the accumulated angles.
pub trait Shape {
    /// Closest intersection with `ray` strictly inside `ray_t`.
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit>;

    fn translate(&mut self, offset: Vec3);

    fn rotate(&mut self, axis: Axis, degrees: f64);

    fn material(&self) -> &Arc<Material>;
}

/// A shape defined outside this crate, usually created through a
/// [`PrimitiveRegistry`](crate::PrimitiveRegistry) factory.
pub trait CustomPrimitive: Shape + fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Deep copy; the material stays shared.
    fn box_clone(&self) -> Box<dyn CustomPrimitive>;
}

impl Clone for Box<dyn CustomPrimitive> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Every kind of object a scene can hold.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
    Box(Cuboid),
    Cone(Cone),
    InfiniteCone(InfiniteCone),
    Cylinder(Cylinder),
    InfiniteCylinder(InfiniteCylinder),
    Torus(Torus),
    Triangle(Triangle),
    Fractal(Fractal),
    Mobius(MobiusStrip),
    KleinBottle(KleinBottle),
    TangleCube(TangleCube),
    Composite(Composite),
    Decorated(Decorated),
    Custom(Box<dyn CustomPrimitive>),
}

macro_rules! dispatch {
    ($primitive:expr, $shape:ident => $body:expr) => {
        match $primitive {
            Primitive::Sphere($shape) => $body,
            Primitive::Plane($shape) => $body,
            Primitive::Box($shape) => $body,
            Primitive::Cone($shape) => $body,
            Primitive::InfiniteCone($shape) => $body,
            Primitive::Cylinder($shape) => $body,
            Primitive::InfiniteCylinder($shape) => $body,
            Primitive::Torus($shape) => $body,
            Primitive::Triangle($shape) => $body,
            Primitive::Fractal($shape) => $body,
            Primitive::Mobius($shape) => $body,
            Primitive::KleinBottle($shape) => $body,
            Primitive::TangleCube($shape) => $body,
            Primitive::Composite($shape) => $body,
            Primitive::Decorated($shape) => $body,
            Primitive::Custom($shape) => $body,
        }
    };
}

impl Primitive {
    /// Closest hit inside `ray_t`, attributed to the primitive whose material
    /// shades it.
    ///
    /// A composite reports the child that was hit; a decorator reports
    /// itself so its material replaces the wrapped one.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitInfo<'_>> {
        match self {
            Primitive::Composite(composite) => composite.hit(ray, ray_t),
            Primitive::Decorated(decorated) => decorated
                .inner()
                .hit(ray, ray_t)
                .map(|hit| hit.with_primitive(self)),
            _ => self.intersect(ray, ray_t).map(|surface| HitInfo::new(ray, surface, self)),
        }
    }

    /// Geometric hit without attribution.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        dispatch!(self, shape => shape.intersect(ray, ray_t))
    }

    pub fn translate(&mut self, offset: Vec3) {
        dispatch!(self, shape => shape.translate(offset))
    }

    pub fn rotate(&mut self, axis: Axis, degrees: f64) {
        dispatch!(self, shape => shape.rotate(axis, degrees))
    }

    pub fn rotate_x(&mut self, degrees: f64) {
        self.rotate(Axis::X, degrees);
    }

    pub fn rotate_y(&mut self, degrees: f64) {
        self.rotate(Axis::Y, degrees);
    }

    pub fn rotate_z(&mut self, degrees: f64) {
        self.rotate(Axis::Z, degrees);
    }

    pub fn material(&self) -> &Material {
        dispatch!(self, shape => shape.material().as_ref())
    }

    /// Shared handle to the material, for building derived primitives.
    pub fn material_handle(&self) -> &Arc<Material> {
        dispatch!(self, shape => shape.material())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Sphere(_) => "sphere",
            Primitive::Plane(_) => "plane",
            Primitive::Box(_) => "box",
            Primitive::Cone(_) => "cone",
            Primitive::InfiniteCone(_) => "infinite_cone",
            Primitive::Cylinder(_) => "cylinder",
            Primitive::InfiniteCylinder(_) => "infinite_cylinder",
            Primitive::Torus(_) => "torus",
            Primitive::Triangle(_) => "triangle",
            Primitive::Fractal(_) => "fractal",
            Primitive::Mobius(_) => "mobius",
            Primitive::KleinBottle(_) => "klein_bottle",
            Primitive::TangleCube(_) => "tangle_cube",
            Primitive::Composite(_) => "composite",
            Primitive::Decorated(decorated) => decorated.inner().type_name(),
            Primitive::Custom(custom) => custom.type_name(),
        }
    }

    /// Wrap this primitive so it is shaded with `material`.
    pub fn with_material(self, material: Arc<Material>) -> Primitive {
        Primitive::Decorated(Decorated::new(self, material))
    }
}

macro_rules! impl_from {
    ($($variant:ident($shape:ty)),* $(,)?) => {
        $(
            impl From<$shape> for Primitive {
                fn from(shape: $shape) -> Self {
                    Primitive::$variant(shape)
                }
            }
        )*
    };
}

impl_from!(
    Sphere(Sphere),
    Plane(Plane),
    Box(Cuboid),
    Cone(Cone),
    InfiniteCone(InfiniteCone),
    Cylinder(Cylinder),
    InfiniteCylinder(InfiniteCylinder),
    Torus(Torus),
    Triangle(Triangle),
    Fractal(Fractal),
    Mobius(MobiusStrip),
    KleinBottle(KleinBottle),
    TangleCube(TangleCube),
    Composite(Composite),
    Decorated(Decorated),
    Custom(Box<dyn CustomPrimitive>),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::FractalKind;
    use lumen_core::Color;

    fn every_primitive() -> Vec<Primitive> {
        let m = Arc::new(Material::default());
        let red = Arc::new(Material::new(Color::X));
        vec![
            Sphere::new(Vec3::ZERO, 1.0, m.clone()).unwrap().into(),
            Plane::new(Vec3::ZERO, Vec3::Y, m.clone()).unwrap().into(),
            Cuboid::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 0.8), m.clone()).unwrap().into(),
            Cone::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y, 1.0, 2.0, m.clone()).unwrap().into(),
            InfiniteCone::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y, 30.0, m.clone()).unwrap().into(),
            Cylinder::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, 1.0, 2.0, m.clone()).unwrap().into(),
            InfiniteCylinder::new(Vec3::ZERO, Vec3::Y, 1.0, m.clone()).unwrap().into(),
            Torus::new(Vec3::ZERO, Vec3::Z, 1.0, 0.3, m.clone()).unwrap().into(),
            Triangle::new(
                Vec3::new(-2.0, -2.0, 0.0),
                Vec3::new(2.0, -2.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
                m.clone(),
            )
            .unwrap()
            .into(),
            Fractal::new(FractalKind::Mandelbulb, Vec3::ZERO, 1.5, m.clone()).unwrap().into(),
            MobiusStrip::new(Vec3::ZERO, 1.0, 0.3, 0.02, m.clone()).unwrap().into(),
            KleinBottle::new(Vec3::ZERO, 1.0, 0.05, false, m.clone()).unwrap().into(),
            TangleCube::new(Vec3::ZERO, 1.0, m.clone()).unwrap().into(),
            Composite::new(
                vec![
                    Sphere::new(Vec3::new(0.9, 0.0, 0.0), 0.5, red.clone()).unwrap().into(),
                    Sphere::new(Vec3::new(-0.9, 0.0, 0.0), 0.5, m.clone()).unwrap().into(),
                ],
                m.clone(),
            )
            .unwrap()
            .into(),
            Primitive::from(Sphere::new(Vec3::ZERO, 1.0, m).unwrap()).with_material(red),
        ]
    }

    fn probe_rays() -> Vec<Ray> {
        let origin = Vec3::new(0.3, 0.2, 6.0);
        [
            Vec3::ZERO,
            Vec3::new(0.9, 0.1, 0.0),
            Vec3::new(0.1, 0.95, 0.05),
            Vec3::new(1.0, 1.0, 1.0),
        ]
        .into_iter()
        .map(|target| Ray::new(origin, target - origin))
        .collect()
    }

    fn range() -> Interval {
        Interval::new(1e-3, 100.0)
    }

    #[test]
    fn test_hits_are_in_range_with_unit_normals() {
        for primitive in every_primitive() {
            let mut hits = 0;
            for ray in probe_rays() {
                if let Some(hit) = primitive.hit(&ray, range()) {
                    hits += 1;
                    assert!(range().contains(hit.distance), "{}", primitive.type_name());
                    assert!((hit.normal.length() - 1.0).abs() < 1e-3, "{}", primitive.type_name());
                    assert!(hit.normal.dot(ray.direction) <= 0.0, "{}", primitive.type_name());
                }
            }
            assert!(hits > 0, "no probe ray hit {}", primitive.type_name());
        }
    }

    #[test]
    fn test_hit_is_idempotent_and_clone_matches() {
        for primitive in every_primitive() {
            let copy = primitive.clone();
            assert!(Arc::ptr_eq(primitive.material_handle(), copy.material_handle()));
            for ray in probe_rays() {
                let first = primitive.intersect(&ray, range());
                let second = primitive.intersect(&ray, range());
                let cloned = copy.intersect(&ray, range());
                assert_eq!(first, second, "{}", primitive.type_name());
                assert_eq!(first, cloned, "{}", primitive.type_name());
            }
        }
    }

    #[test]
    fn test_rotation_round_trip_restores_hits() {
        for original in every_primitive() {
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                let mut turned = original.clone();
                turned.rotate(axis, 37.0);
                turned.rotate(axis, -37.0);

                for ray in probe_rays() {
                    let before = original.intersect(&ray, range());
                    let after = turned.intersect(&ray, range());
                    match (before, after) {
                        (Some(a), Some(b)) => {
                            assert!((a.t - b.t).abs() < 1e-6, "{} {:?}", original.type_name(), axis);
                            assert!((a.normal - b.normal).length() < 1e-4, "{}", original.type_name());
                        }
                        (None, None) => {}
                        _ => panic!("{} changed hit/miss after {:?} round trip", original.type_name(), axis),
                    }
                }
            }
        }
    }

    #[test]
    fn test_translate_moves_hit() {
        for mut primitive in every_primitive() {
            let ray = probe_rays()[0];
            let Some(before) = primitive.intersect(&ray, range()) else {
                continue;
            };
            let offset = Vec3::new(0.0, 0.0, -2.0);
            primitive.translate(offset);
            let moved = Ray::new(ray.origin + offset, ray.direction);
            let after = primitive.intersect(&moved, range()).unwrap();
            assert!((before.t - after.t).abs() < 1e-6, "{}", primitive.type_name());
        }
    }

    #[test]
    fn test_type_names() {
        let names: Vec<&str> = every_primitive().iter().map(Primitive::type_name).collect();
        assert_eq!(
            names,
            vec![
                "sphere",
                "plane",
                "box",
                "cone",
                "infinite_cone",
                "cylinder",
                "infinite_cylinder",
                "torus",
                "triangle",
                "fractal",
                "mobius",
                "klein_bottle",
                "tangle_cube",
                "composite",
                "sphere",
            ]
        );
    }

    #[test]
    fn test_invalid_parameters() {
        let m = Arc::new(Material::default());
        assert_eq!(
            Sphere::new(Vec3::ZERO, -1.0, m.clone()).unwrap_err(),
            GeometryError::NonPositive {
                name: "radius",
                value: -1.0
            }
        );
        assert!(matches!(
            Sphere::new(Vec3::ZERO, f64::NAN, m.clone()),
            Err(GeometryError::NonFinite { .. })
        ));
        assert_eq!(Plane::new(Vec3::ZERO, Vec3::ZERO, m).unwrap_err(), GeometryError::ZeroAxis);
    }
}
