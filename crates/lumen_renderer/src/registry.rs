//! Name-keyed primitive factories.
//!
//! Scene descriptions name a primitive type and give it a flat set of
//! numeric parameters. Vector parameters are spelled as three scalars with
//! `_x`, `_y` and `_z` suffixes (`center_x`, `center_y`, `center_z`). The
//! registry is built once before the scene and is never consulted while
//! rendering.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::DVec4;
use lumen_core::Material;
use lumen_math::Vec3;
use thiserror::Error;

use crate::cone::{Cone, InfiniteCone};
use crate::cuboid::Cuboid;
use crate::cylinder::{Cylinder, InfiniteCylinder};
use crate::fractal::{Fractal, FractalKind};
use crate::klein_bottle::KleinBottle;
use crate::mobius::MobiusStrip;
use crate::plane::Plane;
use crate::primitive::{GeometryError, Primitive};
use crate::sphere::Sphere;
use crate::tangle_cube::TangleCube;
use crate::torus::Torus;
use crate::triangle::Triangle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("unknown primitive type '{0}'")]
    UnknownType(String),

    #[error("{type_name}: missing parameter '{name}'")]
    MissingParameter { type_name: String, name: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Builds a primitive from its parameters and material.
pub type PrimitiveFactory =
    Box<dyn Fn(&Params<'_>, Arc<Material>) -> RegistryResult<Primitive> + Send + Sync>;

/// Parameter lookup for one factory call.
pub struct Params<'a> {
    type_name: &'a str,
    values: &'a HashMap<String, f64>,
}

impl<'a> Params<'a> {
    pub fn new(type_name: &'a str, values: &'a HashMap<String, f64>) -> Self {
        Self { type_name, values }
    }

    pub fn get(&self, name: &str) -> RegistryResult<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::MissingParameter {
                type_name: self.type_name.to_string(),
                name: name.to_string(),
            })
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.values.get(name).copied().unwrap_or(default)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get_or(name, 0.0) != 0.0
    }

    pub fn vec3(&self, prefix: &str) -> RegistryResult<Vec3> {
        Ok(Vec3::new(
            self.get(&format!("{prefix}_x"))?,
            self.get(&format!("{prefix}_y"))?,
            self.get(&format!("{prefix}_z"))?,
        ))
    }

    pub fn vec3_or(&self, prefix: &str, default: Vec3) -> Vec3 {
        Vec3::new(
            self.get_or(&format!("{prefix}_x"), default.x),
            self.get_or(&format!("{prefix}_y"), default.y),
            self.get_or(&format!("{prefix}_z"), default.z),
        )
    }
}

/// Maps primitive type names to factories.
#[derive(Default)]
pub struct PrimitiveRegistry {
    factories: HashMap<String, PrimitiveFactory>,
}

impl fmt::Debug for PrimitiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveRegistry")
            .field("types", &self.names())
            .finish()
    }
}

impl PrimitiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every shape this crate implements.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register("sphere", |p, m| {
            Ok(Sphere::new(p.vec3_or("center", Vec3::ZERO), p.get("radius")?, m)?.into())
        });
        registry.register("plane", |p, m| {
            Ok(Plane::new(p.vec3_or("position", Vec3::ZERO), p.vec3_or("normal", Vec3::Y), m)?.into())
        });
        registry.register("box", |p, m| {
            let size = p.vec3("size")?;
            Ok(Cuboid::new(p.vec3_or("center", Vec3::ZERO), size / 2.0, m)?.into())
        });
        registry.register("cone", |p, m| {
            let cone = Cone::new(
                p.vec3_or("apex", Vec3::ZERO),
                p.vec3_or("axis", Vec3::NEG_Y),
                p.get("radius")?,
                p.get("height")?,
                m,
            )?;
            Ok(cone.into())
        });
        registry.register("infinite_cone", |p, m| {
            let cone = InfiniteCone::new(
                p.vec3_or("apex", Vec3::ZERO),
                p.vec3_or("axis", Vec3::Y),
                p.get("angle")?,
                m,
            )?;
            Ok(cone.into())
        });
        registry.register("cylinder", |p, m| {
            let cylinder = Cylinder::new(
                p.vec3_or("base", Vec3::ZERO),
                p.vec3_or("axis", Vec3::Y),
                p.get("radius")?,
                p.get("height")?,
                m,
            )?;
            Ok(cylinder.into())
        });
        registry.register("infinite_cylinder", |p, m| {
            let cylinder = InfiniteCylinder::new(
                p.vec3_or("center", Vec3::ZERO),
                p.vec3_or("axis", Vec3::Y),
                p.get("radius")?,
                m,
            )?;
            Ok(cylinder.into())
        });
        registry.register("torus", |p, m| {
            let torus = Torus::new(
                p.vec3_or("center", Vec3::ZERO),
                p.vec3_or("axis", Vec3::Y),
                p.get("major_radius")?,
                p.get("minor_radius")?,
                m,
            )?;
            Ok(torus.into())
        });
        registry.register("triangle", |p, m| {
            Ok(Triangle::new(p.vec3("v0")?, p.vec3("v1")?, p.vec3("v2")?, m)?.into())
        });
        for kind in FractalKind::ALL {
            registry.register(kind.name(), move |p, m| fractal(kind, p, m));
        }
        registry.register("mobius", |p, m| {
            let strip = MobiusStrip::new(
                p.vec3_or("center", Vec3::ZERO),
                p.get("radius")?,
                p.get_or("width", 0.3),
                p.get_or("thickness", 0.02),
                m,
            )?;
            Ok(strip.into())
        });
        registry.register("klein_bottle", |p, m| {
            let bottle = KleinBottle::new(
                p.vec3_or("center", Vec3::ZERO),
                p.get_or("scale", 1.0),
                p.get_or("thickness", 0.05),
                p.flag("figure8"),
                m,
            )?;
            Ok(bottle.into())
        });
        registry.register("tangle_cube", |p, m| {
            Ok(TangleCube::new(p.vec3_or("center", Vec3::ZERO), p.get_or("size", 1.0), m)?.into())
        });

        registry
    }

    /// Add or replace the factory for `name`.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Params<'_>, Arc<Material>) -> RegistryResult<Primitive> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create(
        &self,
        name: &str,
        params: &HashMap<String, f64>,
        material: Arc<Material>,
    ) -> RegistryResult<Primitive> {
        let Some(factory) = self.factories.get(name) else {
            log::warn!("No primitive factory registered for '{}'", name);
            return Err(RegistryError::UnknownType(name.to_string()));
        };
        factory(&Params::new(name, params), material)
    }
}

fn fractal(kind: FractalKind, p: &Params<'_>, material: Arc<Material>) -> RegistryResult<Primitive> {
    let mut fractal = Fractal::new(kind, p.vec3_or("center", Vec3::ZERO), p.get_or("radius", 2.0), material)?;
    if let Ok(iterations) = p.get("iterations") {
        fractal = fractal.with_iterations(iterations.max(0.0) as u32)?;
    }
    if let Ok(bailout) = p.get("bailout") {
        fractal = fractal.with_bailout(bailout)?;
    }
    if let Ok(power) = p.get("power") {
        fractal = fractal.with_power(power)?;
    }
    if p.values.contains_key("c_x") {
        let constant = DVec4::new(
            p.get_or("c_x", 0.0),
            p.get_or("c_y", 0.0),
            p.get_or("c_z", 0.0),
            p.get_or("c_w", 0.0),
        );
        fractal = fractal.with_constant(constant);
    }
    Ok(fractal.into())
}
