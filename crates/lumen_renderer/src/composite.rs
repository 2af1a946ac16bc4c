//! Primitives built from other primitives.

use std::sync::Arc;

use lumen_core::Material;
use lumen_math::{Axis, Interval, Ray, Vec3};

use crate::hittable::{HitInfo, SurfaceHit};
use crate::primitive::{GeometryError, GeometryResult, Primitive, Shape};

/// A group of primitives hit-tested as one object.
///
/// Hits are reported against the child that was struck, so each child keeps
/// its own material. The group material applies only where the group itself
/// is asked for one.
#[derive(Debug, Clone)]
pub struct Composite {
    children: Vec<Primitive>,
    material: Arc<Material>,
}

impl Composite {
    pub fn new(children: Vec<Primitive>, material: Arc<Material>) -> GeometryResult<Self> {
        if children.is_empty() {
            return Err(GeometryError::EmptyComposite);
        }
        Ok(Self { children, material })
    }

    pub fn push(&mut self, child: Primitive) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Primitive] {
        &self.children
    }

    /// Closest child hit; ties keep the earlier child.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitInfo<'_>> {
        let mut closest = None;
        let mut range = ray_t;
        for child in &self.children {
            if let Some(hit) = child.hit(ray, range) {
                range = range.with_max(hit.distance);
                closest = Some(hit);
            }
        }
        closest
    }
}

impl Shape for Composite {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let mut closest = None;
        let mut range = ray_t;
        for child in &self.children {
            if let Some(surface) = child.intersect(ray, range) {
                range = range.with_max(surface.t);
                closest = Some(surface);
            }
        }
        closest
    }

    fn translate(&mut self, offset: Vec3) {
        for child in &mut self.children {
            child.translate(offset);
        }
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        for child in &mut self.children {
            child.rotate(axis, degrees);
        }
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

/// Wraps a primitive and shades it with a different material.
#[derive(Debug, Clone)]
pub struct Decorated {
    inner: Box<Primitive>,
    material: Arc<Material>,
}

impl Decorated {
    pub fn new(inner: Primitive, material: Arc<Material>) -> Self {
        Self {
            inner: Box::new(inner),
            material,
        }
    }

    pub fn inner(&self) -> &Primitive {
        &self.inner
    }

    pub fn into_inner(self) -> Primitive {
        *self.inner
    }
}

impl Shape for Decorated {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        self.inner.intersect(ray, ray_t)
    }

    fn translate(&mut self, offset: Vec3) {
        self.inner.translate(offset);
    }

    fn rotate(&mut self, axis: Axis, degrees: f64) {
        self.inner.rotate(axis, degrees);
    }

    fn material(&self) -> &Arc<Material> {
        &self.material
    }
}
