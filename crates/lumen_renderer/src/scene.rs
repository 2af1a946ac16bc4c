//! Scene container and the recursive shading pipeline.
//!
//! A [`Scene`] owns everything a frame is rendered from. It is built and
//! mutated between frames and only read while workers render.

use lumen_core::{AmbientLight, Camera, Color, Light, Shader};
use lumen_math::{Interval, Ray, Vec3, Vec3Ext};

use crate::hittable::HitInfo;
use crate::primitive::Primitive;

/// Recursion limit for reflection and refraction rays.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Closest parameter accepted by [`Scene::trace`].
pub const TRACE_T_MIN: f64 = 1e-3;

/// Offset along the normal for secondary ray origins.
pub const SURFACE_BIAS: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct Scene {
    primitives: Vec<Primitive>,
    lights: Vec<Light>,
    shaders: Vec<Shader>,
    ambient: AmbientLight,
    camera: Camera,
    background: Color,
    max_depth: u32,
    image_width: u32,
    image_height: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
            lights: Vec::new(),
            shaders: Vec::new(),
            ambient: AmbientLight::default(),
            camera: Camera::default(),
            background: Color::ZERO,
            max_depth: DEFAULT_MAX_DEPTH,
            image_width: 800,
            image_height: 600,
        }
    }

    /// Add a primitive; insertion order breaks ties between equal hits.
    pub fn add_primitive(&mut self, primitive: impl Into<Primitive>) {
        self.primitives.push(primitive.into());
    }

    pub fn add_light(&mut self, light: impl Into<Light>) {
        self.lights.push(light.into());
    }

    pub fn add_shader(&mut self, shader: Shader) {
        self.shaders.push(shader);
    }

    pub fn set_ambient_light(&mut self, ambient: AmbientLight) {
        self.ambient = ambient;
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    pub fn set_max_depth(&mut self, max_depth: u32) {
        self.max_depth = max_depth;
    }

    pub fn set_image_dimensions(&mut self, width: u32, height: u32) {
        self.image_width = width;
        self.image_height = height;
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn primitives_mut(&mut self) -> &mut [Primitive] {
        &mut self.primitives
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn shaders(&self) -> &[Shader] {
        &self.shaders
    }

    pub fn ambient_light(&self) -> &AmbientLight {
        &self.ambient
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// Closest hit along `ray` beyond [`TRACE_T_MIN`].
    ///
    /// The upper bound shrinks to each accepted hit, so a later primitive
    /// only wins when strictly closer.
    pub fn trace(&self, ray: &Ray) -> Option<HitInfo<'_>> {
        self.closest_hit(ray, Interval::new(TRACE_T_MIN, f64::INFINITY))
    }

    fn closest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitInfo<'_>> {
        let mut closest = None;
        let mut range = ray_t;
        for primitive in &self.primitives {
            if let Some(hit) = primitive.hit(ray, range) {
                range = range.with_max(hit.distance);
                closest = Some(hit);
            }
        }
        closest
    }

    /// Whether anything blocks `light` as seen from `point`.
    ///
    /// The shadow ray starts [`SURFACE_BIAS`] off the surface on the side
    /// facing the light. Occluders beyond a point light do not count.
    pub fn is_in_shadow(&self, point: Vec3, normal: Vec3, light: &Light) -> bool {
        let to_light = light.direction_from(point);
        let bias = if normal.dot(to_light) < 0.0 { -normal } else { normal };
        let origin = point + bias * SURFACE_BIAS;

        let max_distance = light
            .distance_from(origin)
            .unwrap_or(f64::INFINITY);
        let shadow_ray = Ray::new(origin, to_light);
        let range = Interval::new(TRACE_T_MIN, max_distance);

        self.primitives
            .iter()
            .any(|primitive| primitive.intersect(&shadow_ray, range).is_some())
    }

    /// Linear RGB seen along `ray`; call with `depth = 0` for camera rays.
    pub fn compute_color(&self, ray: &Ray, depth: u32) -> Color {
        let Some(hit) = self.trace(ray) else {
            return self.background;
        };

        let material = hit.material();
        let base = material.color_at(hit.uv);
        let normal = material.normal_at(hit.uv, hit.normal).normalized();
        let occlusion = material.ambient_occlusion_at(hit.uv);
        let point = hit.point + hit.normal * material.displacement_at(hit.uv);
        let view = -ray.direction.normalized();

        let mut color = base * self.ambient.color * occlusion;
        for light in &self.lights {
            if self.is_in_shadow(point, hit.normal, light) {
                continue;
            }
            let to_light = light.direction_from(point);
            let light_color = light.color_at(point);

            let diffuse = normal.dot(to_light).max(0.0) * occlusion;
            color += base * light_color * diffuse;

            let half = (to_light + view).normalized();
            let specular = normal.dot(half).max(0.0).powf(material.shininess) * material.specular_at(hit.uv);
            color += light_color * specular;
        }

        if depth < self.max_depth {
            if material.reflectivity > 0.0 {
                let reflected = self.reflect_color(ray, &hit, normal, depth);
                color = color * (1.0 - material.reflectivity) + reflected * material.reflectivity;
            }
            if material.transparency > 0.0 {
                let refracted = self.refract_color(ray, &hit, normal, depth);
                color = color * (1.0 - material.transparency) + refracted * material.transparency;
            }
        }

        if depth == 0 {
            for shader in &self.shaders {
                color = shader.apply(color, hit.point, normal, ray);
            }
        }
        color
    }

    fn reflect_color(&self, ray: &Ray, hit: &HitInfo<'_>, normal: Vec3, depth: u32) -> Color {
        let direction = ray.direction.normalized().reflect_about(normal);
        let origin = hit.point + hit.normal * SURFACE_BIAS;
        self.compute_color(&Ray::new(origin, direction), depth + 1)
    }

    /// Transmitted color; total internal reflection traces the mirror ray.
    fn refract_color(&self, ray: &Ray, hit: &HitInfo<'_>, normal: Vec3, depth: u32) -> Color {
        let ior = hit.material().refraction_index;
        let eta = if hit.front_face { 1.0 / ior } else { ior };

        match ray.direction.normalized().try_refract(normal, eta) {
            Some(direction) => {
                let origin = hit.point - hit.normal * SURFACE_BIAS;
                self.compute_color(&Ray::new(origin, direction), depth + 1)
            }
            None => self.reflect_color(ray, hit, normal, depth),
        }
    }

    /// Primitive under screen coordinates (u, v), v = 1 at the top.
    pub fn pick(&self, u: f64, v: f64) -> Option<&Primitive> {
        let ray = self.camera.ray(u, v);
        self.trace(&ray).map(|hit| hit.primitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use lumen_core::{DirectionalLight, Material, PointLight};
    use lumen_math::Axis;

    use crate::cuboid::Cuboid;
    use crate::hittable::SurfaceHit;
    use crate::primitive::{CustomPrimitive, Shape};
    use crate::plane::Plane;
    use crate::sphere::Sphere;

    fn matte(color: Color) -> Arc<Material> {
        Arc::new(Material::new(color))
    }

    fn sphere(center: Vec3, radius: f64, material: Arc<Material>) -> Sphere {
        Sphere::new(center, radius, material).unwrap()
    }

    #[test]
    fn test_trace_returns_closest_in_any_order() {
        let mut scene = Scene::new();
        scene.add_primitive(sphere(Vec3::new(0.0, 0.0, -10.0), 1.0, matte(Color::X)));
        scene.add_primitive(sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, matte(Color::Y)));

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = scene.trace(&ray).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-9);
        assert_eq!(hit.material().color, Color::Y);
    }

    #[test]
    fn test_trace_tie_keeps_first_inserted() {
        let mut scene = Scene::new();
        scene.add_primitive(sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, matte(Color::X)));
        scene.add_primitive(sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, matte(Color::Y)));

        let hit = scene.trace(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
        assert_eq!(hit.material().color, Color::X);
    }

    #[test]
    fn test_miss_returns_background() {
        let mut scene = Scene::new();
        scene.set_background(Color::new(0.2, 0.3, 0.4));
        let color = scene.compute_color(&Ray::new(Vec3::ZERO, Vec3::Z), 0);
        assert_eq!(color, Color::new(0.2, 0.3, 0.4));
    }

    #[test]
    fn test_shadow_with_and_without_occluder() {
        let light = Light::from(PointLight::new(Vec3::new(0.0, 10.0, 0.0), Color::ONE));
        let point = Vec3::ZERO;

        let mut scene = Scene::new();
        scene.add_primitive(Plane::new(Vec3::ZERO, Vec3::Y, matte(Color::ONE)).unwrap());
        assert!(!scene.is_in_shadow(point, Vec3::Y, &light));

        scene.add_primitive(sphere(Vec3::new(0.0, 5.0, 0.0), 1.0, matte(Color::ONE)));
        assert!(scene.is_in_shadow(point, Vec3::Y, &light));
    }

    #[test]
    fn test_occluder_behind_point_light_casts_no_shadow() {
        let light = Light::from(PointLight::new(Vec3::new(0.0, 3.0, 0.0), Color::ONE));
        let mut scene = Scene::new();
        scene.add_primitive(sphere(Vec3::new(0.0, 6.0, 0.0), 1.0, matte(Color::ONE)));
        assert!(!scene.is_in_shadow(Vec3::ZERO, Vec3::Y, &light));

        // A directional light has no far limit
        let sun = Light::from(DirectionalLight::new(Vec3::NEG_Y, Color::ONE));
        assert!(scene.is_in_shadow(Vec3::ZERO, Vec3::Y, &sun));
    }

    #[test]
    fn test_lambert_and_ambient() {
        let mut scene = Scene::new();
        let material = Arc::new(Material::new(Color::splat(0.5)).with_shininess(1e6));
        scene.add_primitive(Plane::new(Vec3::ZERO, Vec3::Y, material).unwrap());
        scene.add_light(DirectionalLight::new(Vec3::new(0.0, -1.0, -1.0), Color::ONE));

        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let color = scene.compute_color(&ray, 0);
        // ambient 0.5 * 0.1 plus diffuse 0.5 * cos 45°; the highlight is off-angle
        let expected = 0.05 + 0.5 * std::f64::consts::FRAC_1_SQRT_2;
        assert!((color.x - expected).abs() < 1e-6, "color = {color}");
    }

    #[test]
    fn test_shadowed_point_only_gets_ambient() {
        let mut scene = Scene::new();
        scene.add_primitive(Plane::new(Vec3::ZERO, Vec3::Y, matte(Color::ONE)).unwrap());
        scene.add_primitive(sphere(Vec3::new(0.0, 5.0, 0.0), 1.0, matte(Color::ONE)));
        scene.add_light(DirectionalLight::new(Vec3::NEG_Y, Color::ONE));

        let ray = Ray::new(Vec3::new(0.0, 1.0, 3.0), Vec3::new(0.0, -1.0, -3.0).normalized());
        let color = scene.compute_color(&ray, 0);
        assert!((color - Color::splat(0.1)).length() < 1e-9);
    }

    #[test]
    fn test_mirror_reflects_what_it_faces() {
        let mut scene = Scene::new();
        scene.set_ambient_light(AmbientLight::new(Color::ONE));
        let mirror = Arc::new(Material::new(Color::ZERO).with_reflectivity(1.0));
        scene.add_primitive(Plane::new(Vec3::ZERO, Vec3::Z, mirror).unwrap());
        scene.add_primitive(sphere(Vec3::new(0.0, 0.0, 10.0), 1.0, matte(Color::X)));

        // Looking at the mirror from between it and the red sphere
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let color = scene.compute_color(&ray, 0);
        assert!((color - Color::X).length() < 1e-9, "color = {color}");

        // Without recursion the mirror shows only its own black
        scene.set_max_depth(0);
        assert_eq!(scene.compute_color(&ray, 0), Color::ZERO);
    }

    #[test]
    fn test_mirror_box_terminates() {
        let mut scene = Scene::new();
        let mirror = Arc::new(Material::new(Color::splat(0.5)).with_reflectivity(1.0));
        scene.add_primitive(
            Cuboid::new(Vec3::ZERO, Vec3::splat(2.0), mirror.clone()).unwrap(),
        );
        scene.add_primitive(sphere(Vec3::ZERO, 0.5, mirror));
        scene.add_light(PointLight::new(Vec3::new(1.0, 1.0, 1.0), Color::ONE));

        for direction in [Vec3::X, Vec3::new(1.0, 1.0, 0.3), Vec3::new(-0.2, 0.7, -1.0)] {
            let ray = Ray::new(Vec3::new(1.2, -1.3, 0.9), direction.normalized());
            let color = scene.compute_color(&ray, 0);
            assert!(color.is_finite());
        }
    }

    /// Mirror box that counts its hit tests.
    #[derive(Debug, Clone)]
    struct CountingBox {
        inner: Cuboid,
        calls: Arc<AtomicUsize>,
    }

    impl Shape for CountingBox {
        fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.inner.intersect(ray, ray_t)
        }

        fn translate(&mut self, offset: Vec3) {
            self.inner.translate(offset);
        }

        fn rotate(&mut self, axis: Axis, degrees: f64) {
            self.inner.rotate(axis, degrees);
        }

        fn material(&self) -> &Arc<Material> {
            self.inner.material()
        }
    }

    impl CustomPrimitive for CountingBox {
        fn type_name(&self) -> &'static str {
            "counting_box"
        }

        fn box_clone(&self) -> Box<dyn CustomPrimitive> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_mirror_box_recursion_is_bounded_by_max_depth() {
        let mirror = Arc::new(Material::new(Color::splat(0.5)).with_reflectivity(1.0));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scene = Scene::new();
        scene.add_primitive(Primitive::Custom(Box::new(CountingBox {
            inner: Cuboid::new(Vec3::ZERO, Vec3::splat(2.0), mirror).unwrap(),
            calls: calls.clone(),
        })));

        let ray = Ray::new(Vec3::new(0.3, -0.2, 0.1), Vec3::new(1.0, 0.7, 0.3).normalized());
        for max_depth in [0, 1, 5, 9] {
            scene.set_max_depth(max_depth);
            calls.store(0, Ordering::Relaxed);
            let color = scene.compute_color(&ray, 0);
            assert!(color.is_finite());
            // One trace per shading call: the camera ray plus one per bounce
            assert_eq!(calls.load(Ordering::Relaxed), max_depth as usize + 1);
        }
    }

    #[test]
    fn test_total_internal_reflection_follows_mirror_ray() {
        let mut scene = Scene::new();
        scene.set_ambient_light(AmbientLight::new(Color::ONE));
        let glass = Arc::new(Material::new(Color::ONE).with_transparency(1.0, 1.5));
        // A tall glass column, and a red ceiling far above it
        scene.add_primitive(Cuboid::new(Vec3::ZERO, Vec3::new(1.0, 5.0, 1.0), glass).unwrap());
        scene.add_primitive(Plane::new(Vec3::new(0.0, 20.0, 0.0), Vec3::NEG_Y, matte(Color::X)).unwrap());

        // From inside, the ray meets the side wall past the critical angle
        let ray = Ray::new(Vec3::new(0.0, -4.0, 0.0), Vec3::new(1.0, 2.0, 0.0).normalized());
        let hit = scene.trace(&ray).unwrap();
        assert!(!hit.front_face);
        assert!(ray.direction.try_refract(hit.normal, 1.5).is_none());

        // Mirrored off both walls, the ray leaves through the top toward the ceiling
        let color = scene.compute_color(&ray, 0);
        assert!((color - Color::X).length() < 1e-9, "color = {color}");
        assert_eq!(scene.refract_color(&ray, &hit, hit.normal, 0), scene.reflect_color(&ray, &hit, hit.normal, 0));
    }

    #[test]
    fn test_grazing_entry_stays_finite() {
        let mut scene = Scene::new();
        let glass = Arc::new(Material::new(Color::ONE).with_transparency(1.0, 1.5));
        scene.add_primitive(sphere(Vec3::ZERO, 1.0, glass));
        scene.add_light(PointLight::new(Vec3::new(5.0, 5.0, 5.0), Color::ONE));

        let grazing = Ray::new(Vec3::new(-5.0, 0.99, 0.0), Vec3::X);
        assert!(scene.compute_color(&grazing, 0).is_finite());
    }

    #[test]
    fn test_refraction_through_glass_sees_behind() {
        let mut scene = Scene::new();
        scene.set_ambient_light(AmbientLight::new(Color::ONE));
        let glass = Arc::new(Material::new(Color::ZERO).with_transparency(1.0, 1.5));
        scene.add_primitive(sphere(Vec3::ZERO, 1.0, glass));
        scene.add_primitive(Plane::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, matte(Color::Y)).unwrap());

        // Head-on rays pass straight through both surfaces
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let color = scene.compute_color(&ray, 0);
        assert!((color - Color::Y).length() < 1e-6, "color = {color}");
    }

    #[test]
    fn test_shaders_run_once_on_primary_hit() {
        let mut scene = Scene::new();
        scene.set_ambient_light(AmbientLight::new(Color::ONE));
        scene.add_primitive(sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, matte(Color::splat(0.3))));
        scene.add_shader(Shader::Toon {
            levels: 2,
            edge_threshold: 0.0,
        });

        let color = scene.compute_color(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), 0);
        assert_eq!(color, Color::ZERO);
        // Secondary rays are not filtered
        let secondary = scene.compute_color(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), 1);
        assert_eq!(secondary, Color::splat(0.3));
    }

    #[test]
    fn test_pick_returns_hit_primitive() {
        let mut scene = Scene::new();
        scene.add_primitive(sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, matte(Color::ONE)));
        assert_eq!(scene.pick(0.5, 0.5).map(Primitive::type_name), Some("sphere"));
        assert!(scene.pick(0.0, 0.0).is_none());
    }

    #[test]
    fn test_image_dimensions() {
        let mut scene = Scene::new();
        scene.set_image_dimensions(320, 200);
        assert_eq!((scene.image_width(), scene.image_height()), (320, 200));
        assert_eq!(scene.max_depth(), DEFAULT_MAX_DEPTH);
    }
}
