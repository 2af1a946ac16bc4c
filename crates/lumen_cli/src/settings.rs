//! JSON render settings and scene assembly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lumen_core::{
    AmbientLight, Camera, ChessboardTexture, Color, DirectionalLight, ImageTexture, Light, Material,
    PerlinTexture, PointLight, Shader, Texture,
};
use lumen_math::Vec3;
use lumen_renderer::{PrimitiveRegistry, RenderConfig, Scene};
use serde::Deserialize;

fn vec3(v: [f64; 3]) -> Vec3 {
    Vec3::from_array(v)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub render: RenderConfig,
    pub camera: CameraSettings,
    pub ambient: [f64; 3],
    pub background: [f64; 3],
    pub lights: Vec<LightSettings>,
    pub shaders: Vec<ShaderSettings>,
    /// Empty means the built-in demo scene
    pub objects: Vec<ObjectSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("render.png"),
            width: 800,
            height: 600,
            render: RenderConfig::default(),
            camera: CameraSettings::default(),
            ambient: [0.1; 3],
            background: [0.0; 3],
            lights: Vec::new(),
            shaders: Vec::new(),
            objects: Vec::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse settings {}", path.display()))
    }

    /// Assemble the scene these settings describe.
    pub fn build_scene(&self, registry: &PrimitiveRegistry) -> Result<Scene> {
        let mut scene = Scene::new();
        scene.set_image_dimensions(self.width, self.height);
        scene.set_camera(self.camera.build(self.width, self.height));
        scene.set_ambient_light(AmbientLight::new(vec3(self.ambient)));
        scene.set_background(vec3(self.background));

        if self.objects.is_empty() {
            log::info!("No objects given, using the demo scene");
            add_demo_objects(&mut scene, registry)?;
        }
        for (i, object) in self.objects.iter().enumerate() {
            let primitive = object
                .build(registry)
                .with_context(|| format!("Object #{} ({})", i, object.kind))?;
            scene.add_primitive(primitive);
        }

        if self.lights.is_empty() {
            scene.add_light(PointLight::new(Vec3::new(5.0, 8.0, 6.0), Color::ONE));
        }
        for light in &self.lights {
            scene.add_light(light.build());
        }
        for shader in &self.shaders {
            scene.add_shader(shader.build());
        }

        log::info!(
            "Scene: {} primitives, {} lights, {} shaders",
            scene.primitives().len(),
            scene.lights().len(),
            scene.shaders().len()
        );
        Ok(scene)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f64; 3],
    pub look_at: [f64; 3],
    pub up: [f64; 3],
    /// Horizontal field of view in degrees
    pub fov: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 2.0, 8.0],
            look_at: [0.0, 0.5, 0.0],
            up: [0.0, 1.0, 0.0],
            fov: 60.0,
        }
    }
}

impl CameraSettings {
    fn build(&self, width: u32, height: u32) -> Camera {
        let aspect = width.max(1) as f64 / height.max(1) as f64;
        Camera::new().look_at(vec3(self.position), vec3(self.look_at), vec3(self.up), self.fov, aspect)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightSettings {
    Point {
        position: [f64; 3],
        #[serde(default = "white")]
        color: [f64; 3],
        #[serde(default)]
        attenuation: Option<[f64; 3]>,
        #[serde(default)]
        filter: Option<[f64; 3]>,
    },
    Directional {
        direction: [f64; 3],
        #[serde(default = "white")]
        color: [f64; 3],
        #[serde(default)]
        filter: Option<[f64; 3]>,
    },
}

fn white() -> [f64; 3] {
    [1.0; 3]
}

impl LightSettings {
    fn build(&self) -> Light {
        match self {
            LightSettings::Point {
                position,
                color,
                attenuation,
                filter,
            } => {
                let mut point = PointLight::new(vec3(*position), vec3(*color));
                if let Some([constant, linear, quadratic]) = *attenuation {
                    point = point.with_attenuation(constant, linear, quadratic);
                }
                with_filter(point.into(), *filter)
            }
            LightSettings::Directional {
                direction,
                color,
                filter,
            } => with_filter(DirectionalLight::new(vec3(*direction), vec3(*color)).into(), *filter),
        }
    }
}

fn with_filter(light: Light, filter: Option<[f64; 3]>) -> Light {
    match filter {
        Some(filter) => light.filtered(vec3(filter)),
        None => light,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShaderSettings {
    Basic,
    Phong { specular_strength: f64, shininess: f64 },
    Toon { levels: u32, edge_threshold: f64 },
    Fresnel { power: f64, rim_color: [f64; 3] },
}

impl ShaderSettings {
    fn build(&self) -> Shader {
        match *self {
            ShaderSettings::Basic => Shader::Basic,
            ShaderSettings::Phong {
                specular_strength,
                shininess,
            } => Shader::Phong {
                specular_strength,
                shininess,
            },
            ShaderSettings::Toon {
                levels,
                edge_threshold,
            } => Shader::Toon {
                levels,
                edge_threshold,
            },
            ShaderSettings::Fresnel { power, rim_color } => Shader::Fresnel {
                power,
                rim_color: vec3(rim_color),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextureSettings {
    Image { path: PathBuf },
    Chessboard { color1: [f64; 3], color2: [f64; 3], scale: f64 },
    Perlin {
        color1: [f64; 3],
        color2: [f64; 3],
        scale: f64,
        #[serde(default = "default_persistence")]
        persistence: f64,
        #[serde(default = "default_octaves")]
        octaves: u32,
        #[serde(default)]
        seed: u64,
    },
}

fn default_persistence() -> f64 {
    0.5
}

fn default_octaves() -> u32 {
    4
}

impl TextureSettings {
    fn build(&self) -> Texture {
        match self {
            TextureSettings::Image { path } => {
                Texture::Image(Arc::new(ImageTexture::open_or(path, ImageTexture::missing())))
            }
            TextureSettings::Chessboard { color1, color2, scale } => {
                Texture::Chessboard(ChessboardTexture::new(vec3(*color1), vec3(*color2), *scale))
            }
            TextureSettings::Perlin {
                color1,
                color2,
                scale,
                persistence,
                octaves,
                seed,
            } => Texture::Perlin(PerlinTexture::new(
                vec3(*color1),
                vec3(*color2),
                *scale,
                *persistence,
                *octaves,
                *seed,
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub color: [f64; 3],
    pub reflectivity: f64,
    pub transparency: f64,
    pub refraction_index: f64,
    pub shininess: f64,
    pub texture: Option<TextureSettings>,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        let base = Material::default();
        Self {
            color: base.color.to_array(),
            reflectivity: base.reflectivity,
            transparency: base.transparency,
            refraction_index: base.refraction_index,
            shininess: base.shininess,
            texture: None,
        }
    }
}

impl MaterialSettings {
    fn build(&self) -> Result<Material> {
        let mut material = Material::new(vec3(self.color))
            .with_reflectivity(self.reflectivity)
            .with_transparency(self.transparency, self.refraction_index)
            .with_shininess(self.shininess);
        if let Some(texture) = &self.texture {
            material = material.with_texture(texture.build());
        }
        Ok(material.validate()?)
    }
}

/// One primitive: a registry type name, its numeric parameters, a material
/// and optional rigid transforms applied after construction.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSettings {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: HashMap<String, f64>,
    #[serde(default)]
    pub material: MaterialSettings,
    /// Degrees about X, then Y, then Z, applied before `translate`
    #[serde(default)]
    pub rotate: Option<[f64; 3]>,
    #[serde(default)]
    pub translate: Option<[f64; 3]>,
}

impl ObjectSettings {
    fn build(&self, registry: &PrimitiveRegistry) -> Result<lumen_renderer::Primitive> {
        let material = Arc::new(self.material.build()?);
        let mut primitive = registry.create(&self.kind, &self.params, material)?;
        if let Some([x, y, z]) = self.rotate {
            primitive.rotate_x(x);
            primitive.rotate_y(y);
            primitive.rotate_z(z);
        }
        if let Some(offset) = self.translate {
            primitive.translate(vec3(offset));
        }
        Ok(primitive)
    }
}

fn add_demo_objects(scene: &mut Scene, registry: &PrimitiveRegistry) -> Result<()> {
    let demo = r#"[
        {"type": "plane", "params": {"position_y": -1.0},
         "material": {"texture": {"type": "chessboard", "color1": [0.9, 0.9, 0.9], "color2": [0.2, 0.2, 0.2], "scale": 8.0}}},
        {"type": "sphere", "params": {"center_x": -2.2, "radius": 1.0},
         "material": {"color": [0.9, 0.3, 0.3], "reflectivity": 0.4}},
        {"type": "sphere", "params": {"center_z": 1.5, "radius": 0.8},
         "material": {"color": [1.0, 1.0, 1.0], "transparency": 0.9, "refraction_index": 1.5}},
        {"type": "box", "params": {"size_x": 1.4, "size_y": 1.4, "size_z": 1.4},
         "material": {"color": [0.3, 0.5, 0.9]}, "rotate": [0.0, 30.0, 0.0], "translate": [2.2, 0.0, 0.0]},
        {"type": "torus", "params": {"major_radius": 0.7, "minor_radius": 0.2},
         "material": {"color": [0.9, 0.8, 0.2]}, "rotate": [60.0, 0.0, 0.0], "translate": [0.0, 1.8, 0.0]},
        {"type": "mandelbulb", "params": {"center_z": -3.0, "radius": 1.3},
         "material": {"color": [0.6, 0.9, 0.6]}}
    ]"#;
    let objects: Vec<ObjectSettings> = serde_json::from_str(demo).context("Demo scene is malformed")?;
    for object in &objects {
        scene.add_primitive(object.build(registry)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Ray;

    #[test]
    fn test_defaults_build_demo_scene() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!((settings.width, settings.height), (800, 600));
        let scene = settings.build_scene(&PrimitiveRegistry::with_builtins()).unwrap();
        assert_eq!(scene.primitives().len(), 6);
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn test_objects_lights_and_shaders() {
        let json = r#"{
            "width": 64, "height": 32,
            "render": {"samples_per_pixel": 4, "threads": 2},
            "camera": {"position": [0, 0, 5], "look_at": [0, 0, 0]},
            "lights": [
                {"type": "point", "position": [0, 5, 0], "attenuation": [1, 0.1, 0]},
                {"type": "directional", "direction": [0, -1, 0], "filter": [1, 0, 0]}
            ],
            "shaders": [{"type": "toon", "levels": 4, "edge_threshold": 0.2}],
            "objects": [
                {"type": "sphere", "params": {"radius": 1}, "material": {"color": [0, 1, 0]}},
                {"type": "sphere", "params": {"radius": 0.5}, "translate": [3, 0, 0]}
            ]
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.render.samples_per_pixel, 4);
        assert_eq!(settings.render.threads, Some(2));

        let scene = settings.build_scene(&PrimitiveRegistry::with_builtins()).unwrap();
        assert_eq!(scene.primitives().len(), 2);
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.shaders().len(), 1);
        assert_eq!(scene.image_width(), 64);

        let hit = scene.trace(&Ray::new(Vec3::new(3.0, 5.0, 0.0), Vec3::NEG_Y)).unwrap();
        assert!((hit.distance - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_material_is_reported() {
        let json = r#"{"objects": [{"type": "sphere", "params": {"radius": 1}, "material": {"reflectivity": 2}}]}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        let err = settings.build_scene(&PrimitiveRegistry::with_builtins()).unwrap_err();
        assert!(format!("{err:#}").contains("reflectivity"));
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let json = r#"{"objects": [{"type": "teapot"}]}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        let err = settings.build_scene(&PrimitiveRegistry::with_builtins()).unwrap_err();
        assert!(format!("{err:#}").contains("teapot"));
    }
}
