//! Surface materials and their sampling contract.

use lumen_math::{Vec2, Vec3};
use thiserror::Error;

use crate::maps::{AmbientOcclusionMap, DisplacementMap, NormalMap, SpecularMap};
use crate::texture::Texture;

/// Color type alias (linear RGB, usually 0-1 but not clamped).
pub type Color = Vec3;

/// Specular factor used when a material has no specular map.
pub const DEFAULT_SPECULAR: f64 = 0.5;

/// Errors raised while building a material.
#[derive(Error, Debug, PartialEq)]
pub enum MaterialError {
    #[error("reflectivity must be in [0, 1], got {0}")]
    Reflectivity(f64),

    #[error("transparency must be in [0, 1], got {0}")]
    Transparency(f64),

    #[error("refraction index must be >= 1, got {0}")]
    RefractionIndex(f64),

    #[error("shininess must be non-negative, got {0}")]
    Shininess(f64),
}

pub type MaterialResult<T> = Result<T, MaterialError>;

/// How a surface responds to light.
///
/// Primitives hold materials behind an `Arc` so clones share them.
/// Every map is optional; sampling an absent map yields a neutral default.
#[derive(Clone, Debug)]
pub struct Material {
    pub color: Color,
    pub reflectivity: f64,
    pub transparency: f64,
    pub refraction_index: f64,
    pub shininess: f64,
    pub texture: Option<Texture>,
    pub normal_map: Option<NormalMap>,
    pub displacement_map: Option<DisplacementMap>,
    pub specular_map: Option<SpecularMap>,
    pub ao_map: Option<AmbientOcclusionMap>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::ONE,
            reflectivity: 0.0,
            transparency: 0.0,
            refraction_index: 1.0,
            shininess: 32.0,
            texture: None,
            normal_map: None,
            displacement_map: None,
            specular_map: None,
            ao_map: None,
        }
    }
}

impl Material {
    /// A plain diffuse material of the given color.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    /// Set reflectivity (fraction of the reflected ray blended in).
    pub fn with_reflectivity(mut self, reflectivity: f64) -> Self {
        self.reflectivity = reflectivity;
        self
    }

    /// Set transparency and the index used for refraction.
    pub fn with_transparency(mut self, transparency: f64, refraction_index: f64) -> Self {
        self.transparency = transparency;
        self.refraction_index = refraction_index;
        self
    }

    /// Set the specular exponent.
    pub fn with_shininess(mut self, shininess: f64) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_normal_map(mut self, map: NormalMap) -> Self {
        self.normal_map = Some(map);
        self
    }

    pub fn with_displacement_map(mut self, map: DisplacementMap) -> Self {
        self.displacement_map = Some(map);
        self
    }

    pub fn with_specular_map(mut self, map: SpecularMap) -> Self {
        self.specular_map = Some(map);
        self
    }

    pub fn with_ao_map(mut self, map: AmbientOcclusionMap) -> Self {
        self.ao_map = Some(map);
        self
    }

    /// Check parameter ranges. Call once at scene build time.
    pub fn validate(self) -> MaterialResult<Self> {
        if !(0.0..=1.0).contains(&self.reflectivity) {
            return Err(MaterialError::Reflectivity(self.reflectivity));
        }
        if !(0.0..=1.0).contains(&self.transparency) {
            return Err(MaterialError::Transparency(self.transparency));
        }
        if self.refraction_index.is_nan() || self.refraction_index < 1.0 {
            return Err(MaterialError::RefractionIndex(self.refraction_index));
        }
        if self.shininess.is_nan() || self.shininess < 0.0 {
            return Err(MaterialError::Shininess(self.shininess));
        }
        Ok(self)
    }

    /// Base color, from the texture when present.
    pub fn color_at(&self, uv: Vec2) -> Color {
        match &self.texture {
            Some(texture) => texture.color_at(uv),
            None => self.color,
        }
    }

    /// Shading normal; `base` is returned untouched without a normal map.
    pub fn normal_at(&self, uv: Vec2, base: Vec3) -> Vec3 {
        match &self.normal_map {
            Some(map) => map.perturb(uv, base),
            None => base,
        }
    }

    pub fn displacement_at(&self, uv: Vec2) -> f64 {
        self.displacement_map
            .as_ref()
            .map_or(0.0, |map| map.displacement_at(uv))
    }

    pub fn specular_at(&self, uv: Vec2) -> f64 {
        self.specular_map
            .as_ref()
            .map_or(DEFAULT_SPECULAR, |map| map.specular_at(uv))
    }

    pub fn ambient_occlusion_at(&self, uv: Vec2) -> f64 {
        self.ao_map.as_ref().map_or(1.0, |map| map.occlusion_at(uv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{ChessboardTexture, ImageTexture};
    use std::sync::Arc;

    #[test]
    fn test_defaults_without_maps() {
        let material = Material::new(Color::new(0.2, 0.4, 0.6));
        let uv = Vec2::new(0.3, 0.7);
        let n = Vec3::new(0.0, 0.6, 0.8);

        assert_eq!(material.color_at(uv), Color::new(0.2, 0.4, 0.6));
        assert_eq!(material.normal_at(uv, n), n);
        assert_eq!(material.displacement_at(uv), 0.0);
        assert_eq!(material.specular_at(uv), 0.5);
        assert_eq!(material.ambient_occlusion_at(uv), 1.0);
    }

    #[test]
    fn test_default_is_white_and_opaque() {
        let material = Material::default();
        assert_eq!(material.color, Color::ONE);
        assert_eq!(material.reflectivity, 0.0);
        assert_eq!(material.transparency, 0.0);
        assert_eq!(material.refraction_index, 1.0);
    }

    #[test]
    fn test_texture_overrides_flat_color() {
        let material = Material::new(Color::ZERO)
            .with_texture(Texture::Chessboard(ChessboardTexture::new(Color::X, Color::Y, 1.0)));
        assert_eq!(material.color_at(Vec2::new(0.5, 0.5)), Color::X);
    }

    #[test]
    fn test_specular_map_replaces_default() {
        let gray = Arc::new(ImageTexture::solid_color(Vec3::splat(0.9)));
        let material = Material::default().with_specular_map(SpecularMap::new(gray));
        assert!((material.specular_at(Vec2::ZERO) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(Material::default().with_reflectivity(0.5).validate().is_ok());
        assert_eq!(
            Material::default().with_reflectivity(1.5).validate().unwrap_err(),
            MaterialError::Reflectivity(1.5)
        );
        assert_eq!(
            Material::default().with_transparency(0.5, 0.8).validate().unwrap_err(),
            MaterialError::RefractionIndex(0.8)
        );
        assert_eq!(
            Material::default().with_transparency(-0.1, 1.5).validate().unwrap_err(),
            MaterialError::Transparency(-0.1)
        );
        assert!(Material::default().with_shininess(-1.0).validate().is_err());
    }
}
