//! Surface detail maps: normal, displacement, specular and ambient occlusion.
//!
//! Each map wraps an [`ImageTexture`] holding raw (non color managed) data.

use std::sync::Arc;

use lumen_math::{Vec2, Vec3, Vec3Ext};

use crate::texture::ImageTexture;

/// Tangent-space normal map.
#[derive(Clone, Debug)]
pub struct NormalMap {
    pub image: Arc<ImageTexture>,
    /// 0 leaves the surface flat, 1 uses the map as authored.
    pub strength: f64,
}

impl NormalMap {
    pub fn new(image: Arc<ImageTexture>, strength: f64) -> Self {
        Self { image, strength }
    }

    /// Decoded tangent-space normal at `uv`.
    pub fn tangent_normal_at(&self, uv: Vec2) -> Vec3 {
        let mut n = self.image.sample(uv) * 2.0 - Vec3::ONE;
        n.z = n.z.max(0.1);
        if self.strength != 1.0 {
            n = Vec3::Z * (1.0 - self.strength) + n * self.strength;
        }
        n.normalized()
    }

    /// Perturb `base` (unit, world space) by the map.
    pub fn perturb(&self, uv: Vec2, base: Vec3) -> Vec3 {
        let t = self.tangent_normal_at(uv);
        let (tangent, bitangent) = tangent_frame(base);
        (tangent * t.x + bitangent * t.y + base * t.z).normalized()
    }
}

/// An orthonormal tangent/bitangent pair around `n`.
fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let helper = if n.y.abs() < 0.999 { Vec3::Y } else { Vec3::X };
    let tangent = helper.cross(n).normalized();
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}

/// Height map; only sampled, never used to move geometry.
#[derive(Clone, Debug)]
pub struct DisplacementMap {
    pub image: Arc<ImageTexture>,
    pub strength: f64,
}

impl DisplacementMap {
    pub fn new(image: Arc<ImageTexture>, strength: f64) -> Self {
        Self { image, strength }
    }

    pub fn displacement_at(&self, uv: Vec2) -> f64 {
        // Contrast curve
        self.image.sample_scalar(uv).clamp(0.0, 1.0).powf(0.7) * self.strength
    }
}

/// Per-texel specular intensity.
#[derive(Clone, Debug)]
pub struct SpecularMap {
    pub image: Arc<ImageTexture>,
    pub intensity: f64,
}

impl SpecularMap {
    pub fn new(image: Arc<ImageTexture>) -> Self {
        Self { image, intensity: 1.0 }
    }

    pub fn specular_at(&self, uv: Vec2) -> f64 {
        self.image.sample_scalar(uv) * self.intensity
    }
}

/// Baked ambient occlusion; white means unoccluded.
#[derive(Clone, Debug)]
pub struct AmbientOcclusionMap {
    pub image: Arc<ImageTexture>,
    pub strength: f64,
}

impl AmbientOcclusionMap {
    pub fn new(image: Arc<ImageTexture>, strength: f64) -> Self {
        Self { image, strength }
    }

    pub fn occlusion_at(&self, uv: Vec2) -> f64 {
        let ao = self.image.sample_scalar(uv).clamp(0.0, 1.0);
        (1.0 - self.strength * (1.0 - ao)).clamp(0.0, 1.0)
    }
}
