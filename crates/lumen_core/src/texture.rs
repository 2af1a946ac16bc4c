//! Image textures and the procedural texture family.
//!
//! Image data is held in memory as floating point RGB. Decoding from disk
//! goes through the `image` crate; a file that fails to load can be swapped
//! for a fallback texture so a broken asset never reaches the render loop.

use std::path::Path;
use std::sync::Arc;

use lumen_math::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while building or loading a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture: {0}")]
    LoadError(String),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Texture is {width}x{height} but {len} pixels were supplied")]
    SizeMismatch { width: u32, height: u32, len: usize },

    #[error("Texture dimensions must be non-zero")]
    Empty,
}

pub type TextureResult<T> = Result<T, TextureError>;

/// How an image texture is filtered between texels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    Nearest,
    Bilinear,
}

/// Wrap a texture coordinate into [0, 1).
#[inline]
pub fn wrap_coordinate(coord: f64) -> f64 {
    let wrapped = coord.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// A texture backed by pixel data.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB, row 0 is the top of the image.
    pixels: Vec<[f64; 3]>,
    pub filter: Filter,
}

impl ImageTexture {
    /// Create a texture from floating point pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<[f64; 3]>) -> TextureResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty);
        }
        if pixels.len() != (width as usize) * (height as usize) {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            filter: Filter::Nearest,
        })
    }

    /// Create a texture from 8-bit RGB bytes, each channel mapped to [0, 1].
    pub fn from_rgb8(width: u32, height: u32, bytes: &[u8]) -> TextureResult<Self> {
        let pixels = bytes
            .chunks_exact(3)
            .map(|p| {
                [
                    p[0] as f64 / 255.0,
                    p[1] as f64 / 255.0,
                    p[2] as f64 / 255.0,
                ]
            })
            .collect();
        Self::new(width, height, pixels)
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z]],
            filter: Filter::Nearest,
        }
    }

    /// Builder-style filter selection.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Decode an image file.
    pub fn open(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| {
            TextureError::LoadError(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let texture = Self::from_rgb8(width, height, rgb.as_raw())?;

        log::debug!("Loaded texture: {} ({}x{})", path.display(), width, height);
        Ok(texture)
    }

    /// Decode an image file, substituting `fallback` when it cannot be read.
    pub fn open_or(path: impl AsRef<Path>, fallback: ImageTexture) -> Self {
        match Self::open(path.as_ref()) {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("{}; using fallback texture", e);
                fallback
            }
        }
    }

    /// Red/white 2x2 checker used when a color texture is missing.
    pub fn missing() -> Self {
        let red = [1.0, 0.0, 0.0];
        let white = [1.0, 1.0, 1.0];
        Self {
            width: 2,
            height: 2,
            pixels: vec![red, white, white, red],
            filter: Filter::Nearest,
        }
    }

    /// Sample the texture at UV coordinates.
    ///
    /// UVs wrap, and v = 0 is the bottom row of the image.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let u = wrap_coordinate(uv.x);
        let v = 1.0 - wrap_coordinate(uv.y);

        match self.filter {
            Filter::Nearest => self.nearest(u, v),
            Filter::Bilinear => self.bilinear(u, v),
        }
    }

    /// First channel only (grayscale maps).
    pub fn sample_scalar(&self, uv: Vec2) -> f64 {
        self.sample(uv).x
    }

    fn nearest(&self, u: f64, v: f64) -> Vec3 {
        let x = ((u * self.width as f64) as u32).min(self.width - 1);
        let y = ((v * self.height as f64) as u32).min(self.height - 1);
        self.texel(x, y)
    }

    fn bilinear(&self, u: f64, v: f64) -> Vec3 {
        let x = u * (self.width - 1) as f64;
        let y = v * (self.height - 1) as f64;

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let top = self.texel(x0, y0) * (1.0 - fx) + self.texel(x1, y0) * fx;
        let bottom = self.texel(x0, y1) * (1.0 - fx) + self.texel(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    fn texel(&self, x: u32, y: u32) -> Vec3 {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .unwrap_or(Vec3::ZERO)
    }
}

/// Two-color checker pattern in UV space.
#[derive(Clone, Debug)]
pub struct ChessboardTexture {
    pub color1: Vec3,
    pub color2: Vec3,
    pub scale: f64,
}

impl ChessboardTexture {
    pub fn new(color1: Vec3, color2: Vec3, scale: f64) -> Self {
        Self { color1, color2, scale }
    }

    pub fn color_at(&self, uv: Vec2) -> Vec3 {
        if self.scale <= 0.0 {
            return self.color1;
        }
        let x = (uv.x * self.scale).floor() as i64;
        let y = (uv.y * self.scale).floor() as i64;
        if (x + y).rem_euclid(2) == 0 {
            self.color1
        } else {
            self.color2
        }
    }
}

const PERM_SIZE: usize = 256;

/// Turbulent improved-Perlin noise blended between two colors.
#[derive(Clone, Debug)]
pub struct PerlinTexture {
    pub color1: Vec3,
    pub color2: Vec3,
    pub scale: f64,
    pub persistence: f64,
    pub octaves: u32,
    perm: Vec<usize>,
}

impl PerlinTexture {
    pub fn new(color1: Vec3, color2: Vec3, scale: f64, persistence: f64, octaves: u32, seed: u64) -> Self {
        let mut p: Vec<usize> = (0..PERM_SIZE).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        p.shuffle(&mut rng);

        // Doubled so lookups of index + 1 never wrap
        let perm = p.iter().chain(p.iter()).copied().collect();

        Self {
            color1,
            color2,
            scale,
            persistence,
            octaves: octaves.max(1),
            perm,
        }
    }

    pub fn color_at(&self, uv: Vec2) -> Vec3 {
        let n = self.turbulence(uv.x * self.scale, uv.y * self.scale, 0.0);
        self.color1 * (1.0 - n) + self.color2 * n
    }

    /// Sum of |noise| over octaves, normalised to [0, 1].
    pub fn turbulence(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut freq = 1.0;
        let mut amp = 1.0;
        let mut max_value = 0.0;
        for _ in 0..self.octaves {
            total += self.noise(x * freq, y * freq, z * freq).abs() * amp;
            max_value += amp;
            amp *= self.persistence;
            freq *= 2.0;
        }
        if max_value == 0.0 {
            0.0
        } else {
            total / max_value
        }
    }

    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let xi = (x.floor() as i64 & 255) as usize;
        let yi = (y.floor() as i64 & 255) as usize;
        let zi = (z.floor() as i64 & 255) as usize;
        let x = x - x.floor();
        let y = y - y.floor();
        let z = z - z.floor();
        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let p = &self.perm;
        let a = p[xi] + yi;
        let aa = p[a] + zi;
        let ab = p[a + 1] + zi;
        let b = p[xi + 1] + yi;
        let ba = p[b] + zi;
        let bb = p[b + 1] + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p[aa], x, y, z), grad(p[ba], x - 1.0, y, z)),
                lerp(u, grad(p[ab], x, y - 1.0, z), grad(p[bb], x - 1.0, y - 1.0, z)),
            ),
            lerp(
                v,
                lerp(u, grad(p[aa + 1], x, y, z - 1.0), grad(p[ba + 1], x - 1.0, y, z - 1.0)),
                lerp(
                    u,
                    grad(p[ab + 1], x, y - 1.0, z - 1.0),
                    grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Any surface color source a material can carry.
#[derive(Clone, Debug)]
pub enum Texture {
    Image(Arc<ImageTexture>),
    Chessboard(ChessboardTexture),
    Perlin(PerlinTexture),
}

impl Texture {
    pub fn color_at(&self, uv: Vec2) -> Vec3 {
        match self {
            Texture::Image(image) => image.sample(uv),
            Texture::Chessboard(chess) => chess.color_at(uv),
            Texture::Perlin(perlin) => perlin.color_at(uv),
        }
    }
}
