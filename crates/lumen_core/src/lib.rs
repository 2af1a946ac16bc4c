//! Lumen Core - materials, textures, lights and camera.
//!
//! This crate provides everything a surface hit is shaded with:
//!
//! - **Materials**: `Material` and its optional texture and detail maps
//! - **Textures**: in-memory image textures plus chessboard and Perlin noise
//! - **Lights**: point, directional, color-filtered and ambient lights
//! - **Camera**: screen-rectangle pinhole camera
//! - **Shaders**: per-hit color filters (Phong, toon, Fresnel)
//!
//! Geometry and the tracing loop live in `lumen_renderer`.

pub mod camera;
pub mod light;
pub mod maps;
pub mod material;
pub mod shader;
pub mod texture;

// Re-export commonly used types
pub use camera::{Camera, Screen};
pub use light::{AmbientLight, DirectionalLight, Light, PointLight};
pub use maps::{AmbientOcclusionMap, DisplacementMap, NormalMap, SpecularMap};
pub use material::{Color, Material, MaterialError, MaterialResult, DEFAULT_SPECULAR};
pub use shader::Shader;
pub use texture::{
    ChessboardTexture, Filter, ImageTexture, PerlinTexture, Texture, TextureError, TextureResult,
};
