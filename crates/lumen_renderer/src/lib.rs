//! Lumen Renderer - primitives, shading and tiled CPU rendering.
//!
//! - **Primitives**: a closed [`Primitive`] enum over analytic and ray-marched
//!   shapes, plus [`CustomPrimitive`] for shapes defined elsewhere
//! - **Registry**: [`PrimitiveRegistry`] builds primitives from named
//!   parameter sets
//! - **Scene**: closest-hit queries, shadow tests and recursive Whitted-style
//!   shading
//! - **Renderer**: tiles claimed from an atomic counter by scoped worker
//!   threads, optional supersampling and post-processing

mod composite;
mod cone;
mod cuboid;
mod cylinder;
mod fractal;
mod hittable;
mod klein_bottle;
mod mobius;
mod plane;
mod primitive;
mod registry;
mod renderer;
mod scene;
mod sphere;
mod tangle_cube;
mod tile;
mod torus;
mod triangle;

pub use composite::{Composite, Decorated};
pub use cone::{Cone, InfiniteCone};
pub use cuboid::Cuboid;
pub use cylinder::{Cylinder, InfiniteCylinder};
pub use fractal::{Fractal, FractalKind};
pub use hittable::{HitInfo, SurfaceHit};
pub use klein_bottle::KleinBottle;
pub use mobius::MobiusStrip;
pub use plane::Plane;
pub use primitive::{CustomPrimitive, GeometryError, GeometryResult, Primitive, Shape};
pub use registry::{Params, PrimitiveFactory, PrimitiveRegistry, RegistryError, RegistryResult};
pub use renderer::{
    pixel_uv, supersample_ray, FrameBuffer, PostProcess, RenderConfig, Renderer, LOW_RENDER_STRIDE,
};
pub use scene::{Scene, DEFAULT_MAX_DEPTH, SURFACE_BIAS, TRACE_T_MIN};
pub use sphere::Sphere;
pub use tangle_cube::TangleCube;
pub use tile::{generate_tiles, tile_count, Tile, DEFAULT_TILE_SIZE};
pub use torus::Torus;
pub use triangle::Triangle;

/// Re-export the math types callers need to build scenes
pub use lumen_math::{Axis, Interval, Ray, Vec2, Vec3};
