//! Tiled multi-threaded renderer.
//!
//! Worker threads claim tiles from a shared atomic counter until none are
//! left, so faster threads simply take more tiles. Each worker returns its
//! finished tiles and the frame is assembled after every thread has joined.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use lumen_core::Color;
use lumen_math::Vec2;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scene::Scene;
use crate::tile::{generate_tiles, Tile, DEFAULT_TILE_SIZE};

/// Low render mode keeps one pixel in this many along each axis.
pub const LOW_RENDER_STRIDE: u32 = 5;

const MIN_THREADS: usize = 2;
const MAX_THREADS: usize = 16;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Tile edge in pixels
    pub tile_size: u32,
    /// Worker count; `None` uses the hardware concurrency clamped to 2..=16
    pub threads: Option<usize>,
    /// Camera rays per pixel
    pub samples_per_pixel: u32,
    /// Interactive preview: only every fifth row and column is traced
    pub low_render: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            threads: None,
            samples_per_pixel: 1,
            low_render: false,
        }
    }
}

impl RenderConfig {
    pub fn thread_count(&self) -> usize {
        match self.threads {
            Some(threads) => threads.max(1),
            None => thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(MIN_THREADS)
                .clamp(MIN_THREADS, MAX_THREADS),
        }
    }
}

/// A whole-frame pass over linear color, run after all tiles are done.
pub trait PostProcess: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, frame: &mut FrameBuffer);
}

/// Linear RGB pixels, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; pixel_count(width, height)],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn write_tile(&mut self, tile: &Tile, colors: &[Color]) {
        for ((x, y), color) in tile.pixels().zip(colors) {
            self.set(x, y, *color);
        }
    }

    /// Tone map to 8-bit RGB: square root of the clamped channel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let width = self.width as usize;
        let mut bytes = vec![0u8; width * self.height as usize * 3];
        if width == 0 {
            return bytes;
        }

        bytes
            .par_chunks_mut(width * 3)
            .zip(self.pixels.par_chunks(width))
            .for_each(|(row_bytes, row)| {
                for (rgb, color) in row_bytes.chunks_exact_mut(3).zip(row) {
                    rgb[0] = quantize(color.x);
                    rgb[1] = quantize(color.y);
                    rgb[2] = quantize(color.z);
                }
            });
        bytes
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

#[inline]
fn quantize(channel: f64) -> u8 {
    (255.999 * channel.clamp(0.0, 1.0).sqrt()) as u8
}

/// Screen coordinates of pixel (x, y); row 0 is the top of the screen.
pub fn pixel_uv(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    let axis = |i: u32, n: u32| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
    Vec2::new(axis(x, width), axis(height - 1 - y, height))
}

/// Average `samples` camera rays spread over one pixel footprint around
/// (u, v).
///
/// Perfect squares use a stratified grid and need no randomness; other
/// counts jitter uniformly with `rng`.
pub fn supersample_ray<R: Rng + ?Sized>(
    scene: &Scene,
    uv: Vec2,
    footprint: Vec2,
    samples: u32,
    rng: &mut R,
) -> Color {
    let samples = samples.max(1);
    let camera = scene.camera();
    let shade = |offset: Vec2| {
        let sample = uv + (offset - Vec2::splat(0.5)) * footprint;
        scene.compute_color(&camera.ray(sample.x, sample.y), 0)
    };

    let side = (samples as f64).sqrt().round() as u32;
    let mut total = Color::ZERO;
    if side * side == samples {
        for j in 0..side {
            for i in 0..side {
                let offset = Vec2::new(i as f64 + 0.5, j as f64 + 0.5) / side as f64;
                total += shade(offset);
            }
        }
    } else {
        for _ in 0..samples {
            total += shade(Vec2::new(rng.gen::<f64>(), rng.gen::<f64>()));
        }
    }
    total / samples as f64
}

/// Renders scenes with a fixed configuration and post-process chain.
#[derive(Default)]
pub struct Renderer {
    config: RenderConfig,
    post_processes: Vec<Box<dyn PostProcess>>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            post_processes: Vec::new(),
        }
    }

    pub fn with_post_process(mut self, pass: impl PostProcess + 'static) -> Self {
        self.post_processes.push(Box::new(pass));
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a fresh frame at the scene's image dimensions.
    pub fn render(&self, scene: &Scene) -> FrameBuffer {
        let mut frame = FrameBuffer::new(scene.image_width(), scene.image_height());
        self.render_into(scene, &mut frame);
        frame
    }

    /// Render over an existing frame.
    ///
    /// Pixels skipped by low render mode keep their previous value. The frame
    /// is resized when the scene dimensions changed.
    pub fn render_into(&self, scene: &Scene, frame: &mut FrameBuffer) {
        let (width, height) = (scene.image_width(), scene.image_height());
        if frame.width != width || frame.height != height {
            *frame = FrameBuffer::new(width, height);
        }

        let tiles = generate_tiles(width, height, self.config.tile_size);
        let threads = self.config.thread_count();
        log::info!(
            "Rendering {}x{}: {} tiles on {} threads, {} spp",
            width,
            height,
            tiles.len(),
            threads,
            self.config.samples_per_pixel
        );
        let start = Instant::now();

        let next_tile = AtomicUsize::new(0);
        let previous = &*frame;
        let finished: Vec<(Tile, Vec<Color>)> = thread::scope(|s| {
            let workers: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        let mut rng = rand::thread_rng();
                        let mut done = Vec::new();
                        loop {
                            let index = next_tile.fetch_add(1, Ordering::Relaxed);
                            let Some(tile) = tiles.get(index) else {
                                break;
                            };
                            done.push((*tile, self.render_tile(scene, tile, previous, &mut rng)));
                        }
                        done
                    })
                })
                .collect();

            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        for (tile, colors) in &finished {
            frame.write_tile(tile, colors);
        }
        self.post_process(frame);

        log::info!("Render finished in {:.2?}", start.elapsed());
    }

    /// Same frame as [`Renderer::render`], traced on the calling thread.
    pub fn render_single_threaded(&self, scene: &Scene) -> FrameBuffer {
        let (width, height) = (scene.image_width(), scene.image_height());
        let mut frame = FrameBuffer::new(width, height);
        let mut rng = rand::thread_rng();

        for tile in generate_tiles(width, height, self.config.tile_size) {
            let colors = self.render_tile(scene, &tile, &frame, &mut rng);
            frame.write_tile(&tile, &colors);
        }
        self.post_process(&mut frame);
        frame
    }

    fn post_process(&self, frame: &mut FrameBuffer) {
        for pass in &self.post_processes {
            log::debug!("Post-process: {}", pass.name());
            pass.process(frame);
        }
    }

    fn render_tile<R: Rng + ?Sized>(
        &self,
        scene: &Scene,
        tile: &Tile,
        previous: &FrameBuffer,
        rng: &mut R,
    ) -> Vec<Color> {
        let mut colors = Vec::with_capacity(tile.pixel_count() as usize);
        for (x, y) in tile.pixels() {
            if self.config.low_render && (x % LOW_RENDER_STRIDE != 0 || y % LOW_RENDER_STRIDE != 0) {
                colors.push(previous.get(x, y));
                continue;
            }
            colors.push(self.render_pixel(scene, x, y, rng));
        }
        colors
    }

    fn render_pixel<R: Rng + ?Sized>(&self, scene: &Scene, x: u32, y: u32, rng: &mut R) -> Color {
        let (width, height) = (scene.image_width(), scene.image_height());
        let uv = pixel_uv(x, y, width, height);

        if self.config.samples_per_pixel <= 1 {
            let ray = scene.camera().ray(uv.x, uv.y);
            return scene.compute_color(&ray, 0);
        }

        let footprint = Vec2::new(
            1.0 / (width.max(2) - 1) as f64,
            1.0 / (height.max(2) - 1) as f64,
        );
        supersample_ray(scene, uv, footprint, self.config.samples_per_pixel, rng)
    }
}
