//! `lumen [settings.json] [output.png]`
//!
//! Renders the scene described by a JSON settings file (or the built-in demo
//! scene when no file is given) and writes it as a PNG.

mod settings;

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use image::RgbImage;
use lumen_renderer::{PrimitiveRegistry, Renderer};

use crate::settings::Settings;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut settings = match args.get(1) {
        Some(path) => Settings::load(path.as_ref())?,
        None => {
            log::info!("No settings file given, using defaults");
            Settings::default()
        }
    };
    if let Some(output) = args.get(2) {
        settings.output = PathBuf::from(output);
    }

    let registry = PrimitiveRegistry::with_builtins();
    let scene = settings.build_scene(&registry)?;

    let start = Instant::now();
    let renderer = Renderer::new(settings.render.clone());
    let frame = renderer.render(&scene);

    let image = RgbImage::from_raw(frame.width, frame.height, frame.to_rgb8())
        .context("Frame buffer does not match the image size")?;
    image
        .save(&settings.output)
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;

    log::info!(
        "Wrote {} ({}x{}) in {:.2?}",
        settings.output.display(),
        frame.width,
        frame.height,
        start.elapsed()
    );
    Ok(())
}
