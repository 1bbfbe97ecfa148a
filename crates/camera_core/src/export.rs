//! Instant-print rendering and PNG export.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use shared::domain::{Photo, PhotoId, PhotoImage};
use tracing::info;

const PRINT_PAPER: Rgba<u8> = Rgba([250, 247, 238, 255]);
/// Side border as a fraction of the photo width; the bottom strip is four times thicker.
const BORDER_DIVISOR: u32 = 16;
const BOTTOM_BORDER_FACTOR: u32 = 4;

pub fn export_file_name(id: PhotoId) -> String {
    format!("retro-photo-{id}.png")
}

/// Places the still on instant-film paper with a thick bottom strip.
///
/// The strip is left blank. No font rasterizer is linked, so the caption and
/// capture time are not drawn; they stay available from the stored `Photo`.
pub fn render_instant_print(image: &PhotoImage) -> Result<RgbaImage> {
    let still = image::load_from_memory_with_format(image.jpeg_bytes(), ImageFormat::Jpeg)
        .context("failed to decode captured still")?
        .to_rgba8();
    let (width, height) = still.dimensions();
    let border = (width / BORDER_DIVISOR).max(1);
    let bottom = border * BOTTOM_BORDER_FACTOR;

    let mut print = RgbaImage::from_pixel(width + border * 2, height + border + bottom, PRINT_PAPER);
    imageops::overlay(&mut print, &still, i64::from(border), i64::from(border));
    Ok(print)
}

/// Writes a downloadable print of a photo and returns where it went.
///
/// [`PngFileExporter`] renders only the framed image (see
/// [`render_instant_print`]); caption text is not part of the file.
#[async_trait]
pub trait PhotoExporter: Send + Sync {
    async fn export(&self, photo: &Photo) -> Result<PathBuf>;
}

pub struct PngFileExporter {
    dir: PathBuf,
}

impl PngFileExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl PhotoExporter for PngFileExporter {
    async fn export(&self, photo: &Photo) -> Result<PathBuf> {
        let dir = self.dir.clone();
        let path = dir.join(export_file_name(photo.id()));
        let image = photo.image().clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create export dir '{}'", dir.display()))?;
            let print = render_instant_print(&image)?;
            print
                .save_with_format(&target, ImageFormat::Png)
                .with_context(|| format!("failed to write '{}'", target.display()))?;
            Ok(())
        })
        .await
        .context("export task failed")??;

        info!(photo_id = %photo.id(), path = %path.display(), "export: photo saved");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
