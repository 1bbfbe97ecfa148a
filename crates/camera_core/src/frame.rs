//! Frame sources and the still-grab pipeline (crop to 3:4, resize, JPEG).

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use image::{codecs::jpeg::JpegEncoder, imageops, DynamicImage, RgbaImage};
use shared::domain::PhotoImage;
use tracing::info;

pub const PORTRAIT_WIDTH: u32 = 480;
pub const PORTRAIT_HEIGHT: u32 = 640;
const JPEG_QUALITY: u8 = 85;

pub trait FrameSource: Send + Sync {
    fn current_frame(&self) -> Result<RgbaImage>;
}

/// Acquires a frame source, e.g. after the user grants camera access.
#[async_trait]
pub trait FrameSourceProvider: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn FrameSource>>;
}

pub struct MissingFrameSourceProvider;

#[async_trait]
impl FrameSourceProvider for MissingFrameSourceProvider {
    async fn acquire(&self) -> Result<Arc<dyn FrameSource>> {
        Err(anyhow!("no camera available"))
    }
}

/// Serves the same decoded image on every grab.
pub struct StillFrameSource {
    frame: RgbaImage,
}

impl StillFrameSource {
    pub fn new(frame: RgbaImage) -> Self {
        Self { frame }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let frame = image::open(path)
            .with_context(|| format!("failed to decode frame image '{}'", path.display()))?
            .to_rgba8();
        Ok(Self::new(frame))
    }
}

impl FrameSource for StillFrameSource {
    fn current_frame(&self) -> Result<RgbaImage> {
        Ok(self.frame.clone())
    }
}

pub struct StillImageProvider {
    path: PathBuf,
}

impl StillImageProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSourceProvider for StillImageProvider {
    async fn acquire(&self) -> Result<Arc<dyn FrameSource>> {
        let path = self.path.clone();
        let source = tokio::task::spawn_blocking(move || StillFrameSource::open(&path))
            .await
            .context("frame decode task failed")??;
        info!(path = %self.path.display(), "frame: still image source ready");
        Ok(Arc::new(source))
    }
}

/// Centered crop rectangle `(x, y, width, height)` with a 3:4 aspect ratio.
pub fn portrait_crop(width: u32, height: u32) -> (u32, u32, u32, u32) {
    let (w, h) = (u64::from(width), u64::from(height));
    if w * 4 > h * 3 {
        let crop_w = h * 3 / 4;
        (((w - crop_w) / 2) as u32, 0, crop_w as u32, height)
    } else {
        let crop_h = w * 4 / 3;
        (0, ((h - crop_h) / 2) as u32, width, crop_h as u32)
    }
}

pub fn grab_portrait_still(source: &dyn FrameSource) -> Result<PhotoImage> {
    let frame = source.current_frame()?;
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("frame source returned an empty frame"));
    }

    let (x, y, crop_w, crop_h) = portrait_crop(width, height);
    if crop_w == 0 || crop_h == 0 {
        return Err(anyhow!("frame {width}x{height} is too small to crop"));
    }
    let cropped = imageops::crop_imm(&frame, x, y, crop_w, crop_h).to_image();
    let resized = imageops::resize(
        &cropped,
        PORTRAIT_WIDTH,
        PORTRAIT_HEIGHT,
        imageops::FilterType::Triangle,
    );
    let rgb = DynamicImage::ImageRgba8(resized).to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(
            rgb.as_raw(),
            PORTRAIT_WIDTH,
            PORTRAIT_HEIGHT,
            image::ColorType::Rgb8.into(),
        )
        .context("jpeg encoding failed")?;

    Ok(PhotoImage::from_jpeg(jpeg, PORTRAIT_WIDTH, PORTRAIT_HEIGHT))
}

#[cfg(test)]
#[path = "tests/frame_tests.rs"]
mod tests;
