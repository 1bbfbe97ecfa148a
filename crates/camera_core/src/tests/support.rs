use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use caption_service::{CaptionBackend, CaptionRequest, CaptionService};
use image::{Rgba, RgbaImage};
use shared::{
    domain::{Photo, PhotoId, PhotoImage, PhotoPatch, Position},
    locale::Locale,
};
use tokio::sync::Semaphore;

use crate::frame::{FrameSource, FrameSourceProvider, StillFrameSource};

/// Caption backend that answers only once a permit is released.
/// Captions are `caption for <width>px`, so results can be traced to their photo.
pub(crate) struct GatedBackend {
    gate: Semaphore,
}

impl GatedBackend {
    pub(crate) fn closed() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
        })
    }

    pub(crate) fn open() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
        })
    }

    pub(crate) fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }
}

#[async_trait]
impl CaptionBackend for GatedBackend {
    async fn caption(&self, request: &CaptionRequest) -> Result<String> {
        self.gate.acquire().await?.forget();
        Ok(caption_for(request.image.width()))
    }
}

pub(crate) fn caption_for(width: u32) -> String {
    format!("caption for {width}px")
}

pub(crate) fn caption_service(backend: Arc<GatedBackend>) -> CaptionService {
    CaptionService::new(backend, &Locale::default())
}

pub(crate) fn frame_source() -> Arc<dyn FrameSource> {
    Arc::new(StillFrameSource::new(RgbaImage::from_pixel(
        640,
        480,
        Rgba([200, 120, 80, 255]),
    )))
}

pub(crate) struct ReadyProvider;

#[async_trait]
impl FrameSourceProvider for ReadyProvider {
    async fn acquire(&self) -> Result<Arc<dyn FrameSource>> {
        Ok(frame_source())
    }
}

/// A stored-ready photo with a recognizable image width.
pub(crate) fn developed_photo(width: u32, caption: &str, position: Position) -> Photo {
    let mut photo = Photo::developing(
        PhotoId::generate(),
        PhotoImage::from_jpeg(vec![0xff, 0xd8, 0xff, 0xd9], width, 640),
        "Oct 19, 2026 10:00",
        position,
    );
    photo.apply(&PhotoPatch::developed(caption));
    photo
}
