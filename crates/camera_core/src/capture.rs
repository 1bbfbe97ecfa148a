use std::{pin::pin, sync::Arc, time::Duration};

use anyhow::Context;

use caption_service::CaptionService;
use chrono::Local;
use photo_store::PhotoStore;
use shared::{
    domain::{Photo, PhotoId, PhotoPatch, ViewportSize},
    locale::Locale,
};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    audio::AudioCue,
    error::CaptureError,
    frame::{grab_portrait_still, FrameSource, FrameSourceProvider},
};

pub const EJECT_WINDOW: Duration = Duration::from_millis(1000);

/// Handle to the caption task of a fresh capture. Dropping it does not cancel the task.
pub struct CapturedPhoto {
    pub id: PhotoId,
    pub caption_task: JoinHandle<()>,
}

struct CaptureState {
    source: Option<Arc<dyn FrameSource>>,
    viewport: ViewportSize,
    ejecting: bool,
}

pub struct CaptureController {
    store: PhotoStore,
    captions: Arc<CaptionService>,
    audio: Arc<dyn AudioCue>,
    locale: Locale,
    eject_window: Duration,
    state: Arc<Mutex<CaptureState>>,
    ready: Arc<Notify>,
}

impl CaptureController {
    pub fn new(
        store: PhotoStore,
        captions: Arc<CaptionService>,
        audio: Arc<dyn AudioCue>,
        locale: Locale,
        viewport: ViewportSize,
    ) -> Self {
        Self {
            store,
            captions,
            audio,
            locale,
            eject_window: EJECT_WINDOW,
            state: Arc::new(Mutex::new(CaptureState {
                source: None,
                viewport,
                ejecting: false,
            })),
            ready: Arc::new(Notify::new()),
        }
    }

    pub fn with_eject_window(mut self, eject_window: Duration) -> Self {
        self.eject_window = eject_window;
        self
    }

    /// Acquires a frame source. On failure capture stays disabled.
    pub async fn attach_source(
        &self,
        provider: &dyn FrameSourceProvider,
    ) -> Result<(), CaptureError> {
        match provider.acquire().await {
            Ok(source) => {
                self.state.lock().await.source = Some(source);
                info!("capture: frame source attached");
                Ok(())
            }
            Err(source) => {
                self.state.lock().await.source = None;
                warn!("capture: frame source unavailable, capture disabled: {source:#}");
                Err(CaptureError::SourceUnavailable { source })
            }
        }
    }

    pub async fn detach_source(&self) {
        self.state.lock().await.source = None;
    }

    pub async fn set_viewport(&self, viewport: ViewportSize) {
        self.state.lock().await.viewport = viewport;
    }

    pub async fn is_ejecting(&self) -> bool {
        self.state.lock().await.ejecting
    }

    pub async fn can_capture(&self) -> bool {
        let state = self.state.lock().await;
        state.source.is_some() && !state.ejecting
    }

    /// Waits until the eject window of the last capture has closed.
    pub async fn wait_until_ready(&self) {
        loop {
            let mut notified = pin!(self.ready.notified());
            notified.as_mut().enable();
            if !self.state.lock().await.ejecting {
                return;
            }
            notified.await;
        }
    }

    pub async fn capture(&self) -> Result<CapturedPhoto, CaptureError> {
        // The slot is claimed before grabbing so a second capture is rejected
        // while the first one is still encoding.
        let (source, position) = {
            let mut state = self.state.lock().await;
            let source = state.source.clone().ok_or(CaptureError::NoSource)?;
            if state.ejecting {
                debug!("capture: rejected while previous photo is ejecting");
                return Err(CaptureError::Ejecting);
            }
            state.ejecting = true;
            (source, state.viewport.center())
        };

        let grabbed = tokio::task::spawn_blocking(move || grab_portrait_still(source.as_ref()))
            .await
            .context("frame grab task failed")
            .and_then(|grab| grab);
        let image = match grabbed {
            Ok(image) => image,
            Err(source) => {
                self.release_slot().await;
                return Err(CaptureError::FrameGrab { source });
            }
        };

        let photo = Photo::developing(
            PhotoId::generate(),
            image,
            self.locale.format_timestamp(&Local::now()),
            position,
        );
        if let Err(err) = self.store.insert(photo.clone()).await {
            self.release_slot().await;
            return Err(err.into());
        }

        let id = photo.id();
        info!(photo_id = %id, "capture: photo ejecting");
        if let Err(err) = self.audio.play_shutter() {
            debug!("capture: shutter sound failed: {err:#}");
        }
        if self.eject_window.is_zero() {
            self.release_slot().await;
        } else {
            self.spawn_eject_timer();
        }

        let store = self.store.clone();
        let captions = Arc::clone(&self.captions);
        let image = photo.image().clone();
        let caption_task = tokio::spawn(async move {
            let caption = captions.generate(&image).await;
            if store.update_by_id(id, PhotoPatch::developed(caption)).await {
                info!(photo_id = %id, "capture: photo developed");
            } else {
                info!(photo_id = %id, "capture: caption resolved after photo was deleted");
            }
        });

        Ok(CapturedPhoto { id, caption_task })
    }

    async fn release_slot(&self) {
        self.state.lock().await.ejecting = false;
        self.ready.notify_waiters();
    }

    fn spawn_eject_timer(&self) {
        let state = Arc::clone(&self.state);
        let ready = Arc::clone(&self.ready);
        let window = self.eject_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            state.lock().await.ejecting = false;
            ready.notify_waiters();
            debug!("capture: eject window closed");
        });
    }
}

#[cfg(test)]
#[path = "tests/capture_tests.rs"]
mod tests;
