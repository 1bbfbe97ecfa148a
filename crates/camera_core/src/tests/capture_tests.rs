use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use futures::FutureExt;
use shared::domain::{Caption, Position};

use crate::{
    audio::SilentAudioCue,
    frame::{
        FrameSource, MissingFrameSourceProvider, StillFrameSource, PORTRAIT_HEIGHT,
        PORTRAIT_WIDTH,
    },
    test_support::{caption_for, caption_service, GatedBackend, ReadyProvider},
};

fn controller(store: &PhotoStore, backend: Arc<GatedBackend>) -> CaptureController {
    controller_with_audio(store, backend, Arc::new(SilentAudioCue))
}

fn controller_with_audio(
    store: &PhotoStore,
    backend: Arc<GatedBackend>,
    audio: Arc<dyn AudioCue>,
) -> CaptureController {
    CaptureController::new(
        store.clone(),
        Arc::new(caption_service(backend)),
        audio,
        Locale::default(),
        ViewportSize::new(800.0, 600.0),
    )
}

#[derive(Default)]
struct CountingCue {
    plays: AtomicUsize,
}

impl AudioCue for CountingCue {
    fn play_shutter(&self) -> anyhow::Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct BrokenSpeaker;

impl AudioCue for BrokenSpeaker {
    fn play_shutter(&self) -> anyhow::Result<()> {
        Err(anyhow!("no audio device"))
    }
}

#[tokio::test]
async fn capture_without_source_is_rejected() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open());

    assert!(matches!(capture.capture().await, Err(CaptureError::NoSource)));
    assert!(!capture.can_capture().await);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn failed_acquisition_keeps_capture_disabled() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open());

    let err = capture
        .attach_source(&MissingFrameSourceProvider)
        .await
        .expect_err("acquire should fail");
    assert!(matches!(err, CaptureError::SourceUnavailable { .. }));
    assert!(!capture.can_capture().await);
    assert!(matches!(capture.capture().await, Err(CaptureError::NoSource)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn capture_creates_developing_photo_that_later_develops() {
    let store = PhotoStore::new();
    let backend = GatedBackend::closed();
    let capture = controller(&store, backend.clone());
    capture.attach_source(&ReadyProvider).await.expect("attach");

    let captured = capture.capture().await.expect("capture");

    let photos = store.list().await;
    assert_eq!(photos.len(), 1);
    let photo = &photos[0];
    assert_eq!(photo.id(), captured.id);
    assert!(photo.is_developing());
    assert_eq!(photo.caption(), &Caption::Pending);
    assert_eq!(photo.position(), Position::new(400.0, 300.0));
    assert_eq!(
        (photo.image().width(), photo.image().height()),
        (PORTRAIT_WIDTH, PORTRAIT_HEIGHT)
    );
    assert!(!photo.captured_at().is_empty());

    backend.release(1);
    captured.caption_task.await.expect("caption task");

    let photo = store.get(captured.id).await.expect("photo");
    assert!(!photo.is_developing());
    assert_eq!(photo.caption().text(), Some(caption_for(PORTRAIT_WIDTH).as_str()));
}

#[tokio::test(start_paused = true)]
async fn second_capture_inside_eject_window_is_rejected() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open());
    capture.attach_source(&ReadyProvider).await.expect("attach");

    capture.capture().await.expect("first capture");
    assert!(capture.is_ejecting().await);
    assert!(matches!(capture.capture().await, Err(CaptureError::Ejecting)));
    assert_eq!(store.len().await, 1);

    tokio::time::sleep(EJECT_WINDOW + Duration::from_millis(10)).await;
    assert!(!capture.is_ejecting().await);
    capture.capture().await.expect("capture after window");
    assert_eq!(store.len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn eject_window_closes_before_caption_resolves() {
    let store = PhotoStore::new();
    let backend = GatedBackend::closed();
    let capture = controller(&store, backend.clone());
    capture.attach_source(&ReadyProvider).await.expect("attach");

    let captured = capture.capture().await.expect("capture");
    tokio::time::sleep(EJECT_WINDOW + Duration::from_millis(10)).await;

    assert!(!capture.is_ejecting().await);
    let photo = store.get(captured.id).await.expect("photo");
    assert!(photo.is_developing());
    assert!(photo.caption().is_pending());

    backend.release(1);
    captured.caption_task.await.expect("caption task");
    assert!(!store.get(captured.id).await.expect("photo").is_developing());
}

#[tokio::test]
async fn caption_arriving_after_delete_is_dropped() {
    let store = PhotoStore::new();
    let backend = GatedBackend::closed();
    let capture = controller(&store, backend.clone());
    capture.attach_source(&ReadyProvider).await.expect("attach");

    let captured = capture.capture().await.expect("capture");
    assert!(store.remove(captured.id).await);

    backend.release(1);
    captured.caption_task.await.expect("caption task");

    assert!(store.get(captured.id).await.is_none());
    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn overlapping_caption_requests_resolve_independently() {
    let store = PhotoStore::new();
    let backend = GatedBackend::closed();
    let capture = controller(&store, backend.clone());
    capture.attach_source(&ReadyProvider).await.expect("attach");

    let first = capture.capture().await.expect("first");
    tokio::time::sleep(EJECT_WINDOW + Duration::from_millis(10)).await;
    let second = capture.capture().await.expect("second");
    assert_ne!(first.id, second.id);

    backend.release(2);
    first.caption_task.await.expect("first caption");
    second.caption_task.await.expect("second caption");

    for photo in store.list().await {
        assert!(!photo.is_developing());
        assert!(!photo.caption().is_pending());
    }
    let order: Vec<_> = store.list().await.iter().map(|photo| photo.id()).collect();
    assert_eq!(order, vec![first.id, second.id]);
}

#[tokio::test]
async fn new_photos_use_current_viewport_center() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open()).with_eject_window(Duration::ZERO);
    capture.attach_source(&ReadyProvider).await.expect("attach");
    capture.set_viewport(ViewportSize::new(1000.0, 500.0)).await;

    let captured = capture.capture().await.expect("capture");
    let photo = store.get(captured.id).await.expect("photo");
    assert_eq!(photo.position(), Position::new(500.0, 250.0));
}

#[tokio::test]
async fn shutter_plays_once_per_accepted_capture() {
    let store = PhotoStore::new();
    let cue = Arc::new(CountingCue::default());
    let capture = controller_with_audio(&store, GatedBackend::open(), cue.clone());
    capture.attach_source(&ReadyProvider).await.expect("attach");

    capture.capture().await.expect("capture");
    let _ = capture.capture().await;
    assert_eq!(cue.plays.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn broken_audio_does_not_block_capture() {
    let store = PhotoStore::new();
    let capture = controller_with_audio(&store, GatedBackend::open(), Arc::new(BrokenSpeaker));
    capture.attach_source(&ReadyProvider).await.expect("attach");

    capture.capture().await.expect("capture");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn detaching_source_disables_capture() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open());
    capture.attach_source(&ReadyProvider).await.expect("attach");
    assert!(capture.can_capture().await);

    capture.detach_source().await;
    assert!(matches!(capture.capture().await, Err(CaptureError::NoSource)));
}

struct LargeProvider;

#[async_trait::async_trait]
impl FrameSourceProvider for LargeProvider {
    async fn acquire(&self) -> anyhow::Result<Arc<dyn FrameSource>> {
        Ok(Arc::new(StillFrameSource::new(image::RgbaImage::from_pixel(
            4000,
            3000,
            image::Rgba([10, 20, 30, 255]),
        ))))
    }
}

#[tokio::test]
async fn frame_encoding_does_not_run_inside_the_caller_poll() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open());
    capture.attach_source(&LargeProvider).await.expect("attach");

    let mut pending = Box::pin(capture.capture());
    assert!((&mut pending).now_or_never().is_none());

    // The slot is already claimed while the still is encoding.
    assert!(capture.is_ejecting().await);
    assert!(matches!(capture.capture().await, Err(CaptureError::Ejecting)));
    assert!(store.is_empty().await);

    let captured = pending.await.expect("capture");
    assert_eq!(store.len().await, 1);
    assert!(store.contains(captured.id).await);
}

struct BrokenSource;

impl FrameSource for BrokenSource {
    fn current_frame(&self) -> anyhow::Result<image::RgbaImage> {
        Err(anyhow!("sensor glitch"))
    }
}

struct BrokenProvider;

#[async_trait::async_trait]
impl FrameSourceProvider for BrokenProvider {
    async fn acquire(&self) -> anyhow::Result<Arc<dyn FrameSource>> {
        Ok(Arc::new(BrokenSource))
    }
}

#[tokio::test]
async fn failed_grab_frees_the_capture_slot() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open());
    capture.attach_source(&BrokenProvider).await.expect("attach");

    assert!(matches!(
        capture.capture().await,
        Err(CaptureError::FrameGrab { .. })
    ));
    assert!(!capture.is_ejecting().await);
    assert!(capture.can_capture().await);
    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn wait_until_ready_sleeps_out_the_eject_window() {
    let store = PhotoStore::new();
    let capture = controller(&store, GatedBackend::open());
    capture.attach_source(&ReadyProvider).await.expect("attach");

    capture.wait_until_ready().await;
    capture.capture().await.expect("first capture");
    let started = tokio::time::Instant::now();
    capture.wait_until_ready().await;

    assert!(started.elapsed() >= EJECT_WINDOW);
    assert!(!capture.is_ejecting().await);
    capture.capture().await.expect("second capture");
    assert_eq!(store.len().await, 2);
}
