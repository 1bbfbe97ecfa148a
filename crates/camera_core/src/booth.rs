//! The command surface: one entry point per user action, wired to the controllers.

use std::{path::PathBuf, sync::Arc, time::Duration};

use caption_service::CaptionService;
use futures::future::join_all;
use photo_store::PhotoStore;
use shared::{
    domain::{PhotoId, Position, ViewportSize},
    error::{BoothError, ErrorCode},
    locale::Locale,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    audio::AudioCue,
    capture::{CaptureController, EJECT_WINDOW},
    drag::DragController,
    edit::CaptionEditController,
    error::CaptureError,
    export::PhotoExporter,
    frame::FrameSourceProvider,
};

#[derive(Debug, Clone)]
pub struct BoothOptions {
    pub locale: Locale,
    pub viewport: ViewportSize,
    pub eject_window: Duration,
}

impl Default for BoothOptions {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            viewport: ViewportSize::new(1280.0, 800.0),
            eject_window: EJECT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter { shift: bool },
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoothCommand {
    Capture,
    BeginDrag { id: PhotoId, pointer: Position },
    PointerMove { pointer: Position },
    EndDrag,
    Hover { id: Option<PhotoId> },
    Download { id: PhotoId },
    Delete { id: PhotoId },
    BeginEdit { id: PhotoId },
    UpdateDraft { text: String },
    EditKey(EditKey),
    Regenerate { id: PhotoId },
    Resize(ViewportSize),
}

impl BoothCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BoothCommand::Capture => "capture",
            BoothCommand::BeginDrag { .. } => "begin_drag",
            BoothCommand::PointerMove { .. } => "pointer_move",
            BoothCommand::EndDrag => "end_drag",
            BoothCommand::Hover { .. } => "hover",
            BoothCommand::Download { .. } => "download",
            BoothCommand::Delete { .. } => "delete",
            BoothCommand::BeginEdit { .. } => "begin_edit",
            BoothCommand::UpdateDraft { .. } => "update_draft",
            BoothCommand::EditKey(_) => "edit_key",
            BoothCommand::Regenerate { .. } => "regenerate",
            BoothCommand::Resize(_) => "resize",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoothOutcome {
    Captured(PhotoId),
    Moved(bool),
    Released(Option<PhotoId>),
    Exported(Option<PathBuf>),
    Deleted(bool),
    Editing(PhotoId),
    Committed(Option<PhotoId>),
    Cancelled(Option<PhotoId>),
    Regenerating(PhotoId),
    Done,
}

pub struct PhotoBooth {
    store: PhotoStore,
    capture: CaptureController,
    drag: DragController,
    edit: CaptionEditController,
    exporter: Arc<dyn PhotoExporter>,
    hovered: Mutex<Option<PhotoId>>,
    caption_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PhotoBooth {
    pub fn new(
        options: BoothOptions,
        captions: CaptionService,
        exporter: Arc<dyn PhotoExporter>,
        audio: Arc<dyn AudioCue>,
    ) -> Self {
        let store = PhotoStore::new();
        let captions = Arc::new(captions);
        let capture = CaptureController::new(
            store.clone(),
            Arc::clone(&captions),
            audio,
            options.locale,
            options.viewport,
        )
        .with_eject_window(options.eject_window);

        Self {
            drag: DragController::new(store.clone()),
            edit: CaptionEditController::new(store.clone(), captions),
            store,
            capture,
            exporter,
            hovered: Mutex::new(None),
            caption_tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn capture_controller(&self) -> &CaptureController {
        &self.capture
    }

    pub fn drag_controller(&self) -> &DragController {
        &self.drag
    }

    pub fn edit_controller(&self) -> &CaptionEditController {
        &self.edit
    }

    pub async fn attach_source(
        &self,
        provider: &dyn FrameSourceProvider,
    ) -> Result<(), CaptureError> {
        self.capture.attach_source(provider).await
    }

    /// Per-photo controls (download, delete, regenerate) show for the hovered photo.
    pub async fn controls_visible(&self, id: PhotoId) -> bool {
        *self.hovered.lock().await == Some(id)
    }

    /// Waits for every caption request issued so far to resolve.
    pub async fn wait_for_captions(&self) {
        let tasks = std::mem::take(&mut *self.caption_tasks.lock().await);
        for result in join_all(tasks).await {
            if let Err(err) = result {
                warn!("booth: caption task failed: {err}");
            }
        }
    }

    pub async fn dispatch(&self, command: BoothCommand) -> Result<BoothOutcome, BoothError> {
        let name = command.name();
        let outcome = self.handle(command).await;
        match &outcome {
            Ok(outcome) => debug!(command = name, ?outcome, "booth: command handled"),
            Err(err) => info!(command = name, code = ?err.code, "booth: command rejected: {}", err.message),
        }
        outcome
    }

    async fn handle(&self, command: BoothCommand) -> Result<BoothOutcome, BoothError> {
        match command {
            BoothCommand::Capture => {
                let captured = self.capture.capture().await?;
                self.track(captured.caption_task).await;
                Ok(BoothOutcome::Captured(captured.id))
            }
            BoothCommand::BeginDrag { id, pointer } => {
                let editing = self.edit.editing().await;
                self.drag.begin_drag(id, pointer, editing).await?;
                Ok(BoothOutcome::Done)
            }
            BoothCommand::PointerMove { pointer } => {
                Ok(BoothOutcome::Moved(self.drag.on_pointer_move(pointer).await))
            }
            BoothCommand::EndDrag => Ok(BoothOutcome::Released(self.drag.end_drag().await)),
            BoothCommand::Hover { id } => {
                *self.hovered.lock().await = id;
                Ok(BoothOutcome::Done)
            }
            BoothCommand::Download { id } => {
                let photo = self.store.get(id).await.ok_or_else(|| not_found(id))?;
                match self.exporter.export(&photo).await {
                    Ok(path) => Ok(BoothOutcome::Exported(Some(path))),
                    Err(err) => {
                        warn!(photo_id = %id, "booth: export failed: {err:#}");
                        Ok(BoothOutcome::Exported(None))
                    }
                }
            }
            BoothCommand::Delete { id } => {
                let removed = self.store.remove(id).await;
                self.drag.release(id).await;
                self.edit.discard(id).await;
                let mut hovered = self.hovered.lock().await;
                if *hovered == Some(id) {
                    *hovered = None;
                }
                if removed {
                    info!(photo_id = %id, "booth: photo deleted");
                }
                Ok(BoothOutcome::Deleted(removed))
            }
            BoothCommand::BeginEdit { id } => {
                let photo = self.store.get(id).await.ok_or_else(|| not_found(id))?;
                let current = photo.caption().text().unwrap_or_default().to_string();
                self.edit.begin_edit(id, current).await;
                Ok(BoothOutcome::Editing(id))
            }
            BoothCommand::UpdateDraft { text } => {
                if self.edit.update_draft(text).await {
                    Ok(BoothOutcome::Done)
                } else {
                    Err(BoothError::new(ErrorCode::Conflict, "no caption is being edited"))
                }
            }
            BoothCommand::EditKey(EditKey::Enter { shift: true }) => Ok(BoothOutcome::Done),
            BoothCommand::EditKey(EditKey::Enter { shift: false }) => {
                Ok(BoothOutcome::Committed(self.edit.commit().await))
            }
            BoothCommand::EditKey(EditKey::Escape) => {
                Ok(BoothOutcome::Cancelled(self.edit.cancel().await))
            }
            BoothCommand::Regenerate { id } => {
                let task = self.edit.regenerate(id).await?;
                self.track(task).await;
                Ok(BoothOutcome::Regenerating(id))
            }
            BoothCommand::Resize(viewport) => {
                self.capture.set_viewport(viewport).await;
                Ok(BoothOutcome::Done)
            }
        }
    }

    async fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.caption_tasks.lock().await;
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }
}

fn not_found(id: PhotoId) -> BoothError {
    BoothError::new(ErrorCode::NotFound, format!("photo {id} does not exist"))
}

#[cfg(test)]
#[path = "tests/booth_tests.rs"]
mod tests;
