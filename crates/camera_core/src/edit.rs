use std::sync::Arc;

use caption_service::CaptionService;
use photo_store::PhotoStore;
use shared::domain::{Caption, PhotoId, PhotoPatch};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

use crate::error::EditError;

#[derive(Debug, Clone)]
struct EditSession {
    id: PhotoId,
    draft: String,
}

/// Single-slot caption editor plus on-demand caption regeneration.
pub struct CaptionEditController {
    store: PhotoStore,
    captions: Arc<CaptionService>,
    session: Mutex<Option<EditSession>>,
}

impl CaptionEditController {
    pub fn new(store: PhotoStore, captions: Arc<CaptionService>) -> Self {
        Self {
            store,
            captions,
            session: Mutex::new(None),
        }
    }

    /// Starts editing `id`. An open session for another photo is dropped
    /// without saving; its id is returned.
    pub async fn begin_edit(
        &self,
        id: PhotoId,
        current_caption: impl Into<String>,
    ) -> Option<PhotoId> {
        let previous = self.session.lock().await.replace(EditSession {
            id,
            draft: current_caption.into(),
        });
        let discarded = previous.map(|session| session.id).filter(|prev| *prev != id);
        if let Some(prev) = discarded {
            debug!(photo_id = %prev, "edit: unsaved draft discarded");
        }
        debug!(photo_id = %id, "edit: started");
        discarded
    }

    /// Returns false when no edit is open.
    pub async fn update_draft(&self, text: impl Into<String>) -> bool {
        match self.session.lock().await.as_mut() {
            Some(session) => {
                session.draft = text.into();
                true
            }
            None => false,
        }
    }

    /// Writes the draft as the caption. Returns the edited id, if an edit was open.
    pub async fn commit(&self) -> Option<PhotoId> {
        let session = self.session.lock().await.take()?;
        let applied = self
            .store
            .update_by_id(session.id, PhotoPatch::caption(Caption::Ready(session.draft)))
            .await;
        info!(photo_id = %session.id, applied, "edit: caption committed");
        Some(session.id)
    }

    pub async fn cancel(&self) -> Option<PhotoId> {
        let id = self.session.lock().await.take().map(|session| session.id);
        if let Some(id) = id {
            debug!(photo_id = %id, "edit: cancelled");
        }
        id
    }

    /// Drops the session only if it targets `id`.
    pub async fn discard(&self, id: PhotoId) -> bool {
        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(|s| s.id == id) {
            *session = None;
            return true;
        }
        false
    }

    pub async fn editing(&self) -> Option<PhotoId> {
        self.session.lock().await.as_ref().map(|session| session.id)
    }

    pub async fn draft(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.draft.clone())
    }

    /// Requests a fresh caption for a developed photo. The result is applied
    /// by id, so it is dropped if the photo is deleted first.
    pub async fn regenerate(&self, id: PhotoId) -> Result<JoinHandle<()>, EditError> {
        let photo = self.store.get(id).await.ok_or(EditError::UnknownPhoto(id))?;
        if photo.is_developing() {
            return Err(EditError::StillDeveloping(id));
        }
        if !self
            .store
            .update_by_id(id, PhotoPatch::caption(Caption::Pending))
            .await
        {
            return Err(EditError::UnknownPhoto(id));
        }
        info!(photo_id = %id, "edit: caption regeneration started");

        let store = self.store.clone();
        let captions = Arc::clone(&self.captions);
        let image = photo.image().clone();
        Ok(tokio::spawn(async move {
            let caption = captions.generate(&image).await;
            let applied = store
                .update_by_id(id, PhotoPatch::caption(Caption::Ready(caption)))
                .await;
            info!(photo_id = %id, applied, "edit: regenerated caption resolved");
        }))
    }
}

#[cfg(test)]
#[path = "tests/edit_tests.rs"]
mod tests;
