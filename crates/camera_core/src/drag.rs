use photo_store::PhotoStore;
use shared::domain::{PhotoId, PhotoPatch, Position};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::DragError;

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    id: PhotoId,
    /// Pointer position minus photo center at grab time.
    offset: Position,
}

/// Moves at most one held photo, keeping the original grab point under the pointer.
pub struct DragController {
    store: PhotoStore,
    active: Mutex<Option<ActiveDrag>>,
}

impl DragController {
    pub fn new(store: PhotoStore) -> Self {
        Self {
            store,
            active: Mutex::new(None),
        }
    }

    /// `editing` is the photo currently in caption edit mode, if any.
    pub async fn begin_drag(
        &self,
        id: PhotoId,
        pointer: Position,
        editing: Option<PhotoId>,
    ) -> Result<(), DragError> {
        if editing == Some(id) {
            return Err(DragError::PhotoBeingEdited(id));
        }

        let mut active = self.active.lock().await;
        if let Some(current) = *active {
            return Err(DragError::AlreadyDragging(current.id));
        }
        let photo = self.store.get(id).await.ok_or(DragError::UnknownPhoto(id))?;

        *active = Some(ActiveDrag {
            id,
            offset: pointer - photo.position(),
        });
        debug!(photo_id = %id, "drag: started");
        Ok(())
    }

    /// Returns whether a position update was applied.
    pub async fn on_pointer_move(&self, pointer: Position) -> bool {
        let mut active = self.active.lock().await;
        let Some(drag) = *active else {
            return false;
        };

        let applied = self
            .store
            .update_by_id(drag.id, PhotoPatch::position(pointer - drag.offset))
            .await;
        if !applied {
            debug!(photo_id = %drag.id, "drag: held photo disappeared, releasing");
            *active = None;
        }
        applied
    }

    /// Returns the photo that was being dragged, if any.
    pub async fn end_drag(&self) -> Option<PhotoId> {
        let released = self.active.lock().await.take().map(|drag| drag.id);
        if let Some(id) = released {
            debug!(photo_id = %id, "drag: ended");
        }
        released
    }

    /// Ends the drag only if it holds `id`.
    pub async fn release(&self, id: PhotoId) -> bool {
        let mut active = self.active.lock().await;
        if active.is_some_and(|drag| drag.id == id) {
            *active = None;
            return true;
        }
        false
    }

    pub async fn dragging(&self) -> Option<PhotoId> {
        self.active.lock().await.map(|drag| drag.id)
    }
}

#[cfg(test)]
#[path = "tests/drag_tests.rs"]
mod tests;
