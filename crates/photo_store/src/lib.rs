use std::sync::Arc;

use shared::domain::{Photo, PhotoId, PhotoPatch};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("photo {0} is already stored")]
    DuplicateId(PhotoId),
}

/// Emitted once per applied mutation, in the order mutations were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Inserted(PhotoId),
    Updated(PhotoId),
    Removed(PhotoId),
}

/// Ordered collection of photos and the only place their fields change.
///
/// Clones share the same underlying collection. Updates and removals that
/// name an absent id are no-ops, which is what makes late caption results
/// harmless after a photo has been deleted.
#[derive(Clone)]
pub struct PhotoStore {
    photos: Arc<RwLock<Vec<Photo>>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for PhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            photos: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn insert(&self, photo: Photo) -> Result<(), StoreError> {
        let id = photo.id();
        let mut photos = self.photos.write().await;
        if photos.iter().any(|existing| existing.id() == id) {
            warn!(photo_id = %id, "store: rejected duplicate insert");
            return Err(StoreError::DuplicateId(id));
        }
        photos.push(photo);
        debug!(photo_id = %id, count = photos.len(), "store: photo inserted");
        let _ = self.events.send(StoreEvent::Inserted(id));
        Ok(())
    }

    /// Applies `patch` if `id` is present. Returns whether anything was applied.
    pub async fn update_by_id(&self, id: PhotoId, patch: PhotoPatch) -> bool {
        let mut photos = self.photos.write().await;
        let Some(photo) = photos.iter_mut().find(|photo| photo.id() == id) else {
            debug!(photo_id = %id, "store: update for absent photo ignored");
            return false;
        };
        photo.apply(&patch);
        let _ = self.events.send(StoreEvent::Updated(id));
        true
    }

    /// Removes `id` if present. Returns whether a photo was removed.
    pub async fn remove(&self, id: PhotoId) -> bool {
        let mut photos = self.photos.write().await;
        let Some(index) = photos.iter().position(|photo| photo.id() == id) else {
            return false;
        };
        photos.remove(index);
        debug!(photo_id = %id, count = photos.len(), "store: photo removed");
        let _ = self.events.send(StoreEvent::Removed(id));
        true
    }

    pub async fn list(&self) -> Vec<Photo> {
        self.photos.read().await.clone()
    }

    pub async fn get(&self, id: PhotoId) -> Option<Photo> {
        self.photos
            .read()
            .await
            .iter()
            .find(|photo| photo.id() == id)
            .cloned()
    }

    pub async fn contains(&self, id: PhotoId) -> bool {
        self.photos.read().await.iter().any(|photo| photo.id() == id)
    }

    pub async fn most_recent(&self) -> Option<Photo> {
        self.photos.read().await.last().cloned()
    }

    pub async fn len(&self) -> usize {
        self.photos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.photos.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
