use photo_store::StoreError;
use shared::{
    domain::PhotoId,
    error::{BoothError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no frame source attached")]
    NoSource,
    #[error("frame source unavailable: {source}")]
    SourceUnavailable { source: anyhow::Error },
    #[error("previous photo is still ejecting")]
    Ejecting,
    #[error("failed to grab frame: {source}")]
    FrameGrab { source: anyhow::Error },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DragError {
    #[error("photo {0} is being edited")]
    PhotoBeingEdited(PhotoId),
    #[error("photo {0} is already being dragged")]
    AlreadyDragging(PhotoId),
    #[error("photo {0} does not exist")]
    UnknownPhoto(PhotoId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("photo {0} does not exist")]
    UnknownPhoto(PhotoId),
    #[error("photo {0} is still developing")]
    StillDeveloping(PhotoId),
}

impl From<CaptureError> for BoothError {
    fn from(value: CaptureError) -> Self {
        let code = match &value {
            CaptureError::NoSource | CaptureError::SourceUnavailable { .. } => {
                ErrorCode::SourceUnavailable
            }
            CaptureError::Ejecting => ErrorCode::Busy,
            CaptureError::FrameGrab { .. } | CaptureError::Store(_) => ErrorCode::Internal,
        };
        BoothError::new(code, value.to_string())
    }
}

impl From<DragError> for BoothError {
    fn from(value: DragError) -> Self {
        let code = match &value {
            DragError::PhotoBeingEdited(_) => ErrorCode::Conflict,
            DragError::AlreadyDragging(_) => ErrorCode::Busy,
            DragError::UnknownPhoto(_) => ErrorCode::NotFound,
        };
        BoothError::new(code, value.to_string())
    }
}

impl From<EditError> for BoothError {
    fn from(value: EditError) -> Self {
        let code = match &value {
            EditError::UnknownPhoto(_) => ErrorCode::NotFound,
            EditError::StillDeveloping(_) => ErrorCode::Busy,
        };
        BoothError::new(code, value.to_string())
    }
}
