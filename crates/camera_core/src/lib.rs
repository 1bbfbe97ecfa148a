//! Photo lifecycle engine: capture, development, captioning, dragging and caption editing.

pub mod audio;
pub mod booth;
pub mod capture;
pub mod drag;
pub mod edit;
pub mod error;
pub mod export;
pub mod frame;

pub use audio::{AudioCue, SilentAudioCue, TerminalBell};
pub use booth::{BoothCommand, BoothOptions, BoothOutcome, EditKey, PhotoBooth};
pub use capture::{CaptureController, CapturedPhoto, EJECT_WINDOW};
pub use drag::DragController;
pub use edit::CaptionEditController;
pub use error::{CaptureError, DragError, EditError};
pub use export::{export_file_name, PhotoExporter, PngFileExporter};
pub use frame::{
    FrameSource, FrameSourceProvider, MissingFrameSourceProvider, StillFrameSource,
    StillImageProvider,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
