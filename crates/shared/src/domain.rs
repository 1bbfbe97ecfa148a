use std::{
    fmt,
    ops::{Add, Sub},
    str::FromStr,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown in place of a caption that has not resolved yet.
pub const PENDING_CAPTION_DISPLAY: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub Uuid);

impl PhotoId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhotoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Center point of a photo, or a pointer location, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Encoded still captured from the frame source. Cheap to clone, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoImage {
    jpeg: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl PhotoImage {
    pub fn from_jpeg(jpeg: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            jpeg: jpeg.into(),
            width,
            height,
        }
    }

    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Debug for PhotoImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("jpeg_len", &self.jpeg.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum Caption {
    Pending,
    Ready(String),
}

impl Caption {
    pub fn ready(text: impl Into<String>) -> Self {
        Self::Ready(text.into())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Ready(text) => Some(text),
        }
    }

    pub fn display_text(&self) -> &str {
        self.text().unwrap_or(PENDING_CAPTION_DISPLAY)
    }
}

/// Partial update applied by the store. `developing` can only be cleared,
/// never set, so the development transition happens at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoPatch {
    pub caption: Option<Caption>,
    pub position: Option<Position>,
    pub finish_developing: bool,
}

impl PhotoPatch {
    pub fn caption(caption: Caption) -> Self {
        Self {
            caption: Some(caption),
            ..Self::default()
        }
    }

    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// First caption resolution: sets the text and ends development.
    pub fn developed(text: impl Into<String>) -> Self {
        Self {
            caption: Some(Caption::ready(text)),
            position: None,
            finish_developing: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.position.is_none() && !self.finish_developing
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    id: PhotoId,
    image: PhotoImage,
    caption: Caption,
    captured_at: String,
    position: Position,
    developing: bool,
}

impl Photo {
    /// A freshly captured photo: pending caption, still developing.
    pub fn developing(
        id: PhotoId,
        image: PhotoImage,
        captured_at: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            id,
            image,
            caption: Caption::Pending,
            captured_at: captured_at.into(),
            position,
            developing: true,
        }
    }

    pub fn id(&self) -> PhotoId {
        self.id
    }

    pub fn image(&self) -> &PhotoImage {
        &self.image
    }

    pub fn caption(&self) -> &Caption {
        &self.caption
    }

    pub fn captured_at(&self) -> &str {
        &self.captured_at
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_developing(&self) -> bool {
        self.developing
    }

    pub fn apply(&mut self, patch: &PhotoPatch) {
        if let Some(caption) = &patch.caption {
            self.caption = caption.clone();
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if patch.finish_developing {
            self.developing = false;
        }
    }

    pub fn summary(&self) -> PhotoSummary {
        PhotoSummary {
            id: self.id,
            caption: self.caption.clone(),
            captured_at: self.captured_at.clone(),
            position: self.position,
            developing: self.developing,
            width: self.image.width,
            height: self.image.height,
        }
    }
}

/// Serializable view of a photo without its image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoSummary {
    pub id: PhotoId,
    pub caption: Caption,
    pub captured_at: String,
    pub position: Position,
    pub developing: bool,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
