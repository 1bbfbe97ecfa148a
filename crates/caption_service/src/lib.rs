use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::PhotoImage,
    locale::{CaptionLanguage, Locale},
};
use tracing::{debug, warn};

pub mod http;
pub use http::{HttpCaptionBackend, HttpCaptionConfig};

pub const MAX_CAPTION_WORDS: usize = 15;
pub const MAX_OUTPUT_TOKENS: u32 = 60;
pub const DEFAULT_CAPTION_TIMEOUT: Duration = Duration::from_secs(5);

const CHINESE_FALLBACK_CAPTION: &str = "定格这一刻的温暖与美好。";
const GENERIC_FALLBACK_CAPTION: &str = "A warm little moment, worth keeping.";

/// Caption used whenever the remote captioner cannot produce one.
pub fn fallback_caption(language: CaptionLanguage) -> &'static str {
    if language.is_chinese() {
        CHINESE_FALLBACK_CAPTION
    } else {
        GENERIC_FALLBACK_CAPTION
    }
}

#[derive(Debug, Clone)]
pub struct CaptionRequest {
    pub image: PhotoImage,
    pub language: CaptionLanguage,
    pub max_words: usize,
    pub max_tokens: u32,
}

impl CaptionRequest {
    pub fn new(image: PhotoImage, language: CaptionLanguage) -> Self {
        Self {
            image,
            language,
            max_words: MAX_CAPTION_WORDS,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Look at this instant photo and write one warm, brief remark about it in {}. \
             Use at most {} words. Reply with the remark only.",
            self.language.name(),
            self.max_words
        )
    }
}

#[async_trait]
pub trait CaptionBackend: Send + Sync {
    async fn caption(&self, request: &CaptionRequest) -> Result<String>;
}

/// Used when no captioning credential is configured.
pub struct MissingCaptionBackend;

#[async_trait]
impl CaptionBackend for MissingCaptionBackend {
    async fn caption(&self, _request: &CaptionRequest) -> Result<String> {
        Err(anyhow!("caption backend unavailable: no credential configured"))
    }
}

/// Stateless captioner: one backend call per request, fallback on any failure.
#[derive(Clone)]
pub struct CaptionService {
    backend: Arc<dyn CaptionBackend>,
    language: CaptionLanguage,
    timeout: Duration,
}

impl CaptionService {
    pub fn new(backend: Arc<dyn CaptionBackend>, locale: &Locale) -> Self {
        Self {
            backend,
            language: locale.language(),
            timeout: DEFAULT_CAPTION_TIMEOUT,
        }
    }

    pub fn offline(locale: &Locale) -> Self {
        Self::new(Arc::new(MissingCaptionBackend), locale)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn language(&self) -> CaptionLanguage {
        self.language
    }

    pub fn fallback(&self) -> &'static str {
        fallback_caption(self.language)
    }

    pub async fn generate(&self, image: &PhotoImage) -> String {
        let request = CaptionRequest::new(image.clone(), self.language);
        let outcome = tokio::time::timeout(self.timeout, self.backend.caption(&request)).await;

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(language = %self.language, "caption: backend failed, using fallback: {err:#}");
                return self.fallback().to_string();
            }
            Err(_) => {
                warn!(
                    language = %self.language,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "caption: backend timed out, using fallback"
                );
                return self.fallback().to_string();
            }
        };

        match clean_caption(&raw) {
            Some(caption) => {
                debug!(language = %self.language, "caption: generated");
                caption
            }
            None => {
                warn!(language = %self.language, "caption: backend returned empty text, using fallback");
                self.fallback().to_string()
            }
        }
    }
}

const QUOTE_PAIRS: [(char, char); 4] = [('"', '"'), ('\'', '\''), ('“', '”'), ('「', '」')];

/// Collapses whitespace and strips one pair of surrounding quotes.
fn clean_caption(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut text = collapsed.as_str();
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            text = inner.trim();
            break;
        }
    }
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
