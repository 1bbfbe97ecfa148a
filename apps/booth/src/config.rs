use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared::{domain::ViewportSize, locale::Locale};
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "booth.toml";
const EXPORT_SUBDIR: &str = "retro-camera";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub caption_endpoint: Option<String>,
    pub caption_api_key: Option<String>,
    pub caption_model: String,
    pub caption_timeout_ms: u64,
    pub locale: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            caption_endpoint: None,
            caption_api_key: None,
            caption_model: "gpt-4o-mini".into(),
            caption_timeout_ms: 5_000,
            locale: None,
            export_dir: None,
            viewport_width: 1280.0,
            viewport_height: 800.0,
        }
    }
}

/// Keys accepted in `booth.toml`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    caption_endpoint: Option<String>,
    caption_api_key: Option<String>,
    caption_model: Option<String>,
    caption_timeout_ms: Option<u64>,
    locale: Option<String>,
    export_dir: Option<PathBuf>,
    viewport_width: Option<f32>,
    viewport_height: Option<f32>,
}

impl Settings {
    /// `None` means captions come from the offline fallback only.
    pub fn caption_endpoint_url(&self) -> Result<Option<Url>> {
        let Some(raw) = self.caption_endpoint.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let url = Url::parse(raw).with_context(|| format!("invalid caption endpoint '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("caption endpoint must be http(s), got '{}'", url.scheme());
        }
        Ok(Some(url))
    }

    pub fn caption_timeout(&self) -> Duration {
        Duration::from_millis(self.caption_timeout_ms)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(EXPORT_SUBDIR)
        })
    }

    pub fn viewport(&self) -> ViewportSize {
        ViewportSize::new(self.viewport_width, self.viewport_height)
    }

    /// Configured locale, else the process environment.
    pub fn locale(&self) -> Locale {
        self.locale
            .as_deref()
            .and_then(Locale::parse)
            .unwrap_or_else(Locale::from_env)
    }
}

/// Loads `path` (or `booth.toml` in the working directory, if present), then
/// applies environment overrides. An explicitly named file must exist.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut settings = Settings::default();

    let file = match path {
        Some(path) => Some(read_file_settings(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Some(read_file_settings(Path::new(DEFAULT_CONFIG_FILE))?)
        }
        None => None,
    };
    if let Some(file) = file {
        apply_file(&mut settings, file);
    }

    apply_env(&mut settings, &env)?;
    Ok(settings)
}

fn read_file_settings(path: &Path) -> Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config '{}'", path.display()))
}

fn apply_file(settings: &mut Settings, file: FileSettings) {
    if file.caption_endpoint.is_some() {
        settings.caption_endpoint = file.caption_endpoint;
    }
    if file.caption_api_key.is_some() {
        settings.caption_api_key = file.caption_api_key;
    }
    if let Some(v) = file.caption_model {
        settings.caption_model = v;
    }
    if let Some(v) = file.caption_timeout_ms {
        settings.caption_timeout_ms = v;
    }
    if file.locale.is_some() {
        settings.locale = file.locale;
    }
    if file.export_dir.is_some() {
        settings.export_dir = file.export_dir;
    }
    if let Some(v) = file.viewport_width {
        settings.viewport_width = v;
    }
    if let Some(v) = file.viewport_height {
        settings.viewport_height = v;
    }
}

/// First present key wins, so `APP__*` takes precedence over the short name.
fn first_of(env: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env(key))
}

fn apply_env(settings: &mut Settings, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(v) = first_of(env, &["APP__CAPTION_ENDPOINT", "CAPTION_ENDPOINT"]) {
        settings.caption_endpoint = Some(v);
    }
    if let Some(v) = first_of(env, &["APP__CAPTION_API_KEY", "CAPTION_API_KEY"]) {
        settings.caption_api_key = Some(v);
    }
    if let Some(v) = first_of(env, &["APP__CAPTION_MODEL", "CAPTION_MODEL"]) {
        settings.caption_model = v;
    }
    if let Some(v) = first_of(env, &["APP__CAPTION_TIMEOUT_MS", "CAPTION_TIMEOUT_MS"]) {
        settings.caption_timeout_ms = v
            .trim()
            .parse()
            .with_context(|| format!("invalid caption timeout '{v}'"))?;
    }
    if let Some(v) = env("APP__LOCALE") {
        settings.locale = Some(v);
    }
    if let Some(v) = env("APP__EXPORT_DIR") {
        settings.export_dir = Some(PathBuf::from(v));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
