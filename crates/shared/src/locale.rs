//! Locale detection and the language/timestamp choices that follow from it.

use std::fmt;

use chrono::{DateTime, TimeZone};

const DEFAULT_LOCALE_TAG: &str = "en-US";
const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionLanguage {
    Chinese,
    Japanese,
    Korean,
    French,
    German,
    Spanish,
    English,
}

impl CaptionLanguage {
    /// English name of the language, used when prompting the captioner.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::French => "French",
            Self::German => "German",
            Self::Spanish => "Spanish",
            Self::English => "English",
        }
    }

    pub fn is_chinese(&self) -> bool {
        matches!(self, Self::Chinese)
    }
}

impl fmt::Display for CaptionLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// BCP 47-ish locale tag, normalized to `ll-RR` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            tag: DEFAULT_LOCALE_TAG.to_string(),
        }
    }
}

impl Locale {
    /// Accepts POSIX (`zh_CN.UTF-8`, `de_DE@euro`) and BCP 47 (`zh-Hans-CN`) forms.
    /// `C`, `POSIX` and empty values carry no language and yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let without_encoding = raw.split(['.', '@']).next().unwrap_or_default();
        if without_encoding.is_empty()
            || without_encoding.eq_ignore_ascii_case("c")
            || without_encoding.eq_ignore_ascii_case("posix")
        {
            return None;
        }

        let mut parts = without_encoding.split(['_', '-']);
        let language = parts.next()?.to_ascii_lowercase();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut tag = language;
        for part in parts.filter(|part| !part.is_empty()) {
            tag.push('-');
            if part.len() == 2 {
                tag.push_str(&part.to_ascii_uppercase());
            } else {
                tag.push_str(part);
            }
        }
        Some(Self { tag })
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// First parseable value among `LC_ALL`, `LC_MESSAGES`, `LANG`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        LOCALE_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find_map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn language_code(&self) -> &str {
        self.tag.split('-').next().unwrap_or_default()
    }

    pub fn language(&self) -> CaptionLanguage {
        match self.language_code() {
            "zh" => CaptionLanguage::Chinese,
            "ja" => CaptionLanguage::Japanese,
            "ko" => CaptionLanguage::Korean,
            "fr" => CaptionLanguage::French,
            "de" => CaptionLanguage::German,
            "es" => CaptionLanguage::Spanish,
            _ => CaptionLanguage::English,
        }
    }

    pub fn format_timestamp<Tz>(&self, at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let pattern = match self.language() {
            CaptionLanguage::Chinese | CaptionLanguage::Japanese => "%Y年%m月%d日 %H:%M",
            CaptionLanguage::Korean => "%Y. %m. %d. %H:%M",
            CaptionLanguage::German => "%d.%m.%Y %H:%M",
            CaptionLanguage::French | CaptionLanguage::Spanish => "%d/%m/%Y %H:%M",
            CaptionLanguage::English if self.tag == DEFAULT_LOCALE_TAG => "%b %-d, %Y %H:%M",
            CaptionLanguage::English => "%-d %b %Y %H:%M",
        };
        at.format(pattern).to_string()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

#[cfg(test)]
#[path = "tests/locale_tests.rs"]
mod tests;
