//! Pipeline policy settings.
//!
//! Every value has a default; a TOML file may override any subset:
//!
//! ```toml
//! [keywords]
//! top_k = 20
//!
//! [fetch]
//! news_delay_ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub keywords: KeywordSettings,
    pub fetch: FetchSettings,
    pub export: ExportSettings,
    pub summary: SummarySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSettings {
    /// Number of ranked keywords kept per member.
    pub top_k: usize,
    /// How many times a title is repeated ahead of its body text.
    pub title_weight: usize,
    /// Most recent news articles fed to keyword extraction and trends.
    pub recent_news: i64,
    /// Most recent videos fed to keyword extraction.
    pub recent_videos: i64,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            top_k: 15,
            title_weight: 2,
            recent_news: 30,
            recent_videos: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Rows requested per portal page.
    pub page_size: u32,
    /// Hard ceiling on pages fetched per paginated request.
    pub max_pages: u32,
    /// Articles requested per member from news search.
    pub news_display: u32,
    pub news_delay_ms: u64,
    pub bill_delay_ms: u64,
    /// Assembly term whose bills are collected.
    pub assembly_term: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 50,
            news_display: 50,
            news_delay_ms: 100,
            bill_delay_ms: 500,
            assembly_term: 22,
        }
    }
}

impl FetchSettings {
    pub fn news_delay(&self) -> Duration {
        Duration::from_millis(self.news_delay_ms)
    }

    pub fn bill_delay(&self) -> Duration {
        Duration::from_millis(self.bill_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Most recent bills included in a member snapshot.
    pub recent_bills: i64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { recent_bills: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Bill titles handed to the summarizer.
    pub max_titles: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self { max_titles: 30 }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.keywords.top_k == 0 {
            return Err(SettingsError::Invalid("keywords.top_k must be at least 1".into()));
        }
        if self.keywords.title_weight == 0 {
            return Err(SettingsError::Invalid(
                "keywords.title_weight must be at least 1".into(),
            ));
        }
        if !(1..=1000).contains(&self.fetch.page_size) {
            return Err(SettingsError::Invalid(
                "fetch.page_size must be between 1 and 1000".into(),
            ));
        }
        if self.fetch.max_pages == 0 {
            return Err(SettingsError::Invalid("fetch.max_pages must be at least 1".into()));
        }
        Ok(())
    }
}
