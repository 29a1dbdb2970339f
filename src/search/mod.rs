pub mod duckduckgo;

use async_trait::async_trait;
use thiserror::Error;

pub use duckduckgo::DuckDuckGoImages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeSearch {
    On,
    Moderate,
    Off,
}

impl SafeSearch {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "on" | "strict" => Some(Self::On),
            "moderate" => Some(Self::Moderate),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Moderate => "moderate",
            Self::Off => "off",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageSearchOptions {
    pub region: String,
    pub safesearch: SafeSearch,
    pub image_type: String,
    pub max_results: usize,
}

impl Default for ImageSearchOptions {
    fn default() -> Self {
        Self {
            region: "wt-wt".to_string(),
            safesearch: SafeSearch::Moderate,
            image_type: "photo".to_string(),
            max_results: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub image_url: String,
    pub title: String,
    pub source_url: Option<String>,
}

#[cfg(test)]
impl ImageCandidate {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            title: String::new(),
            source_url: None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ImageSearchError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("image search request failed: {0}")]
    Request(String),
    #[error("image search request failed with status {0}")]
    Status(u16),
    #[error("invalid image search response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn search_images(
        &self,
        query: &str,
        options: &ImageSearchOptions,
    ) -> Result<Vec<ImageCandidate>, ImageSearchError>;
}
