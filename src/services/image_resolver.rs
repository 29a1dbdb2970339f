use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::media::{resolve_mime_type, FetchError, FetchedImage, ImageFetcher};
use crate::search::{ImageCandidate, ImageSearch, ImageSearchOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub source_url: String,
}

impl ResolvedImage {
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

#[derive(Debug, Error)]
pub enum CandidateRejection {
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("content type {0:?} is not an image")]
    NotAnImage(Option<String>),
    #[error("payload too small ({0} bytes)")]
    TooSmall(usize),
}

pub fn validate_image(fetched: &FetchedImage, min_bytes: usize) -> Result<(), CandidateRejection> {
    let is_image = fetched
        .content_type
        .as_deref()
        .map(|value| value.to_lowercase().contains("image"))
        .unwrap_or(false);
    if !is_image {
        return Err(CandidateRejection::NotAnImage(fetched.content_type.clone()));
    }
    if fetched.bytes.len() <= min_bytes {
        return Err(CandidateRejection::TooSmall(fetched.bytes.len()));
    }
    Ok(())
}

/// Fetches candidates strictly in order and returns the first one that
/// downloads and validates. Nothing after the winner is fetched.
pub async fn first_valid_image(
    candidates: &[ImageCandidate],
    fetcher: &dyn ImageFetcher,
    min_bytes: usize,
) -> Option<ResolvedImage> {
    for candidate in candidates {
        let url = candidate.image_url.as_str();
        info!("Attempting to fetch image URL: {}", url);

        let outcome = match fetcher.fetch(url).await {
            Ok(fetched) => validate_image(&fetched, min_bytes).map(|_| fetched),
            Err(err) => Err(CandidateRejection::from(err)),
        };

        match outcome {
            Ok(fetched) => {
                info!(
                    "Successfully fetched image from {} ({} bytes)",
                    url,
                    fetched.bytes.len()
                );
                let mime_type = resolve_mime_type(&fetched.bytes, fetched.content_type.as_deref());
                return Some(ResolvedImage {
                    bytes: fetched.bytes,
                    mime_type,
                    source_url: url.to_string(),
                });
            }
            Err(rejection) => {
                warn!("Skipping image candidate {}: {}", url, rejection);
            }
        }
    }
    None
}

pub struct ImageResolver {
    search: Arc<dyn ImageSearch>,
    fetcher: Arc<dyn ImageFetcher>,
    options: ImageSearchOptions,
    min_bytes: usize,
}

impl ImageResolver {
    pub fn new(
        search: Arc<dyn ImageSearch>,
        fetcher: Arc<dyn ImageFetcher>,
        options: ImageSearchOptions,
        min_bytes: usize,
    ) -> Self {
        Self {
            search,
            fetcher,
            options,
            min_bytes,
        }
    }

    pub async fn resolve(&self, name: &str) -> Option<ResolvedImage> {
        info!(
            "Searching {} images for: {}",
            self.search.provider(),
            name
        );
        let candidates = match self.search.search_images(name, &self.options).await {
            Ok(candidates) => candidates,
            Err(err) => {
                error!("Error during image search for '{}': {}", name, err);
                return None;
            }
        };

        if candidates.is_empty() {
            warn!("No image results found for query: {}", name);
            return None;
        }

        let resolved = first_valid_image(&candidates, self.fetcher.as_ref(), self.min_bytes).await;
        if resolved.is_none() {
            error!("Could not fetch a valid image from search results for: {}", name);
        }
        resolved
    }
}
