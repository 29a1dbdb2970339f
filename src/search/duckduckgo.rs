use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, info};

use crate::search::{ImageCandidate, ImageSearch, ImageSearchError, ImageSearchOptions, SafeSearch};

static VQD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).expect("valid vqd regex"));

#[derive(Debug, Deserialize)]
struct DdgImagesResponse {
    results: Option<Vec<DdgImageResult>>,
}

#[derive(Debug, Deserialize)]
struct DdgImageResult {
    image: Option<String>,
    title: Option<String>,
    url: Option<String>,
}

#[derive(Clone)]
pub struct DuckDuckGoImages {
    http: Client,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl DuckDuckGoImages {
    pub fn new(http: Client, base_url: &str, timeout_seconds: u64, user_agent: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_seconds),
            user_agent: user_agent.to_string(),
        }
    }

    async fn fetch_vqd(&self, query: &str) -> Result<String, ImageSearchError> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .header(header::USER_AGENT, &self.user_agent)
            .query(&[("q", query)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| ImageSearchError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageSearchError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|err| ImageSearchError::Request(err.to_string()))?;

        extract_vqd(&html).ok_or_else(|| {
            ImageSearchError::InvalidResponse(format!("no vqd token found for query '{query}'"))
        })
    }
}

#[async_trait]
impl ImageSearch for DuckDuckGoImages {
    fn provider(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search_images(
        &self,
        query: &str,
        options: &ImageSearchOptions,
    ) -> Result<Vec<ImageCandidate>, ImageSearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ImageSearchError::EmptyQuery);
        }

        let vqd = self.fetch_vqd(query).await?;
        debug!("DuckDuckGo vqd token acquired for '{}'", query);

        let filters = build_filters(&options.image_type);
        let safesearch = safesearch_param(options.safesearch);
        info!(
            "Calling DuckDuckGo image search with query: {} (region={}, safesearch={}, type={})",
            query,
            options.region,
            options.safesearch.as_str(),
            options.image_type
        );

        let response = self
            .http
            .get(format!("{}/i.js", self.base_url))
            .header(header::USER_AGENT, &self.user_agent)
            .header(header::REFERER, format!("{}/", self.base_url))
            .query(&[
                ("l", options.region.as_str()),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("f", filters.as_str()),
                ("p", safesearch),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| ImageSearchError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageSearchError::Status(response.status().as_u16()));
        }

        let data: DdgImagesResponse = response
            .json()
            .await
            .map_err(|err| ImageSearchError::InvalidResponse(err.to_string()))?;

        Ok(extract_candidates(data, options.max_results))
    }
}

fn extract_vqd(html: &str) -> Option<String> {
    VQD_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Filter string order is `time,size,color,type,layout,license`.
fn build_filters(image_type: &str) -> String {
    let image_type = image_type.trim();
    if image_type.is_empty() {
        return ",,,,,".to_string();
    }
    format!(",,,type:{image_type},,")
}

fn safesearch_param(level: SafeSearch) -> &'static str {
    match level {
        SafeSearch::On | SafeSearch::Moderate => "1",
        SafeSearch::Off => "-1",
    }
}

fn extract_candidates(payload: DdgImagesResponse, max_results: usize) -> Vec<ImageCandidate> {
    let mut candidates = Vec::new();
    for item in payload.results.unwrap_or_default() {
        let image_url = item.image.unwrap_or_default();
        if image_url.trim().is_empty() {
            debug!("DuckDuckGo result missing image URL; skipping");
            continue;
        }
        candidates.push(ImageCandidate {
            image_url,
            title: item.title.unwrap_or_default(),
            source_url: item.url.filter(|url| !url.trim().is_empty()),
        });
        if candidates.len() >= max_results {
            break;
        }
    }
    candidates
}
