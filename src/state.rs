use std::sync::Arc;

use anyhow::Result;

use crate::config::{Config, ModelSettings};
use crate::llm::{ChatModel, GroqClient};
use crate::media::HttpImageFetcher;
use crate::search::{DuckDuckGoImages, ImageSearchOptions};
use crate::services::ImageResolver;
use crate::utils::http::build_http_client;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ChatModel>,
    pub resolver: Arc<ImageResolver>,
    pub suggestion: Arc<ModelSettings>,
    pub chat: Arc<ModelSettings>,
}

impl AppState {
    pub fn new(
        model: Arc<dyn ChatModel>,
        resolver: Arc<ImageResolver>,
        suggestion: ModelSettings,
        chat: ModelSettings,
    ) -> Self {
        AppState {
            model,
            resolver,
            suggestion: Arc::new(suggestion),
            chat: Arc::new(chat),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_http_client()?;

        let model = GroqClient::new(
            http.clone(),
            &config.groq_api_key,
            &config.groq_base_url,
            config.llm_timeout_seconds,
        );

        let search_settings = &config.image_search;
        let search = DuckDuckGoImages::new(
            http.clone(),
            &search_settings.base_url,
            search_settings.timeout_seconds,
            &config.image_fetch.user_agent,
        );
        let fetcher = HttpImageFetcher::new(
            http,
            config.image_fetch.timeout_seconds,
            &config.image_fetch.user_agent,
        );
        let options = ImageSearchOptions {
            region: search_settings.region.clone(),
            safesearch: search_settings.safesearch,
            image_type: search_settings.image_type.clone(),
            max_results: search_settings.max_results,
        };
        let resolver = ImageResolver::new(
            Arc::new(search),
            Arc::new(fetcher),
            options,
            config.image_fetch.min_bytes,
        );

        Ok(AppState::new(
            Arc::new(model),
            Arc::new(resolver),
            config.suggestion.clone(),
            config.chat.clone(),
        ))
    }
}
