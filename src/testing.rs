//! In-memory fakes for the capability traits, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use crate::config::ModelSettings;
use crate::llm::{ChatModel, CompletionRequest, LlmError};
use crate::media::{FetchError, FetchedImage, ImageFetcher};
use crate::search::{ImageCandidate, ImageSearch, ImageSearchError, ImageSearchOptions};
use crate::services::ImageResolver;
use crate::state::AppState;

pub const DEFAULT_MIN_IMAGE_BYTES: usize = 500;

pub fn suggestion_settings() -> ModelSettings {
    ModelSettings {
        model: "llama3-70b-8192".to_string(),
        temperature: 0.8,
        top_p: 1.0,
        max_tokens: 150,
    }
}

pub fn chat_settings() -> ModelSettings {
    ModelSettings {
        model: "llama3-8b-8192".to_string(),
        temperature: 0.8,
        top_p: 1.0,
        max_tokens: 200,
    }
}

pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(len.max(4), 0);
    bytes
}

pub struct FakeChatModel {
    configured: bool,
    outcome: Result<String, LlmError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl FakeChatModel {
    fn with_outcome(configured: bool, outcome: Result<String, LlmError>) -> Self {
        Self {
            configured,
            outcome,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_outcome(true, Ok(text.to_string()))
    }

    pub fn failing(err: LlmError) -> Self {
        Self::with_outcome(true, Err(err))
    }

    pub fn unconfigured() -> Self {
        Self::with_outcome(false, Err(LlmError::NotConfigured))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    fn provider(&self) -> &'static str {
        "fake"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        if !self.configured {
            return Err(LlmError::NotConfigured);
        }
        self.outcome.clone().map(|text| text.trim().to_string())
    }
}

pub struct FakeImageSearch {
    default: Result<Vec<ImageCandidate>, ImageSearchError>,
    by_query: HashMap<String, Vec<ImageCandidate>>,
    queries: Mutex<Vec<String>>,
    last_max_results: Mutex<Option<usize>>,
}

impl FakeImageSearch {
    fn with_default(default: Result<Vec<ImageCandidate>, ImageSearchError>) -> Self {
        Self {
            default,
            by_query: HashMap::new(),
            queries: Mutex::new(Vec::new()),
            last_max_results: Mutex::new(None),
        }
    }

    pub fn returning(candidates: Vec<ImageCandidate>) -> Self {
        Self::with_default(Ok(candidates))
    }

    pub fn failing(err: ImageSearchError) -> Self {
        Self::with_default(Err(err))
    }

    pub fn with_results_for(mut self, query: &str, urls: &[&str]) -> Self {
        let candidates = urls.iter().map(|url| ImageCandidate::new(*url)).collect();
        self.by_query.insert(query.to_string(), candidates);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn last_max_results(&self) -> Option<usize> {
        *self.last_max_results.lock().unwrap()
    }
}

#[async_trait]
impl ImageSearch for FakeImageSearch {
    fn provider(&self) -> &'static str {
        "fake"
    }

    async fn search_images(
        &self,
        query: &str,
        options: &ImageSearchOptions,
    ) -> Result<Vec<ImageCandidate>, ImageSearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        *self.last_max_results.lock().unwrap() = Some(options.max_results);
        if let Some(candidates) = self.by_query.get(query) {
            return Ok(candidates.clone());
        }
        self.default.clone()
    }
}

pub struct FakeImageFetcher {
    responses: HashMap<String, Result<FetchedImage, FetchError>>,
    requested: Mutex<Vec<String>>,
}

impl FakeImageFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, url: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(
            url.to_string(),
            Ok(FetchedImage {
                bytes,
                content_type: Some(content_type.to_string()),
            }),
        );
        self
    }

    pub fn with_timeout(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Err(FetchError::Timeout));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), Err(FetchError::Status(status)));
        self
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for FakeImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

pub fn test_state(
    model: Arc<FakeChatModel>,
    search: Arc<FakeImageSearch>,
    fetcher: Arc<FakeImageFetcher>,
) -> AppState {
    let resolver = ImageResolver::new(
        search,
        fetcher,
        ImageSearchOptions::default(),
        DEFAULT_MIN_IMAGE_BYTES,
    );
    AppState::new(
        model,
        Arc::new(resolver),
        suggestion_settings(),
        chat_settings(),
    )
}

pub async fn serve_locally(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
