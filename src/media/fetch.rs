use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};

use crate::media::{FetchError, FetchedImage, ImageFetcher};

#[derive(Clone)]
pub struct HttpImageFetcher {
    http: Client,
    timeout: Duration,
    user_agent: String,
}

impl HttpImageFetcher {
    pub fn new(http: Client, timeout_seconds: u64, user_agent: &str) -> Self {
        Self {
            http,
            timeout: Duration::from_secs(timeout_seconds),
            user_agent: user_agent.to_string(),
        }
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let response = self
            .http
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = response.bytes().await.map_err(classify)?;
        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
