use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

pub fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
        .build()
        .context("Failed to build HTTP client")
}
