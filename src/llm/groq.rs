use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::llm::{ChatModel, CompletionRequest, LlmError};
use crate::utils::text::truncate_for_log;
use crate::utils::timing::log_llm_timing;

const PROVIDER: &str = "groq";

#[derive(Clone)]
pub struct GroqClient {
    http: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(http: Client, api_key: &str, base_url: &str, timeout_seconds: u64) -> Self {
        Self {
            http,
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn call_api(&self, payload: &Value) -> Result<Value, LlmError> {
        debug!("Groq request: {}", summarize_payload(payload));

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    "Groq request transport error: {err} (timeout={}, connect={})",
                    err.is_timeout(),
                    err.is_connect()
                );
                LlmError::Transport(err.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Groq API error: status={}, body={}", status, body_summary);
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: message.unwrap_or(body_summary),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        let payload = build_payload(&request);
        let operation = format!("{PROVIDER}:{}", request.operation);
        let metadata = json!({ "messages": request.messages.len() });

        log_llm_timing(PROVIDER, &request.model, &operation, Some(metadata), || async {
            let response = self.call_api(&payload).await?;
            extract_content(&response)
        })
        .await
    }
}

fn build_payload(request: &CompletionRequest) -> Value {
    json!({
        "model": request.model,
        "messages": request.messages,
        "temperature": request.temperature,
        "top_p": request.top_p,
        "max_tokens": request.max_tokens,
        "stream": false,
    })
}

fn summarize_payload(payload: &Value) -> String {
    let model = payload
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let message_count = payload
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|messages| messages.len())
        .unwrap_or(0);
    let max_tokens = payload
        .get("max_tokens")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    format!("model={model}, messages={message_count}, max_tokens={max_tokens}")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn extract_content(response: &Value) -> Result<String, LlmError> {
    response
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            LlmError::InvalidResponse(format!(
                "missing choices[0].message.content in {}",
                truncate_for_log(&response.to_string(), 500)
            ))
        })
}
