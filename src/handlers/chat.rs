use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::{forwardable_status, AppError};
use crate::llm::{ChatHistory, ChatMessage, ChatRole};
use crate::services::persona_chat::respond;
use crate::services::ServiceError;
use crate::state::AppState;
use crate::utils::text::truncate_for_log;
use crate::utils::timing::start_request_timer;

pub const INVALID_BODY: &str = "Invalid JSON request body.";
pub const MISSING_USER_MESSAGE: &str = "Missing required field: user_message.";
pub const MISSING_CHARACTER_NAME: &str = "Missing required field: character_name.";
pub const HISTORY_NOT_LIST: &str = "Invalid format for chat_history: must be a list.";
pub const HISTORY_ITEM_INVALID: &str =
    "Invalid item format in chat_history. Each item must be an object with \"role\" and \"content\".";
pub const CONFIGURATION_ERROR: &str = "Server configuration error: Groq API key not available.";
pub const UPSTREAM_PREFIX: &str = "Groq API error";

#[derive(Debug)]
pub struct ChatRequest {
    pub user_message: String,
    pub character_name: String,
    pub history: ChatHistory,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub assistant_response: String,
}

fn required_string(
    object: &Map<String, Value>,
    field: &str,
    missing: &'static str,
) -> Result<String, AppError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation(missing))
}

fn parse_history_item(item: &Value) -> Result<ChatMessage, AppError> {
    let role = item
        .get("role")
        .and_then(Value::as_str)
        .and_then(ChatRole::parse);
    let content = item.get("content").and_then(Value::as_str);
    match (role, content) {
        (Some(role), Some(content)) => Ok(ChatMessage::new(role, content)),
        _ => Err(AppError::validation(HISTORY_ITEM_INVALID)),
    }
}

fn parse_history(value: Option<&Value>) -> Result<ChatHistory, AppError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(parse_history_item).collect(),
        Some(_) => Err(AppError::validation(HISTORY_NOT_LIST)),
    }
}

pub fn parse_chat_request(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ChatRequest, AppError> {
    let Ok(Json(value)) = body else {
        return Err(AppError::validation(INVALID_BODY));
    };
    let object = value
        .as_object()
        .ok_or_else(|| AppError::validation(INVALID_BODY))?;

    Ok(ChatRequest {
        user_message: required_string(object, "user_message", MISSING_USER_MESSAGE)?,
        character_name: required_string(object, "character_name", MISSING_CHARACTER_NAME)?,
        history: parse_history(object.get("chat_history"))?,
    })
}

fn map_service_error(err: ServiceError) -> AppError {
    match err {
        ServiceError::Validation(message) => AppError::Validation(message),
        ServiceError::Configuration => AppError::Configuration(CONFIGURATION_ERROR.to_string()),
        ServiceError::Upstream { status, .. } => AppError::Upstream {
            status: forwardable_status(status),
            message: match status {
                Some(code) => format!("{UPSTREAM_PREFIX}: request failed with status {code}"),
                None => format!("{UPSTREAM_PREFIX}: the model service did not return a usable response"),
            },
        },
    }
}

async fn run_chat(
    state: &AppState,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ChatResponse, AppError> {
    let request = parse_chat_request(body)?;

    if !state.model.is_configured() {
        error!("Chat API request received but the language model client has no API key.");
        return Err(AppError::Configuration(CONFIGURATION_ERROR.to_string()));
    }

    info!(
        "API chat request for {} with message: '{}'",
        request.character_name,
        truncate_for_log(&request.user_message, 50)
    );

    let assistant_response = respond(
        state.model.as_ref(),
        &state.chat,
        &request.character_name,
        &request.user_message,
        &request.history,
    )
    .await
    .map_err(map_service_error)?;

    Ok(ChatResponse { assistant_response })
}

pub async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let mut timer = start_request_timer("POST /api/chat", None);

    let result = run_chat(&state, body).await;
    match &result {
        Ok(_) => timer.mark_status(200, None),
        Err(err) => timer.mark_status(err.status_code().as_u16(), Some(err.to_string())),
    }
    result.map(Json)
}
