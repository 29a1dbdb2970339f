use tracing::{error, info, warn};

use crate::config::{ModelSettings, SUGGESTION_SYSTEM_PROMPT, SUGGESTION_USER_PROMPT};
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::services::ServiceError;
use crate::utils::text::truncate_for_log;

pub const MAX_SUGGESTIONS: usize = 5;

pub fn parse_suggestions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

pub fn build_messages(traits: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUGGESTION_SYSTEM_PROMPT),
        ChatMessage::user(SUGGESTION_USER_PROMPT.replace("{traits}", traits)),
    ]
}

/// Asks the model for characters matching `traits`. An answer with no
/// parseable names is `Ok(vec![])`, not an error.
pub async fn suggest(
    model: &dyn ChatModel,
    settings: &ModelSettings,
    traits: &str,
) -> Result<Vec<String>, ServiceError> {
    let traits = traits.trim();
    if traits.is_empty() {
        return Err(ServiceError::Validation(
            "Please describe your character traits.".to_string(),
        ));
    }
    if !model.is_configured() {
        return Err(ServiceError::Configuration);
    }

    info!(
        "Requesting character suggestions for traits: {}",
        truncate_for_log(traits, 50)
    );

    let request = CompletionRequest {
        operation: "suggest",
        model: settings.model.clone(),
        messages: build_messages(traits),
        temperature: settings.temperature,
        top_p: settings.top_p,
        max_tokens: settings.max_tokens,
    };

    let raw = model.complete(request).await.map_err(|err| {
        error!(
            "Error fetching character suggestions from {}: {}",
            model.provider(),
            err
        );
        ServiceError::from(err)
    })?;
    info!("Raw suggestions from model: {}", truncate_for_log(&raw, 500));

    let names = parse_suggestions(&raw);
    if names.is_empty() {
        warn!("Model did not return any usable character names.");
    } else {
        info!("Parsed characters: {:?}", names);
    }
    Ok(names)
}
