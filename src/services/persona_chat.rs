use tracing::{error, info};

use crate::config::{ModelSettings, PERSONA_SYSTEM_PROMPT};
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::services::ServiceError;
use crate::utils::text::truncate_for_log;

pub fn build_persona_prompt(character_name: &str) -> String {
    PERSONA_SYSTEM_PROMPT.replace("{character_name}", character_name)
}

pub fn build_messages(
    character_name: &str,
    user_message: &str,
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(build_persona_prompt(character_name)));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(user_message));
    messages
}

pub async fn respond(
    model: &dyn ChatModel,
    settings: &ModelSettings,
    character_name: &str,
    user_message: &str,
    history: &[ChatMessage],
) -> Result<String, ServiceError> {
    let character_name = character_name.trim();
    if character_name.is_empty() {
        return Err(ServiceError::Validation(
            "Missing required field: character_name.".to_string(),
        ));
    }
    if user_message.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Missing required field: user_message.".to_string(),
        ));
    }
    if !model.is_configured() {
        return Err(ServiceError::Configuration);
    }

    let messages = build_messages(character_name, user_message, history);
    info!(
        "Sending {} messages to {} for {}: '{}'",
        messages.len(),
        model.provider(),
        character_name,
        truncate_for_log(user_message, 50)
    );

    let request = CompletionRequest {
        operation: "persona_chat",
        model: settings.model.clone(),
        messages,
        temperature: settings.temperature,
        top_p: settings.top_p,
        max_tokens: settings.max_tokens,
    };

    let reply = model.complete(request).await.map_err(|err| {
        error!("{} API error for {}: {}", model.provider(), character_name, err);
        ServiceError::from(err)
    })?;
    let reply = reply.trim().to_string();
    info!(
        "Model response received for {}: '{}'",
        character_name,
        truncate_for_log(&reply, 50)
    );
    Ok(reply)
}
