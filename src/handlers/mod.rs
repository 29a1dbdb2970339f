pub mod chat;
pub mod generate;
pub mod pages;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/health", get(pages::health))
        .route("/generate", post(generate::generate_handler))
        .route("/chat/{url_name}", get(pages::chat_page))
        .route("/api/chat", post(chat::chat_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::llm::{ChatRole, LlmError};
    use crate::search::ImageSearchError;
    use crate::testing::{jpeg_bytes, test_state, FakeChatModel, FakeImageFetcher, FakeImageSearch};

    struct Harness {
        model: Arc<FakeChatModel>,
        search: Arc<FakeImageSearch>,
        fetcher: Arc<FakeImageFetcher>,
    }

    impl Harness {
        fn new(model: FakeChatModel, search: FakeImageSearch, fetcher: FakeImageFetcher) -> Self {
            Self {
                model: Arc::new(model),
                search: Arc::new(search),
                fetcher: Arc::new(fetcher),
            }
        }

        fn with_model(model: FakeChatModel) -> Self {
            Self::new(
                model,
                FakeImageSearch::returning(Vec::new()),
                FakeImageFetcher::new(),
            )
        }

        fn app(&self) -> Router {
            build_router(test_state(
                self.model.clone(),
                self.search.clone(),
                self.fetcher.clone(),
            ))
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn post_raw(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        post_raw(app, uri, &body.to_string()).await
    }

    async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        (status, String::from_utf8(body).unwrap())
    }

    #[tokio::test]
    async fn generate_rejects_blank_or_missing_prompt() {
        let harness = Harness::with_model(FakeChatModel::replying("A, B"));

        for body in [json!({ "prompt": "" }), json!({ "prompt": "   " }), json!({}), json!({ "prompt": 7 })] {
            let (status, body) = post_json(harness.app(), "/generate", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], generate::PROMPT_REQUIRED);
        }

        let (status, _) = post_raw(harness.app(), "/generate", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(harness.model.calls(), 0);
    }

    #[tokio::test]
    async fn generate_reports_missing_credential_as_configuration_error() {
        let harness = Harness::with_model(FakeChatModel::unconfigured());
        let (status, body) =
            post_json(harness.app(), "/generate", json!({ "prompt": "brave" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], generate::CONFIGURATION_ERROR);
        assert_eq!(harness.model.calls(), 0);
    }

    #[tokio::test]
    async fn generate_without_names_is_server_error() {
        let harness = Harness::with_model(FakeChatModel::replying(" ,, , "));
        let (status, body) =
            post_json(harness.app(), "/generate", json!({ "prompt": "brave" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], generate::NO_SUGGESTIONS);
        assert!(harness.search.queries().is_empty());
    }

    #[tokio::test]
    async fn generate_without_any_image_has_distinct_message() {
        let harness = Harness::new(
            FakeChatModel::replying("Batman (DC Comics), Lara Croft (Tomb Raider Games)"),
            FakeImageSearch::returning(Vec::new()),
            FakeImageFetcher::new(),
        );
        let (status, body) =
            post_json(harness.app(), "/generate", json!({ "prompt": "brave" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], generate::NO_IMAGES);
        assert_ne!(generate::NO_IMAGES, generate::NO_SUGGESTIONS);
        assert_eq!(
            harness.search.queries(),
            vec!["Batman (DC Comics)", "Lara Croft (Tomb Raider Games)"]
        );
    }

    #[tokio::test]
    async fn generate_drops_characters_without_images() {
        let harness = Harness::new(
            FakeChatModel::replying("Batman (DC Comics), Nobody, Lara Croft (Tomb Raider Games)"),
            FakeImageSearch::failing(ImageSearchError::Status(403))
                .with_results_for("Batman (DC Comics)", &["https://img/bat-small", "https://img/bat"])
                .with_results_for("Lara Croft (Tomb Raider Games)", &["https://img/lara"]),
            FakeImageFetcher::new()
                .with_response("https://img/bat-small", "image/jpeg", jpeg_bytes(120))
                .with_response("https://img/bat", "image/jpeg", jpeg_bytes(2048))
                .with_response("https://img/lara", "image/png; charset=binary", vec![7; 900]),
        );

        let (status, body) =
            post_json(harness.app(), "/generate", json!({ "prompt": "brave, stubborn" })).await;
        assert_eq!(status, StatusCode::OK);

        let characters = body["characters"].as_array().unwrap();
        assert_eq!(characters.len(), 2);
        assert_eq!(characters[0]["name"], "Batman (DC Comics)");
        assert_eq!(characters[0]["url_name"], "Batman+%28DC+Comics%29");
        assert_eq!(characters[0]["mime_type"], "image/jpeg");
        assert_eq!(
            characters[0]["image_data"],
            general_purpose::STANDARD.encode(jpeg_bytes(2048))
        );
        assert_eq!(characters[1]["name"], "Lara Croft (Tomb Raider Games)");
        assert_eq!(characters[1]["mime_type"], "image/png");
        assert!(characters
            .iter()
            .all(|character| character["image_data"].as_str().is_some_and(|data| !data.is_empty())));

        assert_eq!(
            harness.fetcher.requested(),
            vec!["https://img/bat-small", "https://img/bat", "https://img/lara"]
        );
    }

    #[tokio::test]
    async fn generate_hides_upstream_detail() {
        let harness = Harness::with_model(FakeChatModel::failing(LlmError::Status {
            status: 401,
            message: "Invalid API Key gsk_secret".to_string(),
        }));
        let (status, body) =
            post_json(harness.app(), "/generate", json!({ "prompt": "brave" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], generate::UNEXPECTED);
        assert!(!body.to_string().contains("gsk_secret"));
    }

    #[tokio::test]
    async fn chat_rejects_history_item_without_content_before_model_call() {
        let harness = Harness::with_model(FakeChatModel::replying("unused"));
        let (status, body) = post_json(
            harness.app(),
            "/api/chat",
            json!({
                "user_message": "Hello",
                "character_name": "Batman (DC Comics)",
                "chat_history": [{ "role": "assistant" }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], chat::HISTORY_ITEM_INVALID);
        assert_eq!(harness.model.calls(), 0);
    }

    #[tokio::test]
    async fn chat_rejects_missing_fields_and_bad_json() {
        let harness = Harness::with_model(FakeChatModel::replying("unused"));

        let (status, body) = post_json(
            harness.app(),
            "/api/chat",
            json!({ "character_name": "Batman" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], chat::MISSING_USER_MESSAGE);

        let (status, body) = post_raw(harness.app(), "/api/chat", "[1, 2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], chat::INVALID_BODY);
        assert_eq!(harness.model.calls(), 0);
    }

    #[tokio::test]
    async fn chat_forwards_full_conversation() {
        let harness = Harness::with_model(FakeChatModel::replying("  I am vengeance.  "));
        let (status, body) = post_json(
            harness.app(),
            "/api/chat",
            json!({
                "user_message": "Who are you?",
                "character_name": "Batman (DC Comics)",
                "chat_history": [
                    { "role": "assistant", "content": "Greetings." },
                    { "role": "user", "content": "Hi" }
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assistant_response"], "I am vengeance.");

        let request = harness.model.last_request().unwrap();
        let roles: Vec<ChatRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::Assistant, ChatRole::User, ChatRole::User]
        );
        assert_eq!(request.messages[3].content, "Who are you?");
    }

    #[tokio::test]
    async fn chat_forwards_provider_status() {
        let harness = Harness::with_model(FakeChatModel::failing(LlmError::Status {
            status: 429,
            message: "Rate limit reached".to_string(),
        }));
        let (status, body) = post_json(
            harness.app(),
            "/api/chat",
            json!({ "user_message": "Hello", "character_name": "Batman" }),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body["error"],
            "Groq API error: request failed with status 429"
        );
    }

    #[tokio::test]
    async fn chat_without_credential_is_configuration_error() {
        let harness = Harness::with_model(FakeChatModel::unconfigured());
        let (status, body) = post_json(
            harness.app(),
            "/api/chat",
            json!({ "user_message": "Hello", "character_name": "Batman" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], chat::CONFIGURATION_ERROR);
    }

    #[tokio::test]
    async fn chat_page_decodes_and_escapes_name() {
        let harness = Harness::with_model(FakeChatModel::replying("unused"));

        let (status, html) = get_text(harness.app(), "/chat/Batman+%28DC+Comics%29").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Chat with Batman (DC Comics)"));

        let (_, html) = get_text(harness.app(), "/chat/%3Cscript%3Ealert(1)%3C%2Fscript%3E").await;
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn health_reports_model_configuration() {
        let harness = Harness::with_model(FakeChatModel::unconfigured());
        let (status, body) = get_text(harness.app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["model_configured"], false);

        let (status, html) = get_text(harness.app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("/generate"));
    }
}
