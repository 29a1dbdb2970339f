use axum::extract::State;
use axum::http::Uri;
use axum::response::Html;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;
use crate::utils::text::{decode_url_name, escape_html};

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Persona Match</title></head>
<body>
<main id="app">
<h1>Which fictional character are you?</h1>
<p>Describe your personality traits and POST them as <code>{"prompt": "..."}</code> to <code>/generate</code>.</p>
</main>
</body>
</html>
"#;

fn render_chat_page(character_name: &str) -> String {
    let name = escape_html(character_name);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Chat with {name}</title></head>
<body>
<main id="chat" data-character-name="{name}">
<h1>Chat with {name}</h1>
<p>Send <code>{{"character_name", "user_message", "chat_history"}}</code> to <code>/api/chat</code>.</p>
</main>
</body>
</html>
"#
    )
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Decodes the raw segment once with form rules (`+` is a space), the
/// inverse of how `/generate` builds `url_name`.
pub async fn chat_page(uri: Uri) -> Html<String> {
    let raw = uri.path().strip_prefix("/chat/").unwrap_or_default();
    Html(render_chat_page(&decode_url_name(raw)))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_configured": state.model.is_configured(),
    }))
}
