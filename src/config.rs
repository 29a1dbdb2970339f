use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};

use crate::search::SafeSearch;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_DUCKDUCKGO_BASE_URL: &str = "https://duckduckgo.com";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ImageSearchSettings {
    pub base_url: String,
    pub region: String,
    pub safesearch: SafeSearch,
    pub image_type: String,
    pub max_results: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ImageFetchSettings {
    pub timeout_seconds: u64,
    pub min_bytes: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: String,
    pub log_dir: String,
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub llm_timeout_seconds: u64,
    pub suggestion: ModelSettings,
    pub chat: ModelSettings,
    pub image_search: ImageSearchSettings,
    pub image_fetch: ImageFetchSettings,
    /// Problems found while reading the environment, logged once the
    /// subscriber is installed.
    pub startup_warnings: Vec<String>,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_safesearch(value: &str) -> Result<SafeSearch, String> {
    SafeSearch::parse(value).ok_or_else(|| {
        format!("Unknown IMAGE_SEARCH_SAFESEARCH value '{value}'; defaulting to moderate.")
    })
}

impl Config {
    /// Reads the process environment. A missing `GROQ_API_KEY` is not an
    /// error here; the model endpoints report it per request instead.
    pub fn from_env() -> Result<Self> {
        let bind_raw = env_string("BIND_ADDRESS", "0.0.0.0:5000");
        let bind_address = bind_raw
            .parse::<SocketAddr>()
            .map_err(|err| anyhow!("Invalid BIND_ADDRESS '{bind_raw}': {err}"))?;

        let mut startup_warnings = Vec::new();

        let groq_api_key = env_string("GROQ_API_KEY", "").trim().to_string();
        if groq_api_key.is_empty() {
            startup_warnings.push("GROQ_API_KEY environment variable not set.".to_string());
        }

        let safesearch = normalize_safesearch(&env_string("IMAGE_SEARCH_SAFESEARCH", "moderate"))
            .unwrap_or_else(|warning| {
                startup_warnings.push(warning);
                SafeSearch::Moderate
            });

        let top_p = env_f32("LLM_TOP_P", 1.0);

        Ok(Config {
            bind_address,
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: env_string("LOG_DIR", "logs"),
            groq_api_key,
            groq_base_url: env_string("GROQ_BASE_URL", DEFAULT_GROQ_BASE_URL),
            llm_timeout_seconds: env_u64("LLM_TIMEOUT_SECONDS", 60).max(1),
            suggestion: ModelSettings {
                model: env_string("SUGGESTION_MODEL", "llama3-70b-8192"),
                temperature: env_f32("SUGGESTION_TEMPERATURE", 0.8),
                top_p,
                max_tokens: env_u32("SUGGESTION_MAX_TOKENS", 150),
            },
            chat: ModelSettings {
                model: env_string("CHAT_MODEL", "llama3-8b-8192"),
                temperature: env_f32("CHAT_TEMPERATURE", 0.8),
                top_p,
                max_tokens: env_u32("CHAT_MAX_TOKENS", 200),
            },
            image_search: ImageSearchSettings {
                base_url: env_string("DUCKDUCKGO_BASE_URL", DEFAULT_DUCKDUCKGO_BASE_URL),
                region: env_string("IMAGE_SEARCH_REGION", "wt-wt"),
                safesearch,
                image_type: env_string("IMAGE_SEARCH_TYPE", "photo"),
                max_results: env_usize("IMAGE_SEARCH_MAX_RESULTS", 5).clamp(1, 20),
                timeout_seconds: env_u64("IMAGE_SEARCH_TIMEOUT_SECONDS", 10).max(1),
            },
            image_fetch: ImageFetchSettings {
                timeout_seconds: env_u64("IMAGE_FETCH_TIMEOUT_SECONDS", 15).max(1),
                min_bytes: env_usize("IMAGE_MIN_BYTES", 500),
                user_agent: env_string("IMAGE_USER_AGENT", "Mozilla/5.0"),
            },
            startup_warnings,
        })
    }
}

pub const SUGGESTION_SYSTEM_PROMPT: &str = "You are an assistant that suggests famous fictional characters (from Anime, movies, TV shows, books, comics, games, etc.) based on personality traits. Respond ONLY with a comma-separated list of at least 4 character names. Make sure each one of them is from a different category. Include the source (like 'Light Yagami (Death Note)', 'Batman (DC Comics)'). Do not add any introductory text, explanations, or numbering. Example: Naruto Uzumaki (Naruto), Batman (DC Comics), Sherlock Holmes (Books by A. Conan Doyle), Wonder Woman (DC Comics), Lara Croft (Tomb Raider Games).";

pub const SUGGESTION_USER_PROMPT: &str =
    "Suggest at least 4 famous fictional characters based on these traits: {traits}";

pub const PERSONA_SYSTEM_PROMPT: &str = "You are embodying the character '{character_name}'. Respond to the user's message below in the first person, staying true to the character's known personality, voice, mannerisms, and knowledge based on their source material. Keep your response concise and conversational for a chat interface. Do not break character. Do not mention that you are an AI.";
