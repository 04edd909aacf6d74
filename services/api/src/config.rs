//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Everything here is read once before the
//! first request and injected explicitly; nothing reads ambient globals later.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use studium_core::domain::{Language, ProviderKind};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for one LLM provider, fixed at startup.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Present only when the key looks like a real credential.
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub upload_directory: PathBuf,
    pub claude: ProviderConfig,
    pub openai: ProviderConfig,
    pub anthropic_base_url: String,
    pub primary_ai_service: ProviderKind,
    pub default_language: Language,
    pub max_file_size: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_processing_time: Duration,
    pub max_flashcards: usize,
    pub max_trivia_questions: usize,
}

/// Well-known placeholder values that must not enable a provider.
const KEY_PLACEHOLDERS: &[&str] = &[
    "your_openai_api_key_here",
    "your_anthropic_api_key_here",
    "sk-proj-your-key-here",
    "sk-ant-your-key-here",
    "your_api_key_here",
    "your_key_here",
    "replace_with_your_key",
];

/// Returns the key only if it is plausibly real: non-empty, not a known
/// placeholder, and matching the provider's issued-key format.
fn validate_api_key(key: Option<String>, provider: ProviderKind) -> Option<String> {
    let key = key?;
    if key.is_empty() {
        return None;
    }
    if KEY_PLACEHOLDERS.iter().any(|p| p.eq_ignore_ascii_case(&key)) {
        return None;
    }
    let plausible = match provider {
        ProviderKind::Claude => key.starts_with("sk-ant-api03-") && key.len() > 20,
        ProviderKind::OpenAi => key.starts_with("sk-") && key.len() > 20,
    };
    plausible.then_some(key)
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let upload_directory = std::env::var("UPLOAD_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        // --- Load Provider Settings (keys are optional) ---
        let claude = ProviderConfig {
            model: std::env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            max_tokens: parse_var("CLAUDE_MAX_TOKENS", 1000u32)?,
            temperature: parse_var("CLAUDE_TEMPERATURE", 0.7f32)?,
            api_key: validate_api_key(std::env::var("ANTHROPIC_API_KEY").ok(), ProviderKind::Claude),
        };
        let openai = ProviderConfig {
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            max_tokens: parse_var("OPENAI_MAX_TOKENS", 1000u32)?,
            temperature: parse_var("OPENAI_TEMPERATURE", 0.7f32)?,
            api_key: validate_api_key(std::env::var("OPENAI_API_KEY").ok(), ProviderKind::OpenAi),
        };
        let anthropic_base_url = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());

        let primary_ai_service = match std::env::var("PRIMARY_AI_SERVICE")
            .unwrap_or_else(|_| "claude".to_string())
            .as_str()
        {
            "claude" => ProviderKind::Claude,
            "openai" => ProviderKind::OpenAi,
            other => {
                return Err(ConfigError::InvalidValue(
                    "PRIMARY_AI_SERVICE".to_string(),
                    format!("'{other}' is not a known provider (claude, openai)"),
                ))
            }
        };

        let default_language = std::env::var("DEFAULT_LANGUAGE")
            .unwrap_or_else(|_| "es".to_string())
            .parse::<Language>()
            .map_err(|e| ConfigError::InvalidValue("DEFAULT_LANGUAGE".to_string(), e))?;

        // --- Load Processing Settings ---
        let max_file_size = parse_var("MAX_FILE_SIZE", 10 * 1024 * 1024usize)?;
        let chunk_size = parse_var("CHUNK_SIZE", 1000usize)?;
        let chunk_overlap = parse_var("CHUNK_OVERLAP", 200usize)?;
        let max_processing_time = Duration::from_secs(parse_var("MAX_PROCESSING_TIME", 30u64)?);
        let max_flashcards = parse_var("MAX_FLASHCARDS", 10usize)?;
        let max_trivia_questions = parse_var("MAX_TRIVIA_QUESTIONS", 10usize)?;

        if chunk_overlap >= chunk_size {
            return Err(ConfigError::InvalidValue(
                "CHUNK_OVERLAP".to_string(),
                format!("overlap {chunk_overlap} must be smaller than CHUNK_SIZE {chunk_size}"),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            upload_directory,
            claude,
            openai,
            anthropic_base_url,
            primary_ai_service,
            default_language,
            max_file_size,
            chunk_size,
            chunk_overlap,
            max_processing_time,
            max_flashcards,
            max_trivia_questions,
        })
    }

    /// Ordered provider list: primary first, the other second, unavailable
    /// providers skipped entirely.
    pub fn service_priority(&self) -> Vec<ProviderKind> {
        let mut priority = Vec::with_capacity(2);
        let ordered = match self.primary_ai_service {
            ProviderKind::Claude => [ProviderKind::Claude, ProviderKind::OpenAi],
            ProviderKind::OpenAi => [ProviderKind::OpenAi, ProviderKind::Claude],
        };
        for kind in ordered {
            let available = match kind {
                ProviderKind::Claude => self.claude.is_available(),
                ProviderKind::OpenAi => self.openai.is_available(),
            };
            if available {
                priority.push(kind);
            }
        }
        priority
    }
}
