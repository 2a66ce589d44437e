//! Configuration management for PdfAudio
//!
//! Loads settings from environment variables (.env file)

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI API key used for speech synthesis
    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible API
    pub openai_base_url: String,
    /// Interface to bind
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Flat directory holding uploaded PDFs and generated audio
    pub upload_dir: PathBuf,
    /// Speech model identifier
    pub tts_model: String,
    /// Voice used for synthesis
    pub tts_voice: String,
    /// Request timeout for the speech API; `None` keeps the client default
    pub tts_timeout: Option<Duration>,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
    /// Maximum number of characters sent to the speech API
    pub max_chars: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let openai_api_key =
            get("OPENAI_API_KEY").ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let port = parse_or("PORT", get("PORT"), defaults::PORT)?;
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), defaults::MAX_UPLOAD_BYTES)?;

        let tts_timeout = get("TTS_TIMEOUT_SECS")
            .map(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::InvalidValue("TTS_TIMEOUT_SECS".to_string(), s))
            })
            .transpose()?;

        Ok(Self {
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| defaults::OPENAI_BASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            upload_dir: get("UPLOAD_DIR").unwrap_or_else(|| defaults::UPLOAD_DIR.to_string()).into(),
            tts_model: get("TTS_MODEL").unwrap_or_else(|| models::GPT_4O_MINI_TTS.to_string()),
            tts_voice: get("TTS_VOICE").unwrap_or_else(|| voices::ALLOY.to_string()),
            tts_timeout,
            max_upload_bytes,
            max_chars: defaults::MAX_CHARS,
        })
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(s) => s.trim().parse().map_err(|_| ConfigError::InvalidValue(key.to_string(), s)),
        None => Ok(default),
    }
}

pub mod defaults {
    pub const PORT: u16 = 5000;
    pub const HOST: &str = "0.0.0.0";
    pub const UPLOAD_DIR: &str = "uploads";
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
    pub const MAX_CHARS: usize = 4000;
}

/// Speech model identifiers
pub mod models {
    pub const GPT_4O_MINI_TTS: &str = "gpt-4o-mini-tts";
}

pub mod voices {
    pub const ALLOY: &str = "alloy";
}
