//! Speech synthesis client
//!
//! Sends text to the OpenAI audio speech endpoint and returns MP3 bytes

use crate::config::Config;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Speech API returned no audio")]
    EmptyAudio,
}

/// Request body for speech generation
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Error envelope returned by the API on failure
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Speech API client
pub struct SpeechSynthesizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
}

impl SpeechSynthesizer {
    /// Create a synthesizer from application configuration
    pub fn new(config: &Config) -> Result<Self, SynthesisError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.tts_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
        })
    }

    /// Synthesize `text` into MP3 audio
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}/audio/speech", self.base_url);
        let request = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "mp3",
        };

        debug!(model = %self.model, voice = %self.voice, chars = text.chars().count(), "Requesting speech");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Speech request failed: {} - {}", status, body);

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(SynthesisError::RateLimitExceeded);
            }

            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SynthesisError::Api { status, message });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        info!(bytes = audio.len(), "Received synthesized audio");
        Ok(audio.to_vec())
    }
}
