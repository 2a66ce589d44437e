//! PdfAudio
//!
//! An HTTP service that turns uploaded PDFs into spoken MP3 audio using the
//! OpenAI speech API.

mod config;
mod error;
mod extractor;
mod handlers;
mod server;
mod storage;
mod synthesizer;
mod types;

use config::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,pdf_audio=debug,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("PdfAudio starting...");

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Please ensure OPENAI_API_KEY is set in the environment or .env file");
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully");
    info!("Speech model: {} (voice: {})", config.tts_model, config.tts_voice);

    // Run the server
    if let Err(e) = server::run(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
