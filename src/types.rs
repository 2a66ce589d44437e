//! API response bodies

use serde::{Deserialize, Serialize};

/// Successful conversion
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversionResponse {
    /// Path the audio can be fetched from, e.g. `/download/<id>.mp3`
    pub download_url: String,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
