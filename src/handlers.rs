//! PDF-to-audio request handlers

use crate::error::{AppError, Result};
use crate::extractor::{self, truncate_chars};
use crate::storage::{get_mime_type, ArtifactId, ArtifactStore};
use crate::synthesizer::SpeechSynthesizer;
use crate::types::ConversionResponse;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Shared state handed to every handler
pub struct AppState {
    pub store: ArtifactStore,
    pub synthesizer: SpeechSynthesizer,
    /// Characters of extracted text sent to the speech API
    pub max_chars: usize,
}

pub const UPLOAD_FORM: &str = r#"<!doctype html>
<title>PDF to Audio</title>
<h1>Upload a PDF to Convert to Audio</h1>
<form method="post" enctype="multipart/form-data" action="/">
  <input type="file" name="file" accept="application/pdf" required>
  <input type="submit" value="Convert">
</form>
"#;

/// GET / - upload form
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// POST / - convert an uploaded PDF to MP3
#[instrument(skip_all)]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResponse>> {
    // A non-multipart body cannot carry the file field
    let multipart = multipart.map_err(|e| {
        debug!("Rejected upload body: {}", e);
        AppError::MissingFile
    })?;

    let upload = read_file_field(multipart).await?.ok_or(AppError::MissingFile)?;
    let download_url = run_conversion(&state, &upload).await?;

    Ok(Json(ConversionResponse { download_url }))
}

/// Take the first non-empty `file` field of the form
async fn read_file_field(mut multipart: Multipart) -> Result<Option<Bytes>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        debug!(filename = ?field.file_name(), "Reading uploaded file");
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            // Browsers send an empty part when no file was chosen
            return Ok(None);
        }
        return Ok(Some(bytes));
    }

    Ok(None)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest {
            message: format!("Failed to parse multipart data: {}", err.body_text()),
        }
    }
}

/// Save, extract, synthesize and store; returns the download path
async fn run_conversion(state: &AppState, upload: &Bytes) -> Result<String> {
    let id = ArtifactId::generate();
    info!(id = %id, bytes = upload.len(), "Starting conversion");

    state.store.save_document(&id, upload).await?;

    let text = extractor::extract_text(upload.to_vec()).await?;
    if !extractor::has_content(&text) {
        info!(id = %id, "Document has no extractable text");
        return Err(AppError::NoExtractableText);
    }

    let chunk = truncate_chars(&text, state.max_chars);
    debug!(
        id = %id,
        extracted_chars = text.chars().count(),
        sent_chars = chunk.chars().count(),
        "Prepared text for synthesis"
    );

    let audio = state.synthesizer.synthesize(chunk).await?;
    state.store.save_audio(&id, &audio).await?;

    let download_url = format!("/download/{}", id.audio_name());
    info!(id = %id, audio_bytes = audio.len(), "Conversion complete");
    Ok(download_url)
}

/// GET /download/{filename} - return a stored file as an attachment
#[instrument(skip_all, fields(filename = %filename))]
pub async fn download(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Result<Response> {
    let bytes = state.store.read(&filename).await?;

    let headers = [
        (header::CONTENT_TYPE, get_mime_type(&filename).to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
    ];
    Ok((headers, bytes).into_response())
}
