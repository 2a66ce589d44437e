//! HTTP server setup
//!
//! Builds the axum router and serves it on the configured address

use crate::config::Config;
use crate::handlers::{convert, download, upload_form, AppState};
use crate::storage::ArtifactStore;
use crate::synthesizer::SpeechSynthesizer;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build application state from configuration
pub async fn build_state(config: &Config) -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let store = ArtifactStore::new(config.upload_dir.clone());
    store.ensure_dir().await?;

    let synthesizer = SpeechSynthesizer::new(config)?;

    Ok(Arc::new(AppState {
        store,
        synthesizer,
        max_chars: config.max_chars,
    }))
}

/// Assemble the router
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // Browser front ends on other origins post uploads directly
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(upload_form).post(convert))
        .route("/convert", post(convert))
        .route("/download/{filename}", get(download))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process stops
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = build_state(&config).await?;
    info!("Storing artifacts in {:?}", state.store.root());

    let app = router(state, config.max_upload_bytes);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("PdfAudio listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::fixtures::pdf_with_text;
    use crate::types::{ConversionResponse, ErrorResponse};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUDIO: &[u8] = b"ID3\x04\x00fake-mp3-frames";

    struct Harness {
        server: TestServer,
        speech: MockServer,
        dir: TempDir,
    }

    async fn harness() -> Harness {
        let speech = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let base_url = format!("{}/v1", speech.uri());
        let upload_dir = dir.path().join("uploads").to_string_lossy().into_owned();
        let config = Config::from_lookup(move |key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "OPENAI_BASE_URL" => Some(base_url.clone()),
            "UPLOAD_DIR" => Some(upload_dir.clone()),
            _ => None,
        })
        .unwrap();

        let state = build_state(&config).await.unwrap();
        let server = TestServer::new(router(state, config.max_upload_bytes)).unwrap();

        Harness { server, speech, dir }
    }

    async fn mock_speech_ok(speech: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO.to_vec()))
            .expect(expected_calls)
            .mount(speech)
            .await;
    }

    fn pdf_form(pdf: Vec<u8>) -> MultipartForm {
        let part = Part::bytes(pdf).file_name("document.pdf").mime_type("application/pdf");
        MultipartForm::new().add_part("file", part)
    }

    fn is_download_url(url: &str) -> bool {
        url.strip_prefix("/download/")
            .and_then(|name| name.strip_suffix(".mp3"))
            .map(|id| id.len() == 32 && id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_upload_form() {
        let h = harness().await;
        let response = h.server.get("/").await;
        response.assert_status_ok();
        let body = response.text();
        assert!(body.contains("<form"));
        assert!(body.contains(r#"name="file""#));
    }

    #[tokio::test]
    async fn test_convert_and_download() {
        let h = harness().await;
        mock_speech_ok(&h.speech, 1).await;

        let response = h.server.post("/").multipart(pdf_form(pdf_with_text(Some("Hello world")))).await;
        response.assert_status_ok();
        let body: ConversionResponse = response.json();
        assert!(is_download_url(&body.download_url), "bad url {}", body.download_url);

        // Both the source document and the audio land in the flat directory
        let id = &body.download_url["/download/".len()..body.download_url.len() - ".mp3".len()];
        let uploads = h.dir.path().join("uploads");
        assert!(uploads.join(format!("{id}.pdf")).exists());
        assert!(uploads.join(format!("{id}.mp3")).exists());

        let download = h.server.get(&body.download_url).await;
        download.assert_status_ok();
        assert_eq!(&download.as_bytes()[..], AUDIO);
        let disposition = download.header("content-disposition");
        assert!(disposition.to_str().unwrap().starts_with("attachment"));
        assert_eq!(download.header("content-type"), "audio/mpeg");

        // Retrieval is repeatable
        let again = h.server.get(&body.download_url).await;
        assert_eq!(&again.as_bytes()[..], AUDIO);
    }

    #[tokio::test]
    async fn test_convert_alias_runs_the_same_pipeline() {
        let h = harness().await;
        mock_speech_ok(&h.speech, 1).await;

        let response = h.server.post("/convert").multipart(pdf_form(pdf_with_text(Some("Alias")))).await;
        response.assert_status_ok();
        let body: ConversionResponse = response.json();
        assert!(is_download_url(&body.download_url));
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let h = harness().await;
        mock_speech_ok(&h.speech, 0).await;

        let form = MultipartForm::new().add_text("purpose", "audio");
        let response = h.server.post("/").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "no file uploaded");
    }

    #[tokio::test]
    async fn test_non_multipart_body() {
        let h = harness().await;
        mock_speech_ok(&h.speech, 0).await;

        let response = h.server.post("/").text("just text").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "no file uploaded");
    }

    #[tokio::test]
    async fn test_blank_pdf_is_rejected_without_synthesis() {
        let h = harness().await;
        mock_speech_ok(&h.speech, 0).await;

        let response = h.server.post("/").multipart(pdf_form(pdf_with_text(None))).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "no extractable text");
    }

    #[tokio::test]
    async fn test_unreadable_pdf() {
        let h = harness().await;
        mock_speech_ok(&h.speech, 0).await;

        let response = h.server.post("/").multipart(pdf_form(b"not a pdf at all".to_vec())).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorResponse = response.json();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_speech_service_failure() {
        let h = harness().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&h.speech)
            .await;

        let response = h.server.post("/").multipart(pdf_form(pdf_with_text(Some("Hello")))).await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "speech synthesis failed");
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_before_synthesis() {
        let h = harness().await;
        mock_speech_ok(&h.speech, 1).await;

        let text = format!("{}TAILMARKER", "a".repeat(4500));
        let response = h.server.post("/").multipart(pdf_form(pdf_with_text(Some(&text)))).await;
        response.assert_status_ok();

        let requests = h.speech.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let input = sent["input"].as_str().unwrap();
        assert_eq!(input.chars().count(), 4000);
        assert!(!input.contains("TAILMARKER"));
        assert_eq!(sent["model"], "gpt-4o-mini-tts");
        assert_eq!(sent["voice"], "alloy");
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let h = harness().await;
        let response = h.server.get("/download/00000000000000000000000000000000.mp3").await;
        response.assert_status_not_found();
        let body: ErrorResponse = response.json();
        assert!(body.error.contains("not found"));
    }

    #[tokio::test]
    async fn test_download_rejects_traversal() {
        let h = harness().await;
        std::fs::write(h.dir.path().join("secret.txt"), b"top secret").unwrap();

        let response = h.server.get("/download/..%2Fsecret.txt").await;
        response.assert_status_not_found();
    }
}
