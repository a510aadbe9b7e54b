//! Router assembly and the HTTP listener.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use crate::routes::{self, AppState};

/// Options for the HTTP layer that are not handler state.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
    pub cors_permissive: bool,
}

/// Build the application router.
pub fn build_router(state: AppState, options: &RouterOptions) -> Router {
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/process", post(routes::process))
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if options.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Serve `app` on `addr` until Ctrl-C.
#[instrument(skip(app))]
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "MedBuddy API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use image::{Rgb, RgbImage};
    use medbuddy_media::{encode_png, ArtifactStore, FullFrameDetector};
    use medbuddy_providers::MockProvider;
    use medbuddy_understanding::{SchedulePipeline, StickerReader};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "medbuddy-test-boundary";
    const REPLY: &str = r#"{"schedule":[{"time":"morning","pills":1},{"time":"noon","pills":1},{"time":"evening","pills":2}],"meal_relation":"after"}"#;

    fn app(dir: &tempfile::TempDir, reply: &str, max_upload_bytes: usize) -> Router {
        let store = ArtifactStore::new(dir.path().join("stickers"), dir.path().join("results"));
        app_with_store(dir, store, reply, max_upload_bytes)
    }

    fn app_with_store(dir: &tempfile::TempDir, store: ArtifactStore, reply: &str, max_upload_bytes: usize) -> Router {
        let provider = Arc::new(MockProvider::new("mock").with_response(reply));
        let pipeline = SchedulePipeline::new(
            Arc::new(FullFrameDetector),
            StickerReader::new(provider, "mock-vision"),
            store,
        );
        let state = AppState::new(
            Arc::new(pipeline),
            dir.path().join("uploads"),
            vec!["png".into(), "jpg".into(), "jpeg".into(), "gif".into()],
        );
        build_router(
            state,
            &RouterOptions {
                max_upload_bytes,
                cors_permissive: true,
            },
        )
    }

    fn png() -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(16, 24, Rgb([240, 240, 240]))).unwrap()
    }

    fn form(field: &str, file_name: Option<&str>, data: &[u8]) -> Request<Body> {
        let disposition = match file_name {
            Some(f) => format!("form-data; name=\"{field}\"; filename=\"{f}\""),
            None => format!("form-data; name=\"{field}\""),
        };
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/process")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_reports_ready() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "OK", "message": "Server ready"}));
    }

    #[tokio::test]
    async fn valid_png_returns_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), form("image", Some("sticker.png"), &png())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meal_relation"], "after");
        assert_eq!(body["schedule"][2], serde_json::json!({"time": "evening", "pills": 2}));
        assert!(body.get("detection_status").is_none());

        let uploads: Vec<_> = std::fs::read_dir(dir.path().join("uploads")).unwrap().collect();
        assert_eq!(uploads.len(), 1);
        assert!(dir.path().join("results/result_1.json").exists());
    }

    #[tokio::test]
    async fn unreadable_sticker_returns_zero_schedule_without_status() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            app(&dir, "Sorry, the image is too blurry.", 1 << 20),
            form("image", Some("blurry.PNG"), &png()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "schedule": [
                    {"time": "morning", "pills": 0},
                    {"time": "noon", "pills": 0},
                    {"time": "evening", "pills": 0}
                ],
                "meal_relation": "before"
            })
        );
    }

    #[tokio::test]
    async fn wrong_content_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::post("/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid content type. Use form-data");
    }

    #[tokio::test]
    async fn missing_image_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), form("photo", Some("a.png"), &png())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No image provided");
    }

    #[tokio::test]
    async fn empty_filename_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), form("image", Some(""), &png())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Empty filename");
    }

    #[tokio::test]
    async fn text_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), form("image", Some("notes.txt"), b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid file type");
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn empty_upload_is_a_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), form("image", Some("empty.png"), b"")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Processing error: Empty file uploaded");
    }

    #[tokio::test]
    async fn corrupt_image_is_a_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(&dir, REPLY, 1 << 20), form("image", Some("bad.jpg"), b"not a jpeg")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Processing error: "));
    }

    #[tokio::test]
    async fn unwritable_results_dir_is_a_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        std::fs::write(&results, b"not a directory").unwrap();
        let store = ArtifactStore::new(dir.path().join("stickers"), results.clone());

        let (status, body) = send(
            app_with_store(&dir, store, REPLY, 1 << 20),
            form("image", Some("sticker.png"), &png()),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Processing error: storage error: "));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(app(&dir, REPLY, 256), form("image", Some("big.png"), &vec![0u8; 4096])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
