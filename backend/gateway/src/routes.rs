//! Route handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap},
    Json,
};
use medbuddy_core::{MealRelation, ScheduleEntry};
use medbuddy_media::{decode_image_blocking, is_allowed_extension, save_upload};
use medbuddy_understanding::SchedulePipeline;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ApiError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SchedulePipeline>,
    pub upload_dir: PathBuf,
    pub allowed_extensions: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(pipeline: Arc<SchedulePipeline>, upload_dir: impl Into<PathBuf>, allowed_extensions: Vec<String>) -> Self {
        Self {
            pipeline,
            upload_dir: upload_dir.into(),
            allowed_extensions: Arc::new(allowed_extensions),
        }
    }
}

/// Body of a successful `/process` call. Never carries a detection status.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub schedule: Vec<ScheduleEntry>,
    pub meal_relation: MealRelation,
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Server ready" }))
}

struct Upload {
    file_name: String,
    data: Vec<u8>,
}

/// Pull the `image` file part out of the form. Parts without a file name
/// are plain form fields and are ignored.
async fn read_image_field(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!(field = %name, "Ignoring form field");
            continue;
        };
        if name != "image" {
            debug!(field = %name, file = %file_name, "Ignoring file field");
            continue;
        }
        let data = field.bytes().await?.to_vec();
        return Ok(Some(Upload { file_name, data }));
    }
    Ok(None)
}

/// `POST /process`
pub async fn process(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    if !is_form {
        return Err(ApiError::bad_request("Invalid content type. Use form-data"));
    }
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let upload = read_image_field(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No image provided"))?;
    info!(file = %upload.file_name, bytes = upload.data.len(), "Received upload");

    if upload.file_name.is_empty() {
        return Err(ApiError::bad_request("Empty filename"));
    }
    if !is_allowed_extension(&upload.file_name, state.allowed_extensions.as_slice()) {
        return Err(ApiError::bad_request("Invalid file type"));
    }

    let saved = save_upload(&state.upload_dir, &upload.file_name, &upload.data).await?;
    let label = saved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| upload.file_name.clone());

    let image = decode_image_blocking(upload.data).await?;
    let result = state.pipeline.run(Arc::new(image), &label).await?;

    if result.is_fallback() {
        info!(upload = %label, "No medication schedule detected in the image");
    }

    Ok(Json(ProcessResponse {
        schedule: result.schedule,
        meal_relation: result.meal_relation,
    }))
}
