//! Upload workflow handlers.
//!
//! `GET /` shows the form. `POST /` validates the `file` part, stores it,
//! runs detection and annotation, and renders the timing suggestion.
//! Invalid uploads are redirected back to the form with an `error` code.

use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use greenlight_media::analyze_image;
use greenlight_models::{CountSummary, TimingResult};
use greenlight_storage::{allowed_file, secure_filename};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::views::{self, ResultView, UploadRejection};

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    pub error: Option<String>,
}

/// Render the upload form.
pub async fn upload_form(Query(query): Query<FormQuery>) -> Html<String> {
    let rejection = query.error.as_deref().and_then(UploadRejection::from_code);
    Html(views::upload_form(rejection))
}

/// JSON body returned when the client asks for `application/json`.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub cars: u32,
    pub motorcycles: u32,
    pub total: u32,
    pub green_time: u32,
    pub improvement_time: f64,
    pub improvement_pct: f64,
    pub uploaded_filename: String,
    pub result_filename: String,
    pub uploaded_url: String,
    pub result_url: String,
}

impl AnalysisResponse {
    fn new(counts: &CountSummary, timing: &TimingResult, uploaded: &str, result: &str) -> Self {
        Self {
            cars: counts.cars,
            motorcycles: counts.motorcycles,
            total: counts.total(),
            green_time: timing.green_time,
            improvement_time: timing.improvement_time,
            improvement_pct: timing.improvement_pct,
            uploaded_filename: uploaded.to_string(),
            result_filename: result.to_string(),
            uploaded_url: format!("/uploads/{}", uploaded),
            result_url: format!("/results/{}", result),
        }
    }
}

/// The `file` part as received.
struct RawUpload {
    filename: String,
    data: Vec<u8>,
}

/// Handle an image upload.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Option<Multipart>,
) -> ApiResult<Response> {
    let upload = match read_file_part(multipart).await? {
        Ok(upload) => upload,
        Err(rejection) => return Ok(reject(rejection)),
    };
    let filename = match validate_upload(&upload) {
        Ok(filename) => filename,
        Err(rejection) => return Ok(reject(rejection)),
    };

    let upload_path = state.store.save_upload(&filename, &upload.data).await?;
    let result_path = state.store.result_path(&filename)?;

    let detector = state.detector.clone();
    let annotator = state.annotator.clone();
    let threshold = state.config.confidence_threshold;
    let analysis = tokio::task::spawn_blocking(move || {
        analyze_image(
            detector.as_ref(),
            &annotator,
            &upload_path,
            &result_path,
            threshold,
        )
    })
    .await
    .map_err(|e| ApiError::internal(format!("Analysis task failed: {}", e)))?
    .inspect_err(|_| metrics::record_upload("failed"))?;

    let timing = state.config.timing.summarize(&analysis.counts).rounded();
    metrics::record_upload("analyzed");
    metrics::record_analysis(
        &analysis.counts,
        timing.green_time,
        analysis.detection_time.as_secs_f64(),
    );

    let result_filename = analysis
        .result_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename.as_str())
        .to_string();

    info!(
        filename = %filename,
        total = analysis.counts.total(),
        green_time = timing.green_time,
        improvement_time = timing.improvement_time,
        "Upload analyzed"
    );

    if wants_json(&headers) {
        return Ok(Json(AnalysisResponse::new(
            &analysis.counts,
            &timing,
            &filename,
            &result_filename,
        ))
        .into_response());
    }

    let page = views::result_page(&ResultView {
        counts: &analysis.counts,
        timing: &timing,
        uploaded_filename: &filename,
        result_filename: &result_filename,
    });
    Ok(Html(page).into_response())
}

/// Pull the `file` part out of the multipart body.
///
/// A missing body, a missing `file` part, or a `file` part without a
/// filename all count as "no file".
async fn read_file_part(
    multipart: Option<Multipart>,
) -> ApiResult<Result<RawUpload, UploadRejection>> {
    let Some(mut multipart) = multipart else {
        return Ok(Err(UploadRejection::NoFile));
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            return Ok(Err(UploadRejection::NoFile));
        };
        let data = field.bytes().await?;

        return Ok(Ok(RawUpload {
            filename,
            data: data.to_vec(),
        }));
    }

    Ok(Err(UploadRejection::NoFile))
}

/// Check the upload and return its sanitized storage name.
fn validate_upload(upload: &RawUpload) -> Result<String, UploadRejection> {
    if upload.filename.is_empty() {
        return Err(UploadRejection::EmptyFilename);
    }
    if !allowed_file(&upload.filename) {
        return Err(UploadRejection::UnsupportedType);
    }

    // Sanitizing can strip the stem or the dot; the stored name must still
    // carry an image extension for the result encoder.
    let filename = secure_filename(&upload.filename);
    if filename.is_empty() || !allowed_file(&filename) {
        return Err(UploadRejection::UnsupportedType);
    }
    if upload.data.is_empty() {
        return Err(UploadRejection::EmptyFile);
    }

    Ok(filename)
}

fn reject(rejection: UploadRejection) -> Response {
    warn!(reason = rejection.code(), "Upload rejected");
    metrics::record_upload("rejected");
    Redirect::to(&format!("/?error={}", rejection.code())).into_response()
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}
