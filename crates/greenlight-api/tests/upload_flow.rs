//! Upload workflow integration tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use greenlight_api::{create_router, ApiConfig, AppState};
use greenlight_media::{Annotator, DetectionProvider, LabelFont, MediaError, MediaResult};
use greenlight_models::{BoundingBox, Detection};
use greenlight_storage::LocalStore;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "greenlight-test-boundary";

/// Returns the same detections for every image.
struct StubDetector(Vec<Detection>);

impl DetectionProvider for StubDetector {
    fn detect(&self, _image: &DynamicImage) -> MediaResult<Vec<Detection>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct FailingDetector;

impl DetectionProvider for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> MediaResult<Vec<Detection>> {
        Err(MediaError::inference("model exploded"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct TestApp {
    router: Router,
    _root: TempDir,
    uploads: PathBuf,
    results: PathBuf,
}

fn street_detections() -> Vec<Detection> {
    vec![
        Detection::new("mobil", 0.91, BoundingBox::new(10.0, 40.0, 60.0, 80.0)),
        Detection::new("mobil", 0.55, BoundingBox::new(70.0, 40.0, 120.0, 80.0)),
        Detection::new("motor", 0.48, BoundingBox::new(130.0, 50.0, 150.0, 90.0)),
        // Below the default threshold; neither counted nor drawn
        Detection::new("mobil", 0.10, BoundingBox::new(0.0, 0.0, 5.0, 5.0)),
    ]
}

fn test_app(detector: Arc<dyn DetectionProvider>) -> TestApp {
    test_app_with_limit(detector, ApiConfig::default().max_body_size)
}

fn test_app_with_limit(detector: Arc<dyn DetectionProvider>, max_body_size: usize) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let uploads = root.path().join("uploads");
    let results = root.path().join("static/results");

    let font_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/fonts/DejaVuSans.ttf");
    let config = ApiConfig {
        upload_dir: uploads.clone(),
        result_dir: results.clone(),
        font_path: font_path.clone(),
        max_body_size,
        ..ApiConfig::default()
    };

    let store = LocalStore::open(&uploads, &results).unwrap();
    let annotator = Annotator::new(LabelFont::from_path(&font_path).unwrap());
    let state = AppState::from_parts(config, detector, annotator, store);

    TestApp {
        router: create_router(state, None),
        _root: root,
        uploads,
        results,
    }
}

fn png_bytes() -> Vec<u8> {
    let image = RgbImage::from_pixel(200, 120, Rgb([90, 90, 90]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Test the upload form.
#[tokio::test]
async fn test_get_renders_form() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<form"));
    assert!(html.contains("name=\"file\""));
}

#[tokio::test]
async fn test_form_shows_rejection_message() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/?error=unsupported_type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let html = body_string(response).await;
    assert!(html.contains("Only PNG and JPEG images are supported."));
}

/// Test that a text file is bounced without touching the results directory.
#[tokio::test]
async fn test_txt_upload_redirects_without_results() {
    let app = test_app(Arc::new(StubDetector(street_detections())));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some("notes.txt"), b"hello")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/?error=unsupported_type"
    );
    assert!(file_names(&app.results).is_empty());
    assert!(file_names(&app.uploads).is_empty());
}

#[tokio::test]
async fn test_missing_file_part_redirects() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("photo", Some("cam.png"), &png_bytes())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/?error=no_file");
}

#[tokio::test]
async fn test_file_part_without_filename_redirects() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", None, b"abc")))
        .await
        .unwrap();

    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/?error=no_file");
}

#[tokio::test]
async fn test_empty_filename_redirects() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some(""), b"")))
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/?error=empty_filename"
    );
}

#[tokio::test]
async fn test_non_multipart_post_redirects() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

/// Test the full workflow: one result file named after the sanitized upload.
#[tokio::test]
async fn test_valid_upload_renders_result() {
    let app = test_app(Arc::new(StubDetector(street_detections())));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some("my cam.png"), &png_bytes())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;

    // 2 cars + 1 motorcycle -> 10 + 12 + 5 = 27s, saving 33s (55%)
    assert!(html.contains("<td>27 s</td>"), "{html}");
    assert!(html.contains("<td>33.0 s</td>"));
    assert!(html.contains("<td>55.00 %</td>"));
    assert!(html.contains("src=\"/results/my_cam.png\""));
    assert!(html.contains("src=\"/uploads/my_cam.png\""));

    assert_eq!(file_names(&app.results), vec!["my_cam.png".to_string()]);
    assert_eq!(file_names(&app.uploads), vec!["my_cam.png".to_string()]);

    let original = image::open(app.uploads.join("my_cam.png")).unwrap().to_rgb8();
    let annotated = image::open(app.results.join("my_cam.png")).unwrap().to_rgb8();
    assert_eq!(original.dimensions(), annotated.dimensions());
    assert_ne!(original.as_raw(), annotated.as_raw());
}

#[tokio::test]
async fn test_valid_upload_json() {
    let app = test_app(Arc::new(StubDetector(street_detections())));

    let mut request = upload_request(multipart_body("file", Some("cam.png"), &png_bytes()));
    request
        .headers_mut()
        .insert(header::ACCEPT, "application/json".parse().unwrap());

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["cars"], 2);
    assert_eq!(body["motorcycles"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["green_time"], 27);
    assert_eq!(body["improvement_time"], 33.0);
    assert_eq!(body["improvement_pct"], 55.0);
    assert_eq!(body["result_url"], "/results/cam.png");
}

/// A PNG carrying a `.jpg` name is decoded by content.
#[tokio::test]
async fn test_png_named_jpg_is_analyzed() {
    let app = test_app(Arc::new(StubDetector(street_detections())));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some("cam.jpg"), &png_bytes())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(file_names(&app.results), vec!["cam.jpg".to_string()]);
    let annotated = image::open(app.results.join("cam.jpg")).unwrap();
    assert_eq!((annotated.width(), annotated.height()), (200, 120));
}

#[tokio::test]
async fn test_body_over_limit_is_payload_too_large() {
    let app = test_app_with_limit(Arc::new(StubDetector(vec![])), 1024);

    // No Content-Length header, so the limit trips while streaming the parts
    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some("cam.png"), &[0u8; 8192])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(file_names(&app.uploads).is_empty());
}

#[tokio::test]
async fn test_result_image_is_served() {
    let app = test_app(Arc::new(StubDetector(street_detections())));

    let response = app
        .router
        .clone()
        .oneshot(upload_request(multipart_body("file", Some("cam.png"), &png_bytes())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/results/cam.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
}

#[tokio::test]
async fn test_unknown_class_is_server_error() {
    let app = test_app(Arc::new(StubDetector(vec![Detection::new(
        "bus",
        0.9,
        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
    )])));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some("cam.png"), &png_bytes())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(file_names(&app.results).is_empty());
}

#[tokio::test]
async fn test_corrupt_image_is_server_error() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some("cam.jpg"), b"definitely not a jpeg")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_detector_failure_is_server_error() {
    let app = test_app(Arc::new(FailingDetector));

    let response = app
        .router
        .oneshot(upload_request(multipart_body("file", Some("cam.png"), &png_bytes())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(file_names(&app.results).is_empty());
}

/// Test health endpoints.
#[tokio::test]
async fn test_health_and_ready() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    for uri in ["/health", "/healthz", "/ready"] {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert!(response.headers().contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn test_metrics_disabled_is_not_found() {
    let app = test_app(Arc::new(StubDetector(vec![])));

    let response = app
        .router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
