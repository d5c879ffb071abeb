use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ai_or_human::classifier::{Classifier, ModelDescriptor};
use ai_or_human::config::Config;
use ai_or_human::handlers::{ErrorResponse, MSG_RATE_LIMITED};
use ai_or_human::instagram::{FetchError, PostFetcher, PostInfo};
use ai_or_human::{router, AppState, PredictionResult};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tower::ServiceExt;

const BOUNDARY: &str = "----aiorhumanboundary";

struct FixedClassifier {
    descriptor: ModelDescriptor,
    prob_ai: f64,
}

impl Classifier for FixedClassifier {
    fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    fn classify(&self, _image: &DynamicImage) -> anyhow::Result<PredictionResult> {
        Ok(PredictionResult::from_prob_ai(self.prob_ai))
    }
}

struct StubFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl PostFetcher for StubFetcher {
    async fn fetch_post(&self, shortcode: &str) -> Result<PostInfo, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match shortcode {
            "private" => Err(FetchError::Inaccessible),
            "blocked" => Err(FetchError::Blocked("HTTP 429".to_string())),
            _ => Ok(PostInfo {
                shortcode: shortcode.to_string(),
                is_video: shortcode == "video",
                display_url: format!("https://cdn.example/{}.jpg", shortcode),
            }),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.contains("gone") {
            return Err(FetchError::DownloadStatus(404));
        }
        if url.contains("garbled") {
            return Ok(b"not an image at all".to_vec());
        }
        Ok(png_bytes())
    }
}

fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 120, 40])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn app_with(classifier: Option<Arc<dyn Classifier>>) -> (Router, Arc<StubFetcher>) {
    let fetcher = Arc::new(StubFetcher {
        calls: AtomicUsize::new(0),
    });
    let state = AppState::new(Config::default(), classifier, fetcher.clone());
    (router(state), fetcher)
}

fn app(prob_ai: f64) -> (Router, Arc<StubFetcher>) {
    let classifier: Arc<dyn Classifier> = Arc::new(FixedClassifier {
        descriptor: ModelDescriptor::default(),
        prob_ai,
    });
    app_with(Some(classifier))
}

fn multipart_request(field: &str, filename: Option<&str>, bytes: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn instagram_request(url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/instagram")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "url": url }).to_string()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_returns_prediction() {
    let (app, _) = app(0.13);
    let resp = app
        .oneshot(multipart_request("file", Some("photo.png"), &png_bytes()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let result: PredictionResult = read_json(resp).await;
    assert_eq!(result.prediction, "Manusia");
    assert!((result.confidence - 0.87).abs() < 1e-9);
    assert!((result.prob_ai - 0.13).abs() < 1e-9);
    assert!(result.image_data.is_none());
}

#[tokio::test]
async fn upload_without_file_field() {
    let (app, _) = app(0.5);
    let resp = app
        .oneshot(multipart_request("other", Some("photo.png"), &png_bytes()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = read_json(resp).await;
    assert_eq!(err.error, "No file part");
}

#[tokio::test]
async fn upload_with_empty_filename() {
    let (app, _) = app(0.5);
    let resp = app
        .oneshot(multipart_request("file", Some(""), &png_bytes()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = read_json(resp).await;
    assert_eq!(err.error, "No selected file");
}

#[tokio::test]
async fn upload_of_non_image() {
    let (app, _) = app(0.5);
    let resp = app
        .oneshot(multipart_request("file", Some("notes.png"), b"plain text"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = read_json(resp).await;
    assert!(err.error.starts_with("Invalid image file"));
}

#[tokio::test]
async fn upload_without_model() {
    let (app, _) = app_with(None);
    let resp = app
        .oneshot(multipart_request("file", Some("photo.png"), &png_bytes()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let err: ErrorResponse = read_json(resp).await;
    assert_eq!(
        err.error,
        "Model tidak dapat dimuat. Pastikan file model ada di direktori yang sama."
    );
}

#[tokio::test]
async fn instagram_returns_prediction_with_image() {
    let (app, _) = app(0.9);
    let resp = app
        .oneshot(instagram_request("https://www.instagram.com/p/Cabc123/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let result: PredictionResult = read_json(resp).await;
    assert_eq!(result.prediction, "AI");
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(result.image_data.unwrap())
        .unwrap();
    assert_eq!(decoded, png_bytes());
}

#[tokio::test]
async fn instagram_validation_messages() {
    let cases = [
        ("", "No URL provided"),
        ("https://example.com/p/abc/", "Link tidak valid. Pastikan itu link Instagram."),
        (
            "https://www.instagram.com/reel/abc/",
            "Post ini berupa reels. Hanya gambar yang bisa diproses.",
        ),
        (
            "https://www.instagram.com/p/private/",
            "Post tidak bisa diakses. Kemungkinan akun private.",
        ),
        (
            "https://www.instagram.com/p/video/",
            "Post ini berupa video. Hanya gambar yang bisa diproses.",
        ),
        (
            "https://www.instagram.com/p/gone/",
            "Gagal mengunduh gambar dari Instagram.",
        ),
        (
            "https://www.instagram.com/p/blocked/",
            "Tidak dapat mengakses Instagram. Kemungkinan IP server diblokir IG. HTTP 429",
        ),
    ];

    for (url, expected) in cases {
        let (app, _) = app(0.5);
        let resp = app.oneshot(instagram_request(url)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "url: {}", url);
        let err: ErrorResponse = read_json(resp).await;
        assert_eq!(err.error, expected, "url: {}", url);
    }
}

#[tokio::test]
async fn instagram_image_that_fails_to_decode_is_a_server_error() {
    let (app, _) = app(0.5);
    let resp = app
        .oneshot(instagram_request("https://www.instagram.com/p/garbled/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorResponse = read_json(resp).await;
    assert!(
        err.error.starts_with("Error processing image: "),
        "error: {}",
        err.error
    );
}

#[tokio::test]
async fn instagram_over_the_limit_is_rejected_immediately() {
    let (app, _) = app(0.5);
    for i in 0..10 {
        let resp = app
            .clone()
            .oneshot(instagram_request("https://www.instagram.com/reel/abc/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "request {}", i + 1);
    }

    let resp = tokio::time::timeout(
        std::time::Duration::from_secs(3),
        app.oneshot(instagram_request("https://www.instagram.com/reel/abc/")),
    )
    .await
    .expect("request over the limit should not wait for the window")
    .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let err: ErrorResponse = read_json(resp).await;
    assert_eq!(err.error, MSG_RATE_LIMITED);
}

#[tokio::test]
async fn upload_is_not_rate_limited() {
    let (app, _) = app(0.5);
    for _ in 0..12 {
        let resp = app
            .clone()
            .oneshot(multipart_request("file", Some("photo.png"), &png_bytes()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn instagram_rejects_before_fetching_without_model() {
    let (app, fetcher) = app_with(None);
    let resp = app
        .oneshot(instagram_request("https://www.instagram.com/p/abc/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_instagram_post_is_served_from_cache() {
    let (app, fetcher) = app(0.2);
    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(instagram_request("https://www.instagram.com/p/same/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn metrics_count_both_flows() {
    let (app, _) = app(0.13);
    app.clone()
        .oneshot(multipart_request("file", Some("photo.png"), &png_bytes()))
        .await
        .unwrap();
    app.clone()
        .oneshot(instagram_request("https://www.instagram.com/reel/abc/"))
        .await
        .unwrap();

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let stats: serde_json::Value = read_json(resp).await;
    assert_eq!(stats["upload"]["requests"], 1);
    assert_eq!(stats["upload"]["human"], 1);
    assert_eq!(stats["instagram"]["errors"], 1);
}

#[tokio::test]
async fn health_reports_readiness() {
    let (app, _) = app_with(None);
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: serde_json::Value = read_json(resp).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["ready"], false);
}

#[tokio::test]
async fn index_serves_html() {
    let (app, _) = app(0.5);
    let resp = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("<html"));
}
