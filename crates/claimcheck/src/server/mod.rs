//! HTTP inference server.
//!
//! One route does the work: `POST /predict` takes a multipart form with a
//! `text` claim and an `image` file and answers with the real/fake label and
//! the classifier's two scores. `GET /health` is a liveness probe.

mod error;
mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use claimcheck_core::{Config, Predictor};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Shared state handed to every request.
pub struct AppState {
    /// Models loaded once at startup.
    pub predictor: Arc<Predictor>,
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>, config: &Config) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.limits.max_upload_bytes()))
        .layer(cors_layer(&config.server.cors_origins)?)
        .with_state(state))
}

/// Any origin when `origins` is empty, otherwise exactly the listed ones.
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutdown signal received (Ctrl-C)"),
        _ = terminate => tracing::info!("Shutdown signal received (SIGTERM)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use claimcheck_core::{
        Classifier, LabelTable, ObjectDetector, PipelineError, PipelineResult, TextEncoder,
    };
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use ndarray::Array2;
    use tower::ServiceExt;

    const BOUNDARY: &str = "claimcheck-test-boundary";

    /// Counts calls so tests can assert the models were never reached.
    #[derive(Default)]
    struct CountingEncoder {
        calls: AtomicUsize,
    }

    impl TextEncoder for CountingEncoder {
        fn encode(&self, text: &str) -> PipelineResult<Array2<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rows = text.split_whitespace().count() + 2;
            Ok(Array2::from_shape_fn((rows, 8), |(r, c)| {
                (r * 8 + c) as f32 / 64.0
            }))
        }
    }

    struct FixedDetector(Vec<usize>);

    impl ObjectDetector for FixedDetector {
        fn detect(&self, _image: &DynamicImage) -> PipelineResult<BTreeSet<usize>> {
            Ok(self.0.iter().copied().collect())
        }
    }

    struct FixedClassifier(Result<[f32; 2], String>);

    impl Classifier for FixedClassifier {
        fn classify(&self, _features: &Array2<f32>) -> PipelineResult<[f32; 2]> {
            self.0.clone().map_err(|message| PipelineError::Classification { message })
        }
    }

    struct Harness {
        app: Router,
        encoder: Arc<CountingEncoder>,
    }

    fn harness_with(scores: Result<[f32; 2], String>, config: Config) -> Harness {
        let encoder = Arc::new(CountingEncoder::default());
        let predictor = Predictor::new(
            encoder.clone(),
            Arc::new(FixedDetector(vec![0])),
            Arc::new(FixedClassifier(scores)),
            LabelTable::from_labels(["person", "bicycle"]),
            &config,
        );
        let state = Arc::new(AppState {
            predictor: Arc::new(predictor),
        });
        Harness {
            app: build_router(state, &config).unwrap(),
            encoder,
        }
    }

    fn harness(scores: [f32; 2]) -> Harness {
        harness_with(Ok(scores), Config::default())
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 320, Rgb([255, 255, 255])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// Encode `text` and `image` parts; `None` leaves the part out.
    fn multipart_body(text: Option<&str>, image: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(text) = text {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n{text}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(image) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(image);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    /// Helper: parse a JSON response body into a `serde_json::Value`.
    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predict_returns_label_and_softmax() {
        let h = harness([0.2, 0.8]);
        let image = png_bytes();
        let resp = h
            .app
            .oneshot(predict_request(multipart_body(
                Some("breaking news"),
                Some(&image),
            )))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["label"], "real");
        let softmax = body["softmax"].as_array().unwrap();
        assert_eq!(softmax.len(), 2);
        assert!((softmax[0].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!((softmax[1].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert_eq!(h.encoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn equal_scores_are_fake() {
        let h = harness([0.5, 0.5]);
        let image = png_bytes();
        let resp = h
            .app
            .oneshot(predict_request(multipart_body(Some("claim"), Some(&image))))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["label"], "fake");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_the_models() {
        let image = png_bytes();
        let bodies = [
            multipart_body(None, Some(&image)),
            multipart_body(Some("claim"), None),
            multipart_body(None, None),
            multipart_body(Some(""), Some(&image)),
            multipart_body(Some("claim"), Some(&[])),
        ];

        for body in bodies {
            let h = harness([0.1, 0.9]);
            let resp = h.app.oneshot(predict_request(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                json_body(resp).await,
                serde_json::json!({"error": "Missing input"})
            );
            assert_eq!(h.encoder.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn non_multipart_body_is_missing_input() {
        let h = harness([0.1, 0.9]);
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"claim"}"#))
            .unwrap();

        let resp = h.app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "Missing input");
    }

    #[tokio::test]
    async fn undecodable_image_is_internal_error() {
        let h = harness([0.1, 0.9]);
        let resp = h
            .app
            .oneshot(predict_request(multipart_body(
                Some("claim"),
                Some(b"not an image"),
            )))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn classifier_failure_message_is_returned() {
        let h = harness_with(Err("session exploded".to_string()), Config::default());
        let image = png_bytes();
        let resp = h
            .app
            .oneshot(predict_request(multipart_body(Some("claim"), Some(&image))))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("session exploded"));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let mut config = Config::default();
        config.limits.max_upload_mb = 1;
        let h = harness_with(Ok([0.1, 0.9]), config);
        let image = vec![0u8; 2 * 1024 * 1024];

        let resp = h
            .app
            .oneshot(predict_request(multipart_body(Some("claim"), Some(&image))))
            .await
            .unwrap();

        assert!(resp.status().is_client_error());
        assert_eq!(h.encoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let h = harness([0.5, 0.5]);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let resp = h.app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], claimcheck_core::VERSION);
    }

    #[tokio::test]
    async fn cors_allows_any_origin_by_default() {
        let h = harness([0.5, 0.5]);
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:8000")
            .body(Body::empty())
            .unwrap();

        let resp = h.app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn cors_restricted_to_configured_origins() {
        let mut config = Config::default();
        config.server.cors_origins = vec!["https://claims.example".to_string()];
        let h = harness_with(Ok([0.5, 0.5]), config);

        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://other.example")
            .body(Body::empty())
            .unwrap();
        let resp = h.app.oneshot(req).await.unwrap();
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn invalid_cors_origin_is_an_error() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
        assert!(cors_layer(&[]).is_ok());
    }
}
