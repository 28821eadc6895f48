use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use snapread::api::{create_router, AppState};
use snapread::config::{Config, LimitsConfig, OriginConfig, ServerConfig, StorageConfig, VisionConfig};
use snapread::ocr::{OcrApi, VisionClient};
use snapread::storage::{BlobImageStore, ImageStore};

const ALLOWED_ORIGIN: &str = "https://app.example.com";

fn test_config(blob_uri: &str, vision_uri: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        vision: VisionConfig {
            subscription_key: "test-key".to_string(),
            endpoint: vision_uri.to_string(),
            poll_interval_ms: 10,
            max_poll_attempts: 30,
            timeout_secs: 5,
        },
        storage: StorageConfig {
            sas_url: format!("{blob_uri}/images?sv=2024&sig=abc"),
            public_base_url: format!("{blob_uri}/images"),
            timeout_secs: 5,
        },
        limits: LimitsConfig {
            max_image_bytes: 10 * 1024 * 1024,
            rate_window_ms: 60_000,
            rate_max_requests: 10,
            rate_gc_threshold: 1000,
        },
        origins: OriginConfig {
            allowed: vec![ALLOWED_ORIGIN.to_string()],
        },
    }
}

fn build_app(config: Config) -> Router {
    let store: Arc<dyn ImageStore> = Arc::new(BlobImageStore::new(&config.storage).unwrap());
    let ocr: Arc<dyn OcrApi> = Arc::new(VisionClient::new(&config.vision).unwrap());
    create_router(AppState::new(config, store, ocr))
}

fn recognize_request(body: Body) -> Request<Body> {
    let peer: SocketAddr = "198.51.100.1:40000".parse().unwrap();
    Request::builder()
        .method("POST")
        .uri("/api/v1/recognize")
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer))
        .body(body)
        .unwrap()
}

fn image_json(bytes: &[u8]) -> Body {
    Body::from(serde_json::to_vec(&json!({ "image": STANDARD.encode(bytes) })).unwrap())
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Mounts the full read protocol: submission returning an operation
/// location, then a running poll, then the terminal state.
async fn mount_read_api(server: &MockServer, terminal: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/vision/v3.2/read/analyze"))
        .respond_with(ResponseTemplate::new(202).insert_header(
            "Operation-Location",
            format!("{}/vision/v3.2/read/analyzeResults/op-1", server.uri()).as_str(),
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vision/v3.2/read/analyzeResults/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vision/v3.2/read/analyzeResults/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(terminal))
        .mount(server)
        .await;
}

async fn mount_blob_store(server: &MockServer, expect_delete: u64) {
    Mock::given(method("PUT"))
        .and(path_regex(r"^/images/image-.*\.png$"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"^/images/image-.*\.png$"))
        .respond_with(ResponseTemplate::new(202))
        .expect(expect_delete)
        .mount(server)
        .await;
}

#[tokio::test]
async fn recognize_end_to_end_returns_flattened_text() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;

    mount_blob_store(&blob, 1).await;
    mount_read_api(
        &vision,
        json!({
            "status": "succeeded",
            "analyzeResult": {
                "readResults": [
                    {"lines": [{"words": [{"text": "HELLO"}, {"text": "WORLD"}]}]}
                ]
            }
        }),
    )
    .await;

    let app = build_app(test_config(&blob.uri(), &vision.uri()));

    let mut request = recognize_request(image_json(&vec![0x89u8; 1024]));
    request
        .headers_mut()
        .insert(header::ORIGIN, ALLOWED_ORIGIN.parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        ALLOWED_ORIGIN
    );
    assert_eq!(body_string(response).await, "HELLO WORLD\n");

    // MockServer verifies the upload and the cleanup delete on drop.
}

#[tokio::test]
async fn ocr_failure_returns_500_and_still_deletes_blob() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;

    mount_blob_store(&blob, 1).await;
    mount_read_api(&vision, json!({"status": "failed"})).await;

    let app = build_app(test_config(&blob.uri(), &vision.uri()));
    let response = app
        .oneshot(recognize_request(image_json(b"png")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.starts_with("Error: "));
    assert!(body.contains("analysis failed"));
}

#[tokio::test]
async fn preflight_returns_cors_headers_and_empty_body() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;
    let app = build_app(test_config(&blob.uri(), &vision.uri()));

    let peer: SocketAddr = "198.51.100.1:40000".parse().unwrap();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/recognize")
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .extension(ConnectInfo(peer))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap(),
        "POST,OPTIONS"
    );
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn unlisted_origin_is_403_and_no_collaborator_is_called() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&blob)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&vision)
        .await;

    let app = build_app(test_config(&blob.uri(), &vision.uri()));

    let mut request = recognize_request(image_json(b"png"));
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn missing_image_is_400() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;
    let app = build_app(test_config(&blob.uri(), &vision.uri()));

    let response = app
        .oneshot(recognize_request(Body::from(r#"{}"#)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "No image found in request body.");
}

#[tokio::test]
async fn oversized_image_is_413_without_upload() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&blob)
        .await;

    let mut config = test_config(&blob.uri(), &vision.uri());
    config.limits.max_image_bytes = 1024;
    let app = build_app(config);

    let response = app
        .oneshot(recognize_request(image_json(&vec![0u8; 2048])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn same_client_is_limited_after_cap() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;

    mount_blob_store(&blob, 1).await;
    mount_read_api(
        &vision,
        json!({
            "status": "succeeded",
            "analyzeResult": {"readResults": [{"lines": [{"words": [{"text": "OK"}]}]}]}
        }),
    )
    .await;

    let mut config = test_config(&blob.uri(), &vision.uri());
    config.limits.rate_max_requests = 1;
    let app = build_app(config);

    let response = app
        .clone()
        .oneshot(recognize_request(image_json(b"png")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(recognize_request(image_json(b"png")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn forwarded_for_header_scopes_the_limit_per_client() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/images/image-.*\.png$"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&blob)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/images/image-.*\.png$"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&blob)
        .await;
    Mock::given(method("POST"))
        .and(path("/vision/v3.2/read/analyze"))
        .respond_with(ResponseTemplate::new(202).insert_header(
            "Operation-Location",
            format!("{}/vision/v3.2/read/analyzeResults/op-1", vision.uri()).as_str(),
        ))
        .expect(2)
        .mount(&vision)
        .await;
    Mock::given(method("GET"))
        .and(path("/vision/v3.2/read/analyzeResults/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "analyzeResult": {"readResults": [{"lines": [{"words": [{"text": "OK"}]}]}]}
        })))
        .mount(&vision)
        .await;

    let mut config = test_config(&blob.uri(), &vision.uri());
    config.limits.rate_max_requests = 1;
    let app = build_app(config);

    let mut first = recognize_request(image_json(b"png"));
    first
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.1".parse().unwrap());
    let mut second = recognize_request(image_json(b"png"));
    second
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.2".parse().unwrap());

    let response = app.clone().oneshot(first).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Different forwarded client, fresh quota.
    let response = app.oneshot(second).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let blob = MockServer::start().await;
    let vision = MockServer::start().await;
    let app = build_app(test_config(&blob.uri(), &vision.uri()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}
