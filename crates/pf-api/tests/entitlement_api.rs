//! # Integration Tests for pf-api
//!
//! Drives the assembled router with `oneshot` requests: health probes, the
//! validation endpoint's status codes and bodies, the plan table route and
//! OpenAPI generation.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pf_api::state::AppState;

fn test_app() -> axum::Router {
    pf_api::app(AppState::default())
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(uri: &str) -> (StatusCode, String) {
    let response = test_app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_string(response).await)
}

async fn validate(body: Value) -> (StatusCode, Value) {
    validate_raw(body.to_string()).await
}

async fn validate_raw(body: String) -> (StatusCode, Value) {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/entitlements/validate")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let text = body_string(response).await;
    (status, serde_json::from_str(&text).unwrap())
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    assert_eq!(get("/health/liveness").await, (StatusCode::OK, "ok".into()));
}

#[tokio::test]
async fn test_readiness_probe() {
    assert_eq!(get("/health/readiness").await, (StatusCode::OK, "ready".into()));
}

// -- Validate: success --------------------------------------------------------

#[tokio::test]
async fn test_pro_zip_with_manifest_succeeds() {
    let (status, body) = validate(json!({
        "plan": "PRO",
        "format": "zip",
        "score": 92,
        "modules": ["M07/manifest.json", "M07/prompt.md"]
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "canExport": true, "format": "zip", "plan": "PRO", "moduleCount": 2})
    );
}

#[tokio::test]
async fn test_score_is_optional() {
    let (status, body) = validate(json!({"plan": "creator", "format": "pdf", "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "CREATOR");
}

// -- Validate: 400 ------------------------------------------------------------

#[tokio::test]
async fn test_missing_fields_are_400() {
    let (status, body) = validate(json!({"format": "md"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("plan, modules"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let (status, body) = validate_raw("{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_invalid_plan_is_400() {
    let (status, _) = validate(json!({"plan": "GOLD", "format": "md", "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_format_is_400() {
    for format in ["docx", "txt"] {
        let (status, _) =
            validate(json!({"plan": "PRO", "format": format, "modules": ["M01"]})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{format}");
    }
}

#[tokio::test]
async fn test_empty_modules_is_400() {
    let (status, body) = validate(json!({"plan": "PRO", "format": "md", "modules": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("modules"));
}

#[tokio::test]
async fn test_zip_without_manifest_is_400() {
    let (status, body) =
        validate(json!({"plan": "ENTERPRISE", "format": "zip", "modules": ["M07/prompt.md"]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("manifest.json"));
}

// -- Validate: 403 ------------------------------------------------------------

#[tokio::test]
async fn test_free_pdf_requires_creator() {
    let (status, body) =
        validate(json!({"plan": "FREE", "format": "pdf", "score": 95, "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "ENTITLEMENT_REQUIRED");
    assert_eq!(body["requiredPlan"], "CREATOR");
    assert_eq!(
        body["reason"],
        "PDF export requires the CREATOR plan or higher (current plan: FREE)"
    );
}

#[tokio::test]
async fn test_creator_zip_requires_pro() {
    let (status, body) = validate(json!({
        "plan": "CREATOR", "format": "zip", "modules": ["manifest.json"]
    }))
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["requiredPlan"], "PRO");
}

#[tokio::test]
async fn test_low_score_keeps_current_plan() {
    let (status, body) =
        validate(json!({"plan": "PRO", "format": "json", "score": 79, "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["requiredPlan"], "PRO");
    assert_eq!(
        body["reason"],
        "JSON export requires a score of at least 80 (current score: 79)"
    );
}

#[tokio::test]
async fn test_fractional_and_negative_scores_are_compared_not_rejected() {
    let (status, _) =
        validate(json!({"plan": "PRO", "format": "pdf", "score": 80.0, "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        validate(json!({"plan": "PRO", "format": "pdf", "score": 79.9, "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "ENTITLEMENT_REQUIRED");

    let (status, _) =
        validate(json!({"plan": "PRO", "format": "json", "score": -3, "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        validate(json!({"plan": "PRO", "format": "md", "score": -3, "modules": ["M01"]})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gate_runs_before_module_checks() {
    let (status, _) = validate(json!({"plan": "FREE", "format": "zip", "modules": []})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// -- Plan table ---------------------------------------------------------------

#[tokio::test]
async fn test_plan_formats() {
    let (status, body) = get("/api/entitlements/creator").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({
            "plan": "CREATOR",
            "formats": ["md", "pdf", "json"],
            "scoreGatedFormats": ["pdf", "json"],
            "minScore": 80
        })
    );
}

#[tokio::test]
async fn test_unknown_plan_is_404() {
    let (status, _) = get("/api/entitlements/platinum").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_lists_routes() {
    let (status, body) = get("/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    let doc: Value = serde_json::from_str(&body).unwrap();
    assert!(doc["paths"].get("/api/entitlements/validate").is_some());
    assert!(doc["paths"].get("/api/entitlements/{plan}").is_some());
}
