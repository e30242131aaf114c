//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// OpenAPI document for the whole service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PromptForge Entitlement API",
        version = "0.1.0",
        description = "Export entitlement checks for PromptForge bundles: which plan may export which format, at which score.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::entitlements::validate_entitlement,
        crate::routes::entitlements::plan_formats,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::entitlements::ValidateEntitlementRequest,
        crate::routes::entitlements::ValidateEntitlementResponse,
        crate::routes::entitlements::PlanFormatsResponse,
    )),
    tags(
        (name = "entitlements", description = "Export entitlement gate"),
    )
)]
pub struct ApiDoc;

/// Serves the document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
