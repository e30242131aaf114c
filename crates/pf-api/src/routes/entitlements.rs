//! # Entitlement API
//!
//! Routes:
//! - POST /api/entitlements/validate: check one export request against the gate
//! - GET  /api/entitlements/{plan}: formats a plan may export
//!
//! Validation order for `POST /validate`: required fields, plan and format
//! parsing, the gate, the module list, then the zip-specific manifest rule.

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use pf_entitlement::{
    available_export_formats, check, entitlement_reason, minimum_plan_for, EntitlementDecision,
    ExportFormat, Plan, MIN_EXPORT_SCORE,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Module reference a zip export must include.
pub const MANIFEST_REFERENCE: &str = "manifest.json";

/// Entitlement check request. Fields are optional at the serde level so a
/// missing field is reported by name.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateEntitlementRequest {
    /// `FREE`, `CREATOR`, `PRO` or `ENTERPRISE` (case-insensitive).
    #[serde(default)]
    pub plan: Option<String>,
    /// `md`, `pdf`, `json` or `zip`.
    #[serde(default)]
    pub format: Option<String>,
    /// Run score, when known. Any JSON number.
    #[serde(default)]
    pub score: Option<f64>,
    /// Module references included in the export.
    #[serde(default)]
    pub modules: Option<Vec<String>>,
}

impl Validate for ValidateEntitlementRequest {
    fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("plan", self.plan.is_none()),
            ("format", self.format.is_none()),
            ("modules", self.modules.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("missing required field(s): {}", missing.join(", ")))
        }
    }
}

/// Successful entitlement check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateEntitlementResponse {
    pub success: bool,
    pub can_export: bool,
    pub format: String,
    pub plan: String,
    pub module_count: usize,
}

/// Export table for one plan.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanFormatsResponse {
    pub plan: String,
    pub formats: Vec<String>,
    /// Formats that additionally need `minScore`.
    pub score_gated_formats: Vec<String>,
    pub min_score: u32,
}

/// Build the entitlement router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/entitlements/validate", post(validate_entitlement))
        .route("/api/entitlements/{plan}", get(plan_formats))
}

/// POST /api/entitlements/validate: Check an export against the gate.
#[utoipa::path(
    post,
    path = "/api/entitlements/validate",
    request_body = ValidateEntitlementRequest,
    responses(
        (status = 200, description = "Export allowed", body = ValidateEntitlementResponse),
        (status = 400, description = "Missing or invalid field", body = crate::error::ErrorBody),
        (status = 403, description = "Plan or score does not allow the export", body = crate::error::ErrorBody),
    ),
    tag = "entitlements"
)]
pub(crate) async fn validate_entitlement(
    body: Result<Json<ValidateEntitlementRequest>, JsonRejection>,
) -> Result<Json<ValidateEntitlementResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let plan: Plan = req
        .plan
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e: pf_entitlement::ParsePlanError| AppError::BadRequest(e.to_string()))?;
    let format = parse_offered_format(req.format.as_deref().unwrap_or_default())?;
    let score = req.score.map(gate_score);

    match check(plan, format, score) {
        EntitlementDecision::Allowed => {}
        EntitlementDecision::PlanRequired { required_plan } => {
            return Err(deny(plan, format, score, required_plan));
        }
        EntitlementDecision::ScoreRequired { .. } => {
            return Err(deny(plan, format, score, plan));
        }
        EntitlementDecision::NotOffered => {
            return Err(AppError::BadRequest(entitlement_reason(plan, format, score)));
        }
    }

    let modules = req.modules.unwrap_or_default();
    if modules.is_empty() {
        return Err(AppError::BadRequest("modules must not be empty".to_string()));
    }
    if format == ExportFormat::Zip && !modules.iter().any(|m| m.contains(MANIFEST_REFERENCE)) {
        return Err(AppError::BadRequest(format!(
            "zip export requires a module reference to {MANIFEST_REFERENCE}"
        )));
    }

    tracing::info!(%plan, %format, modules = modules.len(), "export entitlement granted");
    Ok(Json(ValidateEntitlementResponse {
        success: true,
        can_export: true,
        format: format.to_string(),
        plan: plan.to_string(),
        module_count: modules.len(),
    }))
}

/// GET /api/entitlements/{plan}: Formats a plan may export.
#[utoipa::path(
    get,
    path = "/api/entitlements/{plan}",
    params(("plan" = String, Path, description = "Plan name, case-insensitive")),
    responses(
        (status = 200, description = "Plan export table", body = PlanFormatsResponse),
        (status = 404, description = "Unknown plan", body = crate::error::ErrorBody),
    ),
    tag = "entitlements"
)]
pub(crate) async fn plan_formats(
    Path(plan): Path<String>,
) -> Result<Json<PlanFormatsResponse>, AppError> {
    let plan: Plan = plan
        .parse()
        .map_err(|e: pf_entitlement::ParsePlanError| AppError::NotFound(e.to_string()))?;
    let formats = available_export_formats(plan);
    Ok(Json(PlanFormatsResponse {
        plan: plan.to_string(),
        formats: formats.iter().map(ToString::to_string).collect(),
        score_gated_formats: formats
            .iter()
            .filter(|f| f.is_score_gated())
            .map(ToString::to_string)
            .collect(),
        min_score: MIN_EXPORT_SCORE,
    }))
}

/// Parse a format the endpoint can grant. Formats no plan offers for
/// download are rejected as invalid input.
fn parse_offered_format(raw: &str) -> Result<ExportFormat, AppError> {
    let format: ExportFormat = raw
        .parse()
        .map_err(|e: pf_entitlement::ParseFormatError| AppError::BadRequest(e.to_string()))?;
    if minimum_plan_for(format).is_none() {
        return Err(AppError::BadRequest(format!(
            "invalid format {raw:?}: expected one of md, pdf, json, zip"
        )));
    }
    Ok(format)
}

/// Whole-point score for the gate. Flooring keeps `score >= MIN_EXPORT_SCORE`
/// exact for fractional input; negatives clamp to zero.
fn gate_score(score: f64) -> u32 {
    score.floor().clamp(0.0, f64::from(u32::MAX)) as u32
}

fn deny(plan: Plan, format: ExportFormat, score: Option<u32>, required_plan: Plan) -> AppError {
    let reason = entitlement_reason(plan, format, score);
    tracing::info!(%plan, %format, %required_plan, "export entitlement denied");
    AppError::EntitlementRequired {
        required_plan,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_missing_field() {
        let req = ValidateEntitlementRequest {
            plan: None,
            format: Some("md".into()),
            score: None,
            modules: None,
        };
        assert_eq!(
            req.validate().unwrap_err(),
            "missing required field(s): plan, modules"
        );
    }

    #[test]
    fn gate_score_floors_and_clamps() {
        assert_eq!(gate_score(80.0), 80);
        assert_eq!(gate_score(79.999), 79);
        assert_eq!(gate_score(-5.5), 0);
        assert_eq!(gate_score(1e300), u32::MAX);
    }

    #[test]
    fn txt_is_not_a_grantable_format() {
        assert!(matches!(
            parse_offered_format("txt"),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(parse_offered_format("ZIP").unwrap(), ExportFormat::Zip);
    }
}
