//! The gate itself: static plan tables plus the score rule.

use serde::{Deserialize, Serialize};

use crate::format::ExportFormat;
use crate::plan::Plan;

/// Minimum score for score-gated formats (PDF and JSON).
pub const MIN_EXPORT_SCORE: u32 = 80;

const FREE_FORMATS: &[ExportFormat] = &[ExportFormat::Md];
const CREATOR_FORMATS: &[ExportFormat] = &[ExportFormat::Md, ExportFormat::Pdf, ExportFormat::Json];
const PRO_FORMATS: &[ExportFormat] = &[
    ExportFormat::Md,
    ExportFormat::Pdf,
    ExportFormat::Json,
    ExportFormat::Zip,
];

/// Outcome of an entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum EntitlementDecision {
    /// The export may proceed.
    Allowed,
    /// The plan does not include the format.
    PlanRequired {
        /// Lowest plan that includes the format.
        required_plan: Plan,
    },
    /// The plan includes the format but the score is too low.
    ScoreRequired {
        /// Threshold.
        minimum: u32,
        /// The run's score.
        actual: u32,
    },
    /// No plan offers the format for download.
    NotOffered,
}

impl EntitlementDecision {
    /// Whether the export may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Formats a plan may export, in table order.
pub fn available_export_formats(plan: Plan) -> &'static [ExportFormat] {
    match plan {
        Plan::Free => FREE_FORMATS,
        Plan::Creator => CREATOR_FORMATS,
        Plan::Pro | Plan::Enterprise => PRO_FORMATS,
    }
}

/// Lowest plan whose table includes `format`, or `None` for formats no plan
/// offers.
pub fn minimum_plan_for(format: ExportFormat) -> Option<Plan> {
    Plan::all()
        .iter()
        .copied()
        .find(|p| available_export_formats(*p).contains(&format))
}

/// Full decision for `(plan, format, score)`. The plan gate is evaluated
/// before the score gate.
pub fn check(plan: Plan, format: ExportFormat, score: Option<u32>) -> EntitlementDecision {
    if !available_export_formats(plan).contains(&format) {
        return match minimum_plan_for(format) {
            Some(required_plan) => EntitlementDecision::PlanRequired { required_plan },
            None => EntitlementDecision::NotOffered,
        };
    }
    match score {
        Some(actual) if format.is_score_gated() && actual < MIN_EXPORT_SCORE => {
            EntitlementDecision::ScoreRequired {
                minimum: MIN_EXPORT_SCORE,
                actual,
            }
        }
        _ => EntitlementDecision::Allowed,
    }
}

/// Whether `plan` may export `format` at `score`.
pub fn can_export_format(plan: Plan, format: ExportFormat, score: Option<u32>) -> bool {
    check(plan, format, score).is_allowed()
}

/// Human-readable denial reason; empty when allowed.
pub fn entitlement_reason(plan: Plan, format: ExportFormat, score: Option<u32>) -> String {
    match check(plan, format, score) {
        EntitlementDecision::Allowed => String::new(),
        EntitlementDecision::PlanRequired { required_plan } => format!(
            "{} export requires the {required_plan} plan or higher (current plan: {plan})",
            format.as_str().to_uppercase()
        ),
        EntitlementDecision::ScoreRequired { minimum, actual } => format!(
            "{} export requires a score of at least {minimum} (current score: {actual})",
            format.as_str().to_uppercase()
        ),
        EntitlementDecision::NotOffered => format!(
            "{} is not offered as a separate export on any plan",
            format.as_str().to_uppercase()
        ),
    }
}
