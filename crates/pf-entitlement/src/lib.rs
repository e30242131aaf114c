//! # pf-entitlement: Export Entitlement Gate
//!
//! A pure mapping from `(plan, format, score)` to an [`EntitlementDecision`].
//! Consulted by the bundle builder before producing a format and by the HTTP
//! validation endpoint before a download is offered.
//!
//! ## Policy
//!
//! | Plan         | Formats                 |
//! |--------------|-------------------------|
//! | `FREE`       | md                      |
//! | `CREATOR`    | md, pdf, json           |
//! | `PRO`        | md, pdf, json, zip      |
//! | `ENTERPRISE` | md, pdf, json, zip      |
//!
//! PDF and JSON additionally require a score of at least
//! [`MIN_EXPORT_SCORE`] when a score is known. An absent score applies only
//! the plan gate, so a PDF export can be offered before the run is scored.
//!
//! Every function here is total: no panics, no errors. Denials are values.

pub mod format;
pub mod gate;
pub mod plan;

pub use format::{ExportFormat, ParseFormatError};
pub use gate::{
    available_export_formats, can_export_format, check, entitlement_reason, minimum_plan_for,
    EntitlementDecision, MIN_EXPORT_SCORE,
};
pub use plan::{ParsePlanError, Plan};
