//! # Bundle Request
//!
//! Everything the builder needs for one export: run identity, licensing
//! context, requested formats, the prompt itself and the run's telemetry.
//! Requests load from YAML (`.yaml`/`.yml`) or JSON files.
//!
//! ```yaml
//! run_id: run-42
//! module_id: M07
//! pack: pf-pro
//! modules: [M07]
//! plan: PRO
//! formats: [md, json, zip]
//! score: 91
//! prompt: |
//!   You are a pricing analyst...
//! seven_d:
//!   domain: finance
//!   scale: team
//!   urgency: high
//!   complexity: medium
//!   resources: standard
//!   application: pricing
//!   output_format: table
//! ```

use std::path::Path;

use pf_core::{ModuleId, PackId};
use pf_entitlement::{ExportFormat, Plan};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BundleError, BundleResult};

/// The seven prompt-engineering dimensions recorded with every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SevenD {
    pub domain: String,
    pub scale: String,
    pub urgency: String,
    pub complexity: String,
    pub resources: String,
    pub application: String,
    pub output_format: String,
}

/// Per-dimension quality scores for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub clarity: u32,
    pub execution: u32,
    pub ambiguity: u32,
    pub business_fit: u32,
    pub overall_score: u32,
}

/// Token usage for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

/// Run telemetry. Carries no personal data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTelemetry {
    pub score: ScoreBreakdown,
    pub tokens: TokenUsage,
    /// Time to answer, in milliseconds.
    pub duration_ms: u64,
    pub cost_usd: f64,
    pub model: String,
}

/// An export request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleRequest {
    pub run_id: String,
    pub module_id: ModuleId,
    /// License pack the artifacts are watermarked with.
    pub pack: PackId,
    /// Modules actually used to produce the output.
    pub modules: Vec<ModuleId>,
    pub plan: Plan,
    pub formats: Vec<ExportFormat>,
    /// Overall run score. `None` when the run has not been scored.
    #[serde(default)]
    pub score: Option<u32>,
    pub prompt: String,
    #[serde(default)]
    pub seven_d: SevenD,
    #[serde(default)]
    pub telemetry: RunTelemetry,
    #[serde(default)]
    pub license_notice: Option<String>,
    /// Fixed bundle id. Derived from the run id and creation time when
    /// absent.
    #[serde(default)]
    pub bundle_id: Option<Uuid>,
}

impl BundleRequest {
    /// Load a request from a YAML or JSON file, chosen by extension.
    pub fn from_path(path: &Path) -> BundleResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BundleError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                BundleError::Io(e)
            }
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let request: Self = if is_yaml {
            serde_yaml::from_str(&content).map_err(|source| BundleError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&content).map_err(|source| BundleError::JsonParse {
                path: path.to_path_buf(),
                source,
            })?
        };
        request.validate()?;
        Ok(request)
    }

    /// Structural checks that do not depend on entitlements.
    pub fn validate(&self) -> BundleResult<()> {
        if self.run_id.trim().is_empty() {
            return Err(BundleError::InvalidRequest("run_id is empty".to_string()));
        }
        if self.pack.as_str().trim().is_empty() {
            return Err(BundleError::InvalidRequest("pack is empty".to_string()));
        }
        if self.modules.is_empty() {
            return Err(BundleError::InvalidRequest(
                "at least one module is required".to_string(),
            ));
        }
        if self.formats.is_empty() {
            return Err(BundleError::InvalidRequest(
                "at least one export format is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Requested formats, deduplicated, in request order.
    pub fn unique_formats(&self) -> Vec<ExportFormat> {
        let mut out: Vec<ExportFormat> = Vec::with_capacity(self.formats.len());
        for f in &self.formats {
            if !out.contains(f) {
                out.push(*f);
            }
        }
        out
    }

    /// Whether `format` was requested.
    pub fn wants(&self, format: ExportFormat) -> bool {
        self.formats.contains(&format)
    }
}
