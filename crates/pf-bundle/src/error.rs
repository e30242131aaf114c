//! Bundle builder error types.

use std::path::PathBuf;

use pf_core::{ModuleId, PackId};
use pf_entitlement::{EntitlementDecision, ExportFormat};
use thiserror::Error;

/// Errors from building or writing a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// A requested format is not available on the plan.
    #[error("ENTITLEMENT_REQUIRED: {reason}")]
    Entitlement {
        format: ExportFormat,
        decision: EntitlementDecision,
        reason: String,
    },

    /// The run's score is below the definition-of-done threshold for a
    /// score-gated format.
    #[error("DOD_NOT_MET: {format} export requires a score of at least {minimum} (got {actual})")]
    DodNotMet {
        format: ExportFormat,
        minimum: u32,
        actual: u32,
    },

    /// The license is for a different pack than the bundle's watermark.
    #[error("license pack {license} does not match bundle pack {bundle}")]
    LicensePackMismatch { bundle: PackId, license: PackId },

    /// The bundle's watermark names modules the license does not cover.
    #[error("license does not cover bundle modules: {}", join_modules(.modules))]
    UnlicensedModules { modules: Vec<ModuleId> },

    /// The request is structurally invalid.
    #[error("invalid bundle request: {0}")]
    InvalidRequest(String),

    /// A request file could not be found.
    #[error("request file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// YAML request parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON request parsing failed.
    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Delegated from pf-core (watermarking, canonicalization, license
    /// serialization).
    #[error(transparent)]
    Core(#[from] pf_core::PfError),

    /// Checksum engine rejected the computed hashes.
    #[error("checksum error: {0}")]
    Checksum(#[from] pf_crypto::ChecksumError),

    /// Zip writer failure.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_modules(modules: &[ModuleId]) -> String {
    modules.iter().map(ModuleId::as_str).collect::<Vec<_>>().join(", ")
}

/// Result type alias for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;
