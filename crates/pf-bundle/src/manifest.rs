//! # Bundle Manifest
//!
//! `manifest.json` describes the bundle and lists a `sha256:<hex>` checksum
//! and byte length for every other artifact. It is itself watermarked and
//! hashed, so the manifest is covered by the bundle checksum but cannot list
//! its own digest.

use std::collections::BTreeMap;

use pf_core::{ArtifactName, ContentDigest, ModuleId, PfError, Timestamp, Watermark};
use pf_crypto::{verify_file_hashes, HashVerification};
use pf_entitlement::{ExportFormat, Plan};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Manifest schema version.
pub const MANIFEST_VERSION: &str = "1.0.0";

/// One artifact entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArtifact {
    pub file: ArtifactName,
    /// `sha256:<hex>`.
    pub checksum: String,
    pub bytes: u64,
}

/// Parsed `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub bundle_id: Uuid,
    pub run_id: String,
    pub module_id: ModuleId,
    pub plan: Plan,
    pub formats: Vec<ExportFormat>,
    pub score: Option<u32>,
    pub created_at: Timestamp,
    pub license_notice: String,
    pub artifacts: Vec<ManifestArtifact>,
    #[serde(rename = "__pf_wm")]
    pub watermark: Watermark,
}

impl Manifest {
    /// Parse manifest bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PfError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Artifact digests keyed by file name.
    pub fn expected_hashes(&self) -> Result<BTreeMap<String, ContentDigest>, PfError> {
        self.artifacts
            .iter()
            .map(|a| Ok((a.file.file_name().to_string(), ContentDigest::parse_prefixed(&a.checksum)?)))
            .collect()
    }

    /// Re-hash `files` against the recorded artifact checksums. Files the
    /// manifest cannot list (itself, `checksum.txt`, `license.json`,
    /// `overview.md`) are ignored.
    pub fn verify_files(&self, files: &BTreeMap<String, Vec<u8>>) -> Result<HashVerification, PfError> {
        let listed: BTreeMap<String, Vec<u8>> = files
            .iter()
            .filter(|(name, _)| {
                ArtifactName::from_file_name(name)
                    .is_some_and(|a| a != ArtifactName::Manifest)
            })
            .map(|(n, c)| (n.clone(), c.clone()))
            .collect();
        Ok(verify_file_hashes(&listed, &self.expected_hashes()?))
    }
}

/// Default license notice for a plan.
pub fn default_license_notice(plan: Plan) -> String {
    match plan {
        Plan::Free => "Generated with PromptForge (FREE plan). Personal, non-commercial use only.".to_string(),
        Plan::Creator | Plan::Pro => format!(
            "Generated with PromptForge ({plan} plan). Licensed for commercial use by the subscribing account."
        ),
        Plan::Enterprise => "Generated with PromptForge (ENTERPRISE plan). Licensed for commercial use within the subscribing organization.".to_string(),
    }
}
