//! # Canonical Artifact Set
//!
//! The six files whose hashes make up a bundle checksum, in their fixed
//! canonical order. The order is the declaration order of [`ArtifactName`];
//! `Ord` is derived so sorting by artifact name is sorting into canonical
//! order.
//!
//! ```text
//! prompt.txt → prompt.json → prompt.md → prompt.pdf → manifest.json → telemetry.json
//! ```

use serde::{Deserialize, Serialize};

/// Archive entry holding the signed license.
pub const LICENSE_FILE: &str = "license.json";

/// Archive entry holding the per-file checksum lines.
pub const CHECKSUM_FILE: &str = "checksum.txt";

/// Static overview document every licensed archive must carry.
pub const OVERVIEW_FILE: &str = "overview.md";

/// A file that participates in the bundle checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtifactName {
    #[serde(rename = "prompt.txt")]
    PromptTxt,
    #[serde(rename = "prompt.json")]
    PromptJson,
    #[serde(rename = "prompt.md")]
    PromptMd,
    #[serde(rename = "prompt.pdf")]
    PromptPdf,
    #[serde(rename = "manifest.json")]
    Manifest,
    #[serde(rename = "telemetry.json")]
    Telemetry,
}

/// All checksum artifacts in canonical order.
pub const CANONICAL_ORDER: [ArtifactName; 6] = [
    ArtifactName::PromptTxt,
    ArtifactName::PromptJson,
    ArtifactName::PromptMd,
    ArtifactName::PromptPdf,
    ArtifactName::Manifest,
    ArtifactName::Telemetry,
];

impl ArtifactName {
    /// The archive file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PromptTxt => "prompt.txt",
            Self::PromptJson => "prompt.json",
            Self::PromptMd => "prompt.md",
            Self::PromptPdf => "prompt.pdf",
            Self::Manifest => "manifest.json",
            Self::Telemetry => "telemetry.json",
        }
    }

    /// Look up a canonical artifact by file name. Returns `None` for files
    /// outside the canonical set.
    pub fn from_file_name(name: &str) -> Option<Self> {
        CANONICAL_ORDER.into_iter().find(|a| a.file_name() == name)
    }
}

impl std::fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}
