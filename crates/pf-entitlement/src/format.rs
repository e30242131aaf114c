//! Export formats.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A downloadable export format.
///
/// `Txt` is the plain-text artifact. It is produced with every bundle and is
/// not listed in any plan's export table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Markdown.
    Md,
    /// PDF document.
    Pdf,
    /// Structured JSON.
    Json,
    /// Zip bundle with every artifact, license and checksum.
    Zip,
    /// Plain text.
    Txt,
}

/// The input did not name a format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid format {0:?}: expected one of md, pdf, json, zip, txt")]
pub struct ParseFormatError(pub String);

impl ExportFormat {
    /// Every format.
    pub fn all() -> &'static [ExportFormat] {
        &[Self::Md, Self::Pdf, Self::Json, Self::Zip, Self::Txt]
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md => "md",
            Self::Pdf => "pdf",
            Self::Json => "json",
            Self::Zip => "zip",
            Self::Txt => "txt",
        }
    }

    /// Whether the minimum-score rule applies to this format.
    pub fn is_score_gated(&self) -> bool {
        matches!(self, Self::Pdf | Self::Json)
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFormatError(s.to_string()))
    }
}
