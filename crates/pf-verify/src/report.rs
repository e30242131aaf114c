//! # Verification Report
//!
//! An ordered list of findings. Each finding renders as one line prefixed
//! with a fixed-width tag:
//!
//! | Tag      | Meaning                                   | Fails the run |
//! |----------|-------------------------------------------|---------------|
//! | `[OK]`   | final confirmation                        | no            |
//! | `[WARN]` | advisory (mock signature, grace period)   | no            |
//! | `[MISS]` | a required marker or file is absent       | yes           |
//! | `[FAIL]` | policy violation or unusable license      | yes           |
//! | `[ERR ]` | an artifact could not be parsed           | yes           |

use pf_core::{PackId, Timestamp};
use serde::Serialize;

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warn,
    Miss,
    Fail,
    Err,
}

impl Severity {
    /// Line prefix.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
            Self::Miss => "[MISS]",
            Self::Fail => "[FAIL]",
            Self::Err => "[ERR ]",
        }
    }

    /// Whether this severity fails the run.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Miss | Self::Fail | Self::Err)
    }
}

/// One report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Archive entry the finding is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.severity.tag(), self.message)
    }
}

/// The outcome of one verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack: Option<PackId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    pub findings: Vec<Finding>,
}

impl VerificationReport {
    pub(crate) fn push(&mut self, severity: Severity, file: Option<&str>, message: impl Into<String>) {
        let finding = Finding {
            severity,
            file: file.map(str::to_string),
            message: message.into(),
        };
        match severity {
            Severity::Ok => tracing::info!(%finding),
            Severity::Warn => tracing::warn!(%finding),
            _ => tracing::debug!(%finding),
        }
        self.findings.push(finding);
    }

    /// Whether any finding fails the run.
    pub fn has_failures(&self) -> bool {
        self.findings.iter().any(|f| f.severity.is_failure())
    }

    /// Findings of one severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Lines destined for stdout: only the `[OK]` line of a passing run.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.with_severity(Severity::Ok).map(ToString::to_string).collect()
    }

    /// Lines destined for stderr: everything except `[OK]`.
    pub fn stderr_lines(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter(|f| f.severity != Severity::Ok)
            .map(ToString::to_string)
            .collect()
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
