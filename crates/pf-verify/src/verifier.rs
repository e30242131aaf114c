//! # Archive Verifier
//!
//! Runs the checks in order and accumulates findings:
//!
//! 1. **Load**: `license.json` must exist and parse. Otherwise the run ends
//!    immediately with a single `[FAIL]`.
//! 2. **Signature**: Ed25519 over the canonical payload. `"MOCK"` is accepted
//!    only with [`VerifyOptions::allow_mock_signature`].
//! 3. **Expiry**: past `expires_at + grace` fails; inside the grace window
//!    warns.
//! 4. **Artifacts**: every `.json` entry except `license.json` needs a
//!    consistent `__pf_wm`; every `.md` entry needs the badge.
//! 5. **Required files**: `overview.md`.
//!
//! Steps 2 through 5 never stop early. The verifier never returns an error:
//! every failure mode becomes a finding.

use std::path::Path;

use pf_core::{
    ExpiryStatus, License, LicenseSignature, Timestamp, Watermark, GRACE_PERIOD_DAYS,
    LICENSE_FILE, MARKDOWN_BADGE, OVERVIEW_FILE, WATERMARK_KEY,
};
use pf_crypto::{verify_license_signature, Ed25519PublicKey};
use serde_json::Value;

use crate::archive::ArchiveContents;
use crate::report::{Severity, VerificationReport};

/// Verifier settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Verification instant.
    pub now: Timestamp,
    /// Days past `expires_at` that still verify. Negative or out-of-range
    /// values produce a `[FAIL]` finding.
    pub grace_period_days: i64,
    /// Accept `"MOCK"` signatures. Insecure; for test licenses only.
    pub allow_mock_signature: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            now: Timestamp::now(),
            grace_period_days: GRACE_PERIOD_DAYS,
            allow_mock_signature: false,
        }
    }
}

impl VerifyOptions {
    /// Default options at a fixed instant.
    pub fn at(now: Timestamp) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }
}

/// Open and verify an archive file.
pub fn verify_path(path: &Path, public_key: &Ed25519PublicKey, options: &VerifyOptions) -> VerificationReport {
    match ArchiveContents::open(path) {
        Ok(archive) => verify_archive(&archive, public_key, options),
        Err(e) => {
            let mut report = VerificationReport::default();
            report.push(
                Severity::Fail,
                None,
                format!("Cannot open archive {}: {e}", path.display()),
            );
            report
        }
    }
}

/// Verify loaded archive contents.
pub fn verify_archive(
    archive: &ArchiveContents,
    public_key: &Ed25519PublicKey,
    options: &VerifyOptions,
) -> VerificationReport {
    let mut report = VerificationReport::default();

    let Some(license) = load_license(archive, &mut report) else {
        return report;
    };
    report.pack = Some(license.pack.clone());
    report.expires_at = Some(license.expires_at);

    check_signature(&license, public_key, options, &mut report);
    check_expiry(&license, options, &mut report);

    let mut scanned = 0usize;
    for (name, content) in archive.entries() {
        if name == LICENSE_FILE {
            continue;
        }
        if name.ends_with(".json") {
            check_json_artifact(name, content, &license, &mut report);
            scanned += 1;
        } else if name.ends_with(".md") {
            check_markdown_artifact(name, content, &mut report);
            scanned += 1;
        }
    }

    if !archive.contains(OVERVIEW_FILE) {
        report.push(Severity::Miss, Some(OVERVIEW_FILE), OVERVIEW_FILE);
    }

    report.passed = !report.has_failures();
    if report.passed {
        report.push(
            Severity::Ok,
            None,
            format!(
                "License verified: pack {}, {} module(s), {scanned} artifact(s) checked.",
                license.pack,
                license.modules.len()
            ),
        );
    } else {
        tracing::info!(
            failures = report.findings.iter().filter(|f| f.severity.is_failure()).count(),
            "verification failed"
        );
    }
    report
}

fn load_license(archive: &ArchiveContents, report: &mut VerificationReport) -> Option<License> {
    let Some(bytes) = archive.get(LICENSE_FILE) else {
        report.push(Severity::Fail, Some(LICENSE_FILE), "license.json missing from archive");
        return None;
    };
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            report.push(
                Severity::Fail,
                Some(LICENSE_FILE),
                format!("license.json is not valid JSON: {e}"),
            );
            return None;
        }
    };
    match License::from_value(value) {
        Ok(license) => Some(license),
        Err(e) => {
            report.push(Severity::Fail, Some(LICENSE_FILE), format!("license.json rejected: {e}"));
            None
        }
    }
}

fn check_signature(
    license: &License,
    public_key: &Ed25519PublicKey,
    options: &VerifyOptions,
    report: &mut VerificationReport,
) {
    match &license.signature {
        LicenseSignature::Mock if options.allow_mock_signature => {
            report.push(
                Severity::Warn,
                Some(LICENSE_FILE),
                "MOCK signature accepted (insecure mode); signature NOT verified",
            );
        }
        LicenseSignature::Mock => {
            report.push(
                Severity::Fail,
                Some(LICENSE_FILE),
                "MOCK signature rejected (pass --insecure-allow-mock to accept test licenses)",
            );
        }
        LicenseSignature::Encoded(_) => {
            if let Err(e) = verify_license_signature(license, public_key) {
                report.push(
                    Severity::Fail,
                    Some(LICENSE_FILE),
                    format!("Invalid license signature: {e}"),
                );
            }
        }
    }
}

fn check_expiry(license: &License, options: &VerifyOptions, report: &mut VerificationReport) {
    let status = match license.expiry_status(options.now, options.grace_period_days) {
        Ok(status) => status,
        Err(e) => {
            report.push(
                Severity::Fail,
                Some(LICENSE_FILE),
                format!("Cannot evaluate license expiry: {e}"),
            );
            return;
        }
    };
    match status {
        ExpiryStatus::Valid => {}
        ExpiryStatus::InGrace { grace_ends } => report.push(
            Severity::Warn,
            Some(LICENSE_FILE),
            format!(
                "License expired at {}; within grace period until {grace_ends}",
                license.expires_at
            ),
        ),
        ExpiryStatus::Expired { .. } => report.push(
            Severity::Fail,
            Some(LICENSE_FILE),
            "License expired (beyond grace).",
        ),
    }
}

fn check_json_artifact(name: &str, content: &[u8], license: &License, report: &mut VerificationReport) {
    let doc: Value = match serde_json::from_slice(content) {
        Ok(v) => v,
        Err(e) => {
            report.push(Severity::Err, Some(name), format!("{name}: invalid JSON: {e}"));
            return;
        }
    };
    let watermark = match Watermark::extract(&doc) {
        Ok(Some(wm)) => wm,
        Ok(None) => {
            report.push(Severity::Miss, Some(name), format!("{name}: {WATERMARK_KEY}"));
            return;
        }
        Err(e) => {
            report.push(Severity::Err, Some(name), format!("{name}: {e}"));
            return;
        }
    };
    if watermark.pack != license.pack {
        report.push(
            Severity::Fail,
            Some(name),
            format!(
                "{name}: pack mismatch (watermark {}, license {})",
                watermark.pack, license.pack
            ),
        );
    }
    let unauthorized = watermark.unauthorized_modules(&license.modules);
    if !unauthorized.is_empty() {
        let ids: Vec<&str> = unauthorized.iter().map(|m| m.as_str()).collect();
        report.push(
            Severity::Fail,
            Some(name),
            format!("{name}: unauthorized modules: {}", ids.join(", ")),
        );
    }
    tracing::debug!(file = name, "watermark checked");
}

fn check_markdown_artifact(name: &str, content: &[u8], report: &mut VerificationReport) {
    let text = String::from_utf8_lossy(content);
    if !text.contains(MARKDOWN_BADGE) {
        report.push(Severity::Miss, Some(name), format!("{name}: \"{MARKDOWN_BADGE}\" badge"));
    }
}
