//! End-to-end verification scenarios.
//!
//! Each test builds a real bundle with `pf-bundle`, signs a real Ed25519
//! license, writes a zip into a temp dir and verifies it from disk.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use pf_bundle::{build_bundle, default_overview, write_archive_to_path, Bundle, BundleRequest, SevenD};
use pf_core::{
    License, LicensePayload, LicenseSignature, ModuleId, PackId, Timestamp, MARKDOWN_BADGE,
};
use pf_crypto::{sign_license, Ed25519KeyPair};
use pf_entitlement::{can_export_format, ExportFormat, Plan};
use pf_verify::{verify_path, Severity, VerifyOptions};
use zip::write::SimpleFileOptions;

fn now() -> Timestamp {
    Timestamp::parse("2026-06-01T00:00:00Z").unwrap()
}

fn request() -> BundleRequest {
    BundleRequest {
        run_id: "run-e2e".to_string(),
        module_id: ModuleId::new("M07"),
        pack: PackId::new("pf-pro"),
        modules: vec![ModuleId::new("M07"), ModuleId::new("M12")],
        plan: Plan::Pro,
        formats: vec![ExportFormat::Md, ExportFormat::Json, ExportFormat::Pdf, ExportFormat::Zip],
        score: Some(88),
        prompt: "Draft a launch plan.".to_string(),
        seven_d: SevenD {
            domain: "marketing".to_string(),
            ..SevenD::default()
        },
        telemetry: Default::default(),
        license_notice: None,
        bundle_id: None,
    }
}

fn payload(expires_at: Timestamp) -> LicensePayload {
    let modules: BTreeSet<ModuleId> = ["M07", "M12", "M20"].into_iter().map(ModuleId::from).collect();
    LicensePayload::new(PackId::new("pf-pro"), &modules, expires_at)
}

fn bundle() -> Bundle {
    build_bundle(&request(), now()).unwrap()
}

fn write(dir: &Path, name: &str, bundle: &Bundle, license: &License) -> PathBuf {
    let path = dir.join(name);
    let overview = default_overview(bundle.manifest());
    write_archive_to_path(bundle, license, &overview, &path).unwrap();
    path
}

/// Write a zip from raw entries, for archives the builder would never emit.
fn write_raw(dir: &Path, name: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    for (n, body) in entries {
        zip.start_file(*n, SimpleFileOptions::default()).unwrap();
        zip.write_all(body).unwrap();
    }
    zip.finish().unwrap();
    path
}

fn raw_entries(bundle: &Bundle, license: &License) -> Vec<(&'static str, Vec<u8>)> {
    let mut out: Vec<(&'static str, Vec<u8>)> = bundle
        .files()
        .map(|(n, c)| (n.file_name(), c.to_vec()))
        .collect();
    out.push(("checksum.txt", bundle.checksum_txt().as_bytes().to_vec()));
    out.push(("license.json", license.to_json_pretty().unwrap().into_bytes()));
    out.push((
        "overview.md",
        default_overview(bundle.manifest()).into_bytes(),
    ));
    out
}

#[test]
fn a_valid_archive_passes() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(now().plus_days(365).unwrap()), &kp).unwrap();
    let path = write(dir.path(), "ok.zip", &bundle(), &license);

    let report = verify_path(&path, &kp.public_key(), &VerifyOptions::at(now()));
    assert!(report.passed, "{:#?}", report.findings);
    let stdout = report.stdout_lines();
    assert_eq!(stdout.len(), 1);
    assert!(stdout[0].starts_with("[OK]"));
    assert!(report.stderr_lines().is_empty());
}

#[test]
fn b_expired_beyond_grace_fails() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(now().minus_days(10).unwrap()), &kp).unwrap();
    let path = write(dir.path(), "expired.zip", &bundle(), &license);

    let report = verify_path(&path, &kp.public_key(), &VerifyOptions::at(now()));
    assert!(!report.passed);
    assert!(report
        .stderr_lines()
        .contains(&"[FAIL] License expired (beyond grace).".to_string()));
}

#[test]
fn b_inside_grace_passes_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(now().minus_days(3).unwrap()), &kp).unwrap();
    let path = write(dir.path(), "grace.zip", &bundle(), &license);

    let report = verify_path(&path, &kp.public_key(), &VerifyOptions::at(now()));
    assert!(report.passed, "{:#?}", report.findings);
    assert_eq!(report.with_severity(Severity::Warn).count(), 1);
}

#[test]
fn c_unauthorized_module_is_reported_by_file() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(now().plus_days(30).unwrap()), &kp).unwrap();
    let b = bundle();
    let mut entries = raw_entries(&b, &license);
    for (name, body) in entries.iter_mut() {
        if *name == "telemetry.json" {
            let mut v: serde_json::Value = serde_json::from_slice(body).unwrap();
            v["__pf_wm"]["modules"] = serde_json::json!(["M07", "M99"]);
            *body = serde_json::to_vec_pretty(&v).unwrap();
        }
    }
    let path = write_raw(dir.path(), "rogue.zip", &entries);

    let report = verify_path(&path, &kp.public_key(), &VerifyOptions::at(now()));
    assert!(!report.passed);
    let failures: Vec<_> = report.with_severity(Severity::Fail).collect();
    assert_eq!(failures.len(), 1, "{failures:#?}");
    assert_eq!(failures[0].file.as_deref(), Some("telemetry.json"));
    assert_eq!(
        failures[0].to_string(),
        "[FAIL] telemetry.json: unauthorized modules: M99"
    );
}

#[test]
fn d_mock_signature_passes_only_in_insecure_mode() {
    let dir = tempfile::tempdir().unwrap();
    let license = payload(now().plus_days(30).unwrap())
        .into_license(LicenseSignature::Mock)
        .unwrap();
    let path = write(dir.path(), "mock.zip", &bundle(), &license);
    let unrelated_key = Ed25519KeyPair::generate().public_key();

    let strict = verify_path(&path, &unrelated_key, &VerifyOptions::at(now()));
    assert!(!strict.passed);

    let insecure = VerifyOptions {
        allow_mock_signature: true,
        ..VerifyOptions::at(now())
    };
    let report = verify_path(&path, &unrelated_key, &insecure);
    assert!(report.passed, "{:#?}", report.findings);
    assert!(report
        .stderr_lines()
        .iter()
        .any(|l| l.starts_with("[WARN]") && l.contains("MOCK")));
}

#[test]
fn e_missing_overview_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(now().plus_days(30).unwrap()), &kp).unwrap();
    let entries: Vec<_> = raw_entries(&bundle(), &license)
        .into_iter()
        .filter(|(n, _)| *n != "overview.md")
        .collect();
    let path = write_raw(dir.path(), "no-overview.zip", &entries);

    let report = verify_path(&path, &kp.public_key(), &VerifyOptions::at(now()));
    assert!(!report.passed);
    assert!(report.stderr_lines().contains(&"[MISS] overview.md".to_string()));
}

#[test]
fn f_entitlement_examples() {
    assert!(!can_export_format(Plan::Free, ExportFormat::Pdf, Some(95)));
    assert!(can_export_format(Plan::Creator, ExportFormat::Pdf, Some(95)));
}

#[test]
fn wrong_public_key_fails_signature() {
    let dir = tempfile::tempdir().unwrap();
    let license = sign_license(payload(now().plus_days(30).unwrap()), &Ed25519KeyPair::generate()).unwrap();
    let path = write(dir.path(), "wrongkey.zip", &bundle(), &license);

    let report = verify_path(&path, &Ed25519KeyPair::generate().public_key(), &VerifyOptions::at(now()));
    assert!(!report.passed);
    assert!(report
        .stderr_lines()
        .iter()
        .any(|l| l.starts_with("[FAIL] Invalid license signature")));
}

#[test]
fn tampered_license_modules_fail_signature_but_scan_continues() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(now().plus_days(30).unwrap()), &kp).unwrap();
    let mut value = license.to_value();
    value["modules"] = serde_json::json!(["M07"]);
    let tampered = License::from_value(value).unwrap();
    // The archive writer refuses a license that does not cover the bundle.
    let path = write_raw(dir.path(), "tampered.zip", &raw_entries(&bundle(), &tampered));

    let report = verify_path(&path, &kp.public_key(), &VerifyOptions::at(now()));
    assert!(!report.passed);
    let lines = report.stderr_lines();
    assert!(lines.iter().any(|l| l.starts_with("[FAIL] Invalid license signature")));
    // M12 is used by the bundle but no longer in the (tampered) license.
    assert!(lines.iter().any(|l| l.contains("unauthorized modules: M12")));
}

#[test]
fn markdown_without_badge_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(now().plus_days(30).unwrap()), &kp).unwrap();
    let mut entries = raw_entries(&bundle(), &license);
    for (name, body) in entries.iter_mut() {
        if *name == "prompt.md" {
            *body = String::from_utf8(body.clone())
                .unwrap()
                .replace(MARKDOWN_BADGE, "")
                .into_bytes();
        }
    }
    let path = write_raw(dir.path(), "nobadge.zip", &entries);
    let report = verify_path(&path, &kp.public_key(), &VerifyOptions::at(now()));
    assert!(!report.passed);
    assert_eq!(report.with_severity(Severity::Miss).count(), 1);
}

#[test]
fn not_a_zip_is_a_single_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.zip");
    std::fs::write(&path, b"definitely not a zip").unwrap();
    let report = verify_path(&path, &Ed25519KeyPair::generate().public_key(), &VerifyOptions::at(now()));
    assert!(!report.passed);
    assert_eq!(report.findings.len(), 1);
    assert!(report.findings[0].message.starts_with("Cannot open archive"));
}

fn verify_expiring_at(expires_at: &str, options: &VerifyOptions) -> pf_verify::VerificationReport {
    let dir = tempfile::tempdir().unwrap();
    let kp = Ed25519KeyPair::generate();
    let license = sign_license(payload(Timestamp::parse(expires_at).unwrap()), &kp).unwrap();
    let path = write(dir.path(), "edge.zip", &bundle(), &license);
    verify_path(&path, &kp.public_key(), options)
}

#[test]
fn last_second_of_grace_still_passes() {
    // now() is exactly expires_at + 7 days.
    let report = verify_expiring_at("2026-05-25T00:00:00Z", &VerifyOptions::at(now()));
    assert!(report.passed, "{:#?}", report.findings);
    assert_eq!(
        report.stderr_lines(),
        vec!["[WARN] License expired at 2026-05-25T00:00:00Z; within grace period until 2026-06-01T00:00:00Z"]
    );
}

#[test]
fn one_second_past_grace_fails() {
    let report = verify_expiring_at("2026-05-24T23:59:59Z", &VerifyOptions::at(now()));
    assert!(!report.passed);
    assert!(report
        .stderr_lines()
        .contains(&"[FAIL] License expired (beyond grace).".to_string()));
}

#[test]
fn custom_grace_window_moves_the_boundary() {
    let options = VerifyOptions {
        grace_period_days: 10,
        ..VerifyOptions::at(now())
    };
    assert!(verify_expiring_at("2026-05-22T00:00:00Z", &options).passed);
    assert!(!verify_expiring_at("2026-05-21T23:59:59Z", &options).passed);

    let strict = VerifyOptions {
        grace_period_days: 0,
        ..VerifyOptions::at(now())
    };
    assert!(verify_expiring_at("2026-06-01T00:00:00Z", &strict).passed);
    assert!(!verify_expiring_at("2026-05-31T23:59:59Z", &strict).passed);
}

#[test]
fn extreme_grace_window_is_reported_not_panicked() {
    let options = VerifyOptions {
        grace_period_days: i64::MAX,
        ..VerifyOptions::at(now())
    };
    let report = verify_expiring_at("2030-01-01", &options);
    assert!(!report.passed);
    let failures: Vec<_> = report.with_severity(Severity::Fail).collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.starts_with("Cannot evaluate license expiry"));
}
