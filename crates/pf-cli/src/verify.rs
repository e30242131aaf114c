//! # License Verification
//!
//! Shared by the `pf-verify-license` binary and `pf verify`.
//!
//! ## Output Contract
//!
//! - Text mode: the `[OK]` line goes to stdout, every other finding to
//!   stderr, one per line.
//! - JSON mode: the whole report goes to stdout.
//! - Exit code `0` when the archive passes, `2` otherwise. An unreadable or
//!   malformed public key is reported as a `[FAIL]` line with exit `2`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use pf_core::{Timestamp, GRACE_PERIOD_DAYS};
use pf_crypto::Ed25519PublicKey;
use pf_verify::{verify_path, VerifyOptions};

/// Exit code for a failed verification.
pub const EXIT_VERIFICATION_FAILED: u8 = 2;

/// Largest accepted `--grace-days`.
pub const MAX_GRACE_DAYS: i64 = 3650;

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Arguments for license verification.
#[derive(Args, Debug)]
pub struct VerifyLicenseArgs {
    /// Export archive to verify.
    #[arg(long, value_name = "PATH")]
    pub zip: PathBuf,
    /// Public key (SPKI PEM or 64-char hex).
    #[arg(long = "pub", value_name = "PATH")]
    pub public_key: PathBuf,
    /// Verify as of this instant (RFC 3339 or YYYY-MM-DD) instead of now.
    #[arg(long, value_parser = crate::parse_timestamp)]
    pub now: Option<Timestamp>,
    /// Accept "MOCK" license signatures. Never use for real licenses.
    #[arg(long)]
    pub insecure_allow_mock: bool,
    /// Days past expiry that still verify.
    #[arg(
        long,
        default_value_t = GRACE_PERIOD_DAYS,
        value_parser = clap::value_parser!(i64).range(0..=MAX_GRACE_DAYS)
    )]
    pub grace_days: i64,
    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl VerifyLicenseArgs {
    fn options(&self) -> VerifyOptions {
        VerifyOptions {
            now: self.now.unwrap_or_else(Timestamp::now),
            grace_period_days: self.grace_days,
            allow_mock_signature: self.insecure_allow_mock,
        }
    }
}

/// Run verification against process stdout/stderr.
pub fn run_verify_license(args: &VerifyLicenseArgs) -> Result<u8> {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    verify_to(args, &mut stdout.lock(), &mut stderr.lock())
}

/// Run verification, writing report lines to the given streams.
pub fn verify_to(args: &VerifyLicenseArgs, out: &mut impl Write, err: &mut impl Write) -> Result<u8> {
    let public_key = match load_public_key(args) {
        Ok(k) => k,
        Err(message) => {
            writeln!(err, "[FAIL] {message}")?;
            return Ok(EXIT_VERIFICATION_FAILED);
        }
    };

    let report = verify_path(&args.zip, &public_key, &args.options());

    match args.format {
        ReportFormat::Text => {
            for line in report.stderr_lines() {
                writeln!(err, "{line}")?;
            }
            for line in report.stdout_lines() {
                writeln!(out, "{line}")?;
            }
        }
        ReportFormat::Json => writeln!(out, "{}", report.to_json()?)?,
    }

    Ok(if report.passed { 0 } else { EXIT_VERIFICATION_FAILED })
}

fn load_public_key(args: &VerifyLicenseArgs) -> Result<Ed25519PublicKey, String> {
    let contents = std::fs::read_to_string(&args.public_key).map_err(|e| {
        format!("Cannot read public key {}: {e}", args.public_key.display())
    })?;
    Ed25519PublicKey::from_key_file_contents(&contents)
        .map_err(|e| format!("Invalid public key {}: {e}", args.public_key.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::Path;

    use pf_bundle::{build_bundle, default_overview, write_archive_to_path, BundleRequest, SevenD};
    use pf_core::{LicensePayload, LicenseSignature, ModuleId, PackId};
    use pf_crypto::{sign_license, Ed25519KeyPair};
    use pf_entitlement::{ExportFormat, Plan};

    fn now() -> Timestamp {
        Timestamp::parse("2026-06-01T00:00:00Z").unwrap()
    }

    fn write_archive(dir: &Path, signature: Option<&Ed25519KeyPair>, expires: Timestamp) -> PathBuf {
        let request = BundleRequest {
            run_id: "run-v".to_string(),
            module_id: ModuleId::new("M03"),
            pack: PackId::new("pf-pro"),
            modules: vec![ModuleId::new("M03")],
            plan: Plan::Enterprise,
            formats: vec![ExportFormat::Md, ExportFormat::Json, ExportFormat::Zip],
            score: Some(97),
            prompt: "Plan the quarter.".to_string(),
            seven_d: SevenD::default(),
            telemetry: Default::default(),
            license_notice: None,
            bundle_id: None,
        };
        let bundle = build_bundle(&request, now()).unwrap();
        let modules: BTreeSet<ModuleId> = [ModuleId::from("M03")].into_iter().collect();
        let payload = LicensePayload::new(PackId::new("pf-pro"), &modules, expires);
        let license = match signature {
            Some(kp) => sign_license(payload, kp).unwrap(),
            None => payload.into_license(LicenseSignature::Mock).unwrap(),
        };
        let path = dir.join("bundle.zip");
        write_archive_to_path(&bundle, &license, &default_overview(bundle.manifest()), &path).unwrap();
        path
    }

    fn write_pub(dir: &Path, kp: &Ed25519KeyPair) -> PathBuf {
        let path = dir.join("pf.pub");
        std::fs::write(&path, kp.public_key().to_pem().unwrap()).unwrap();
        path
    }

    fn args(zip: PathBuf, public_key: PathBuf) -> VerifyLicenseArgs {
        VerifyLicenseArgs {
            zip,
            public_key,
            now: Some(now()),
            insecure_allow_mock: false,
            grace_days: GRACE_PERIOD_DAYS,
            format: ReportFormat::Text,
        }
    }

    fn run(a: &VerifyLicenseArgs) -> (u8, String, String) {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let code = verify_to(a, &mut out, &mut err).unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn valid_archive_prints_one_ok_line() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Ed25519KeyPair::generate();
        let zip = write_archive(dir.path(), Some(&kp), now().plus_days(30).unwrap());
        let (code, out, err) = run(&args(zip, write_pub(dir.path(), &kp)));
        assert_eq!(code, 0);
        assert!(out.starts_with("[OK] License verified"));
        assert_eq!(out.lines().count(), 1);
        assert!(err.is_empty());
    }

    #[test]
    fn expired_archive_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Ed25519KeyPair::generate();
        let zip = write_archive(dir.path(), Some(&kp), now().minus_days(30).unwrap());
        let (code, out, err) = run(&args(zip, write_pub(dir.path(), &kp)));
        assert_eq!(code, EXIT_VERIFICATION_FAILED);
        assert!(out.is_empty());
        assert!(err.contains("[FAIL] License expired (beyond grace)."));
    }

    #[test]
    fn mock_needs_the_insecure_flag() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Ed25519KeyPair::generate();
        let zip = write_archive(dir.path(), None, now().plus_days(30).unwrap());
        let mut a = args(zip, write_pub(dir.path(), &kp));
        assert_eq!(run(&a).0, EXIT_VERIFICATION_FAILED);

        a.insecure_allow_mock = true;
        let (code, out, err) = run(&a);
        assert_eq!(code, 0);
        assert!(out.starts_with("[OK]"));
        assert!(err.starts_with("[WARN] MOCK signature accepted"));
    }

    #[test]
    fn bad_public_key_is_a_fail_line() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Ed25519KeyPair::generate();
        let zip = write_archive(dir.path(), Some(&kp), now().plus_days(30).unwrap());
        let key = dir.path().join("bad.pub");
        std::fs::write(&key, "not a key").unwrap();
        let (code, _, err) = run(&args(zip.clone(), key));
        assert_eq!(code, EXIT_VERIFICATION_FAILED);
        assert!(err.starts_with("[FAIL] Invalid public key"));

        let (code, _, err) = run(&args(zip, dir.path().join("missing.pub")));
        assert_eq!(code, EXIT_VERIFICATION_FAILED);
        assert!(err.starts_with("[FAIL] Cannot read public key"));
    }

    #[test]
    fn grace_days_flag_is_bounded() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            args: VerifyLicenseArgs,
        }

        let parse = |grace: &str| {
            Harness::try_parse_from(["t", "--zip", "a.zip", "--pub", "k.pub", "--grace-days", grace])
        };
        assert_eq!(parse("0").unwrap().args.grace_days, 0);
        assert_eq!(parse("3650").unwrap().args.grace_days, MAX_GRACE_DAYS);
        assert!(parse("3651").is_err());
        assert!(parse("9223372036854775807").is_err());
        assert!(parse("-1").is_err());
    }

    #[test]
    fn longer_grace_window_accepts_older_license() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Ed25519KeyPair::generate();
        let zip = write_archive(dir.path(), Some(&kp), now().minus_days(30).unwrap());
        let mut a = args(zip, write_pub(dir.path(), &kp));
        a.grace_days = 30;
        let (code, out, err) = run(&a);
        assert_eq!(code, 0);
        assert!(out.starts_with("[OK]"));
        assert!(err.starts_with("[WARN] License expired at"));
    }

    #[test]
    fn json_report_goes_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let kp = Ed25519KeyPair::generate();
        let zip = write_archive(dir.path(), Some(&kp), now().plus_days(30).unwrap());
        let mut a = args(zip, write_pub(dir.path(), &kp));
        a.format = ReportFormat::Json;
        let (code, out, err) = run(&a);
        assert_eq!(code, 0);
        assert!(err.is_empty());
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["passed"], true);
        assert_eq!(v["pack"], "pf-pro");
    }
}
