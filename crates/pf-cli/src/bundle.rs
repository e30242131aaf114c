//! # Bundle Subcommand
//!
//! `pf bundle build` loads a request file (YAML or JSON), builds the bundle,
//! writes every artifact plus `checksum.txt` into the output directory and,
//! when the request includes `zip`, packs the archive with `license.json`
//! and `overview.md`.
//!
//! Entitlement and definition-of-done denials are reported on stderr with
//! exit code 1; they are outcomes, not tool failures.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use pf_bundle::{
    build_bundle, default_overview, ensure_license_covers, write_archive_to_path, Bundle, BundleError,
    BundleRequest,
};
use pf_core::{License, Timestamp};

/// Arguments for `pf bundle`.
#[derive(Args, Debug)]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleCommand,
}

/// Bundle subcommands.
#[derive(Subcommand, Debug)]
pub enum BundleCommand {
    /// Build a bundle from a request file.
    Build(BuildArgs),
}

/// Arguments for `pf bundle build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Request file (.yaml, .yml or .json).
    #[arg(long)]
    pub request: PathBuf,
    /// Output directory.
    #[arg(long, short)]
    pub out: PathBuf,
    /// license.json to embed. Required when the request includes zip.
    #[arg(long)]
    pub license: Option<PathBuf>,
    /// overview.md to embed instead of the generated one.
    #[arg(long)]
    pub overview: Option<PathBuf>,
    /// Archive path. Defaults to `<out>/<run_id>.zip`.
    #[arg(long)]
    pub zip: Option<PathBuf>,
    /// Creation time recorded in the artifacts. Defaults to now.
    #[arg(long, value_parser = crate::parse_timestamp)]
    pub created_at: Option<Timestamp>,
}

/// Execute `pf bundle`.
pub fn run_bundle(args: &BundleArgs) -> Result<u8> {
    match &args.command {
        BundleCommand::Build(build) => cmd_build(build),
    }
}

fn cmd_build(args: &BuildArgs) -> Result<u8> {
    let request = BundleRequest::from_path(&args.request)?;
    let created_at = args.created_at.unwrap_or_else(Timestamp::now);

    let bundle = match build_bundle(&request, created_at) {
        Ok(b) => b,
        Err(e @ (BundleError::Entitlement { .. } | BundleError::DodNotMet { .. })) => {
            eprintln!("{e}");
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    let license = if bundle.wants_archive() {
        Some(load_license(args, &bundle)?)
    } else {
        None
    };

    bundle
        .write_to_dir(&args.out)
        .with_context(|| format!("failed to write bundle to {}", args.out.display()))?;

    println!("OK: built bundle {}", bundle.manifest().bundle_id);
    for entry in bundle.file_hashes() {
        println!("  {entry}");
    }
    println!("  checksum: {}", bundle.checksum());

    if let Some(license) = license {
        let overview = match &args.overview {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read overview: {}", path.display()))?,
            None => default_overview(bundle.manifest()),
        };
        let zip_path = args
            .zip
            .clone()
            .unwrap_or_else(|| args.out.join(format!("{}.zip", request.run_id)));
        write_archive_to_path(&bundle, &license, &overview, &zip_path)?;
        println!("  archive: {}", zip_path.display());
    }

    Ok(0)
}

/// Load the license for a zip export and check it covers the bundle before
/// anything is written.
fn load_license(args: &BuildArgs, bundle: &Bundle) -> Result<License> {
    let Some(license_path) = &args.license else {
        bail!("zip export requires --license");
    };
    let license_bytes = std::fs::read(license_path)
        .with_context(|| format!("failed to read license: {}", license_path.display()))?;
    let license = License::from_slice(&license_bytes)
        .with_context(|| format!("invalid license: {}", license_path.display()))?;
    ensure_license_covers(bundle, &license)
        .with_context(|| format!("license {} cannot sign this bundle", license_path.display()))?;
    Ok(license)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::{LicensePayload, LicenseSignature, ModuleId, PackId};
    use std::collections::BTreeSet;
    use std::path::Path;

    const REQUEST: &str = "run_id: run-7\nmodule_id: M07\npack: pf-pro\nmodules: [M07]\nplan: PRO\nformats: [md, json, zip]\nscore: 90\nprompt: Write a haiku.\n";

    fn write_request(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("run.yaml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn write_license(dir: &Path) -> PathBuf {
        write_license_for(dir, "pf-pro", &["M07"])
    }

    fn write_license_for(dir: &Path, pack: &str, modules: &[&str]) -> PathBuf {
        let modules: BTreeSet<ModuleId> = modules.iter().copied().map(ModuleId::from).collect();
        let license = LicensePayload::new(
            PackId::new(pack),
            &modules,
            Timestamp::parse("2031-01-01").unwrap(),
        )
        .into_license(LicenseSignature::Mock)
        .unwrap();
        let path = dir.join("license.json");
        std::fs::write(&path, license.to_json_pretty().unwrap()).unwrap();
        path
    }

    fn args(dir: &Path, license: Option<PathBuf>) -> BuildArgs {
        BuildArgs {
            request: write_request(dir, REQUEST),
            out: dir.join("dist"),
            license,
            overview: None,
            zip: None,
            created_at: Some(Timestamp::parse("2026-03-01T12:00:00Z").unwrap()),
        }
    }

    #[test]
    fn builds_files_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        let license = write_license(dir.path());
        assert_eq!(cmd_build(&args(dir.path(), Some(license))).unwrap(), 0);

        let dist = dir.path().join("dist");
        for name in ["prompt.txt", "prompt.md", "prompt.json", "manifest.json", "telemetry.json", "checksum.txt"] {
            assert!(dist.join(name).exists(), "{name}");
        }
        assert!(dist.join("run-7.zip").exists());
    }

    #[test]
    fn zip_without_license_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_build(&args(dir.path(), None)).is_err());
    }

    #[test]
    fn mismatched_license_pack_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let license = write_license_for(dir.path(), "pf-basic", &["M07"]);
        let err = cmd_build(&args(dir.path(), Some(license))).unwrap_err();
        assert!(format!("{err:#}").contains("does not match bundle pack"));
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn license_without_bundle_module_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let license = write_license_for(dir.path(), "pf-pro", &["M01"]);
        let err = cmd_build(&args(dir.path(), Some(license))).unwrap_err();
        assert!(format!("{err:#}").contains("does not cover bundle modules: M07"));
        assert!(!dir.path().join("dist").join("run-7.zip").exists());
    }

    #[test]
    fn low_score_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path(), None);
        a.request = write_request(dir.path(), &REQUEST.replace("score: 90", "score: 60"));
        assert_eq!(cmd_build(&a).unwrap(), 1);
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn plan_denial_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path(), None);
        a.request = write_request(dir.path(), &REQUEST.replace("plan: PRO", "plan: FREE"));
        assert_eq!(cmd_build(&a).unwrap(), 1);
    }
}
