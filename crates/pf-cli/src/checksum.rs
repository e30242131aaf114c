//! # Checksum Subcommand
//!
//! Hashes the canonical files of a bundle directory and prints the
//! per-file entries and the bundle checksum. With `--verify`, re-hashes the
//! files against `manifest.json` and compares `checksum.txt` with the
//! content it should have; any mismatch exits 1.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use pf_bundle::Manifest;
use pf_core::{sha256_bytes, ArtifactName, ContentDigest, CANONICAL_ORDER, CHECKSUM_FILE};
use pf_crypto::{canonical_checksum, file_hash, generate_checksum_file};

/// Arguments for `pf checksum`.
#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Bundle directory.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
    /// Check files against manifest.json and checksum.txt.
    #[arg(long)]
    pub verify: bool,
}

/// Execute `pf checksum`.
pub fn run_checksum(args: &ChecksumArgs) -> Result<u8> {
    let files = read_canonical_files(&args.dir)?;
    if files.is_empty() {
        eprintln!("no bundle files found in {}", args.dir.display());
        return Ok(1);
    }

    let entries: Vec<String> = files
        .iter()
        .map(|(name, content)| file_hash(name.file_name(), content))
        .collect();
    for entry in &entries {
        println!("{entry}");
    }
    println!("checksum: {}", canonical_checksum(&entries)?);

    if !args.verify {
        return Ok(0);
    }
    Ok(if verify_dir(&args.dir, &files)? { 0 } else { 1 })
}

fn read_canonical_files(dir: &Path) -> Result<BTreeMap<ArtifactName, Vec<u8>>> {
    let mut files = BTreeMap::new();
    for artifact in CANONICAL_ORDER {
        let path = dir.join(artifact.file_name());
        if !path.exists() {
            continue;
        }
        let content =
            std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        files.insert(artifact, content);
    }
    Ok(files)
}

fn verify_dir(dir: &Path, files: &BTreeMap<ArtifactName, Vec<u8>>) -> Result<bool> {
    let mut ok = true;

    match files.get(&ArtifactName::Manifest) {
        Some(bytes) => {
            let manifest = Manifest::from_slice(bytes).context("invalid manifest.json")?;
            let by_name: BTreeMap<String, Vec<u8>> = files
                .iter()
                .map(|(n, c)| (n.file_name().to_string(), c.clone()))
                .collect();
            let result = manifest.verify_files(&by_name)?;
            for name in &result.corrupted {
                eprintln!("MISMATCH: {name}");
            }
            for name in &result.missing {
                eprintln!("MISSING: {name}");
            }
            for name in &result.unrecorded {
                eprintln!("UNRECORDED: {name}");
            }
            ok &= result.is_valid();
        }
        None => {
            eprintln!("MISSING: manifest.json");
            ok = false;
        }
    }

    let checksum_path = dir.join(CHECKSUM_FILE);
    if checksum_path.exists() {
        let recorded = std::fs::read_to_string(&checksum_path)
            .with_context(|| format!("failed to read {}", checksum_path.display()))?;
        let digests: BTreeMap<String, ContentDigest> = files
            .iter()
            .map(|(n, c)| (n.file_name().to_string(), sha256_bytes(c)))
            .collect();
        if recorded != generate_checksum_file(&digests) {
            eprintln!("MISMATCH: {CHECKSUM_FILE}");
            ok = false;
        }
    } else {
        eprintln!("MISSING: {CHECKSUM_FILE}");
        ok = false;
    }

    if ok {
        println!("OK: bundle files match manifest.json and {CHECKSUM_FILE}");
    }
    Ok(ok)
}
