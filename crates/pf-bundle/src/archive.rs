//! # Archive Writer
//!
//! Packs a [`Bundle`] into a zip with `checksum.txt`, `license.json` and
//! `overview.md`. Entries are written in canonical order followed by the
//! three support files. Every entry carries the zip epoch timestamp and
//! fixed permissions so identical inputs produce identical archive bytes.
//!
//! The license must cover the bundle: same pack, and every watermarked
//! module listed. An archive the verifier would reject is never written.

use std::io::{Seek, Write};
use std::path::Path;

use pf_core::{License, CHECKSUM_FILE, LICENSE_FILE, OVERVIEW_FILE};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::builder::Bundle;
use crate::error::{BundleError, BundleResult};
use crate::manifest::Manifest;

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644)
}

/// Check that `license` covers the bundle's pack and watermarked modules.
pub fn ensure_license_covers(bundle: &Bundle, license: &License) -> BundleResult<()> {
    let watermark = &bundle.manifest().watermark;
    if watermark.pack != license.pack {
        return Err(BundleError::LicensePackMismatch {
            bundle: watermark.pack.clone(),
            license: license.pack.clone(),
        });
    }
    let modules = watermark.unauthorized_modules(&license.modules);
    if !modules.is_empty() {
        return Err(BundleError::UnlicensedModules { modules });
    }
    Ok(())
}

/// Write the archive to any seekable sink.
pub fn write_archive<W: Write + Seek>(
    bundle: &Bundle,
    license: &License,
    overview: &str,
    sink: W,
) -> BundleResult<W> {
    ensure_license_covers(bundle, license)?;
    let mut zip = ZipWriter::new(sink);
    let opts = entry_options();

    for (name, content) in bundle.files() {
        zip.start_file(name.file_name(), opts)?;
        zip.write_all(content)?;
    }
    zip.start_file(CHECKSUM_FILE, opts)?;
    zip.write_all(bundle.checksum_txt().as_bytes())?;

    let mut license_json = license.to_json_pretty()?;
    license_json.push('\n');
    zip.start_file(LICENSE_FILE, opts)?;
    zip.write_all(license_json.as_bytes())?;

    zip.start_file(OVERVIEW_FILE, opts)?;
    zip.write_all(overview.as_bytes())?;

    Ok(zip.finish()?)
}

/// Write the archive to a file path.
pub fn write_archive_to_path(
    bundle: &Bundle,
    license: &License,
    overview: &str,
    path: &Path,
) -> BundleResult<()> {
    ensure_license_covers(bundle, license)?;
    let file = std::fs::File::create(path)?;
    write_archive(bundle, license, overview, file)?;
    tracing::info!(path = %path.display(), checksum = bundle.checksum(), "archive written");
    Ok(())
}

/// Default `overview.md` for a bundle. Carries the provenance badge like every
/// other markdown file in the archive.
pub fn default_overview(manifest: &Manifest) -> String {
    let modules: Vec<&str> = manifest.watermark.modules.iter().map(|m| m.as_str()).collect();
    let mut out = String::new();
    out.push_str(&format!("# Export Bundle {}\n\n", manifest.bundle_id));
    out.push_str(&format!("- Run: `{}`\n", manifest.run_id));
    out.push_str(&format!("- Module: `{}`\n", manifest.module_id));
    out.push_str(&format!("- Pack: `{}`\n", manifest.watermark.pack));
    out.push_str(&format!("- Modules used: {}\n", modules.join(", ")));
    out.push_str(&format!("- Plan: {}\n", manifest.plan));
    out.push_str(&format!("- Created: {}\n\n", manifest.created_at));
    out.push_str("## Contents\n\n");
    for a in &manifest.artifacts {
        out.push_str(&format!("- `{}` ({} bytes) `{}`\n", a.file, a.bytes, a.checksum));
    }
    out.push_str("- `manifest.json`\n- `checksum.txt`\n- `license.json`\n\n");
    out.push_str("## Verifying\n\n");
    out.push_str("```\npf-verify-license --zip <bundle.zip> --pub <public-key.pem>\n```\n\n");
    out.push_str(&format!("{}\n\n", manifest.license_notice));
    out.push_str(&manifest.watermark.markdown_badge());
    out.push('\n');
    out
}
