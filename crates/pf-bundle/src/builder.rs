//! # Bundle Builder
//!
//! Turns a [`BundleRequest`] into a [`Bundle`]:
//!
//! 1. Every requested format passes the entitlement gate. Plan denials abort
//!    with `ENTITLEMENT_REQUIRED`; score denials abort with `DOD_NOT_MET`.
//! 2. Artifacts are composed. JSON artifacts get the `__pf_wm` watermark,
//!    markdown gets the badge.
//! 3. Each artifact is hashed; the manifest records those hashes, is
//!    watermarked and hashed in turn.
//! 4. The canonical checksum and `checksum.txt` are derived from the full set.
//!
//! Output is a pure function of the request and `created_at`.

use std::collections::BTreeMap;

use pf_core::{ArtifactName, ContentDigest, Timestamp, Watermark, CHECKSUM_FILE};
use pf_crypto::{canonical_checksum, generate_checksum_file, FileHash};
use pf_entitlement::{check, entitlement_reason, EntitlementDecision, ExportFormat};
use serde_json::Value;
use uuid::Uuid;

use crate::compose::{compose_json, compose_md, compose_pdf, compose_telemetry, compose_txt};
use crate::error::{BundleError, BundleResult};
use crate::manifest::{default_license_notice, Manifest, ManifestArtifact, MANIFEST_VERSION};
use crate::request::BundleRequest;

const BUNDLE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x7f1e_5a3c_9b2d_4e60_8a41_c0de_b0a7_d1e5);

/// A built bundle. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Bundle {
    files: BTreeMap<ArtifactName, Vec<u8>>,
    hashes: BTreeMap<ArtifactName, ContentDigest>,
    manifest: Manifest,
    checksum: String,
    checksum_txt: String,
    wants_archive: bool,
}

impl Bundle {
    /// Artifact contents in canonical order.
    pub fn files(&self) -> impl Iterator<Item = (ArtifactName, &[u8])> {
        self.files.iter().map(|(n, c)| (*n, c.as_slice()))
    }

    /// One artifact's content.
    pub fn file(&self, name: ArtifactName) -> Option<&[u8]> {
        self.files.get(&name).map(Vec::as_slice)
    }

    /// Per-artifact digests in canonical order.
    pub fn hashes(&self) -> &BTreeMap<ArtifactName, ContentDigest> {
        &self.hashes
    }

    /// `filename:sha256:<hex>` entries in canonical order.
    pub fn file_hashes(&self) -> Vec<String> {
        hash_entries(&self.hashes)
    }

    /// The parsed manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// `sha256:<hex>` over all artifacts in canonical order.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// `checksum.txt` content.
    pub fn checksum_txt(&self) -> &str {
        &self.checksum_txt
    }

    /// Whether the request asked for a zip archive.
    pub fn wants_archive(&self) -> bool {
        self.wants_archive
    }

    /// Write every artifact plus `checksum.txt` into `dir`.
    pub fn write_to_dir(&self, dir: &std::path::Path) -> BundleResult<()> {
        std::fs::create_dir_all(dir)?;
        for (name, content) in self.files() {
            std::fs::write(dir.join(name.file_name()), content)?;
        }
        std::fs::write(dir.join(CHECKSUM_FILE), &self.checksum_txt)?;
        tracing::info!(dir = %dir.display(), files = self.files.len(), "bundle written");
        Ok(())
    }
}

/// Gate every requested format. `txt` is always produced and needs no
/// entitlement.
fn enforce_entitlements(request: &BundleRequest) -> BundleResult<()> {
    for format in request.unique_formats() {
        if format == ExportFormat::Txt {
            continue;
        }
        match check(request.plan, format, request.score) {
            EntitlementDecision::Allowed => {}
            EntitlementDecision::ScoreRequired { minimum, actual } => {
                tracing::warn!(run_id = %request.run_id, %format, actual, minimum, "definition of done not met");
                return Err(BundleError::DodNotMet {
                    format,
                    minimum,
                    actual,
                });
            }
            decision => {
                let reason = entitlement_reason(request.plan, format, request.score);
                tracing::warn!(run_id = %request.run_id, %format, plan = %request.plan, %reason, "entitlement denied");
                return Err(BundleError::Entitlement {
                    format,
                    decision,
                    reason,
                });
            }
        }
    }
    Ok(())
}

fn hash_entries(hashes: &BTreeMap<ArtifactName, ContentDigest>) -> Vec<String> {
    hashes
        .iter()
        .map(|(n, d)| {
            FileHash {
                file_name: n.file_name().to_string(),
                digest: d.clone(),
            }
            .to_string()
        })
        .collect()
}

fn render_json(mut doc: Value, watermark: &Watermark) -> BundleResult<Vec<u8>> {
    watermark.stamp(&mut doc)?;
    let mut bytes = serde_json::to_vec_pretty(&doc)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Build a bundle.
pub fn build_bundle(request: &BundleRequest, created_at: Timestamp) -> BundleResult<Bundle> {
    request.validate()?;
    enforce_entitlements(request)?;

    let watermark = Watermark::new(request.pack.clone(), request.modules.clone());
    let mut files: BTreeMap<ArtifactName, Vec<u8>> = BTreeMap::new();

    files.insert(ArtifactName::PromptTxt, compose_txt(request).into_bytes());
    if request.wants(ExportFormat::Md) {
        files.insert(
            ArtifactName::PromptMd,
            compose_md(request, &watermark, created_at).into_bytes(),
        );
    }
    if request.wants(ExportFormat::Json) {
        files.insert(
            ArtifactName::PromptJson,
            render_json(compose_json(request, created_at), &watermark)?,
        );
    }
    if request.wants(ExportFormat::Pdf) {
        files.insert(
            ArtifactName::PromptPdf,
            compose_pdf(request, &watermark, created_at),
        );
    }
    files.insert(
        ArtifactName::Telemetry,
        render_json(compose_telemetry(request), &watermark)?,
    );

    let mut hashes: BTreeMap<ArtifactName, ContentDigest> = files
        .iter()
        .map(|(name, content)| (*name, pf_core::sha256_bytes(content)))
        .collect();

    let bundle_id = request.bundle_id.unwrap_or_else(|| {
        Uuid::new_v5(
            &BUNDLE_ID_NAMESPACE,
            format!("{}@{}", request.run_id, created_at).as_bytes(),
        )
    });
    let manifest = Manifest {
        version: MANIFEST_VERSION.to_string(),
        bundle_id,
        run_id: request.run_id.clone(),
        module_id: request.module_id.clone(),
        plan: request.plan,
        formats: request.unique_formats(),
        score: request.score,
        created_at,
        license_notice: request
            .license_notice
            .clone()
            .unwrap_or_else(|| default_license_notice(request.plan)),
        artifacts: hashes
            .iter()
            .map(|(name, digest)| ManifestArtifact {
                file: *name,
                checksum: digest.to_string(),
                bytes: files.get(name).map_or(0, |c| c.len() as u64),
            })
            .collect(),
        watermark: watermark.clone(),
    };
    let manifest_bytes = {
        let mut b = serde_json::to_vec_pretty(&manifest)?;
        b.push(b'\n');
        b
    };
    hashes.insert(ArtifactName::Manifest, pf_core::sha256_bytes(&manifest_bytes));
    files.insert(ArtifactName::Manifest, manifest_bytes);

    let checksum = canonical_checksum(&hash_entries(&hashes))?;
    let by_name: BTreeMap<String, ContentDigest> = hashes
        .iter()
        .map(|(n, d)| (n.file_name().to_string(), d.clone()))
        .collect();
    let checksum_txt = generate_checksum_file(&by_name);

    tracing::info!(
        run_id = %request.run_id,
        %bundle_id,
        files = files.len(),
        %checksum,
        "bundle built"
    );

    Ok(Bundle {
        files,
        hashes,
        manifest,
        checksum,
        checksum_txt,
        wants_archive: request.wants(ExportFormat::Zip),
    })
}
