//! # pf-bundle: Export Bundle Builder
//!
//! Produces the canonical export bundle for one run: entitlement gating,
//! artifact composition, watermarking, the manifest with per-file hashes,
//! the canonical checksum and `checksum.txt`, and the zip archive that ships
//! with `license.json` and `overview.md`.
//!
//! ## Pipeline
//!
//! ```text
//! BundleRequest ──▶ entitlement gate ──▶ compose ──▶ watermark ──▶ hash
//!                                                                  │
//!            zip archive ◀── checksum.txt ◀── canonical checksum ◀─┘
//! ```

pub mod archive;
pub mod builder;
pub mod compose;
pub mod error;
pub mod manifest;
pub mod request;

pub use archive::{default_overview, ensure_license_covers, write_archive, write_archive_to_path};
pub use builder::{build_bundle, Bundle};
pub use error::{BundleError, BundleResult};
pub use manifest::{default_license_notice, Manifest, ManifestArtifact, MANIFEST_VERSION};
pub use request::{BundleRequest, RunTelemetry, ScoreBreakdown, SevenD, TokenUsage};
