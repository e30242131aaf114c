//! # pf-core: Foundational Types for the Export Integrity Stack
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! primitives every other crate builds on: the canonical serializer, content
//! digests, the canonical artifact set, the `__pf_wm` watermark, and the
//! license data model consumed by the verifier.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every byte string that is signed or
//!    verified flows through `CanonicalBytes::new()`. Two logically equal JSON
//!    documents always produce identical bytes regardless of key insertion
//!    order.
//!
//! 2. **Closed artifact set.** `ArtifactName` enumerates the six files that
//!    participate in the bundle checksum. Their canonical order is a property
//!    of the enum, not of caller code.
//!
//! 3. **Newtypes for identifiers.** `PackId` and `ModuleId` instead of bare
//!    strings in the license and watermark types.
//!
//! 4. **UTC-only timestamps.** `Timestamp` normalizes to UTC with seconds
//!    precision so expiry arithmetic is unambiguous.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pf-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod artifact;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod license;
pub mod temporal;
pub mod watermark;

// Re-export primary types for ergonomic imports.
pub use artifact::{ArtifactName, CANONICAL_ORDER, CHECKSUM_FILE, LICENSE_FILE, OVERVIEW_FILE};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_bytes, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, CryptoError, PfError};
pub use identity::{ModuleId, PackId};
pub use license::{
    ExpiryStatus, License, LicensePayload, LicenseSignature, GRACE_PERIOD_DAYS, MOCK_SIGNATURE,
};
pub use temporal::Timestamp;
pub use watermark::{Watermark, MARKDOWN_BADGE, WATERMARK_KEY};
