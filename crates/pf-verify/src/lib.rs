//! # pf-verify: Offline License Verifier
//!
//! Verifies an export archive without network access: the license signature,
//! its expiry against a grace window, and that every artifact's watermark is
//! consistent with the license. Produces a [`VerificationReport`] listing
//! every problem found; it does not stop at the first one.
//!
//! The `pf-verify-license` binary in `pf-cli` wraps this crate.

pub mod archive;
pub mod report;
pub mod verifier;

pub use archive::{ArchiveContents, ArchiveError, MAX_ENTRY_BYTES};
pub use report::{Finding, Severity, VerificationReport};
pub use verifier::{verify_archive, verify_path, VerifyOptions};
