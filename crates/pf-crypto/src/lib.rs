//! # pf-crypto: Cryptographic Primitives
//!
//! Provides the cryptographic building blocks of the export integrity stack:
//!
//! - **Ed25519** key handling, signing and verification. Licenses are signed
//!   directly over their canonical payload bytes; there is no separate digest
//!   step.
//! - **Checksum engine**: per-file SHA-256 (`filename:sha256:<hex>`), the
//!   canonical-order bundle checksum, and `checksum.txt` rendering.
//! - **License signing**: issuing and verifying `license.json` signatures.
//!
//! ## Crate Policy
//!
//! - Depends only on `pf-core` internally.
//! - No mocking of cryptographic operations in tests: all tests use real
//!   SHA-256 and real Ed25519.
//! - Signing accepts only `&CanonicalBytes`.

pub mod checksum;
pub mod ed25519;
pub mod license;

pub use checksum::{
    canonical_checksum, checksum_of_digests, file_hash, generate_checksum_file, verify_file_hashes, ChecksumError,
    FileHash, HashVerification,
};
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use license::{sign_license, verify_license_signature};
