//! License signing and signature verification.
//!
//! The signature covers the canonical bytes of the license payload (the
//! license object without its `signature` field) and is stored base64-encoded.

use pf_core::{CryptoError, License, LicensePayload, LicenseSignature, PfError};

use crate::ed25519::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Sign a payload and return the complete license.
pub fn sign_license(payload: LicensePayload, key: &Ed25519KeyPair) -> Result<License, PfError> {
    let canonical = payload.canonical_bytes()?;
    let signature = key.sign(&canonical);
    tracing::debug!(bytes = canonical.len(), "signed license payload");
    payload.into_license(LicenseSignature::Encoded(signature.to_base64()))
}

/// Verify a license signature against a public key.
///
/// The mock sentinel never verifies here. Callers that accept it in insecure
/// mode must check [`LicenseSignature::is_mock`] first.
pub fn verify_license_signature(
    license: &License,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let encoded = match &license.signature {
        LicenseSignature::Mock => {
            return Err(CryptoError::VerificationFailed(
                "mock signature is not a cryptographic signature".to_string(),
            ))
        }
        LicenseSignature::Encoded(s) => s,
    };
    let signature = Ed25519Signature::from_base64(encoded)?;
    let canonical = license
        .payload()
        .canonical_bytes()
        .map_err(|e| CryptoError::VerificationFailed(format!("payload canonicalization: {e}")))?;
    verify_with_public_key(&canonical, &signature, public_key)
}
