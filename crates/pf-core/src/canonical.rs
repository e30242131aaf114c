//! # Canonical Serialization: Order-Independent JSON Bytes
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that are signed or verified anywhere in the stack.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is `CanonicalBytes::new()`, which renders the value with
//! sorted object keys and compact separators. A license payload built by the
//! issuance tool and the same payload parsed back out of `license.json` by the
//! verifier therefore produce the same bytes, whatever order their keys were
//! inserted in.
//!
//! ## Rules
//!
//! 1. **Objects**: keys sorted, rendered as `"key":value`, comma-joined,
//!    wrapped in `{}`.
//! 2. **Arrays**: elements in original order, comma-joined, wrapped in `[]`.
//! 3. **Scalars**: standard JSON encoding; numbers use the ECMAScript
//!    formatting rules of RFC 8785 so the output matches a JavaScript signer.
//!
//! Serialization is delegated to `serde_jcs` (RFC 8785, JSON Canonicalization
//! Scheme).

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonical JSON serialization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted at every nesting level.
/// - Array order is preserved.
/// - No insignificant whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value cannot
    /// be represented as JSON (a failing `Serialize` impl, non-string map keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let bytes = serialize_canonical(&value)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical bytes as a string. Canonical output is always UTF-8.
    pub fn as_str(&self) -> &str {
        // serde_jcs only ever produces UTF-8; the fallback is unreachable in practice.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}
