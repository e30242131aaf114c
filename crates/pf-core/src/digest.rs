//! # Content Digest: Self-Describing File Hashes
//!
//! Defines `ContentDigest` and `DigestAlgorithm`. Bundle artifacts are hashed
//! over their raw bytes (a PDF or a pretty-printed JSON file is fingerprinted
//! exactly as shipped), so unlike signing, hashing accepts `&[u8]`.
//!
//! The textual form is `sha256:<64 lowercase hex chars>`, the same form used
//! in `checksum.txt`, manifest artifact entries, and the bundle checksum.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PfError;

/// The hash algorithm used to produce a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a new content digest from raw bytes and algorithm.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character lowercase hex string into a SHA-256 digest.
    ///
    /// Only the form [`to_hex`](Self::to_hex) produces is accepted, so a
    /// parsed digest always renders back to the same string.
    pub fn from_hex(hex: &str) -> Result<Self, PfError> {
        if hex.len() != 64 {
            return Err(PfError::Validation(format!(
                "digest must be 64 hex chars, got {}",
                hex.len()
            )));
        }
        if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(PfError::Validation(format!(
                "digest must be lowercase hex: {hex:?}"
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, pair) in hex.as_bytes().chunks_exact(2).enumerate() {
            bytes[i] = (hex_value(pair[0]) << 4) | hex_value(pair[1]);
        }
        Ok(Self::new(DigestAlgorithm::Sha256, bytes))
    }

    /// Parse the prefixed `sha256:<hex>` form.
    pub fn parse_prefixed(s: &str) -> Result<Self, PfError> {
        let hex = s.strip_prefix("sha256:").ok_or_else(|| {
            PfError::Validation(format!("digest must start with \"sha256:\", got {s:?}"))
        })?;
        Self::from_hex(hex)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        _ => b - b'a' + 10,
    }
}

/// Compute a SHA-256 digest over raw bytes.
pub fn sha256_bytes(data: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}
