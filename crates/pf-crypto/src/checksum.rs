//! # Checksum Engine
//!
//! Per-file SHA-256 hashes and the canonical bundle checksum.
//!
//! ## Formats
//!
//! - File hash: `prompt.md:sha256:<hex>`. The filename prefix disambiguates
//!   entries in manifests.
//! - Bundle checksum: `sha256:<hex>` over the per-file hex digests joined with
//!   `\n`, in canonical filename order.
//! - `checksum.txt`: one `sha256:<hex>` line per present canonical file, in
//!   canonical order, each newline-terminated.
//!
//! ## Determinism
//!
//! Ordering is enforced here by filename, never by the caller's input order.
//! Files outside the canonical set do not contribute to the checksum.

use std::collections::BTreeMap;

use pf_core::{sha256_bytes, ArtifactName, ContentDigest, CANONICAL_ORDER};
use thiserror::Error;

const HASH_SEPARATOR: &str = ":sha256:";

/// Errors from parsing or combining file hashes.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChecksumError {
    /// The entry is not `filename:sha256:<hex>`.
    #[error("malformed file hash {0:?}: expected \"<filename>:sha256:<hex>\"")]
    Malformed(String),

    /// The same file appears twice with different digests.
    #[error("conflicting hashes for {file}: {first} vs {second}")]
    Conflicting {
        /// File name.
        file: String,
        /// First digest seen.
        first: String,
        /// Second digest seen.
        second: String,
    },
}

/// A parsed `filename:sha256:<hex>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHash {
    /// Archive file name.
    pub file_name: String,
    /// SHA-256 of the raw file bytes.
    pub digest: ContentDigest,
}

impl FileHash {
    /// Hash raw file content.
    pub fn compute(file_name: impl Into<String>, content: &[u8]) -> Self {
        Self {
            file_name: file_name.into(),
            digest: sha256_bytes(content),
        }
    }

    /// Parse `filename:sha256:<hex>`. The filename may itself contain colons.
    pub fn parse(entry: &str) -> Result<Self, ChecksumError> {
        let (name, hex) = entry
            .rsplit_once(HASH_SEPARATOR)
            .ok_or_else(|| ChecksumError::Malformed(entry.to_string()))?;
        if name.is_empty() {
            return Err(ChecksumError::Malformed(entry.to_string()));
        }
        let digest =
            ContentDigest::from_hex(hex).map_err(|_| ChecksumError::Malformed(entry.to_string()))?;
        Ok(Self {
            file_name: name.to_string(),
            digest,
        })
    }

    /// The canonical artifact this hash belongs to, if any.
    pub fn artifact(&self) -> Option<ArtifactName> {
        ArtifactName::from_file_name(&self.file_name)
    }
}

impl std::fmt::Display for FileHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{HASH_SEPARATOR}{}", self.file_name, self.digest.to_hex())
    }
}

/// `filename:sha256:<hex>` for raw file content.
pub fn file_hash(file_name: &str, content: &[u8]) -> String {
    FileHash::compute(file_name, content).to_string()
}

/// Canonical bundle checksum from `file_hash` outputs given in any order.
///
/// # Errors
///
/// Malformed entries and conflicting duplicates are rejected. Well-formed
/// entries for files outside the canonical set are ignored.
pub fn canonical_checksum<S: AsRef<str>>(hashes: &[S]) -> Result<String, ChecksumError> {
    let mut by_artifact: BTreeMap<ArtifactName, ContentDigest> = BTreeMap::new();
    for entry in hashes {
        let parsed = FileHash::parse(entry.as_ref())?;
        let Some(artifact) = parsed.artifact() else {
            tracing::debug!(file = %parsed.file_name, "excluding non-canonical file from checksum");
            continue;
        };
        if let Some(existing) = by_artifact.get(&artifact) {
            if *existing != parsed.digest {
                return Err(ChecksumError::Conflicting {
                    file: parsed.file_name,
                    first: existing.to_hex(),
                    second: parsed.digest.to_hex(),
                });
            }
            continue;
        }
        by_artifact.insert(artifact, parsed.digest);
    }
    Ok(checksum_of_digests(&by_artifact).to_string())
}

/// Canonical checksum over digests already keyed by artifact.
///
/// `BTreeMap<ArtifactName, _>` iterates in canonical order.
pub fn checksum_of_digests(digests: &BTreeMap<ArtifactName, ContentDigest>) -> ContentDigest {
    let joined = digests
        .values()
        .map(ContentDigest::to_hex)
        .collect::<Vec<_>>()
        .join("\n");
    sha256_bytes(joined.as_bytes())
}

/// Render `checksum.txt` from per-file digests keyed by file name.
pub fn generate_checksum_file(file_hashes: &BTreeMap<String, ContentDigest>) -> String {
    let mut out = String::new();
    for artifact in CANONICAL_ORDER {
        if let Some(digest) = file_hashes.get(artifact.file_name()) {
            out.push_str(&digest.to_string());
            out.push('\n');
        }
    }
    out
}

/// Result of re-hashing files against expected digests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashVerification {
    /// Files whose content does not match the expected digest.
    pub corrupted: Vec<String>,
    /// Files present but with no expected digest on record.
    pub unrecorded: Vec<String>,
    /// Expected digests with no corresponding file.
    pub missing: Vec<String>,
}

impl HashVerification {
    /// True when every file matched and nothing is missing or unrecorded.
    pub fn is_valid(&self) -> bool {
        self.corrupted.is_empty() && self.unrecorded.is_empty() && self.missing.is_empty()
    }
}

/// Recompute each file's hash and compare against `expected`.
pub fn verify_file_hashes(
    files: &BTreeMap<String, Vec<u8>>,
    expected: &BTreeMap<String, ContentDigest>,
) -> HashVerification {
    let mut result = HashVerification::default();
    for (name, content) in files {
        match expected.get(name) {
            None => result.unrecorded.push(name.clone()),
            Some(digest) if *digest != sha256_bytes(content) => result.corrupted.push(name.clone()),
            Some(_) => {}
        }
    }
    result.missing = expected
        .keys()
        .filter(|name| !files.contains_key(*name))
        .cloned()
        .collect();
    result
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn contents() -> impl Strategy<Value = Vec<Vec<u8>>> {
        prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 6)
    }

    fn entries(contents: &[Vec<u8>]) -> Vec<String> {
        CANONICAL_ORDER
            .iter()
            .zip(contents)
            .map(|(a, c)| file_hash(a.file_name(), c))
            .collect()
    }

    proptest! {
        #[test]
        fn permutation_invariant(files in contents(), seed in any::<u64>()) {
            let base = entries(&files);
            let mut shuffled = base.clone();
            // Deterministic Fisher-Yates driven by the seed.
            let mut state = seed;
            for i in (1..shuffled.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
            prop_assert_eq!(canonical_checksum(&shuffled).unwrap(), canonical_checksum(&base).unwrap());
        }

        #[test]
        fn single_byte_sensitivity(files in contents(), file_idx in 0usize..6, byte_idx in any::<prop::sample::Index>(), delta in 1u8..=255) {
            let base = entries(&files);
            let mut mutated = files.clone();
            let target = &mut mutated[file_idx];
            let i = byte_idx.index(target.len());
            target[i] = target[i].wrapping_add(delta);
            prop_assert_ne!(canonical_checksum(&entries(&mutated)).unwrap(), canonical_checksum(&base).unwrap());
        }

        #[test]
        fn extra_file_exclusion(files in contents(), extra in prop::collection::vec(any::<u8>(), 0..64), name in "[a-z]{1,8}\\.(txt|json|md|bin)") {
            prop_assume!(ArtifactName::from_file_name(&name).is_none());
            let base = entries(&files);
            let mut with_extra = base.clone();
            with_extra.push(file_hash(&name, &extra));
            prop_assert_eq!(canonical_checksum(&with_extra).unwrap(), canonical_checksum(&base).unwrap());
        }
    }
}
