//! # License Data Model
//!
//! A license grants use of one pack of modules until `expires_at` (plus a
//! grace window). It is issued once, shipped inside the archive as
//! `license.json`, and read by the verifier without modification.
//!
//! ## Signed Payload
//!
//! The signed payload is the license object with the `signature` field
//! removed, including any fields beyond `pack`, `modules` and `expires_at`.
//! [`LicensePayload`] keeps the raw JSON object so that unknown fields are
//! covered by the signature rather than silently dropped.
//!
//! ```json
//! {
//!   "pack": "pf-pro",
//!   "modules": ["M01", "M07"],
//!   "expires_at": "2031-01-01T00:00:00Z",
//!   "signature": "base64…"
//! }
//! ```

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::canonical::CanonicalBytes;
use crate::error::{CanonicalizationError, PfError};
use crate::identity::{ModuleId, PackId};
use crate::temporal::Timestamp;

/// Sentinel signature value that skips cryptographic verification in
/// insecure mode.
pub const MOCK_SIGNATURE: &str = "MOCK";

/// Days past `expires_at` during which a license still verifies.
pub const GRACE_PERIOD_DAYS: i64 = 7;

const SIGNATURE_KEY: &str = "signature";

/// The `signature` field of a license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseSignature {
    /// The `"MOCK"` sentinel.
    Mock,
    /// A base64-encoded Ed25519 signature over the canonical payload.
    Encoded(String),
}

impl LicenseSignature {
    /// Classify a raw signature string.
    pub fn parse(raw: &str) -> Self {
        if raw == MOCK_SIGNATURE {
            Self::Mock
        } else {
            Self::Encoded(raw.to_string())
        }
    }

    /// The string stored in `license.json`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mock => MOCK_SIGNATURE,
            Self::Encoded(s) => s,
        }
    }

    /// Whether this is the mock sentinel.
    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock)
    }
}

/// Where a license stands relative to its expiry at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Not yet expired.
    Valid,
    /// Past `expires_at` but inside the grace window.
    InGrace {
        /// When the grace window closes.
        grace_ends: Timestamp,
    },
    /// Past the grace window.
    Expired {
        /// When the grace window closed.
        grace_ended: Timestamp,
    },
}

/// The license object minus its signature: the bytes that get signed.
#[derive(Debug, Clone, PartialEq)]
pub struct LicensePayload(Map<String, Value>);

impl LicensePayload {
    /// Build a payload from the three required fields.
    pub fn new(pack: PackId, modules: &BTreeSet<ModuleId>, expires_at: Timestamp) -> Self {
        let mut map = Map::new();
        map.insert("pack".to_string(), Value::String(pack.0));
        map.insert(
            "modules".to_string(),
            Value::Array(modules.iter().map(|m| Value::String(m.0.clone())).collect()),
        );
        map.insert("expires_at".to_string(), Value::String(expires_at.to_iso8601()));
        Self(map)
    }

    /// Wrap an arbitrary JSON object, dropping any `signature` key.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        map.remove(SIGNATURE_KEY);
        Self(map)
    }

    /// Add an extra field to the payload (e.g. `licensee`, `issued_at`).
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), PfError> {
        let key = key.into();
        if key == SIGNATURE_KEY {
            return Err(PfError::Validation(
                "the signature field cannot be part of the signed payload".to_string(),
            ));
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Canonical bytes fed to the signature algorithm.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(&self.0)
    }

    /// Access the raw payload object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Attach a signature, validating the required fields.
    pub fn into_license(self, signature: LicenseSignature) -> Result<License, PfError> {
        License::from_parts(self, signature)
    }
}

#[derive(Deserialize)]
struct RequiredFields {
    pack: PackId,
    modules: Vec<ModuleId>,
    expires_at: Timestamp,
}

/// A parsed license.
#[derive(Debug, Clone, PartialEq)]
pub struct License {
    /// Pack identifier.
    pub pack: PackId,
    /// Modules covered by the license.
    pub modules: BTreeSet<ModuleId>,
    /// Expiry instant (grace period not included).
    pub expires_at: Timestamp,
    /// Signature or mock sentinel.
    pub signature: LicenseSignature,
    payload: LicensePayload,
}

impl License {
    /// Parse a license from its JSON object.
    ///
    /// # Errors
    ///
    /// `PfError::Validation` if the value is not an object, has no string
    /// `signature`, or lacks a well-formed `pack`, `modules` or `expires_at`.
    pub fn from_value(value: Value) -> Result<Self, PfError> {
        let Value::Object(mut map) = value else {
            return Err(PfError::Validation("license must be a JSON object".to_string()));
        };
        let signature = match map.remove(SIGNATURE_KEY) {
            Some(Value::String(s)) => LicenseSignature::parse(&s),
            Some(_) => {
                return Err(PfError::Validation("license signature must be a string".to_string()))
            }
            None => return Err(PfError::Validation("license has no signature field".to_string())),
        };
        Self::from_parts(LicensePayload(map), signature)
    }

    /// Parse a license from `license.json` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PfError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    fn from_parts(payload: LicensePayload, signature: LicenseSignature) -> Result<Self, PfError> {
        let fields: RequiredFields = serde_json::from_value(Value::Object(payload.0.clone()))
            .map_err(|e| PfError::Validation(format!("invalid license: {e}")))?;
        Ok(Self {
            pack: fields.pack,
            modules: fields.modules.into_iter().collect(),
            expires_at: fields.expires_at,
            signature,
            payload,
        })
    }

    /// The signed payload.
    pub fn payload(&self) -> &LicensePayload {
        &self.payload
    }

    /// Whether the license covers a module.
    pub fn covers(&self, module: &ModuleId) -> bool {
        self.modules.contains(module)
    }

    /// Expiry status at `now` with the given grace window.
    ///
    /// Fails on a negative grace window or one that overflows the
    /// timestamp range.
    pub fn expiry_status(&self, now: Timestamp, grace_days: i64) -> Result<ExpiryStatus, PfError> {
        if grace_days < 0 {
            return Err(PfError::Validation(format!(
                "grace period must not be negative, got {grace_days} day(s)"
            )));
        }
        let grace_end = self.expires_at.plus_days(grace_days).ok_or_else(|| {
            PfError::Validation(format!(
                "grace period of {grace_days} day(s) past {} is out of range",
                self.expires_at
            ))
        })?;
        Ok(if now > grace_end {
            ExpiryStatus::Expired { grace_ended: grace_end }
        } else if now > self.expires_at {
            ExpiryStatus::InGrace { grace_ends: grace_end }
        } else {
            ExpiryStatus::Valid
        })
    }

    /// The full license object as stored in `license.json`.
    pub fn to_value(&self) -> Value {
        let mut map = self.payload.0.clone();
        map.insert(
            SIGNATURE_KEY.to_string(),
            Value::String(self.signature.as_str().to_string()),
        );
        Value::Object(map)
    }

    /// Pretty-printed `license.json` content.
    pub fn to_json_pretty(&self) -> Result<String, PfError> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}
