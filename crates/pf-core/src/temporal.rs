//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC timestamp truncated to seconds. License expiry
//! and the verifier's reference clock both use it, so grace-period arithmetic
//! never mixes offsets.
//!
//! Accepted inputs for [`Timestamp::parse`]:
//!
//! - RFC 3339 with any offset (`2030-01-01T00:00:00Z`, `2030-01-01T05:30:00+05:30`),
//!   converted to UTC;
//! - a bare calendar date (`2030-01-01`), meaning midnight UTC.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PfError;

/// A UTC timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date.
    pub fn parse(s: &str) -> Result<Self, PfError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Self(naive.and_utc()));
            }
        }
        Err(PfError::Validation(format!(
            "invalid timestamp {s:?}: expected RFC 3339 or YYYY-MM-DD"
        )))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// This timestamp shifted forward by whole days, or `None` when the
    /// result falls outside the representable range.
    pub fn plus_days(&self, days: i64) -> Option<Self> {
        let delta = Duration::try_days(days)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// This timestamp shifted backward by whole days, or `None` on overflow.
    pub fn minus_days(&self, days: i64) -> Option<Self> {
        let delta = Duration::try_days(days)?;
        self.0.checked_sub_signed(delta).map(Self)
    }

    /// Format as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl std::str::FromStr for Timestamp {
    type Err = PfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
