//! # pf-cli: PromptForge Export Tooling
//!
//! Provides the `pf` command-line interface and the standalone
//! `pf-verify-license` binary.
//!
//! ## Subcommands
//!
//! - `pf keygen`: Ed25519 key pair generation (PEM files).
//! - `pf license`: sign or inspect `license.json`.
//! - `pf bundle build`: build an export bundle from a request file.
//! - `pf checksum`: hash a bundle directory or verify it against its manifest.
//! - `pf entitlement`: query the export entitlement gate.
//! - `pf verify`: same as `pf-verify-license`.
//!
//! Handlers return an exit code (`Result<u8>`); `main` maps it to
//! `std::process::ExitCode` and logs errors. Exit codes: `0` success, `1`
//! a check failed (entitlement denied, checksum mismatch), `2` license
//! verification failed.
//!
//! ```bash
//! pf keygen --out keys
//! pf license sign --key keys/pf.key --pack pf-pro --modules M07,M12 --expires 2027-01-01 --out license.json
//! pf bundle build --request run.yaml --out dist --license license.json
//! pf-verify-license --zip dist/run-42.zip --pub keys/pf.pub
//! ```

pub mod bundle;
pub mod checksum;
pub mod entitlement;
pub mod keygen;
pub mod license;
pub mod verify;

use pf_core::Timestamp;

/// clap value parser for RFC 3339 or `YYYY-MM-DD` instants.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, String> {
    Timestamp::parse(raw).map_err(|e| e.to_string())
}
