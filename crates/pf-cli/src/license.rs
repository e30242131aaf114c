//! # License Subcommand
//!
//! Issues and inspects `license.json`.
//!
//! `pf license sign` builds the payload either from flags or from a JSON
//! object file (extra fields such as `licensee` are kept and signed), then
//! signs its canonical form with the private key. `--mock` writes the
//! `"MOCK"` sentinel instead, for test fixtures only.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use pf_core::{
    ExpiryStatus, License, LicensePayload, LicenseSignature, ModuleId, PackId, Timestamp,
    GRACE_PERIOD_DAYS,
};
use pf_crypto::{sign_license, verify_license_signature, Ed25519KeyPair, Ed25519PublicKey};

/// Arguments for `pf license`.
#[derive(Args, Debug)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

/// License subcommands.
#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// Sign a license payload.
    Sign(SignArgs),
    /// Print a license's contents and check its signature and expiry.
    Inspect(InspectArgs),
}

/// Arguments for `pf license sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Private key (PKCS#8 PEM or 64-char hex seed).
    #[arg(long, required_unless_present = "mock")]
    pub key: Option<PathBuf>,
    /// JSON object to sign. Replaces --pack/--modules/--expires.
    #[arg(long, conflicts_with_all = ["pack", "modules", "expires"])]
    pub payload: Option<PathBuf>,
    /// Pack identifier.
    #[arg(long, required_unless_present = "payload")]
    pub pack: Option<String>,
    /// Licensed module ids, comma-separated or repeated.
    #[arg(long, value_delimiter = ',', required_unless_present = "payload")]
    pub modules: Vec<String>,
    /// Expiry (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = crate::parse_timestamp, required_unless_present = "payload")]
    pub expires: Option<Timestamp>,
    /// Write a "MOCK" signature instead of signing. Insecure.
    #[arg(long)]
    pub mock: bool,
    /// Output file. Prints to stdout when omitted.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Arguments for `pf license inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// license.json to inspect.
    #[arg(value_name = "FILE")]
    pub license: PathBuf,
    /// Public key to check the signature with.
    #[arg(long = "pub", value_name = "PATH")]
    pub public_key: Option<PathBuf>,
    /// Evaluate expiry at this instant instead of now.
    #[arg(long, value_parser = crate::parse_timestamp)]
    pub now: Option<Timestamp>,
}

/// Execute `pf license`.
pub fn run_license(args: &LicenseArgs) -> Result<u8> {
    match &args.command {
        LicenseCommand::Sign(sign) => cmd_sign(sign),
        LicenseCommand::Inspect(inspect) => cmd_inspect(inspect),
    }
}

fn build_payload(args: &SignArgs) -> Result<LicensePayload> {
    if let Some(path) = &args.payload {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
        let Value::Object(map) = value else {
            bail!("payload must be a JSON object: {}", path.display());
        };
        return Ok(LicensePayload::from_map(map));
    }

    let (Some(pack), Some(expires)) = (&args.pack, args.expires) else {
        bail!("--pack and --expires are required without --payload");
    };
    let modules: BTreeSet<ModuleId> = args
        .modules
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(ModuleId::from)
        .collect();
    if modules.is_empty() {
        bail!("at least one module is required");
    }
    Ok(LicensePayload::new(PackId::new(pack), &modules, expires))
}

fn cmd_sign(args: &SignArgs) -> Result<u8> {
    let payload = build_payload(args)?;

    let license = if args.mock {
        tracing::warn!("writing a MOCK license; it verifies only with --insecure-allow-mock");
        payload.into_license(LicenseSignature::Mock)?
    } else {
        let Some(key_path) = &args.key else {
            bail!("--key is required unless --mock is given");
        };
        let key = load_key_pair(key_path)?;
        sign_license(payload, &key)?
    };

    let mut json = license.to_json_pretty()?;
    json.push('\n');
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write license: {}", path.display()))?;
            println!(
                "OK: signed license for pack {} ({} module(s)) -> {}",
                license.pack,
                license.modules.len(),
                path.display()
            );
        }
        None => print!("{json}"),
    }
    Ok(0)
}

fn cmd_inspect(args: &InspectArgs) -> Result<u8> {
    let bytes = std::fs::read(&args.license)
        .with_context(|| format!("failed to read license: {}", args.license.display()))?;
    let license = License::from_slice(&bytes)
        .with_context(|| format!("invalid license: {}", args.license.display()))?;

    let modules: Vec<&str> = license.modules.iter().map(|m| m.as_str()).collect();
    println!("pack:       {}", license.pack);
    println!("modules:    {}", modules.join(", "));
    println!("expires_at: {}", license.expires_at);

    let now = args.now.unwrap_or_else(Timestamp::now);
    let mut ok = true;
    match license.expiry_status(now, GRACE_PERIOD_DAYS)? {
        ExpiryStatus::Valid => println!("expiry:     valid"),
        ExpiryStatus::InGrace { grace_ends } => {
            println!("expiry:     expired, in grace period until {grace_ends}")
        }
        ExpiryStatus::Expired { grace_ended } => {
            println!("expiry:     expired (grace ended {grace_ended})");
            ok = false;
        }
    }

    match (&license.signature, &args.public_key) {
        (LicenseSignature::Mock, _) => {
            println!("signature:  MOCK (not verifiable)");
            ok = false;
        }
        (LicenseSignature::Encoded(_), None) => println!("signature:  present (not checked; pass --pub)"),
        (LicenseSignature::Encoded(_), Some(path)) => {
            let key = load_public_key(path)?;
            match verify_license_signature(&license, &key) {
                Ok(()) => println!("signature:  valid"),
                Err(e) => {
                    println!("signature:  INVALID ({e})");
                    ok = false;
                }
            }
        }
    }

    Ok(if ok { 0 } else { 1 })
}

/// Load a signing key file (PKCS#8 PEM or hex seed).
pub fn load_key_pair(path: &Path) -> Result<Ed25519KeyPair> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read private key: {}", path.display()))?;
    Ed25519KeyPair::from_key_file_contents(&contents)
        .with_context(|| format!("invalid private key: {}", path.display()))
}

/// Load a public key file (SPKI PEM or hex).
pub fn load_public_key(path: &Path) -> Result<Ed25519PublicKey> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read public key: {}", path.display()))?;
    Ed25519PublicKey::from_key_file_contents(&contents)
        .with_context(|| format!("invalid public key: {}", path.display()))
}
