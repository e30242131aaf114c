//! # Keygen Subcommand
//!
//! Generates the Ed25519 key pair used to sign licenses. The private key is
//! written as PKCS#8 PEM, the public key as SPKI PEM, which is what
//! `pf-verify-license --pub` expects.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use pf_crypto::Ed25519KeyPair;

/// Arguments for `pf keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub out: PathBuf,
    /// Key file name prefix.
    #[arg(long, default_value = "pf")]
    pub prefix: String,
}

/// Execute `pf keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    cmd_keygen(&args.out, &args.prefix)
}

fn cmd_keygen(output_dir: &Path, prefix: &str) -> Result<u8> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let kp = Ed25519KeyPair::generate();
    let public = kp.public_key();

    let sk_path = output_dir.join(format!("{prefix}.key"));
    let pk_path = output_dir.join(format!("{prefix}.pub"));

    std::fs::write(&sk_path, kp.to_pkcs8_pem()?)
        .with_context(|| format!("failed to write private key: {}", sk_path.display()))?;
    std::fs::write(&pk_path, public.to_pem()?)
        .with_context(|| format!("failed to write public key: {}", pk_path.display()))?;

    tracing::info!(public_key = %public.to_hex(), "generated license signing key");
    println!("OK: generated Ed25519 keypair");
    println!("  Private key: {}", sk_path.display());
    println!("  Public key:  {}", pk_path.display());
    println!("  Public key (hex): {}", public.to_hex());

    Ok(0)
}
