//! # pf CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pf_cli::bundle::{run_bundle, BundleArgs};
use pf_cli::checksum::{run_checksum, ChecksumArgs};
use pf_cli::entitlement::{run_entitlement, EntitlementArgs};
use pf_cli::keygen::{run_keygen, KeygenArgs};
use pf_cli::license::{run_license, LicenseArgs};
use pf_cli::verify::{run_verify_license, VerifyLicenseArgs};

/// PromptForge export tooling.
///
/// Builds watermarked export bundles, signs the licenses that ship with
/// them, and verifies archives offline.
#[derive(Parser, Debug)]
#[command(name = "pf", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 license signing key pair.
    Keygen(KeygenArgs),

    /// Sign or inspect license.json.
    License(LicenseArgs),

    /// Build export bundles.
    Bundle(BundleArgs),

    /// Hash a bundle directory, optionally verifying it.
    Checksum(ChecksumArgs),

    /// Query the export entitlement gate.
    Entitlement(EntitlementArgs),

    /// Verify an export archive offline (same as pf-verify-license).
    Verify(VerifyLicenseArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Keygen(args) => run_keygen(&args),
        Commands::License(args) => run_license(&args),
        Commands::Bundle(args) => run_bundle(&args),
        Commands::Checksum(args) => run_checksum(&args),
        Commands::Entitlement(args) => run_entitlement(&args),
        Commands::Verify(args) => run_verify_license(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
