//! # pf-verify-license
//!
//! Offline verifier for PromptForge export archives.
//!
//! ```bash
//! pf-verify-license --zip export.zip --pub promptforge.pub
//! pf-verify-license --zip export.zip --pub promptforge.pub --now 2026-01-01 --format json
//! ```
//!
//! Exit `0` on success, `2` on any verification failure or usage error.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pf_cli::verify::{run_verify_license, VerifyLicenseArgs, EXIT_VERIFICATION_FAILED};

/// Verify a PromptForge export archive against a license public key.
#[derive(Parser, Debug)]
#[command(name = "pf-verify-license", version, about, long_about = None)]
struct Cli {
    /// Log verifier steps to stderr. Repeat for more (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    args: VerifyLicenseArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Findings are already printed as report lines; logs stay quiet unless asked.
    let filter = match cli.verbose {
        0 => EnvFilter::new("error"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run_verify_license(&cli.args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("[FAIL] {e:#}");
            ExitCode::from(EXIT_VERIFICATION_FAILED)
        }
    }
}
