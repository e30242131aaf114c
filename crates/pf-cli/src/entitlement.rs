//! # Entitlement Subcommand
//!
//! Command-line access to the export entitlement gate, for support staff and
//! scripts: `pf entitlement check` evaluates one `(plan, format, score)`
//! and `pf entitlement formats` lists a plan's export table.

use anyhow::Result;
use clap::{Args, Subcommand};

use pf_entitlement::{
    available_export_formats, check, entitlement_reason, ExportFormat, Plan, MIN_EXPORT_SCORE,
};

/// Arguments for `pf entitlement`.
#[derive(Args, Debug)]
pub struct EntitlementArgs {
    #[command(subcommand)]
    pub command: EntitlementCommand,
}

/// Entitlement subcommands.
#[derive(Subcommand, Debug)]
pub enum EntitlementCommand {
    /// Check whether a plan may export a format. Exits 1 when denied.
    Check {
        /// FREE, CREATOR, PRO or ENTERPRISE.
        #[arg(long)]
        plan: Plan,
        /// md, pdf, json, zip or txt.
        #[arg(long)]
        format: ExportFormat,
        /// Run score, when known.
        #[arg(long)]
        score: Option<u32>,
        /// Print the decision as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the formats a plan may export.
    Formats {
        #[arg(long)]
        plan: Plan,
    },
}

/// Execute `pf entitlement`.
pub fn run_entitlement(args: &EntitlementArgs) -> Result<u8> {
    match &args.command {
        EntitlementCommand::Check {
            plan,
            format,
            score,
            json,
        } => cmd_check(*plan, *format, *score, *json),
        EntitlementCommand::Formats { plan } => {
            println!("{}", format_table(*plan));
            Ok(0)
        }
    }
}

fn cmd_check(plan: Plan, format: ExportFormat, score: Option<u32>, json: bool) -> Result<u8> {
    let decision = check(plan, format, score);
    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else if decision.is_allowed() {
        println!("ALLOWED: {plan} may export {format}");
    } else {
        println!("DENIED: {}", entitlement_reason(plan, format, score));
    }
    Ok(if decision.is_allowed() { 0 } else { 1 })
}

fn format_table(plan: Plan) -> String {
    available_export_formats(plan)
        .iter()
        .map(|f| {
            if f.is_score_gated() {
                format!("{f} (score >= {MIN_EXPORT_SCORE})")
            } else {
                f.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
