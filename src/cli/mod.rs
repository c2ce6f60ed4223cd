//! Command line interface for webext_bundler.
//!
//! Parses arguments, runs one build and prints a summary of the result.

mod args;

pub use args::{Args, Command};

use crate::{
    bundler::{BuildReport, Bundler},
    error::{CliError, Result},
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(&args).await?;
    Ok(0)
}

/// Runs the build described by `args`.
pub async fn run_with(args: &Args) -> Result<BuildReport> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let settings = args.to_settings()?;
    let report = Bundler::new(settings)?.build().await?;
    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &BuildReport) {
    println!("Created: {}", report.output.display());
    println!("  version: {}", report.version);
    println!("  size: {} bytes", report.size);
    println!("  sha256: {}", report.checksum);
    if let Some(id) = &report.extension_id {
        println!("  extension id: {id}");
    }

    let warnings = report.diagnostics.warnings().len();
    let failures = report.diagnostics.import_failures().len();
    if warnings + failures > 0 {
        println!("  {warnings} warning(s), {failures} skipped locale import(s)");
    }
}
