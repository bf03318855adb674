//! Command execution.
//!
//! Each subcommand lives in its own module and returns the process exit code.

mod build;
mod preview;

use crate::bundler::PackageContext;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::metadata::{self, Overrides};
use std::path::Path;

use build::execute_build;
use preview::execute_preview;

/// Execute the command selected by `args`
///
/// Invalid argument combinations are returned as [`CliError`](crate::CliError).
pub fn execute_command(args: Args) -> Result<i32> {
    args.validate()?;

    let config = RuntimeConfig::from(&args);

    match &args.command {
        Command::Build { .. } => execute_build(&args, &config),
        Command::Preview { .. } => execute_preview(&args, &config),
    }
}

/// Loads the packaging manifest and applies command line overrides.
fn load_context(
    config: &RuntimeConfig,
    manifest: &Path,
    overrides: Overrides,
) -> Result<PackageContext> {
    config
        .output()
        .verbose(&format!("Reading packaging manifest {}", manifest.display()))?;
    let context = metadata::load_context(manifest, overrides)?;
    config.output().verbose(&format!(
        "Package {} {} ({})",
        context.name(),
        context.version(),
        if context.bundles_runtime() {
            "runtime bundled"
        } else {
            "no bundled runtime"
        }
    ))?;
    Ok(context)
}
