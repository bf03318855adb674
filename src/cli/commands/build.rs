//! Build command implementation.
//!
//! Assembles the `.deb` package described by the packaging manifest.

use super::load_context;
use crate::bundler::Bundler;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::metadata::Overrides;

/// Execute build command
pub(super) fn execute_build(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Build {
        config: manifest,
        output,
        name,
        package_version,
    } = &args.command
    else {
        unreachable!("execute_build called with non-Build command");
    };

    let overrides = Overrides {
        name: name.clone(),
        version: package_version.clone(),
        output_directory: output.clone(),
    };
    let context = load_context(config, manifest, overrides)?;

    let out = config.output();
    out.progress(&format!("Building {} {}", context.name(), context.version()))?;

    let artifact = Bundler::new(context).bundle()?;

    out.success(&format!("Created {}", artifact.path.display()))?;
    out.indent(&format!("Size: {} bytes", artifact.size))?;
    out.indent(&format!("SHA-256: {}", artifact.checksum))?;

    Ok(0)
}
