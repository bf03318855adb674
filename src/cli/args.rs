//! Command line argument parsing.

use crate::error::CliError;
use crate::metadata::DEFAULT_MANIFEST;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Debian package builder for self-contained application folders
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_deb",
    version,
    about = "Build .deb packages from pre-built application folders",
    long_about = "Build .deb packages from pre-built application folders.

The application is installed under /opt/<name>, a desktop entry is placed in
/usr/share/applications and /usr/local/bin/<name> links to the executable.

Usage:
  kodegen_bundler_deb build --config deb.toml
  kodegen_bundler_deb preview --config deb.toml --json"
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the .deb package
    Build {
        /// Packaging manifest
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
        config: PathBuf,

        /// Output directory (overrides [paths].output_directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Package name (overrides [package].name)
        #[arg(long)]
        name: Option<String>,

        /// Package version (overrides [package].version)
        #[arg(long = "version", value_name = "VERSION")]
        package_version: Option<String>,
    },

    /// Print the entries the package would contain without writing anything
    Preview {
        /// Packaging manifest
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
        config: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        if let Command::Build {
            name, package_version, ..
        } = &self.command
        {
            let invalid = |reason: &str| CliError::InvalidArguments {
                reason: reason.to_string(),
            };
            if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                return Err(invalid("--name must not be empty"));
            }
            if package_version.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(invalid("--version must not be empty"));
            }
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let args = Args::try_parse_from([
            "kodegen_bundler_deb",
            "build",
            "--config",
            "pkg/deb.toml",
            "--version",
            "2.0.0",
            "-o",
            "/tmp/out",
        ])
        .unwrap();

        match args.command {
            Command::Build {
                config,
                output,
                name,
                package_version,
            } => {
                assert_eq!(config, PathBuf::from("pkg/deb.toml"));
                assert_eq!(output, Some(PathBuf::from("/tmp/out")));
                assert_eq!(name, None);
                assert_eq!(package_version.as_deref(), Some("2.0.0"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_preview_defaults() {
        let args = Args::try_parse_from(["kodegen_bundler_deb", "preview"]).unwrap();
        match args.command {
            Command::Preview { config, json } => {
                assert_eq!(config, PathBuf::from("deb.toml"));
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_validate_empty_name() {
        let args =
            Args::try_parse_from(["kodegen_bundler_deb", "build", "--name", " "]).unwrap();
        let err = args.validate().unwrap_err();
        assert!(matches!(
            err,
            CliError::InvalidArguments { ref reason } if reason.contains("--name")
        ));
    }
}
