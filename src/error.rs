//! Error types for the `kodegen_bundler_deb` binary.
//!
//! This module wraps the core [`bundler::Error`](crate::bundler::Error) with
//! configuration and CLI failures and offers actionable recovery suggestions.

use crate::bundler::Error as CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// Packaging manifest errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Package assembly errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] CoreError),
}

/// Packaging manifest (`deb.toml`) errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Manifest file does not exist
    #[error("Packaging manifest not found: {path}")]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Config(ConfigError::NotFound { path }) => vec![
                format!("Create a packaging manifest at {}", path.display()),
                "Point to an existing manifest with --config <path>".to_string(),
            ],
            BundlerError::Cli(CliError::InvalidArguments { .. }) => vec![
                "Run with --help to see the accepted arguments".to_string(),
            ],
            BundlerError::Toml(_) => vec![
                "Check the [package] and [paths] sections of the packaging manifest".to_string(),
                "Relative paths are resolved against the manifest's directory".to_string(),
            ],
            BundlerError::Bundler(CoreError::Render { template, .. }) => vec![
                format!("Check the {} template for fields that are not provided", template),
                "Remove the custom template setting to fall back to the built-in one".to_string(),
            ],
            BundlerError::Bundler(CoreError::ManifestConstruction(_)) => vec![
                "Make sure [paths].executable lies inside [paths].app_directory".to_string(),
                "Names must be a single path component; versions must not contain spaces"
                    .to_string(),
            ],
            BundlerError::Bundler(CoreError::WriterValidation(_)) => vec![
                "Check that every source path in the manifest exists".to_string(),
                "Run `kodegen_bundler_deb preview` to inspect the entries".to_string(),
            ],
            BundlerError::Bundler(CoreError::WriterIo { path, .. }) => vec![
                format!("Check permissions and free space for {}", path.display()),
                "Delete any partial artifact before retrying".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_for_missing_manifest() {
        let err = BundlerError::from(ConfigError::NotFound {
            path: PathBuf::from("deb.toml"),
        });
        let suggestions = err.recovery_suggestions();
        assert!(suggestions[0].contains("deb.toml"));
    }

    #[test]
    fn test_core_errors_convert() {
        let err: BundlerError = CoreError::ManifestConstruction("bad".into()).into();
        assert!(matches!(err, BundlerError::Bundler(CoreError::ManifestConstruction(_))));
        assert_eq!(err.recovery_suggestions().len(), 2);
    }

    #[test]
    fn test_invalid_arguments_convert() {
        let err: BundlerError = CliError::InvalidArguments {
            reason: "--name must not be empty".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "CLI error: Invalid arguments: --name must not be empty"
        );
        assert!(err.recovery_suggestions()[0].contains("--help"));
    }
}
