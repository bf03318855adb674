//! Error types for package assembly.
//!
//! Provides the assembly error taxonomy (render, manifest construction, writer
//! validation, writer I/O) together with contextual error chaining and
//! filesystem-specific errors.
//!
//! # Features
//!
//! - **Context trait**: Add context to errors similar to anyhow
//! - **ErrorExt trait**: Filesystem operations with automatic path context
//! - **bail! macro**: Early return with formatted error messages
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_deb::bundler::{Context, ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_control(path: &Path) -> Result<String> {
//!     let contents = std::fs::read_to_string(path)
//!         .fs_context("reading control file", path)?;
//!
//!     if contents.trim().is_empty() {
//!         kodegen_bundler_deb::bail!("control file {} is empty", path.display());
//!     }
//!
//!     Some(contents).context("control file vanished")
//! }
//! ```

use std::{fmt::Display, io, path::PathBuf};
use thiserror::Error as DeriveError;

/// Errors returned by the bundler.
///
/// The first four variants form the assembly taxonomy: every one of them
/// aborts the current assembly and is surfaced to the caller unmodified.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// A template could not be resolved, rendered, or written.
    #[error("failed to render {template}: {source}")]
    Render {
        /// Template identifier (e.g. `linux/desktop`)
        template: String,
        /// The underlying failure
        #[source]
        source: Box<Self>,
    },

    /// The package context is inconsistent and no manifest can be built.
    #[error("invalid package context: {0}")]
    ManifestConstruction(String),

    /// The archive writer rejected the manifest before writing anything.
    #[error("package validation failed: {0}")]
    WriterValidation(String),

    /// The archive writer failed while producing the artifact.
    #[error("failed writing package {path}: {error}")]
    WriterIo {
        /// Path being written or read when the failure happened
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "reading config file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Handlebars template rendering error.
    #[error("{0}")]
    HandleBarsError(#[from] handlebars::RenderError),

    /// Handlebars template parsing error.
    #[error("{0}")]
    Template(#[from] handlebars::TemplateError),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Wraps any error raised while producing `template` into [`Error::Render`].
    pub fn render(template: impl Into<String>, source: Self) -> Self {
        Self::Render {
            template: template.into(),
            source: Box::new(source),
        }
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with bundler's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
///
/// Wraps I/O errors with the path that caused them for better diagnostics.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying binary".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;

    /// Report an I/O error as an archive-writer failure on `path`.
    fn writer_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }

    fn writer_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::WriterIo {
            path: path.into(),
            error,
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// # Examples
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::bundler::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
