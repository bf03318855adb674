//! # kodegen_bundler_deb
//!
//! Debian package assembly for self-contained application folders.
//!
//! Given a pre-built application directory, this crate produces a `.deb`
//! that installs the application under `/opt/<name>`, registers a desktop
//! entry, optionally ships a bundled runtime, and links the executable onto
//! the search path.
//!
//! ## Features
//!
//! - **Deterministic manifests**: the same context always yields the same entries
//! - **Pluggable collaborators**: template renderer and archive writer are traits
//! - **Pure Rust writer**: ar/tar/gzip without `dpkg-deb`
//! - **No partial artifacts**: failed builds leave nothing at the output path
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_deb build --config deb.toml
//! kodegen_bundler_deb build --config deb.toml --version 1.2.3 --output dist
//! kodegen_bundler_deb preview --config deb.toml --json
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export main types for public API
pub use bundler::{BundledArtifact, Bundler, ManifestAssembler, PackageContext};
pub use cli::Args;
pub use error::{BundlerError, CliError, ConfigError, Result};
