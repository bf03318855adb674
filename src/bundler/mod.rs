//! Debian package assembly for self-contained application folders.
//!
//! This module maps a pre-built application directory (an executable, an
//! optional bundled runtime, and supporting assets) onto the filesystem
//! layout of a `.deb` package and writes the package.
//!
//! # Layout
//!
//! | Installed path | Source |
//! |----------------|--------|
//! | `/opt/<name>/...` | application directory |
//! | `/opt/<name>/<exe>` | executable, mode 0755 |
//! | `/usr/share/applications/<name>.desktop` | rendered launcher descriptor |
//! | `/opt/<name>/<runtime>/bin/<exe>` | bundled runtime entry point, mode 0755 |
//! | `/usr/local/bin/<name>` | symlink to `/opt/<name>/<name>` |
//!
//! # Pipeline
//!
//! [`ManifestAssembler`] renders the descriptor and the control file, builds
//! the [`Manifest`], and hands it to an [`ArchiveWriter`]. Renderer and writer
//! are traits; [`HandlebarsRenderer`] and [`DebWriter`] are the native
//! implementations.
//!
//! ```no_run
//! use kodegen_bundler_deb::bundler::{self, PackageContextBuilder};
//!
//! let context = PackageContextBuilder::new()
//!     .name("demo")
//!     .version("1.0.0")
//!     .app_directory("build/demo")
//!     .executable("build/demo/demo")
//!     .assets_directory("build/assets")
//!     .output_directory("dist")
//!     .build()?;
//!
//! let artifact = bundler::assemble(&context)?;
//! assert!(artifact.ends_with("demo_1.0.0.deb"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod assembler;
mod builder;
pub mod checksum;
mod error;
pub mod manifest;
pub(crate) mod platform;
mod render;
mod settings;
mod utils;
mod writer;

// Public re-exports
pub use assembler::{ManifestAssembler, artifact_path, assemble};
pub use builder::{BundledArtifact, Bundler};
pub use checksum::DigestAlgorithm;
pub use error::{Context, Error, ErrorExt, Result};
pub use manifest::{
    DirectoryEntry, FileEntry, FilesystemEntry, Manifest, Mode, SymlinkEntry, build_manifest,
};
pub use platform::linux::debian::{DebWriter, arch_to_debian};
pub use render::{HandlebarsRenderer, TemplateData, TemplateId, TemplateRenderer};
pub use settings::{
    Arch, BundledRuntime, DebianSettings, DesktopSettings, PackageContext, PackageContextBuilder,
};
pub use writer::{ArchiveCompression, ArchiveWriter, PackageMetadata};
