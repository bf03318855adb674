//! Bundle orchestration.
//!
//! This module provides the [`Bundler`] facade that runs the native
//! assembler and reports the produced artifact.
//!
//! # Overview
//!
//! The bundler:
//! 1. Takes a read-only [`PackageContext`]
//! 2. Runs [`ManifestAssembler::native`]
//! 3. Calculates size and checksum of the artifact
//! 4. Returns a [`BundledArtifact`]
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_deb::bundler::{Bundler, PackageContextBuilder};
//!
//! # fn example() -> kodegen_bundler_deb::bundler::Result<()> {
//! let context = PackageContextBuilder::new()
//!     .name("demo")
//!     .version("1.0.0")
//!     .app_directory("build/demo")
//!     .executable("build/demo/demo")
//!     .assets_directory("build/assets")
//!     .output_directory("dist")
//!     .build()?;
//!
//! let artifact = Bundler::new(context).bundle()?;
//! println!("Created: {} ({} bytes)", artifact.path.display(), artifact.size);
//! println!("SHA256: {}", artifact.checksum);
//! # Ok(())
//! # }
//! ```

use crate::bundler::{
    assembler::ManifestAssembler,
    checksum,
    error::{ErrorExt, Result},
    settings::PackageContext,
};
use std::path::PathBuf;

/// A bundled artifact with metadata about the created package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledArtifact {
    /// Path of the `.deb` file.
    pub path: PathBuf,

    /// Size of the artifact in bytes.
    pub size: u64,

    /// Hex checksum of the artifact (SHA-256).
    ///
    /// This can be published alongside the artifact for users to verify downloads.
    pub checksum: String,
}

/// Main bundler orchestrator.
#[derive(Debug)]
pub struct Bundler {
    context: PackageContext,
}

impl Bundler {
    /// Creates a new bundler for `context`.
    pub fn new(context: PackageContext) -> Self {
        Self { context }
    }

    /// Builds the package and returns the artifact with its size and checksum.
    pub fn bundle(&self) -> Result<BundledArtifact> {
        let assembler = ManifestAssembler::native()?;
        let metadata = assembler.package_metadata(&self.context);
        let path = assembler.assemble(&self.context)?;

        let size = std::fs::metadata(&path)
            .fs_context("reading artifact metadata", &path)?
            .len();
        let checksum = checksum::calculate(metadata.digest, &path)?;

        log::info!(
            "✓ Created {} ({} bytes, {} {})",
            path.display(),
            size,
            metadata.digest.name(),
            checksum
        );

        Ok(BundledArtifact {
            path,
            size,
            checksum,
        })
    }
}
