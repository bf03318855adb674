//! Archive writer seam.
//!
//! The assembler hands a finished [`Manifest`] plus [`PackageMetadata`] to an
//! [`ArchiveWriter`] and knows nothing about container layout, compression or
//! control-member encoding. [`DebWriter`](crate::bundler::DebWriter) is the
//! native implementation.

use crate::bundler::{checksum::DigestAlgorithm, error::Result, manifest::Manifest};
use serde::Serialize;
use std::path::PathBuf;

/// Compression applied to the control and data members.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    /// gzip (`.tar.gz` members)
    #[default]
    Gzip,
    /// uncompressed (`.tar` members)
    None,
}

impl ArchiveCompression {
    /// Member file extension for this compression.
    pub fn tar_extension(&self) -> &'static str {
        match self {
            ArchiveCompression::Gzip => "tar.gz",
            ArchiveCompression::None => "tar",
        }
    }
}

/// Package-level fields the writer needs besides the manifest.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct PackageMetadata {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// Exact path of the artifact to produce.
    pub output: PathBuf,
    /// Directory holding the rendered `control` file and maintainer scripts.
    pub control_directory: PathBuf,
    /// Member compression.
    pub compression: ArchiveCompression,
    /// Digest used for the artifact checksum.
    pub digest: DigestAlgorithm,
}

/// Produces a package artifact from a manifest.
///
/// Implementations validate before writing anything and report failures as
/// [`Error::WriterValidation`](crate::bundler::Error::WriterValidation) or
/// [`Error::WriterIo`](crate::bundler::Error::WriterIo). A failed call must
/// not leave a file at `metadata.output`.
pub trait ArchiveWriter {
    /// Writes the artifact and returns its path.
    ///
    /// `preserve` lists absolute destinations dpkg should keep across
    /// upgrades (conffiles).
    fn write_archive(
        &self,
        manifest: &Manifest,
        preserve: &[String],
        metadata: &PackageMetadata,
    ) -> Result<PathBuf>;
}

impl<W: ArchiveWriter + ?Sized> ArchiveWriter for &W {
    fn write_archive(
        &self,
        manifest: &Manifest,
        preserve: &[String],
        metadata: &PackageMetadata,
    ) -> Result<PathBuf> {
        (**self).write_archive(manifest, preserve, metadata)
    }
}
