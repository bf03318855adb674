//! Artifact checksum calculation.
//!
//! Computes the content digest reported for a finished package and the
//! per-file MD5 sums Debian stores in the `md5sums` control member.

use crate::bundler::error::{ErrorExt, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::{fs::File, io, io::Read, path::Path};

/// Digest algorithm for artifact checksums.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5, used by dpkg's `md5sums`
    Md5,
    /// SHA-256 hashing algorithm
    Sha256,
}

impl DigestAlgorithm {
    /// Lowercase algorithm name.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

/// Calculates the hex-encoded digest of a file.
///
/// Reads the file in 8KB chunks.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded hash (32 characters for MD5, 64 for SHA-256)
/// * `Err` - If the file cannot be read
pub fn calculate(algorithm: DigestAlgorithm, path: &Path) -> Result<String> {
    let file = File::open(path).fs_context("opening file for hashing", path)?;
    digest_reader(algorithm, file).fs_context("reading file for hash calculation", path)
}

/// Calculates the hex-encoded digest of everything `reader` yields.
pub fn digest_reader<R: Read>(algorithm: DigestAlgorithm, mut reader: R) -> io::Result<String> {
    match algorithm {
        DigestAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            io::copy(&mut reader, &mut context)?;
            Ok(format!("{:x}", context.finalize()))
        }
        DigestAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            let mut buffer = vec![0u8; 8192];
            loop {
                let n = reader.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_of_known_input() {
        let digest = digest_reader(DigestAlgorithm::Sha256, &b"abc"[..]).unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_md5_of_known_input() {
        let digest = digest_reader(DigestAlgorithm::Md5, &b"abc"[..]).unwrap();
        assert_eq!(digest, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_calculate_missing_file() {
        let err = calculate(DigestAlgorithm::Sha256, Path::new("/nonexistent/file")).unwrap_err();
        assert!(err.to_string().contains("opening file for hashing"));
    }
}
