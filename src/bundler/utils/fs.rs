//! File system utilities for staging package inputs.
//!
//! Blocking helpers with automatic directory creation and path-aware errors.

use crate::bail;
use crate::bundler::error::{ErrorExt, Result};
use std::{fs, path::Path};

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist. Copying a file
/// onto itself leaves it untouched.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("{from:?} does not exist");
    }
    if !from.is_file() {
        bail!("{from:?} is not a file");
    }
    if is_same_file(from, to) {
        log::debug!("{} is already in place", to.display());
        return Ok(());
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir).fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).fs_context("copying file", from)?;
    Ok(())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Sets the permission bits of `path`. No-op on non-Unix hosts.
pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .fs_context("setting permissions", path)?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}
