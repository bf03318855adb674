//! Filesystem-entry manifest for a Debian package.
//!
//! Maps a generic application folder onto the target filesystem. Every entry
//! the package installs is decided here: where it lands, which ownership and
//! permission bits it carries, and whether the bundled runtime adds an entry.
//!
//! # Layout
//!
//! | Entry | Destination | Mode |
//! |-------|-------------|------|
//! | application tree | `/opt/<name>/...` | 0644 files, 0755 dirs |
//! | executable | `/opt/<name>/<exe>` | 0755 |
//! | launcher descriptor | `/usr/share/applications/<name>.desktop` | 0644 |
//! | runtime entry point | `/opt/<name>/<runtime>/bin/<exe>` | 0755 |
//! | search-path symlink | `/usr/local/bin/<name>` | `LINK_FLAG \| 0777` |

use crate::bundler::{
    error::{Error, Result},
    settings::PackageContext,
};
use serde::Serialize;
use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

/// Root under which each application gets its own install prefix.
pub const INSTALL_ROOT: &str = "/opt";

/// Where desktop entries are installed.
pub const APPLICATIONS_DIR: &str = "/usr/share/applications";

/// Directory on the default search path receiving the launcher symlink.
pub const SEARCH_PATH_DIR: &str = "/usr/local/bin";

/// Permission/ownership bundle for one entry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Mode {
    /// Numeric permission bits (e.g. `0o755`).
    pub permissions: u32,
    /// Owning user name.
    pub user: String,
    /// Owning group name.
    pub group: String,
    /// Owning user id.
    pub uid: u64,
    /// Owning group id.
    pub gid: u64,
    /// Symlink entries carry [`Mode::LINK_FLAG`] on top of their permissions.
    pub link: bool,
}

impl Mode {
    /// POSIX `S_IFLNK` file type bits.
    pub const LINK_FLAG: u32 = 0o120000;

    /// Default mode of regular files.
    pub const DEFAULT_FILE: u32 = 0o644;

    /// Default mode of directories.
    pub const DEFAULT_DIRECTORY: u32 = 0o755;

    /// Mode of executables.
    pub const EXECUTABLE: u32 = 0o755;

    /// Root-owned, non-link mode with the given permissions.
    pub fn root(permissions: u32) -> Self {
        Self {
            permissions,
            user: "root".to_string(),
            group: "root".to_string(),
            uid: 0,
            gid: 0,
            link: false,
        }
    }

    /// `0644 root:root`
    pub fn file() -> Self {
        Self::root(Self::DEFAULT_FILE)
    }

    /// `0755 root:root`
    pub fn directory() -> Self {
        Self::root(Self::DEFAULT_DIRECTORY)
    }

    /// `0755 root:root`
    pub fn executable() -> Self {
        Self::root(Self::EXECUTABLE)
    }

    /// Root-owned symlink with `0777` permissions.
    pub fn symlink() -> Self {
        Self {
            link: true,
            ..Self::root(0o777)
        }
    }

    /// Full stat mode bits as the archive writer stores them.
    pub fn bits(&self) -> u32 {
        if self.link {
            Self::LINK_FLAG | self.permissions
        } else {
            self.permissions
        }
    }
}

/// Recursively mirrors a source directory under a destination prefix.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DirectoryEntry {
    /// Directory on the build host.
    pub source: PathBuf,
    /// Absolute destination on the target system.
    pub destination_prefix: String,
    /// `/`-separated paths relative to `source` that are skipped, subtree included.
    pub excludes: Vec<String>,
    /// Mode applied to regular files in the tree.
    pub file_mode: Mode,
    /// Mode applied to directories in the tree.
    pub directory_mode: Mode,
}

impl DirectoryEntry {
    /// Whether `relative` (a `/`-separated path below `source`) is excluded.
    pub fn is_excluded(&self, relative: &str) -> bool {
        self.excludes.iter().any(|exclude| {
            relative == exclude
                || relative
                    .strip_prefix(exclude.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// A single regular file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FileEntry {
    /// File on the build host.
    pub source: PathBuf,
    /// Absolute destination directory on the target system.
    pub destination_prefix: String,
    /// Destination file name; the source file name when `None`.
    pub file_name: Option<String>,
    /// Mode of the installed file.
    pub mode: Mode,
}

impl FileEntry {
    /// Absolute destination of the installed file.
    pub fn destination(&self) -> String {
        let name = self.file_name.clone().unwrap_or_else(|| {
            self.source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        join_target(&self.destination_prefix, &name)
    }
}

/// A symbolic link; nothing is read from the build host.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SymlinkEntry {
    /// Absolute path of the link itself.
    pub link_path: String,
    /// Path the link points to.
    pub target: String,
    /// Link mode, see [`Mode::symlink`].
    pub mode: Mode,
}

/// One entry of the package manifest.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilesystemEntry {
    /// Directory tree.
    Directory(DirectoryEntry),
    /// Regular file.
    File(FileEntry),
    /// Symbolic link.
    Symlink(SymlinkEntry),
}

impl FilesystemEntry {
    /// Destination path this entry declares.
    ///
    /// For directory trees this is the prefix the tree is mirrored under.
    pub fn destination(&self) -> String {
        match self {
            FilesystemEntry::Directory(dir) => dir.destination_prefix.clone(),
            FilesystemEntry::File(file) => file.destination(),
            FilesystemEntry::Symlink(link) => link.link_path.clone(),
        }
    }
}

/// Ordered list of entries handed to the archive writer.
///
/// Directory entries come before entries nested under them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Manifest {
    entries: Vec<FilesystemEntry>,
}

impl Manifest {
    /// Wraps an already ordered entry list.
    pub fn new(entries: Vec<FilesystemEntry>) -> Self {
        Self { entries }
    }

    /// Entries in construction order.
    pub fn entries(&self) -> &[FilesystemEntry] {
        &self.entries
    }

    /// Iterates the entries in construction order.
    pub fn iter(&self) -> std::slice::Iter<'_, FilesystemEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared destination of every entry, in order.
    pub fn destinations(&self) -> Vec<String> {
        self.entries.iter().map(FilesystemEntry::destination).collect()
    }

    /// The application tree entry, if present.
    pub fn directory(&self) -> Option<&DirectoryEntry> {
        self.entries.iter().find_map(|entry| match entry {
            FilesystemEntry::Directory(dir) => Some(dir),
            _ => None,
        })
    }

    /// The file entries, in order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            FilesystemEntry::File(file) => Some(file),
            _ => None,
        })
    }

    /// The symlink entries, in order.
    pub fn symlinks(&self) -> impl Iterator<Item = &SymlinkEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            FilesystemEntry::Symlink(link) => Some(link),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a FilesystemEntry;
    type IntoIter = std::slice::Iter<'a, FilesystemEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Install prefix of the application, `/opt/<name>`.
pub fn install_prefix(name: &str) -> String {
    join_target(INSTALL_ROOT, name)
}

/// Builds the manifest for `context`.
///
/// `descriptor` is the rendered launcher descriptor on the build host.
///
/// # Errors
///
/// [`Error::ManifestConstruction`] when the context is inconsistent: invalid
/// name or version, executable outside the application root, malformed
/// runtime names, or two entries declaring the same destination.
pub fn build_manifest(context: &PackageContext, descriptor: &Path) -> Result<Manifest> {
    check_identity(context)?;
    let name = context.name();

    let prefix = install_prefix(name);
    let executable_rel = executable_relative_path(context)?;
    let runtime_entry_point = match context.runtime() {
        Some(runtime) => {
            check_component("runtime directory", &runtime.directory)?;
            check_component("runtime executable", &runtime.executable)?;
            Some(runtime.entry_point())
        }
        None => None,
    };

    let mut excludes = vec![executable_rel.clone()];
    excludes.extend(runtime_entry_point.iter().cloned());

    let mut entries = Vec::with_capacity(5);

    entries.push(FilesystemEntry::Directory(DirectoryEntry {
        source: context.app_directory().to_path_buf(),
        destination_prefix: prefix.clone(),
        excludes,
        file_mode: Mode::file(),
        directory_mode: Mode::directory(),
    }));

    let executable_prefix = match executable_rel.rsplit_once('/') {
        Some((parent, _)) => join_target(&prefix, parent),
        None => prefix.clone(),
    };
    entries.push(FilesystemEntry::File(FileEntry {
        source: context.executable().to_path_buf(),
        destination_prefix: executable_prefix,
        file_name: None,
        mode: Mode::executable(),
    }));

    entries.push(FilesystemEntry::File(FileEntry {
        source: descriptor.to_path_buf(),
        destination_prefix: APPLICATIONS_DIR.to_string(),
        file_name: None,
        mode: Mode::file(),
    }));

    if let Some(runtime) = context.runtime() {
        entries.push(FilesystemEntry::File(FileEntry {
            source: context
                .app_directory()
                .join(&runtime.directory)
                .join("bin")
                .join(&runtime.executable),
            destination_prefix: join_target(&join_target(&prefix, &runtime.directory), "bin"),
            file_name: None,
            mode: Mode::executable(),
        }));
    }

    entries.push(FilesystemEntry::Symlink(SymlinkEntry {
        link_path: join_target(SEARCH_PATH_DIR, name),
        target: join_target(&prefix, name),
        mode: Mode::symlink(),
    }));

    let manifest = Manifest::new(entries);
    check_unique_destinations(&manifest)?;

    log::debug!(
        "Built manifest for {} with {} entries (runtime bundled: {})",
        name,
        manifest.len(),
        context.bundles_runtime()
    );

    Ok(manifest)
}

/// Checks the package name and version before they reach any file name or
/// rendered control field.
///
/// The name must be a single path component and the version a single token,
/// neither with control characters.
///
/// # Errors
///
/// [`Error::ManifestConstruction`] naming the offending value.
pub fn check_identity(context: &PackageContext) -> Result<()> {
    check_component("package name", context.name())?;

    let version = context.version();
    if version.is_empty() {
        return Err(Error::ManifestConstruction("version is empty".into()));
    }
    if version.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::ManifestConstruction(format!(
            "version {version:?} must not contain whitespace or control characters"
        )));
    }
    Ok(())
}

/// Executable path relative to the application root, `/`-separated.
fn executable_relative_path(context: &PackageContext) -> Result<String> {
    let relative = context
        .executable()
        .strip_prefix(context.app_directory())
        .map_err(|_| {
            Error::ManifestConstruction(format!(
                "executable {} is not under application root {}",
                context.executable().display(),
                context.app_directory().display()
            ))
        })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part.to_string()),
                None => {
                    return Err(Error::ManifestConstruction(format!(
                        "executable path {} is not valid UTF-8",
                        context.executable().display()
                    )));
                }
            },
            Component::CurDir => {}
            _ => {
                return Err(Error::ManifestConstruction(format!(
                    "executable path {} escapes the application root",
                    context.executable().display()
                )));
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::ManifestConstruction(
            "executable must be a file inside the application root".into(),
        ));
    }

    Ok(parts.join("/"))
}

/// Rejects empty values and anything that is not a single path component.
fn check_component(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::ManifestConstruction(format!("{what} is empty")));
    }
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(Error::ManifestConstruction(format!(
            "{what} '{value}' must not contain path separators"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(Error::ManifestConstruction(format!(
            "{what} {value:?} must not contain control characters"
        )));
    }
    Ok(())
}

fn check_unique_destinations(manifest: &Manifest) -> Result<()> {
    let mut seen = HashSet::new();
    for destination in manifest.destinations() {
        if !destination.starts_with('/') {
            return Err(Error::ManifestConstruction(format!(
                "destination {destination} is not absolute"
            )));
        }
        if !seen.insert(destination.clone()) {
            return Err(Error::ManifestConstruction(format!(
                "destination {destination} is declared twice"
            )));
        }
    }
    Ok(())
}

/// Joins target-system paths with exactly one `/`.
pub(crate) fn join_target(prefix: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if name.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), name)
    }
}
