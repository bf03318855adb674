//! Debian package (.deb) writer.
//!
//! Creates .deb packages as ar archives with proper Debian structure.
//!
//! A .deb file is an ar archive containing:
//! - debian-binary: Format version (2.0)
//! - control.tar.gz: Package metadata (control, md5sums, conffiles, scripts)
//! - data.tar.gz: Files to install
//!
//! The writer validates the whole manifest before creating any file. The
//! archive is staged next to its final location and renamed into place only
//! once complete.

use crate::bundler::{
    checksum::{DigestAlgorithm, digest_reader},
    error::{Error, ErrorExt, Result},
    manifest::{DirectoryEntry, FilesystemEntry, Manifest, Mode},
    settings::Arch,
    writer::{ArchiveCompression, ArchiveWriter, PackageMetadata},
};
use flate2::{Compression, write::GzEncoder};
use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};
use tar::{EntryType, Header, HeaderMode};
use walkdir::WalkDir;

/// Debian binary format version written to `debian-binary`.
const DEBIAN_BINARY: &[u8] = b"2.0\n";

/// mtime of every tar header, matching `HeaderMode::Deterministic`.
const FIXED_MTIME: u64 = 1153704088;

/// Maintainer scripts picked up from the control directory.
pub const MAINTAINER_SCRIPTS: [&str; 4] = ["preinst", "postinst", "prerm", "postrm"];

/// Map Rust architecture to Debian architecture string.
pub fn arch_to_debian(arch: Arch) -> &'static str {
    match arch {
        Arch::X86_64 => "amd64",
        Arch::X86 => "i386",
        Arch::AArch64 => "arm64",
        Arch::Armhf => "armhf",
        Arch::Armel => "armel",
        Arch::Riscv64 => "riscv64",
    }
}

/// Native [`ArchiveWriter`] producing `.deb` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebWriter;

impl DebWriter {
    /// Creates a writer.
    pub fn new() -> Self {
        Self
    }

    /// Checks that `manifest` can be written without touching the filesystem
    /// beyond reading the sources.
    pub fn validate(
        &self,
        manifest: &Manifest,
        preserve: &[String],
        metadata: &PackageMetadata,
    ) -> Result<()> {
        DataLayout::plan(manifest, preserve, metadata).map(|_| ())
    }
}

impl ArchiveWriter for DebWriter {
    fn write_archive(
        &self,
        manifest: &Manifest,
        preserve: &[String],
        metadata: &PackageMetadata,
    ) -> Result<PathBuf> {
        let output = &metadata.output;

        // Remove old package if it exists
        if output.exists() {
            log::debug!("Removing stale artifact {}", output.display());
            fs::remove_file(output).writer_context(output)?;
        }

        // Validate everything before the first write
        let layout = DataLayout::plan(manifest, preserve, metadata)?;
        log::debug!(
            "Validated {} data records for {}",
            layout.records.len(),
            output.display()
        );

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).writer_context(parent)?;
        }

        // Create data archive, collecting md5sums on the way
        let data_member = PartialFile::new(sibling(output, ".data.partial"));
        let md5sums = write_data_member(&layout, data_member.path(), metadata.compression)?;

        // Create control archive
        let control = control_member(&layout, &md5sums, metadata)?;

        // Create final ar archive and move it into place
        let staged = PartialFile::new(sibling(output, ".partial"));
        write_ar(staged.path(), &control, data_member.path(), metadata.compression)?;
        staged.commit(output)?;

        log::info!("Wrote {}", output.display());
        Ok(output.clone())
    }
}

/// One path in the data member.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DataKind {
    Directory,
    File(PathBuf),
    Symlink(PathBuf),
}

#[derive(Debug, Clone)]
struct DataRecord {
    kind: DataKind,
    mode: Mode,
}

impl DataRecord {
    fn is_directory(&self) -> bool {
        self.kind == DataKind::Directory
    }
}

/// Fully expanded, validated content of the data member.
///
/// Keys are archive paths without a leading `/`. Ordering them as strings
/// puts every directory before its children.
#[derive(Debug)]
struct DataLayout {
    records: BTreeMap<String, DataRecord>,
    conffiles: Vec<String>,
    control_directory: PathBuf,
}

impl DataLayout {
    fn plan(manifest: &Manifest, preserve: &[String], metadata: &PackageMetadata) -> Result<Self> {
        let control = metadata.control_directory.join("control");
        if !control.is_file() {
            return Err(Error::WriterValidation(format!(
                "control file {} does not exist",
                control.display()
            )));
        }

        let mut layout = Self {
            records: BTreeMap::new(),
            conffiles: Vec::new(),
            control_directory: metadata.control_directory.clone(),
        };

        for entry in manifest {
            match entry {
                FilesystemEntry::Directory(dir) => layout.expand_tree(dir)?,
                FilesystemEntry::File(file) => {
                    if !file.source.is_file() {
                        return Err(Error::WriterValidation(format!(
                            "{} is not a regular file",
                            file.source.display()
                        )));
                    }
                    let path = archive_path(&file.destination())?;
                    layout.claim(
                        path,
                        DataRecord {
                            kind: DataKind::File(file.source.clone()),
                            mode: file.mode.clone(),
                        },
                    )?;
                }
                FilesystemEntry::Symlink(link) => {
                    if link.target.is_empty() {
                        return Err(Error::WriterValidation(format!(
                            "symlink {} has an empty target",
                            link.link_path
                        )));
                    }
                    let path = archive_path(&link.link_path)?;
                    layout.claim(
                        path,
                        DataRecord {
                            kind: DataKind::Symlink(PathBuf::from(&link.target)),
                            mode: link.mode.clone(),
                        },
                    )?;
                }
            }
        }

        layout.add_parent_directories()?;

        for conffile in preserve {
            let path = archive_path(conffile)?;
            match layout.records.get(&path) {
                Some(DataRecord {
                    kind: DataKind::File(_),
                    ..
                }) => layout.conffiles.push(format!("/{path}")),
                _ => {
                    return Err(Error::WriterValidation(format!(
                        "conffile {conffile} is not a regular file in the package"
                    )));
                }
            }
        }

        Ok(layout)
    }

    fn expand_tree(&mut self, dir: &DirectoryEntry) -> Result<()> {
        if !dir.source.is_dir() {
            return Err(Error::WriterValidation(format!(
                "{} is not a directory",
                dir.source.display()
            )));
        }

        let prefix = archive_path(&dir.destination_prefix)?;
        self.claim(
            prefix.clone(),
            DataRecord {
                kind: DataKind::Directory,
                mode: dir.directory_mode.clone(),
            },
        )?;

        let root = dir.source.as_path();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match relative_path(root, entry.path()) {
                Ok(Some(rel)) => !dir.is_excluded(&rel),
                // non-UTF-8 names are reported by the loop below
                _ => true,
            });

        // Mirror the tree; symlinks are archived as links, not followed
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                Error::WriterIo {
                    path,
                    error: e.into(),
                }
            })?;
            let Some(rel) = relative_path(root, entry.path())? else {
                continue;
            };

            let file_type = entry.file_type();
            let record = if file_type.is_dir() {
                DataRecord {
                    kind: DataKind::Directory,
                    mode: dir.directory_mode.clone(),
                }
            } else if file_type.is_symlink() {
                let target = fs::read_link(entry.path()).writer_context(entry.path())?;
                DataRecord {
                    kind: DataKind::Symlink(target),
                    mode: Mode::symlink(),
                }
            } else if file_type.is_file() {
                DataRecord {
                    kind: DataKind::File(entry.path().to_path_buf()),
                    mode: dir.file_mode.clone(),
                }
            } else {
                log::warn!("Skipping special file {}", entry.path().display());
                continue;
            };

            self.claim(join_archive(&prefix, &rel), record)?;
        }

        Ok(())
    }

    fn claim(&mut self, path: String, record: DataRecord) -> Result<()> {
        if path.is_empty() {
            // the filesystem root is implicit
            return if record.is_directory() {
                Ok(())
            } else {
                Err(Error::WriterValidation(
                    "a non-directory entry claims /".to_string(),
                ))
            };
        }

        match self.records.get(&path) {
            None => {
                self.records.insert(path, record);
                Ok(())
            }
            Some(existing) => match (existing.is_directory(), record.is_directory()) {
                (true, true) => Ok(()),
                (false, false) => Err(Error::WriterValidation(format!(
                    "/{path} is declared more than once"
                ))),
                _ => Err(Error::WriterValidation(format!(
                    "/{path} is declared both as a directory and as a non-directory"
                ))),
            },
        }
    }

    /// Adds `0755 root:root` records for every ancestor nobody declared.
    fn add_parent_directories(&mut self) -> Result<()> {
        let mut parents = Vec::new();
        for path in self.records.keys() {
            let mut current = path.as_str();
            while let Some((parent, _)) = current.rsplit_once('/') {
                parents.push(parent.to_string());
                current = parent;
            }
        }

        for parent in parents {
            match self.records.get(&parent) {
                Some(record) if !record.is_directory() => {
                    return Err(Error::WriterValidation(format!(
                        "/{parent} is a parent directory of other entries but is not a directory"
                    )));
                }
                Some(_) => {}
                None => {
                    self.records.insert(
                        parent,
                        DataRecord {
                            kind: DataKind::Directory,
                            mode: Mode::directory(),
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

/// Converts an absolute target path into an archive path (`/opt/x` → `opt/x`).
fn archive_path(destination: &str) -> Result<String> {
    if !destination.starts_with('/') {
        return Err(Error::WriterValidation(format!(
            "destination {destination} is not absolute"
        )));
    }

    let mut parts = Vec::new();
    for part in destination.split('/').filter(|p| !p.is_empty()) {
        if part == "." || part == ".." {
            return Err(Error::WriterValidation(format!(
                "destination {destination} is not normalized"
            )));
        }
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn join_archive(prefix: &str, rel: &str) -> String {
    if prefix.is_empty() {
        rel.to_string()
    } else {
        format!("{prefix}/{rel}")
    }
}

/// `/`-separated path of `path` below `root`, `None` for `root` itself.
///
/// Archive paths are UTF-8, so any other file name is rejected rather than
/// renamed.
fn relative_path(root: &Path, path: &Path) -> Result<Option<String>> {
    let Ok(rel) = path.strip_prefix(root) else {
        return Ok(None);
    };

    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            Error::WriterValidation(format!("{} is not valid UTF-8", path.display()))
        })?;
        parts.push(part);
    }
    Ok((!parts.is_empty()).then(|| parts.join("/")))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Removes a staged file on drop unless it was committed.
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self, destination: &Path) -> Result<()> {
        fs::rename(&self.path, destination).writer_context(destination)?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort; the file may never have been created
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Tar member stream, gzip-compressed or plain.
enum MemberEncoder<W: Write> {
    Gzip(GzEncoder<W>),
    Plain(W),
}

impl<W: Write> MemberEncoder<W> {
    fn new(inner: W, compression: ArchiveCompression) -> Self {
        match compression {
            ArchiveCompression::Gzip => Self::Gzip(GzEncoder::new(inner, Compression::default())),
            ArchiveCompression::None => Self::Plain(inner),
        }
    }

    fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(encoder) => encoder.finish(),
            Self::Plain(inner) => Ok(inner),
        }
    }
}

impl<W: Write> Write for MemberEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(encoder) => encoder.write(buf),
            Self::Plain(inner) => inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(encoder) => encoder.flush(),
            Self::Plain(inner) => inner.flush(),
        }
    }
}

/// Header with ownership, permissions and a fixed mtime from `mode`.
fn entry_header(entry_type: EntryType, mode: &Mode, size: u64) -> io::Result<Header> {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_size(size);
    apply_mode(&mut header, mode)?;
    Ok(header)
}

fn apply_mode(header: &mut Header, mode: &Mode) -> io::Result<()> {
    header.set_mode(mode.permissions);
    header.set_uid(mode.uid);
    header.set_gid(mode.gid);
    header.set_username(&mode.user)?;
    header.set_groupname(&mode.group)?;
    header.set_mtime(FIXED_MTIME);
    Ok(())
}

/// Writes the data member to `dest` and returns the `md5sums` lines.
fn write_data_member(
    layout: &DataLayout,
    dest: &Path,
    compression: ArchiveCompression,
) -> Result<Vec<String>> {
    let file = File::create(dest).writer_context(dest)?;
    let mut tar = tar::Builder::new(MemberEncoder::new(file, compression));
    let mut md5sums = Vec::new();

    for (path, record) in &layout.records {
        match &record.kind {
            DataKind::Directory => {
                let mut header =
                    entry_header(EntryType::Directory, &record.mode, 0).writer_context(dest)?;
                tar.append_data(&mut header, path, io::empty())
                    .writer_context(dest)?;
            }
            DataKind::File(source) => {
                // Calculate MD5 hash
                let digest = File::open(source)
                    .and_then(|f| digest_reader(DigestAlgorithm::Md5, f))
                    .writer_context(source)?;
                // Format: "hex_digest  relative_path"
                md5sums.push(format!("{digest}  {path}"));

                let metadata = fs::metadata(source).writer_context(source)?;
                let mut header = Header::new_gnu();
                header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);
                apply_mode(&mut header, &record.mode).writer_context(dest)?;

                let mut src = File::open(source).writer_context(source)?;
                tar.append_data(&mut header, path, &mut src)
                    .writer_context(source)?;
            }
            DataKind::Symlink(target) => {
                let mut header =
                    entry_header(EntryType::Symlink, &record.mode, 0).writer_context(dest)?;
                tar.append_link(&mut header, path, target)
                    .writer_context(dest)?;
            }
        }
        log::debug!("Added /{} ({:o})", path, record.mode.bits());
    }

    let encoder = tar.into_inner().writer_context(dest)?;
    let file = encoder.finish().writer_context(dest)?;
    file.sync_all().writer_context(dest)?;

    Ok(md5sums)
}

/// Builds the control member in memory.
fn control_member(
    layout: &DataLayout,
    md5sums: &[String],
    metadata: &PackageMetadata,
) -> Result<Vec<u8>> {
    let control_dir = &layout.control_directory;
    let mut tar = tar::Builder::new(MemberEncoder::new(Vec::new(), metadata.compression));

    let mut append = |name: &str, contents: &[u8], permissions: u32| -> io::Result<()> {
        let size = contents.len() as u64;
        let mut header = entry_header(EntryType::Regular, &Mode::root(permissions), size)?;
        tar.append_data(&mut header, name, contents)
    };

    let control_path = control_dir.join("control");
    let control = fs::read(&control_path).writer_context(&control_path)?;
    append("control", &control, Mode::DEFAULT_FILE).writer_context(&control_path)?;

    let mut sums = md5sums.join("\n");
    if !sums.is_empty() {
        sums.push('\n');
    }
    append("md5sums", sums.as_bytes(), Mode::DEFAULT_FILE).writer_context(&control_path)?;

    if !layout.conffiles.is_empty() {
        let conffiles = format!("{}\n", layout.conffiles.join("\n"));
        append("conffiles", conffiles.as_bytes(), Mode::DEFAULT_FILE)
            .writer_context(&control_path)?;
    }

    // Maintainer scripts are always executable
    for script in MAINTAINER_SCRIPTS {
        let path = control_dir.join(script);
        if path.is_file() {
            let contents = fs::read(&path).writer_context(&path)?;
            append(script, &contents, Mode::EXECUTABLE).writer_context(&path)?;
            log::debug!("Added maintainer script {}", script);
        }
    }

    let encoder = tar.into_inner().writer_context(control_dir)?;
    encoder.finish().writer_context(control_dir)
}

/// Create ar archive (final .deb package).
fn write_ar(
    dest: &Path,
    control: &[u8],
    data: &Path,
    compression: ArchiveCompression,
) -> Result<()> {
    let file = File::create(dest).writer_context(dest)?;
    let mut builder = ar::Builder::new(file);

    let member = |name: String, size: u64| {
        let mut header = ar::Header::new(name.into_bytes(), size);
        header.set_mode(0o100644);
        header
    };

    builder
        .append(&member("debian-binary".into(), DEBIAN_BINARY.len() as u64), DEBIAN_BINARY)
        .writer_context(dest)?;
    builder
        .append(
            &member(format!("control.{}", compression.tar_extension()), control.len() as u64),
            control,
        )
        .writer_context(dest)?;

    let data_size = fs::metadata(data).writer_context(data)?.len();
    let data_file = File::open(data).writer_context(data)?;
    builder
        .append(
            &member(format!("data.{}", compression.tar_extension()), data_size),
            data_file,
        )
        .writer_context(dest)?;

    let finished = builder.into_inner().writer_context(dest)?;
    finished.sync_all().writer_context(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::manifest::{FileEntry, SymlinkEntry};
    use flate2::read::GzDecoder;
    use std::io::Read;

    struct Fixture {
        _dir: tempfile::TempDir,
        app: PathBuf,
        control: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(app.join("lib")).unwrap();
        fs::write(app.join("demo"), b"#!/bin/sh\necho demo\n").unwrap();
        fs::write(app.join("lib/data.txt"), b"data").unwrap();

        let control = dir.path().join("assets");
        fs::create_dir_all(&control).unwrap();
        fs::write(control.join("control"), b"Package: demo\nVersion: 1.0.0\n").unwrap();

        let output = dir.path().join("out/demo_1.0.0.deb");
        Fixture {
            _dir: dir,
            app,
            control,
            output,
        }
    }

    fn metadata(f: &Fixture) -> PackageMetadata {
        PackageMetadata {
            name: "demo".into(),
            version: "1.0.0".into(),
            output: f.output.clone(),
            control_directory: f.control.clone(),
            compression: ArchiveCompression::Gzip,
            digest: DigestAlgorithm::Sha256,
        }
    }

    fn manifest(f: &Fixture, excludes: Vec<String>) -> Manifest {
        Manifest::new(vec![
            FilesystemEntry::Directory(DirectoryEntry {
                source: f.app.clone(),
                destination_prefix: "/opt/demo".into(),
                excludes,
                file_mode: Mode::file(),
                directory_mode: Mode::directory(),
            }),
            FilesystemEntry::File(FileEntry {
                source: f.app.join("demo"),
                destination_prefix: "/opt/demo".into(),
                file_name: None,
                mode: Mode::executable(),
            }),
            FilesystemEntry::Symlink(SymlinkEntry {
                link_path: "/usr/local/bin/demo".into(),
                target: "/opt/demo/demo".into(),
                mode: Mode::symlink(),
            }),
        ])
    }

    fn members(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ar::Archive::new(File::open(path).unwrap());
        let mut members = Vec::new();
        while let Some(entry) = archive.next_entry() {
            let mut entry = entry.unwrap();
            let name = String::from_utf8(entry.header().identifier().to_vec()).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            members.push((name, bytes));
        }
        members
    }

    #[test]
    fn test_arch_to_debian() {
        assert_eq!(arch_to_debian(Arch::X86_64), "amd64");
        assert_eq!(arch_to_debian(Arch::AArch64), "arm64");
        assert_eq!(arch_to_debian(Arch::X86), "i386");
    }

    #[test]
    fn test_archive_path() {
        assert_eq!(archive_path("/opt/demo").unwrap(), "opt/demo");
        assert_eq!(archive_path("/").unwrap(), "");
        assert!(archive_path("opt/demo").is_err());
        assert!(archive_path("/opt/../etc").is_err());
    }

    #[test]
    fn test_writes_three_members_in_order() {
        let f = fixture();
        let path = DebWriter::new()
            .write_archive(&manifest(&f, vec!["demo".into()]), &[], &metadata(&f))
            .unwrap();
        assert_eq!(path, f.output);
        assert!(!sibling(&f.output, ".partial").exists());
        assert!(!sibling(&f.output, ".data.partial").exists());

        let members = members(&path);
        let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["debian-binary", "control.tar.gz", "data.tar.gz"]);
        assert_eq!(members[0].1, b"2.0\n");
    }

    #[test]
    fn test_data_member_layout() {
        let f = fixture();
        let path = DebWriter::new()
            .write_archive(&manifest(&f, vec!["demo".into()]), &[], &metadata(&f))
            .unwrap();
        let members = members(&path);

        let mut archive = tar::Archive::new(GzDecoder::new(&members[2].1[..]));
        let mut seen = Vec::new();
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().trim_end_matches('/').to_string();
            let mode = entry.header().mode().unwrap();
            seen.push((name, mode, entry.header().entry_type()));
        }

        let find = |p: &str| seen.iter().find(|(n, ..)| n == p).cloned().unwrap();
        assert_eq!(find("opt").1, 0o755);
        assert_eq!(find("opt/demo/demo").1, 0o755);
        assert_eq!(find("opt/demo/lib/data.txt").1, 0o644);
        assert_eq!(find("usr/local/bin/demo").2, EntryType::Symlink);

        let pos = |p: &str| seen.iter().position(|(n, ..)| n == p).unwrap();
        assert!(pos("opt") < pos("opt/demo"));
        assert!(pos("opt/demo") < pos("opt/demo/lib/data.txt"));
        assert!(pos("usr/local/bin") < pos("usr/local/bin/demo"));
    }

    #[test]
    fn test_uncompressed_members() {
        let f = fixture();
        let mut meta = metadata(&f);
        meta.compression = ArchiveCompression::None;
        let path = DebWriter::new()
            .write_archive(&manifest(&f, vec!["demo".into()]), &[], &meta)
            .unwrap();
        let names: Vec<String> = members(&path).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["debian-binary", "control.tar", "data.tar"]);
    }

    #[test]
    fn test_missing_control_file() {
        let f = fixture();
        fs::remove_file(f.control.join("control")).unwrap();
        let err = DebWriter::new()
            .write_archive(&manifest(&f, vec!["demo".into()]), &[], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterValidation(_)));
        assert!(!f.output.exists());
    }

    #[test]
    fn test_double_claim_is_rejected() {
        let f = fixture();
        // executable not excluded from the tree: installed twice
        let err = DebWriter::new()
            .write_archive(&manifest(&f, vec![]), &[], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterValidation(ref m) if m.contains("/opt/demo/demo")));
        assert!(!f.output.exists());
    }

    #[test]
    fn test_directory_file_conflict() {
        let f = fixture();
        let mut entries = manifest(&f, vec!["demo".into()]).entries().to_vec();
        entries.push(FilesystemEntry::File(FileEntry {
            source: f.app.join("demo"),
            destination_prefix: "/opt/demo".into(),
            file_name: Some("lib".into()),
            mode: Mode::file(),
        }));
        let err = DebWriter::new()
            .validate(&Manifest::new(entries), &[], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterValidation(_)));
    }

    #[test]
    fn test_missing_source() {
        let f = fixture();
        let mut entries = manifest(&f, vec!["demo".into()]).entries().to_vec();
        entries.push(FilesystemEntry::File(FileEntry {
            source: f.app.join("missing"),
            destination_prefix: "/opt/demo".into(),
            file_name: None,
            mode: Mode::file(),
        }));
        let err = DebWriter::new()
            .validate(&Manifest::new(entries), &[], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterValidation(_)));
    }

    #[test]
    fn test_conffiles() {
        let f = fixture();
        let writer = DebWriter::new();
        let manifest = manifest(&f, vec!["demo".into()]);

        let err = writer
            .validate(&manifest, &["/etc/demo.conf".into()], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterValidation(_)));

        let path = writer
            .write_archive(&manifest, &["/opt/demo/lib/data.txt".into()], &metadata(&f))
            .unwrap();
        let members = members(&path);
        let mut archive = tar::Archive::new(GzDecoder::new(&members[1].1[..]));
        let mut conffiles = String::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.path().unwrap().to_string_lossy() == "conffiles" {
                entry.read_to_string(&mut conffiles).unwrap();
            }
        }
        assert_eq!(conffiles, "/opt/demo/lib/data.txt\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_symlinks_are_preserved() {
        let f = fixture();
        std::os::unix::fs::symlink("lib/data.txt", f.app.join("data-link")).unwrap();
        let path = DebWriter::new()
            .write_archive(&manifest(&f, vec!["demo".into()]), &[], &metadata(&f))
            .unwrap();

        let members = members(&path);
        let mut archive = tar::Archive::new(GzDecoder::new(&members[2].1[..]));
        let link = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap())
            .find(|e| e.path().unwrap().to_string_lossy() == "opt/demo/data-link")
            .unwrap();
        assert_eq!(link.header().entry_type(), EntryType::Symlink);
        assert_eq!(
            link.link_name().unwrap().unwrap().to_string_lossy(),
            "lib/data.txt"
        );
    }

    #[test]
    fn test_failed_validation_removes_stale_artifact() {
        let f = fixture();
        fs::create_dir_all(f.output.parent().unwrap()).unwrap();
        fs::write(&f.output, b"previous build").unwrap();

        let err = DebWriter::new()
            .write_archive(&manifest(&f, vec![]), &[], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterValidation(_)));
        assert!(!f.output.exists());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_files() {
        let f = fixture();
        // a directory where the staged archive should go makes the ar step fail
        let staged = sibling(&f.output, ".partial");
        fs::create_dir_all(&staged).unwrap();

        let err = DebWriter::new()
            .write_archive(&manifest(&f, vec!["demo".into()]), &[], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterIo { ref path, .. } if *path == staged));
        assert!(!f.output.exists());
        assert!(!sibling(&f.output, ".data.partial").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_tree_names_are_rejected() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};
        let f = fixture();
        fs::write(f.app.join(OsStr::from_bytes(b"caf\xe9.txt")), b"latin-1").unwrap();
        fs::write(f.app.join(OsStr::from_bytes(b"caf\xe8.txt")), b"latin-1").unwrap();

        let err = DebWriter::new()
            .write_archive(&manifest(&f, vec!["demo".into()]), &[], &metadata(&f))
            .unwrap_err();
        assert!(matches!(err, Error::WriterValidation(ref m) if m.contains("UTF-8")));
        assert!(!f.output.exists());
    }
}
