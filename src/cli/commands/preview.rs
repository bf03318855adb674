//! Preview command implementation.
//!
//! Prints the manifest and package metadata that `build` would hand to the
//! archive writer. Nothing is rendered or written.

use super::load_context;
use crate::bundler::{FilesystemEntry, Manifest, ManifestAssembler, Mode, PackageMetadata};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::metadata::Overrides;
use serde::Serialize;

/// JSON shape of `preview --json`
#[derive(Debug, Serialize)]
struct PreviewReport<'a> {
    metadata: &'a PackageMetadata,
    bundles_runtime: bool,
    manifest: &'a Manifest,
}

/// Execute preview command
pub(super) fn execute_preview(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Preview {
        config: manifest_path,
        json,
    } = &args.command
    else {
        unreachable!("execute_preview called with non-Preview command");
    };

    let context = load_context(config, manifest_path, Overrides::default())?;
    let assembler = ManifestAssembler::native()?;
    let manifest = assembler.build_manifest(&context)?;
    let metadata = assembler.package_metadata(&context);

    let out = config.output();

    if *json {
        let report = PreviewReport {
            metadata: &metadata,
            bundles_runtime: context.bundles_runtime(),
            manifest: &manifest,
        };
        out.raw(&serde_json::to_string_pretty(&report)?)?;
        return Ok(0);
    }

    out.section(&format!("{} {}", context.name(), context.version()))?;
    out.info(&format!("Artifact: {}", metadata.output.display()))?;
    out.info(&format!("Control directory: {}", metadata.control_directory.display()))?;

    for entry in &manifest {
        out.indent(&describe(entry))?;
    }

    if !context.app_directory().is_dir() {
        out.warn(&format!(
            "Application directory {} does not exist",
            context.app_directory().display()
        ))?;
    }

    Ok(0)
}

fn describe(entry: &FilesystemEntry) -> String {
    match entry {
        FilesystemEntry::Directory(dir) => {
            let mut line = format!(
                "dir   {:<48} {}  <- {}",
                format!("{}/", dir.destination_prefix),
                owner(&dir.directory_mode),
                dir.source.display()
            );
            if !dir.excludes.is_empty() {
                line.push_str(&format!("  (excluding {})", dir.excludes.join(", ")));
            }
            line
        }
        FilesystemEntry::File(file) => format!(
            "file  {:<48} {}  <- {}",
            file.destination(),
            owner(&file.mode),
            file.source.display()
        ),
        FilesystemEntry::Symlink(link) => format!(
            "link  {:<48} {}  -> {}",
            link.link_path,
            owner(&link.mode),
            link.target
        ),
    }
}

fn owner(mode: &Mode) -> String {
    format!("{:06o} {}:{}", mode.bits(), mode.user, mode.group)
}
