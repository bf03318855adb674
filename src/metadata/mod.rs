//! Packaging manifest (`deb.toml`) loading.
//!
//! The manifest describes one package build. Relative paths are resolved
//! against the directory holding the manifest file.

use crate::bundler::{
    Arch, BundledRuntime, DebianSettings, DesktopSettings, PackageContext, PackageContextBuilder,
};
use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "deb.toml";

/// Parsed packaging manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageManifest {
    /// `[package]` section
    pub package: PackageSection,

    /// `[paths]` section
    pub paths: PathsSection,

    /// `[runtime]` section; presence means a runtime is bundled
    #[serde(default)]
    pub runtime: Option<BundledRuntime>,

    /// `[deb]` section
    #[serde(default)]
    pub deb: DebianSettings,

    /// `[desktop]` section
    #[serde(default)]
    pub desktop: DesktopSettings,
}

/// Package identity from the `[package]` section
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    /// Package name, also the install prefix `/opt/<name>`
    pub name: String,

    /// Package version (e.g., "1.0.0")
    pub version: String,

    /// Package description; the first line becomes the summary
    #[serde(default)]
    pub description: String,

    /// Human-readable name for the desktop entry
    pub display_name: Option<String>,

    /// Maintainer, `Name <email>`
    pub maintainer: Option<String>,

    /// Homepage URL
    pub homepage: Option<String>,

    /// Target architecture; defaults to the host
    pub arch: Option<Arch>,
}

/// Build-host locations from the `[paths]` section
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Pre-built application directory
    pub app_directory: PathBuf,

    /// Main executable, inside `app_directory`
    pub executable: PathBuf,

    /// Where the `.deb` is written
    pub output_directory: PathBuf,

    /// Staging directory for the rendered descriptor and control file
    pub assets_directory: PathBuf,
}

/// Values given on the command line that take precedence over the manifest.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replaces `[package].name`
    pub name: Option<String>,
    /// Replaces `[package].version`
    pub version: Option<String>,
    /// Replaces `[paths].output_directory`
    pub output_directory: Option<PathBuf>,
}

/// Loads and parses the manifest at `path`.
pub fn load_manifest(path: &Path) -> Result<PackageManifest> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let content = std::fs::read_to_string(path)?;
    let manifest: PackageManifest = toml::from_str(&content)?;
    log::debug!("Loaded packaging manifest {}", path.display());
    Ok(manifest)
}

impl PackageManifest {
    /// Builds the package context, resolving relative paths against `base_dir`.
    pub fn into_context(self, base_dir: &Path, overrides: Overrides) -> Result<PackageContext> {
        let resolve = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            }
        };

        let mut deb = self.deb;
        for path in [
            &mut deb.desktop_template,
            &mut deb.control_template,
            &mut deb.pre_install_script,
            &mut deb.post_install_script,
            &mut deb.pre_remove_script,
            &mut deb.post_remove_script,
        ]
        .into_iter()
        .flatten()
        {
            *path = resolve(path);
        }

        let mut builder = PackageContextBuilder::new()
            .name(overrides.name.unwrap_or(self.package.name))
            .version(overrides.version.unwrap_or(self.package.version))
            .description(self.package.description)
            .app_directory(resolve(&self.paths.app_directory))
            .executable(resolve(&self.paths.executable))
            .assets_directory(resolve(&self.paths.assets_directory))
            .output_directory(resolve(
                overrides
                    .output_directory
                    .as_deref()
                    .unwrap_or(&self.paths.output_directory),
            ))
            .runtime_opt(self.runtime)
            .deb_settings(deb)
            .desktop_settings(self.desktop);

        if let Some(display_name) = self.package.display_name {
            builder = builder.display_name(display_name);
        }
        if let Some(maintainer) = self.package.maintainer {
            builder = builder.maintainer(maintainer);
        }
        if let Some(homepage) = self.package.homepage {
            builder = builder.homepage(homepage);
        }
        if let Some(arch) = self.package.arch {
            builder = builder.arch(arch);
        }

        Ok(builder.build()?)
    }
}

/// Loads the manifest at `path` and converts it into a package context.
pub fn load_context(path: &Path, overrides: Overrides) -> Result<PackageContext> {
    let manifest = load_manifest(path)?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    manifest.into_context(base_dir, overrides)
}
