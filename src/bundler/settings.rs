//! Configuration structures for package assembly.
//!
//! This module provides the [`PackageContext`] handed to the assembler, the
//! Debian and desktop-entry settings it carries, and a builder for
//! constructing it.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CPU architecture of the packaged application.
///
/// Written to the `Architecture` field of the control file.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_deb::bundler::Arch;
///
/// let arch = Arch::from_target("aarch64-unknown-linux-gnu");
/// assert_eq!(arch, Arch::AArch64);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X86_64,
    /// x86 / i686 (32-bit)
    X86,
    /// AArch64 / ARM64 (64-bit)
    AArch64,
    /// ARM with hard-float (32-bit)
    Armhf,
    /// ARM with soft-float (32-bit)
    Armel,
    /// RISC-V (64-bit)
    Riscv64,
}

impl Arch {
    /// Detects the architecture from a Rust target triple or `std::env::consts::ARCH`.
    pub fn from_target(target: &str) -> Self {
        if target.starts_with("x86_64") {
            Arch::X86_64
        } else if target.starts_with('i') || target == "x86" {
            Arch::X86
        } else if target.starts_with("aarch64") {
            Arch::AArch64
        } else if target.starts_with("arm") && target.ends_with("hf") {
            Arch::Armhf
        } else if target.starts_with("arm") {
            Arch::Armel
        } else if target.starts_with("riscv64") {
            Arch::Riscv64
        } else {
            Arch::X86_64 // fallback
        }
    }

    /// Architecture of the host running the bundler.
    pub fn host() -> Self {
        Self::from_target(std::env::consts::ARCH)
    }
}

impl Default for Arch {
    fn default() -> Self {
        Self::host()
    }
}

/// A runtime shipped inside the install prefix.
///
/// The runtime's entry point is expected at `<directory>/bin/<executable>`
/// relative to the application root. It is installed with mode 0755 while the
/// rest of the runtime tree keeps the default file mode.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct BundledRuntime {
    /// Runtime root directory name, relative to the application root.
    pub directory: String,

    /// File name of the runtime executable inside `<directory>/bin`.
    pub executable: String,
}

impl BundledRuntime {
    /// Creates a bundled runtime description.
    pub fn new(directory: impl Into<String>, executable: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            executable: executable.into(),
        }
    }

    /// Path of the runtime entry point relative to the application root.
    pub fn entry_point(&self) -> String {
        format!("{}/bin/{}", self.directory, self.executable)
    }
}

/// Debian package (.deb) configuration.
///
/// # Configuration
///
/// ```toml
/// [deb]
/// depends = ["libc6 (>= 2.31)", "libssl3"]
/// section = "utils"
/// priority = "optional"
/// ```
///
/// # Dependency Format
///
/// Dependencies follow Debian package syntax:
/// - `package-name` - Any version
/// - `package-name (>= 1.0)` - Minimum version
/// - `package-name (<< 2.0)` - Maximum version
///
/// # Maintainer Scripts
///
/// Lifecycle scripts are staged next to the control file and executed by dpkg:
/// - `pre_install_script` - Before installation
/// - `post_install_script` - After installation
/// - `pre_remove_script` - Before removal
/// - `post_remove_script` - After removal
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DebianSettings {
    /// Package dependencies in Debian syntax.
    ///
    /// Default: None
    pub depends: Option<Vec<String>>,

    /// Package recommendations (optional dependencies).
    ///
    /// Default: None
    pub recommends: Option<Vec<String>>,

    /// Debian control file section.
    ///
    /// Default: None (uses "utils")
    pub section: Option<String>,

    /// Package priority in Debian repository.
    ///
    /// Default: None (uses "optional")
    pub priority: Option<String>,

    /// Path to a custom desktop entry template (Handlebars).
    ///
    /// Default: None (built-in template)
    pub desktop_template: Option<PathBuf>,

    /// Path to a custom control file template (Handlebars).
    ///
    /// Default: None (built-in template)
    pub control_template: Option<PathBuf>,

    /// Pre-install script path (preinst).
    pub pre_install_script: Option<PathBuf>,

    /// Post-install script path (postinst).
    pub post_install_script: Option<PathBuf>,

    /// Pre-remove script path (prerm).
    pub pre_remove_script: Option<PathBuf>,

    /// Post-remove script path (postrm).
    pub post_remove_script: Option<PathBuf>,
}

impl DebianSettings {
    /// Configured maintainer scripts paired with their control member names.
    pub fn maintainer_scripts(&self) -> Vec<(&'static str, &Path)> {
        [
            ("preinst", &self.pre_install_script),
            ("postinst", &self.post_install_script),
            ("prerm", &self.pre_remove_script),
            ("postrm", &self.post_remove_script),
        ]
        .into_iter()
        .filter_map(|(name, path)| path.as_deref().map(|p| (name, p)))
        .collect()
    }
}

/// Freedesktop.org desktop entry settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DesktopSettings {
    /// Menu categories, e.g. `["Utility", "Development"]`.
    pub categories: Vec<String>,

    /// Icon name or absolute icon path on the target system.
    pub icon: Option<String>,

    /// Whether the application runs in a terminal.
    pub terminal: bool,

    /// Generic name shown by some desktop environments.
    pub generic_name: Option<String>,

    /// MIME types the application can open.
    pub mime_types: Vec<String>,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            categories: vec!["Utility".to_string()],
            icon: None,
            terminal: false,
            generic_name: None,
            mime_types: Vec::new(),
        }
    }
}

/// Everything the assembler needs to know about one package build.
///
/// Constructed via [`PackageContextBuilder`] and read-only afterwards.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_deb::bundler::{BundledRuntime, PackageContextBuilder};
///
/// # fn example() -> kodegen_bundler_deb::bundler::Result<()> {
/// let context = PackageContextBuilder::new()
///     .name("demo")
///     .version("1.0.0")
///     .app_directory("build/demo")
///     .executable("build/demo/demo")
///     .assets_directory("build/assets")
///     .output_directory("dist")
///     .runtime(BundledRuntime::new("jre", "java"))
///     .build()?;
/// assert!(context.bundles_runtime());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PackageContext {
    name: String,
    version: String,
    display_name: Option<String>,
    description: String,
    maintainer: Option<String>,
    homepage: Option<String>,
    arch: Arch,
    output_directory: PathBuf,
    app_directory: PathBuf,
    assets_directory: PathBuf,
    executable: PathBuf,
    runtime: Option<BundledRuntime>,
    deb: DebianSettings,
    desktop: DesktopSettings,
}

impl PackageContext {
    /// Returns the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the human readable name, falling back to the package name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns the package description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the maintainer, if configured.
    pub fn maintainer(&self) -> Option<&str> {
        self.maintainer.as_deref()
    }

    /// Returns the homepage URL, if configured.
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Returns the target architecture.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Directory receiving the final artifact.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Root of the pre-built application folder.
    pub fn app_directory(&self) -> &Path {
        &self.app_directory
    }

    /// Staging directory for rendered descriptor files.
    pub fn assets_directory(&self) -> &Path {
        &self.assets_directory
    }

    /// Path of the main executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Bundled runtime, if any.
    pub fn runtime(&self) -> Option<&BundledRuntime> {
        self.runtime.as_ref()
    }

    /// Whether a runtime ships inside the install prefix.
    pub fn bundles_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// Debian-specific settings.
    pub fn deb(&self) -> &DebianSettings {
        &self.deb
    }

    /// Desktop entry settings.
    pub fn desktop(&self) -> &DesktopSettings {
        &self.desktop
    }
}

/// Builder for constructing [`PackageContext`].
///
/// `name`, `version`, `app_directory`, `executable`, `assets_directory` and
/// `output_directory` are required.
#[derive(Default)]
pub struct PackageContextBuilder {
    name: Option<String>,
    version: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    maintainer: Option<String>,
    homepage: Option<String>,
    arch: Option<Arch>,
    output_directory: Option<PathBuf>,
    app_directory: Option<PathBuf>,
    assets_directory: Option<PathBuf>,
    executable: Option<PathBuf>,
    runtime: Option<BundledRuntime>,
    deb: DebianSettings,
    desktop: DesktopSettings,
}

impl PackageContextBuilder {
    /// Creates a new context builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the package name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the package version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the human readable name used in the desktop entry.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the package description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the maintainer (`Name <email>`).
    pub fn maintainer(mut self, maintainer: impl Into<String>) -> Self {
        self.maintainer = Some(maintainer.into());
        self
    }

    /// Sets the homepage URL.
    pub fn homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// Sets the target architecture.
    ///
    /// Default: host architecture
    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Sets the directory receiving the artifact.
    pub fn output_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the application root directory.
    pub fn app_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the staging directory for rendered files.
    pub fn assets_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.assets_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the main executable path.
    pub fn executable<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.executable = Some(path.as_ref().to_path_buf());
        self
    }

    /// Declares a runtime bundled inside the application root.
    pub fn runtime(mut self, runtime: BundledRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Sets or clears the bundled runtime.
    pub fn runtime_opt(mut self, runtime: Option<BundledRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets Debian-specific settings.
    ///
    /// Default: Empty [`DebianSettings`]
    pub fn deb_settings(mut self, settings: DebianSettings) -> Self {
        self.deb = settings;
        self
    }

    /// Sets desktop entry settings.
    ///
    /// Default: [`DesktopSettings::default`]
    pub fn desktop_settings(mut self, settings: DesktopSettings) -> Self {
        self.desktop = settings;
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing. Consistency between
    /// fields is checked later, when the manifest is built.
    pub fn build(self) -> crate::bundler::Result<PackageContext> {
        use crate::bundler::error::Context;

        let description = self.description.unwrap_or_default();
        if description.is_empty() {
            log::warn!("package description is empty");
        }

        Ok(PackageContext {
            name: self.name.context("name is required")?,
            version: self.version.context("version is required")?,
            display_name: self.display_name,
            description,
            maintainer: self.maintainer,
            homepage: self.homepage,
            arch: self.arch.unwrap_or_default(),
            output_directory: self
                .output_directory
                .context("output_directory is required")?,
            app_directory: self.app_directory.context("app_directory is required")?,
            assets_directory: self
                .assets_directory
                .context("assets_directory is required")?,
            executable: self.executable.context("executable is required")?,
            runtime: self.runtime,
            deb: self.deb,
            desktop: self.desktop,
        })
    }
}
