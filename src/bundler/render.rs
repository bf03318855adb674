//! Text rendering of the launcher descriptor and the control file.
//!
//! The assembler only sees the [`TemplateRenderer`] trait. The native
//! implementation, [`HandlebarsRenderer`], renders the built-in templates or
//! user-supplied template files configured in [`DebianSettings`].
//!
//! # Template data
//!
//! Custom templates can reference these fields. Optional values are `null`
//! and can be tested with `{{#if}}`.
//!
//! | Field | Example |
//! |-------|---------|
//! | `name` | `demo` |
//! | `package` | `demo` (lowercase, spaces replaced by `-`) |
//! | `display_name` | `Demo` |
//! | `version` | `1.0.0` |
//! | `summary` | first description line |
//! | `extended_description` | remaining lines, control-file folded |
//! | `maintainer` | `Jane Doe <jane@example.com>` |
//! | `homepage` | optional |
//! | `section` / `priority` | `utils` / `optional` |
//! | `architecture` | `amd64` |
//! | `depends` / `recommends` | optional, `, `-joined |
//! | `install_dir` | `/opt/demo` |
//! | `exec` | `/opt/demo/demo` |
//! | `icon` / `generic_name` | optional |
//! | `terminal` | `false` |
//! | `categories` / `mime_types` | optional, `;`-joined |
//! | `bundles_runtime` | `true` when a runtime ships in the prefix |
//!
//! [`DebianSettings`]: crate::bundler::DebianSettings

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    manifest::{install_prefix, join_target},
    platform::linux::{
        debian::arch_to_debian,
        freedesktop,
        template::{CONTROL_TEMPLATE, DESKTOP_TEMPLATE},
    },
    settings::PackageContext,
};
use handlebars::Handlebars;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Templates the assembler renders.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TemplateId {
    /// Launcher descriptor (`<name>.desktop`).
    DesktopEntry,
    /// Debian control file (`control`).
    Control,
}

impl TemplateId {
    /// Registry key of the template.
    pub fn id(&self) -> &'static str {
        match self {
            TemplateId::DesktopEntry => "linux/desktop",
            TemplateId::Control => "linux/control",
        }
    }

    /// File name the rendered template is staged under.
    pub fn file_name(&self, context: &PackageContext) -> String {
        match self {
            TemplateId::DesktopEntry => freedesktop::desktop_file_name(context.name()),
            TemplateId::Control => "control".to_string(),
        }
    }

    /// Staged location inside the assets directory.
    pub fn staged_path(&self, context: &PackageContext) -> PathBuf {
        context.assets_directory().join(self.file_name(context))
    }

    /// User-supplied template overriding the built-in one.
    fn override_path<'a>(&self, context: &'a PackageContext) -> Option<&'a Path> {
        match self {
            TemplateId::DesktopEntry => context.deb().desktop_template.as_deref(),
            TemplateId::Control => context.deb().control_template.as_deref(),
        }
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Renders a template for a package context into a file.
pub trait TemplateRenderer {
    /// Renders `template` with data projected from `context` into `output`.
    ///
    /// # Errors
    ///
    /// [`Error::Render`] on template resolution, rendering, or I/O failure.
    fn render(&self, template: TemplateId, output: &Path, context: &PackageContext) -> Result<()>;
}

impl<R: TemplateRenderer + ?Sized> TemplateRenderer for &R {
    fn render(&self, template: TemplateId, output: &Path, context: &PackageContext) -> Result<()> {
        (**self).render(template, output, context)
    }
}

/// Data model both templates are rendered from.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    name: String,
    package: String,
    display_name: String,
    version: String,
    summary: String,
    extended_description: Option<String>,
    maintainer: String,
    homepage: Option<String>,
    section: String,
    priority: String,
    architecture: String,
    depends: Option<String>,
    recommends: Option<String>,
    install_dir: String,
    exec: String,
    icon: Option<String>,
    generic_name: Option<String>,
    terminal: bool,
    categories: Option<String>,
    mime_types: Option<String>,
    bundles_runtime: bool,
}

impl TemplateData {
    /// Projects the render data out of a package context.
    pub fn from_context(context: &PackageContext) -> Self {
        let install_dir = install_prefix(context.name());
        let deb = context.deb();
        let desktop = context.desktop();

        let mut lines = context.description().lines();
        let summary = lines
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("(no description)")
            .to_string();
        let extended: Vec<String> = lines
            .map(|line| {
                if line.trim().is_empty() {
                    " .".to_string()
                } else {
                    format!(" {}", line.trim())
                }
            })
            .collect();

        Self {
            name: context.name().to_string(),
            package: context.name().to_lowercase().replace(' ', "-"),
            display_name: context.display_name().to_string(),
            version: context.version().to_string(),
            summary,
            extended_description: (!extended.is_empty()).then(|| extended.join("\n")),
            maintainer: context.maintainer().unwrap_or("Unknown").to_string(),
            homepage: context.homepage().map(str::to_string),
            section: deb.section.clone().unwrap_or_else(|| "utils".to_string()),
            priority: deb.priority.clone().unwrap_or_else(|| "optional".to_string()),
            architecture: arch_to_debian(context.arch()).to_string(),
            depends: deb.depends.as_ref().filter(|d| !d.is_empty()).map(|d| d.join(", ")),
            recommends: deb
                .recommends
                .as_ref()
                .filter(|r| !r.is_empty())
                .map(|r| r.join(", ")),
            exec: join_target(&install_dir, context.name()),
            install_dir,
            icon: desktop.icon.clone(),
            generic_name: desktop.generic_name.clone(),
            terminal: desktop.terminal,
            categories: freedesktop::list_value(&desktop.categories),
            mime_types: freedesktop::list_value(&desktop.mime_types),
            bundles_runtime: context.bundles_runtime(),
        }
    }
}

/// Handlebars-backed renderer with the built-in Debian templates registered.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlebarsRenderer").finish_non_exhaustive()
    }
}

impl HandlebarsRenderer {
    /// Creates a renderer with the built-in templates.
    ///
    /// Strict mode is on, so a template referencing an unknown field fails to
    /// render instead of producing an empty value.
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(TemplateId::DesktopEntry.id(), DESKTOP_TEMPLATE)
            .map_err(|e| Error::render(TemplateId::DesktopEntry.id(), e.into()))?;
        registry
            .register_template_string(TemplateId::Control.id(), CONTROL_TEMPLATE)
            .map_err(|e| Error::render(TemplateId::Control.id(), e.into()))?;

        Ok(Self { registry })
    }

    /// Renders `template` to a string without touching the filesystem
    /// (except for reading a configured template override).
    pub fn render_to_string(
        &self,
        template: TemplateId,
        context: &PackageContext,
    ) -> Result<String> {
        let data = TemplateData::from_context(context);

        let rendered = match template.override_path(context) {
            Some(path) => {
                let source = fs::read_to_string(path).fs_context("reading template", path)?;
                log::debug!("Rendering {} from {}", template, path.display());
                self.registry.render_template(&source, &data)?
            }
            None => self.registry.render(template.id(), &data)?,
        };

        Ok(rendered)
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: TemplateId, output: &Path, context: &PackageContext) -> Result<()> {
        let write = || -> Result<()> {
            let rendered = self.render_to_string(template, context)?;
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent).fs_context("creating staging directory", parent)?;
            }
            fs::write(output, rendered).fs_context("writing rendered template", output)?;
            Ok(())
        };

        write().map_err(|e| Error::render(template.id(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{
        Arch, BundledRuntime, DebianSettings, DesktopSettings, PackageContextBuilder,
    };

    fn builder() -> PackageContextBuilder {
        PackageContextBuilder::new()
            .name("demo")
            .version("1.0.0")
            .description("Demo application\nDoes demo things.\n\nReally.")
            .maintainer("Jane Doe <jane@example.com>")
            .arch(Arch::X86_64)
            .app_directory("/build/demo")
            .executable("/build/demo/demo")
            .assets_directory("/build/assets")
            .output_directory("/tmp/out")
    }

    #[test]
    fn test_desktop_entry() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let ctx = builder().display_name("Demo").build().unwrap();
        let text = renderer.render_to_string(TemplateId::DesktopEntry, &ctx).unwrap();

        assert!(text.starts_with("[Desktop Entry]\n"));
        assert!(text.contains("Name=Demo\n"));
        assert!(text.contains("Comment=Demo application\n"));
        assert!(text.contains("Exec=/opt/demo/demo\n"));
        assert!(text.contains("Terminal=false\n"));
        assert!(text.contains("Categories=Utility;\n"));
        assert!(!text.contains("Icon="));
        assert!(!text.contains("MimeType="));
    }

    #[test]
    fn test_desktop_entry_optional_fields() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let ctx = builder()
            .desktop_settings(DesktopSettings {
                icon: Some("/opt/demo/demo.png".into()),
                mime_types: vec!["text/plain".into()],
                terminal: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        let text = renderer.render_to_string(TemplateId::DesktopEntry, &ctx).unwrap();
        assert!(text.contains("Icon=/opt/demo/demo.png\n"));
        assert!(text.contains("MimeType=text/plain;\n"));
        assert!(text.contains("Terminal=true\n"));
    }

    #[test]
    fn test_control_file() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let ctx = builder()
            .homepage("https://example.com")
            .deb_settings(DebianSettings {
                depends: Some(vec!["libc6".into(), "libssl3".into()]),
                ..Default::default()
            })
            .build()
            .unwrap();
        let text = renderer.render_to_string(TemplateId::Control, &ctx).unwrap();

        assert!(text.starts_with("Package: demo\nVersion: 1.0.0\n"));
        assert!(text.contains("Section: utils\n"));
        assert!(text.contains("Priority: optional\n"));
        assert!(text.contains("Architecture: amd64\n"));
        assert!(text.contains("Maintainer: Jane Doe <jane@example.com>\n"));
        assert!(text.contains("Homepage: https://example.com\n"));
        assert!(text.contains("Depends: libc6, libssl3\n"));
        assert!(!text.contains("Recommends:"));
        assert!(text.contains("Description: Demo application\n Does demo things.\n .\n Really.\n"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_template_data_runtime_flag() {
        let ctx = builder().runtime(BundledRuntime::new("jre", "java")).build().unwrap();
        let data = serde_json::to_value(TemplateData::from_context(&ctx)).unwrap();
        assert_eq!(data["bundles_runtime"], true);
        assert_eq!(data["install_dir"], "/opt/demo");
        assert!(data["homepage"].is_null());
    }

    #[test]
    fn test_override_with_unknown_field_fails() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("desktop.hbs");
        fs::write(&template, "Name={{no_such_field}}\n").unwrap();

        let ctx = builder()
            .assets_directory(dir.path().join("assets"))
            .deb_settings(DebianSettings {
                desktop_template: Some(template),
                ..Default::default()
            })
            .build()
            .unwrap();

        let renderer = HandlebarsRenderer::new().unwrap();
        let output = TemplateId::DesktopEntry.staged_path(&ctx);
        let err = renderer.render(TemplateId::DesktopEntry, &output, &ctx).unwrap_err();

        assert!(matches!(err, Error::Render { ref template, .. } if template == "linux/desktop"));
        assert!(!output.exists());
    }

    #[test]
    fn test_render_writes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = builder().assets_directory(dir.path().join("assets")).build().unwrap();
        let renderer = HandlebarsRenderer::new().unwrap();

        let output = TemplateId::Control.staged_path(&ctx);
        renderer.render(TemplateId::Control, &output, &ctx).unwrap();

        assert_eq!(output, dir.path().join("assets/control"));
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("Package: demo"));
    }

    #[test]
    fn test_missing_override_is_render_error() {
        let ctx = builder()
            .deb_settings(DebianSettings {
                control_template: Some("/nonexistent/control.hbs".into()),
                ..Default::default()
            })
            .build()
            .unwrap();
        let renderer = HandlebarsRenderer::new().unwrap();
        let err = renderer
            .render(TemplateId::Control, Path::new("/nonexistent/out/control"), &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}
