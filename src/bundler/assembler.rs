//! Package assembly pipeline.
//!
//! [`ManifestAssembler`] turns a [`PackageContext`] into a `.deb` artifact:
//!
//! 1. check the package name and version
//! 2. render the launcher descriptor into the assets directory
//! 3. render the control file into the assets directory
//! 4. stage configured maintainer scripts next to the control file, removing
//!    scripts left over from earlier builds
//! 5. build the [`Manifest`]
//! 6. hand manifest and [`PackageMetadata`] to the [`ArchiveWriter`]
//!
//! The first failure aborts the remaining steps and is returned as is.

use crate::bundler::{
    checksum::DigestAlgorithm,
    error::{Context, ErrorExt, Result},
    manifest::{self, Manifest},
    platform::linux::debian::{DebWriter, MAINTAINER_SCRIPTS},
    render::{HandlebarsRenderer, TemplateId, TemplateRenderer},
    settings::PackageContext,
    utils::fs,
    writer::{ArchiveCompression, ArchiveWriter, PackageMetadata},
};
use std::path::PathBuf;

/// Assembles a package with a pluggable renderer and writer.
#[derive(Debug, Clone)]
pub struct ManifestAssembler<R, W> {
    renderer: R,
    writer: W,
}

impl ManifestAssembler<HandlebarsRenderer, DebWriter> {
    /// Assembler with the built-in Handlebars templates and the `.deb` writer.
    pub fn native() -> Result<Self> {
        Ok(Self::new(HandlebarsRenderer::new()?, DebWriter::new()))
    }
}

impl<R: TemplateRenderer, W: ArchiveWriter> ManifestAssembler<R, W> {
    /// Creates an assembler from its collaborators.
    pub fn new(renderer: R, writer: W) -> Self {
        Self { renderer, writer }
    }

    /// Runs the whole pipeline and returns the artifact path.
    ///
    /// # Errors
    ///
    /// The first error of any step, unmodified: [`Error::Render`],
    /// [`Error::ManifestConstruction`], or the writer's
    /// [`Error::WriterValidation`] / [`Error::WriterIo`].
    ///
    /// [`Error::Render`]: crate::bundler::Error::Render
    /// [`Error::ManifestConstruction`]: crate::bundler::Error::ManifestConstruction
    /// [`Error::WriterValidation`]: crate::bundler::Error::WriterValidation
    /// [`Error::WriterIo`]: crate::bundler::Error::WriterIo
    pub fn assemble(&self, context: &PackageContext) -> Result<PathBuf> {
        manifest::check_identity(context)?;
        log::info!("Assembling {} {}", context.name(), context.version());

        let descriptor = TemplateId::DesktopEntry.staged_path(context);
        self.renderer.render(TemplateId::DesktopEntry, &descriptor, context)?;
        let control = TemplateId::Control.staged_path(context);
        self.renderer.render(TemplateId::Control, &control, context)?;
        log::info!("Rendered descriptors into {}", context.assets_directory().display());

        self.stage_maintainer_scripts(context)?;

        let manifest = self.build_manifest(context)?;
        log::info!("Built manifest with {} entries", manifest.len());
        for entry in &manifest {
            log::debug!("  {}", entry.destination());
        }

        let metadata = self.package_metadata(context);
        let artifact = self.writer.write_archive(&manifest, &[], &metadata)?;
        log::info!("Artifact written to {}", artifact.display());

        Ok(artifact)
    }

    /// Builds the manifest for `context` with the descriptor at its staged location.
    pub fn build_manifest(&self, context: &PackageContext) -> Result<Manifest> {
        manifest::build_manifest(context, &TemplateId::DesktopEntry.staged_path(context))
    }

    /// Metadata handed to the writer.
    pub fn package_metadata(&self, context: &PackageContext) -> PackageMetadata {
        PackageMetadata {
            name: context.name().to_string(),
            version: context.version().to_string(),
            output: artifact_path(context),
            control_directory: context.assets_directory().to_path_buf(),
            compression: ArchiveCompression::Gzip,
            digest: DigestAlgorithm::Sha256,
        }
    }

    /// Copies maintainer scripts into the control directory with mode 0755.
    ///
    /// The writer ships every script it finds there, so scripts that are no
    /// longer configured are deleted.
    fn stage_maintainer_scripts(&self, context: &PackageContext) -> Result<()> {
        let configured = context.deb().maintainer_scripts();

        for name in MAINTAINER_SCRIPTS {
            let dest = context.assets_directory().join(name);
            match configured.iter().find(|(script, _)| *script == name) {
                Some((_, source)) => {
                    fs::copy_file(source, &dest)
                        .and_then(|()| fs::set_permissions(&dest, 0o755))
                        .with_context(|| format!("staging {name} script"))?;
                    log::debug!("Staged {} from {}", name, source.display());
                }
                None if dest.is_file() => {
                    std::fs::remove_file(&dest).fs_context("removing stale script", &dest)?;
                    log::debug!("Removed stale {} from {}", name, dest.display());
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// Artifact location, `<output>/<name>_<version>.deb`.
pub fn artifact_path(context: &PackageContext) -> PathBuf {
    context
        .output_directory()
        .join(format!("{}_{}.deb", context.name(), context.version()))
}

/// Assembles `context` with the native renderer and writer.
pub fn assemble(context: &PackageContext) -> Result<PathBuf> {
    ManifestAssembler::native()?.assemble(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        error::Error,
        settings::{BundledRuntime, DebianSettings, PackageContextBuilder},
    };
    use std::{cell::RefCell, path::Path};

    #[derive(Default)]
    struct RecordingRenderer {
        fail_on: Option<TemplateId>,
        calls: RefCell<Vec<(TemplateId, PathBuf)>>,
    }

    impl TemplateRenderer for RecordingRenderer {
        fn render(&self, template: TemplateId, output: &Path, _: &PackageContext) -> Result<()> {
            self.calls.borrow_mut().push((template, output.to_path_buf()));
            if self.fail_on == Some(template) {
                return Err(Error::render(
                    template.id(),
                    Error::GenericError("missing field".into()),
                ));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        reject: bool,
        calls: RefCell<Vec<(Manifest, Vec<String>, PackageMetadata)>>,
    }

    impl ArchiveWriter for RecordingWriter {
        fn write_archive(
            &self,
            manifest: &Manifest,
            preserve: &[String],
            metadata: &PackageMetadata,
        ) -> Result<PathBuf> {
            self.calls
                .borrow_mut()
                .push((manifest.clone(), preserve.to_vec(), metadata.clone()));
            if self.reject {
                return Err(Error::WriterValidation("duplicate destination".into()));
            }
            Ok(metadata.output.clone())
        }
    }

    fn context(runtime: Option<BundledRuntime>) -> PackageContext {
        PackageContextBuilder::new()
            .name("demo")
            .version("1.0.0")
            .app_directory("/build/demo")
            .executable("/build/demo/demo")
            .assets_directory("/build/assets")
            .output_directory("/tmp/out")
            .runtime_opt(runtime)
            .build()
            .unwrap()
    }

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path(&context(None)),
            PathBuf::from("/tmp/out/demo_1.0.0.deb")
        );
    }

    #[test]
    fn test_assemble_passes_manifest_and_metadata() {
        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        let path = assembler.assemble(&context(None)).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/out/demo_1.0.0.deb"));

        let renders = assembler.renderer.calls.borrow();
        assert_eq!(
            *renders,
            vec![
                (TemplateId::DesktopEntry, PathBuf::from("/build/assets/demo.desktop")),
                (TemplateId::Control, PathBuf::from("/build/assets/control")),
            ]
        );

        let calls = assembler.writer.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (manifest, preserve, metadata) = &calls[0];
        assert_eq!(manifest.len(), 4);
        assert!(preserve.is_empty());
        assert_eq!(metadata.compression, ArchiveCompression::Gzip);
        assert_eq!(metadata.digest, DigestAlgorithm::Sha256);
        assert_eq!(metadata.control_directory, PathBuf::from("/build/assets"));
    }

    #[test]
    fn test_runtime_adds_entry() {
        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        assembler
            .assemble(&context(Some(BundledRuntime::new("jre", "java"))))
            .unwrap();
        assert_eq!(assembler.writer.calls.borrow()[0].0.len(), 5);
    }

    #[test]
    fn test_descriptor_failure_skips_writer() {
        let renderer = RecordingRenderer {
            fail_on: Some(TemplateId::DesktopEntry),
            ..Default::default()
        };
        let assembler = ManifestAssembler::new(renderer, RecordingWriter::default());
        let err = assembler.assemble(&context(None)).unwrap_err();

        assert!(matches!(err, Error::Render { ref template, .. } if template == "linux/desktop"));
        assert_eq!(assembler.renderer.calls.borrow().len(), 1);
        assert!(assembler.writer.calls.borrow().is_empty());
    }

    #[test]
    fn test_control_failure_skips_writer() {
        let renderer = RecordingRenderer {
            fail_on: Some(TemplateId::Control),
            ..Default::default()
        };
        let assembler = ManifestAssembler::new(renderer, RecordingWriter::default());
        assert!(matches!(assembler.assemble(&context(None)), Err(Error::Render { .. })));
        assert!(assembler.writer.calls.borrow().is_empty());
    }

    #[test]
    fn test_manifest_error_skips_writer() {
        let ctx = PackageContextBuilder::new()
            .name("demo")
            .version("1.0.0")
            .app_directory("/build/demo")
            .executable("/elsewhere/demo")
            .assets_directory("/build/assets")
            .output_directory("/tmp/out")
            .build()
            .unwrap();
        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        assert!(matches!(assembler.assemble(&ctx), Err(Error::ManifestConstruction(_))));
        assert!(assembler.writer.calls.borrow().is_empty());
    }

    #[test]
    fn test_writer_error_is_returned_unchanged() {
        let writer = RecordingWriter {
            reject: true,
            ..Default::default()
        };
        let assembler = ManifestAssembler::new(RecordingRenderer::default(), writer);
        let err = assembler.assemble(&context(None)).unwrap_err();
        assert!(matches!(err, Error::WriterValidation(ref m) if m == "duplicate destination"));
    }

    #[test]
    fn test_manifests_are_stable() {
        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        let ctx = context(Some(BundledRuntime::new("jre", "java")));
        assembler.assemble(&ctx).unwrap();
        assembler.assemble(&ctx).unwrap();

        let calls = assembler.writer.calls.borrow();
        assert_eq!(calls[0].0, calls[1].0);
        assert_eq!(calls[0].2, calls[1].2);
    }

    #[test]
    fn test_maintainer_scripts_are_staged() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("postinst.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();

        let ctx = PackageContextBuilder::new()
            .name("demo")
            .version("1.0.0")
            .app_directory("/build/demo")
            .executable("/build/demo/demo")
            .assets_directory(dir.path().join("assets"))
            .output_directory("/tmp/out")
            .deb_settings(DebianSettings {
                post_install_script: Some(script),
                ..Default::default()
            })
            .build()
            .unwrap();

        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        assembler.assemble(&ctx).unwrap();

        let staged = dir.path().join("assets/postinst");
        assert_eq!(std::fs::read_to_string(&staged).unwrap(), "#!/bin/sh\nexit 0\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&staged).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_bad_name_stops_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("build/assets");

        for name in ["../escaped", "demo\nEssential: yes"] {
            let ctx = PackageContextBuilder::new()
                .name(name)
                .version("1.0.0")
                .app_directory(dir.path().join("build/demo"))
                .executable(dir.path().join("build/demo/demo"))
                .assets_directory(&assets)
                .output_directory(dir.path().join("dist"))
                .build()
                .unwrap();

            let assembler = ManifestAssembler::native().unwrap();
            assert!(matches!(assembler.assemble(&ctx), Err(Error::ManifestConstruction(_))));
        }

        assert!(!dir.path().join("build/escaped.desktop").exists());
        assert!(!assets.exists());
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_bad_version_skips_renderer() {
        let ctx = PackageContextBuilder::new()
            .name("demo")
            .version("1.0\nDepends: evil")
            .app_directory("/build/demo")
            .executable("/build/demo/demo")
            .assets_directory("/build/assets")
            .output_directory("/tmp/out")
            .build()
            .unwrap();
        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        assert!(matches!(assembler.assemble(&ctx), Err(Error::ManifestConstruction(_))));
        assert!(assembler.renderer.calls.borrow().is_empty());
    }

    #[test]
    fn test_unconfigured_scripts_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join("postinst"), "#!/bin/sh\necho old\n").unwrap();
        std::fs::write(assets.join("prerm"), "#!/bin/sh\necho old\n").unwrap();
        let script = dir.path().join("prerm.sh");
        std::fs::write(&script, "#!/bin/sh\necho new\n").unwrap();

        let ctx = PackageContextBuilder::new()
            .name("demo")
            .version("1.0.0")
            .app_directory("/build/demo")
            .executable("/build/demo/demo")
            .assets_directory(&assets)
            .output_directory("/tmp/out")
            .deb_settings(DebianSettings {
                pre_remove_script: Some(script),
                ..Default::default()
            })
            .build()
            .unwrap();

        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        assembler.assemble(&ctx).unwrap();

        assert!(!assets.join("postinst").exists());
        assert_eq!(
            std::fs::read_to_string(assets.join("prerm")).unwrap(),
            "#!/bin/sh\necho new\n"
        );
    }

    #[test]
    fn test_script_staged_in_place_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join("postinst"), "#!/bin/sh\nexit 0\n").unwrap();

        let ctx = PackageContextBuilder::new()
            .name("demo")
            .version("1.0.0")
            .app_directory("/build/demo")
            .executable("/build/demo/demo")
            .assets_directory(&assets)
            .output_directory("/tmp/out")
            .deb_settings(DebianSettings {
                post_install_script: Some(assets.join("postinst")),
                ..Default::default()
            })
            .build()
            .unwrap();

        let assembler =
            ManifestAssembler::new(RecordingRenderer::default(), RecordingWriter::default());
        assembler.assemble(&ctx).unwrap();
        assert_eq!(
            std::fs::read_to_string(assets.join("postinst")).unwrap(),
            "#!/bin/sh\nexit 0\n"
        );
    }
}
