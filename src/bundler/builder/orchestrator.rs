//! Main build orchestration.
//!
//! This module provides the [`Bundler`] orchestrator that runs one
//! extension build from metadata to the written package.

use crate::{
    bundler::{
        BuildReport, BuildStage, Platform, Result, Settings,
        archive::zip_to_bytes_blocking,
        diagnostics::Diagnostics,
        files::{FileCollection, InclusionRules},
        locales::{fix_translations_for_chrome, import_locales},
        manifest::{DEVENV_POLLER_FILE, MANIFEST_FILE, ManifestBuilder},
        modules::ModuleBundler,
        preprocess::{HandlebarsPreprocessor, Preprocessor, preprocess_files},
        signing::{NoopSigner, RsaSigner, Signer, extension_id, package_bytes},
        templates::{DEVENV_POLLER_SCRIPT, TEST_INDEX, Templates},
        utils::fs::{create_dir_all, write_atomic},
    },
    metadata::{BuildMetadata, load_metadata},
};
use serde_json::json;
use std::path::PathBuf;

use super::{
    checksum::{calculate_sha256, sha256_hex},
    version::{build_version, default_output_path, devenv_directory},
};

/// Package path of the development build version marker.
pub const DEVENV_VERSION_FILE: &str = "devenvVersion__";

/// Package path of the development test page.
pub const TEST_PAGE_FILE: &str = "qunit/index.html";

/// Main build orchestrator.
///
/// Runs the packaging stages in order: file collection, module bundling,
/// preprocessing, locale import, manifest generation, platform fixups,
/// development extras, serialization, signing and writing. Any fatal error
/// aborts the build before an artifact is written.
///
/// # Examples
///
/// ```no_run
/// use webext_bundler::bundler::{Bundler, Platform, SettingsBuilder};
///
/// # async fn example() -> webext_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .base_dir("adblockpluschrome")
///     .platform(Platform::Chrome)
///     .build_number("1337")
///     .build()?;
///
/// let report = Bundler::new(settings)?.build().await?;
/// println!("Created: {} ({} bytes)", report.output.display(), report.size);
/// println!("SHA256: {}", report.checksum);
/// # Ok(())
/// # }
/// ```
pub struct Bundler {
    settings: Settings,
    templates: Templates,
    preprocessor: Box<dyn Preprocessor>,
    signer: Option<Box<dyn Signer>>,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field("templates", &self.templates)
            .field("preprocessor", &"<Preprocessor>")
            .field("signer", &self.signer.as_ref().map(|_| "<Signer>"))
            .finish()
    }
}

impl Bundler {
    /// Creates a bundler with the built-in templates and preprocessor.
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self {
            settings,
            templates: Templates::new()?,
            preprocessor: Box::new(HandlebarsPreprocessor::default()),
            signer: None,
        })
    }

    /// Replaces the directive preprocessor.
    pub fn with_preprocessor(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessor = Box::new(preprocessor);
        self
    }

    /// Signs release packages with `signer` instead of the configured key file.
    pub fn with_signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Box::new(signer));
        self
    }

    /// Template registry, e.g. to override the manifest template.
    pub fn templates_mut(&mut self) -> &mut Templates {
        &mut self.templates
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the build.
    pub async fn build(&self) -> Result<BuildReport> {
        let settings = &self.settings;
        let base_dir = settings.base_dir();
        let platform = settings.platform();
        let mut diagnostics = Diagnostics::default();
        let mut stages = Vec::new();

        let metadata = load_metadata(base_dir, platform).await?;
        stages.push(BuildStage::MetadataLoaded);
        let general = metadata.general();
        log::info!(
            "Building {} {} for {}{}",
            general.basename,
            general.version,
            platform,
            if settings.devenv() { " (devenv)" } else { "" }
        );

        let version = build_version(
            base_dir,
            &general.version,
            settings.release(),
            settings.build_number(),
            &mut diagnostics,
        )
        .await;
        let signed = !settings.devenv() && (self.signer.is_some() || settings.key_file().is_some());
        let output = self.output_path(&metadata, &version, signed);

        let mut files = self.collect_files(&metadata).await?;
        stages.push(BuildStage::FilesCollected);

        if let Some(items) = metadata.convert_js() {
            ModuleBundler::new(&self.templates, &general.basename, &general.version, platform)
                .convert(items, &mut files)
                .await?;
            stages.push(BuildStage::ModulesConverted);
        }

        if let Some(paths) = metadata.preprocess() {
            let params = json!({
                "needsExt": true,
                "type": platform.as_str(),
                "isChrome": platform == Platform::Chrome,
                "isGecko": platform == Platform::Gecko,
                "isEdge": platform == Platform::Edge,
                "version": version,
                "releaseBuild": settings.release(),
            });
            preprocess_files(self.preprocessor.as_ref(), &mut files, &paths, &params)?;
            stages.push(BuildStage::Preprocessed);
        }

        if let Some(items) = metadata.import_locales() {
            import_locales(items, &mut files, settings.duplicate_policy(), &mut diagnostics).await?;
            stages.push(BuildStage::LocalesImported);
        }

        let manifest = ManifestBuilder::new(
            &self.templates,
            platform,
            &version,
            settings.release(),
            settings.devenv(),
        )
        .build(&metadata, &files, &mut diagnostics)?;
        files.set(MANIFEST_FILE, manifest);
        stages.push(BuildStage::ManifestGenerated);

        if platform == Platform::Chrome {
            fix_translations_for_chrome(&mut files)?;
            stages.push(BuildStage::PlatformFixedUp);
        }

        if settings.devenv() {
            self.inject_dev_extras(&metadata, &mut files)?;
            stages.push(BuildStage::DevExtrasInjected);

            create_dir_all(&output, true).await?;
            files.write_to_directory(&output).await?;
            stages.push(BuildStage::Written);

            let size: u64 = files.iter().map(|(_, content)| content.len() as u64).sum();
            let checksum = calculate_sha256(&output).await?;
            log::info!("Wrote development build to {}", output.display());
            return Ok(BuildReport {
                platform,
                version,
                output,
                stages,
                diagnostics,
                checksum,
                size,
                extension_id: None,
            });
        }

        let archive =
            zip_to_bytes_blocking(files, platform.archive_prefix().map(str::to_string)).await?;
        stages.push(BuildStage::Serialized);

        let loaded;
        let signer: &dyn Signer = match (&self.signer, settings.key_file()) {
            (Some(signer), _) => signer.as_ref(),
            (None, Some(key_file)) => {
                loaded = RsaSigner::from_key_file(key_file).await?;
                &loaded
            }
            (None, None) => &NoopSigner,
        };
        let signature = signer.sign(&archive)?;
        let id = signature.as_ref().map(|sig| extension_id(&sig.public_key));
        if let Some(id) = &id {
            log::info!("Signed package for extension id {}", id);
            stages.push(BuildStage::Signed);
        }

        let package = package_bytes(signature.as_ref(), &archive)?;
        write_atomic(&output, &package).await?;
        stages.push(BuildStage::Written);
        log::info!("Wrote {} ({} bytes)", output.display(), package.len());

        Ok(BuildReport {
            platform,
            version,
            output,
            stages,
            diagnostics,
            checksum: sha256_hex(&package),
            size: package.len() as u64,
            extension_id: id,
        })
    }

    fn output_path(&self, metadata: &BuildMetadata, version: &str, signed: bool) -> PathBuf {
        let settings = &self.settings;
        if settings.devenv() {
            return devenv_directory(settings.base_dir(), settings.platform());
        }
        match settings.output() {
            Some(output) => output.to_path_buf(),
            None => default_output_path(
                settings.base_dir(),
                &metadata.general().basename,
                version,
                settings.platform(),
                signed,
            ),
        }
    }

    /// Mapped files first, then the source tree minus the mapped targets.
    async fn collect_files(&self, metadata: &BuildMetadata) -> Result<FileCollection> {
        let base_dir = self.settings.base_dir();
        let rules = InclusionRules::for_source(base_dir, self.settings.devenv()).await?;
        let mut files = FileCollection::new(rules);

        let mapping = metadata.mapping();
        files.read_mapped(mapping).await?;
        let skip: Vec<String> = mapping.iter().map(|item| item.name().to_string()).collect();
        files.read_directory(base_dir, &skip).await?;

        log::info!("Collected {} files", files.len());
        Ok(files)
    }

    fn inject_dev_extras(&self, metadata: &BuildMetadata, files: &mut FileCollection) -> Result<()> {
        files.set(DEVENV_POLLER_FILE, DEVENV_POLLER_SCRIPT);
        files.set(DEVENV_VERSION_FILE, uuid::Uuid::new_v4().to_string());

        if let Some(scripts) = &metadata.general().test_scripts {
            let page = self.templates.render(
                TEST_INDEX,
                &json!({
                    "basename": metadata.general().basename,
                    "scripts": scripts,
                }),
            )?;
            files.set(TEST_PAGE_FILE, page);
        }
        Ok(())
    }
}
