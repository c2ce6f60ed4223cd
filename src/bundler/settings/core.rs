//! Core Settings struct and implementations.

use super::Platform;
use crate::bundler::locales::DuplicatePolicy;
use std::path::{Path, PathBuf};

/// Input record of one build invocation.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder). Mirrors the
/// options of the command line: platform, release flag, build number, output
/// override, signing key and development mode.
///
/// # Examples
///
/// ```no_run
/// use webext_bundler::bundler::{Platform, SettingsBuilder};
///
/// # fn example() -> webext_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .base_dir("adblockpluschrome")
///     .platform(Platform::Chrome)
///     .release(true)
///     .key_file("adblockpluschrome.pem")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Extension source directory; metadata files live here.
    base_dir: PathBuf,

    /// Target platform.
    platform: Platform,

    /// Release builds carry no build-number suffix in their version.
    release: bool,

    /// Explicit build number for non-release builds.
    build_number: Option<String>,

    /// Output path override. Defaults to `<basename>-<version>.<ext>` in `base_dir`.
    output: Option<PathBuf>,

    /// Private key used to sign the package. Unsigned when absent.
    key_file: Option<PathBuf>,

    /// Development build: unpacked output with live-reload helpers.
    devenv: bool,

    /// What to do when an imported locale key already exists.
    duplicate_policy: DuplicatePolicy,
}

impl Settings {
    /// Returns the source directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the target platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// True for release builds. Development builds always count as releases.
    pub fn release(&self) -> bool {
        self.release || self.devenv
    }

    /// Returns the explicit build number, if any.
    pub fn build_number(&self) -> Option<&str> {
        self.build_number.as_deref()
    }

    /// Returns the output path override, if any.
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Returns the signing key path. Development builds are never signed.
    pub fn key_file(&self) -> Option<&Path> {
        if self.devenv {
            None
        } else {
            self.key_file.as_deref()
        }
    }

    /// True for development builds.
    pub fn devenv(&self) -> bool {
        self.devenv
    }

    /// Returns the duplicate locale key policy.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        base_dir: PathBuf,
        platform: Platform,
        release: bool,
        build_number: Option<String>,
        output: Option<PathBuf>,
        key_file: Option<PathBuf>,
        devenv: bool,
        duplicate_policy: DuplicatePolicy,
    ) -> Self {
        Self {
            base_dir,
            platform,
            release,
            build_number,
            output,
            key_file,
            devenv,
            duplicate_policy,
        }
    }
}
