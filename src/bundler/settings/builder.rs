//! Builder for constructing Settings.

use super::{Platform, Settings};
use crate::bundler::locales::DuplicatePolicy;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```
/// use webext_bundler::bundler::{Platform, SettingsBuilder};
///
/// # fn example() -> webext_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .base_dir(".")
///     .platform(Platform::Gecko)
///     .build_number("1337")
///     .build()?;
/// assert!(!settings.release());
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    base_dir: Option<PathBuf>,
    platform: Option<Platform>,
    release: bool,
    build_number: Option<String>,
    output: Option<PathBuf>,
    key_file: Option<PathBuf>,
    devenv: bool,
    duplicate_policy: DuplicatePolicy,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the extension source directory.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn base_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.base_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the target platform.
    ///
    /// Default: [`Platform::Chrome`]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Marks the build as a release build (no build-number suffix).
    pub fn release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Sets an explicit build number for non-release builds.
    pub fn build_number(mut self, build_number: impl Into<String>) -> Self {
        self.build_number = Some(build_number.into());
        self
    }

    /// Overrides the output path.
    pub fn output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    /// Signs the package with the key stored at `path`, creating it if missing.
    pub fn key_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.key_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Produces an unpacked development build.
    pub fn devenv(mut self, devenv: bool) -> Self {
        self.devenv = devenv;
        self
    }

    /// Chooses how duplicate locale keys are resolved on import.
    ///
    /// Default: [`DuplicatePolicy::LastWins`]
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_dir` is missing or the build number is not numeric.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        if let Some(number) = &self.build_number {
            if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
                return Err(crate::bundler::Error::Configuration(format!(
                    "build number must be numeric, got {number:?}"
                )));
            }
        }

        Ok(Settings::new(
            self.base_dir.context("base_dir is required")?,
            self.platform.unwrap_or(Platform::Chrome),
            self.release,
            self.build_number,
            self.output,
            self.key_file,
            self.devenv,
            self.duplicate_policy,
        ))
    }
}
