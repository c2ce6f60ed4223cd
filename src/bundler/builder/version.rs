//! Build versions and output locations.

use super::tool_detection::git_commit_count;
use crate::bundler::{
    Platform,
    diagnostics::{Diagnostics, Warning},
};
use std::path::{Path, PathBuf};

/// Version written into the manifest.
///
/// Release builds use the metadata version as is. Other builds append a
/// build number: the explicit one, or the commit count of the source
/// repository (`0` with a warning when unavailable).
pub async fn build_version(
    base_dir: &Path,
    version: &str,
    release: bool,
    build_number: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> String {
    if release {
        return version.to_string();
    }

    let build_number = match build_number {
        Some(number) => number.to_string(),
        None => match git_commit_count(base_dir).await {
            Ok(count) => count.to_string(),
            Err(reason) => {
                diagnostics.warn(Warning::MissingBuildNumber { reason });
                "0".to_string()
            }
        },
    };
    format!("{version}.{build_number}")
}

/// `<base>/<basename>-<version>.<ext>`.
pub fn default_output_path(
    base_dir: &Path,
    basename: &str,
    version: &str,
    platform: Platform,
    signed: bool,
) -> PathBuf {
    base_dir.join(format!(
        "{basename}-{version}.{}",
        platform.package_extension(signed)
    ))
}

/// Unpacked output directory of development builds.
pub fn devenv_directory(base_dir: &Path, platform: Platform) -> PathBuf {
    base_dir.join(format!("devenv.{platform}"))
}
