//! Target extension platforms.

use std::{fmt, str::FromStr};

/// Extension host a package is built for.
///
/// # Examples
///
/// ```
/// use webext_bundler::bundler::Platform;
///
/// let platform: Platform = "gecko".parse().unwrap();
/// assert_eq!(platform.metadata_file_name(), "metadata.gecko.toml");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum Platform {
    /// Chrome, Chromium and Opera.
    Chrome,
    /// Firefox WebExtensions.
    Gecko,
    /// Legacy Microsoft Edge (AppX).
    Edge,
}

impl Platform {
    /// Lowercase identifier used in file names and templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Chrome => "chrome",
            Platform::Gecko => "gecko",
            Platform::Edge => "edge",
        }
    }

    /// Name of the metadata file read from the source directory.
    pub fn metadata_file_name(&self) -> String {
        format!("metadata.{}.toml", self.as_str())
    }

    /// Directory inside the archive that holds the extension files.
    pub fn archive_prefix(&self) -> Option<&'static str> {
        match self {
            Platform::Edge => Some("Extension/"),
            Platform::Chrome | Platform::Gecko => None,
        }
    }

    /// Artifact file extension; Chrome packages are `.crx` only when signed.
    pub fn package_extension(&self, signed: bool) -> &'static str {
        match self {
            Platform::Gecko => "xpi",
            Platform::Edge => "appx",
            Platform::Chrome if signed => "crx",
            Platform::Chrome => "zip",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = crate::bundler::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chrome" => Ok(Platform::Chrome),
            "gecko" => Ok(Platform::Gecko),
            "edge" => Ok(Platform::Edge),
            other => Err(crate::bundler::Error::Configuration(format!(
                "unknown platform {other:?}, expected one of: chrome, gecko, edge"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_extension_depends_on_signing_for_chrome_only() {
        assert_eq!(Platform::Chrome.package_extension(true), "crx");
        assert_eq!(Platform::Chrome.package_extension(false), "zip");
        assert_eq!(Platform::Gecko.package_extension(true), "xpi");
        assert_eq!(Platform::Edge.package_extension(false), "appx");
    }

    #[test]
    fn unknown_platform_is_a_configuration_error() {
        let err = "safari".parse::<Platform>().unwrap_err();
        assert!(matches!(err, crate::bundler::Error::Configuration(_)));
    }
}
