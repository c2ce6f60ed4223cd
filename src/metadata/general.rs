//! The `[general]` metadata section.

use super::Section;
use crate::bundler::error::{Error, Result};

/// Typed view of `[general]`.
///
/// List options are `None` when absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralSection {
    /// Package base name, used for output file names.
    pub basename: String,
    /// Version without build number.
    pub version: String,
    /// Icon set: individually sized icon files.
    pub icons: Option<Vec<String>>,
    /// Browser action: icon(s) optionally followed by a popup page.
    pub browser_action: Option<Vec<String>>,
    /// Page action: icon(s) optionally followed by a popup page.
    pub page_action: Option<Vec<String>>,
    /// Required permissions.
    pub permissions: Option<Vec<String>>,
    /// Optional permissions.
    pub optional_permissions: Option<Vec<String>>,
    /// Background scripts.
    pub background_scripts: Option<Vec<String>>,
    /// Web-accessible resources.
    pub web_accessible: Option<Vec<String>>,
    /// Scripts loaded by the development test page.
    pub test_scripts: Option<Vec<String>>,
    /// Extension author.
    pub author: Option<String>,
    /// Homepage URL.
    pub homepage: Option<String>,
    /// Options page.
    pub options: Option<String>,
    /// Minimum supported browser version.
    pub minimum_version: Option<String>,
    /// Gecko add-on id.
    pub app_id: Option<String>,
}

impl GeneralSection {
    pub(super) fn from_section(section: &Section) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            section
                .get(name)
                .map(|item| item.value().trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    Error::Configuration(format!("[general] {name} is required"))
                })
        };
        let list = |name: &str| -> Option<Vec<String>> {
            section
                .get(name)
                .map(|item| item.values())
                .filter(|values| !values.is_empty())
        };
        let text = |name: &str| -> Option<String> {
            section
                .get(name)
                .map(|item| item.value().trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Ok(Self {
            basename: required("basename")?,
            version: required("version")?,
            icons: list("icons"),
            browser_action: list("browserAction"),
            page_action: list("pageAction"),
            permissions: list("permissions"),
            optional_permissions: list("optionalPermissions"),
            background_scripts: list("backgroundScripts"),
            web_accessible: list("webAccessible"),
            test_scripts: list("testScripts"),
            author: text("author"),
            homepage: text("homepage"),
            options: text("options"),
            minimum_version: text("minimumVersion"),
            app_id: text("appId"),
        })
    }
}
