//! `manifest.json` generation.
//!
//! The manifest is rendered from the built-in template with variables derived
//! from the `[general]` and `[contentScripts]` metadata, then normalized: the
//! leading comment and the `_dummy` terminator are removed and keys are
//! sorted.

use crate::{
    bundler::{
        Platform,
        diagnostics::{Diagnostics, Warning},
        error::{Error, Result},
        files::FileCollection,
        templates::{MANIFEST, Templates},
        utils::json::to_pretty_sorted,
    },
    metadata::BuildMetadata,
};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, io::Cursor, sync::LazyLock};

/// Package path of the manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Package path of the live-reload script of development builds.
pub const DEVENV_POLLER_FILE: &str = "devenvPoller__.js";

/// URL patterns content scripts are injected into.
const CONTENT_SCRIPT_MATCHES: &[&str] = &["http://*/*", "https://*/*"];

/// A block comment ahead of the first JSON token.
static LEADING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A\s*/\*.*?\*/").expect("valid block comment regex"));

/// Icon of a browser or page action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionIcon {
    /// A single icon file.
    Single(String),
    /// Icons keyed by pixel width.
    Sized(BTreeMap<u32, String>),
}

/// A browser or page action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionData {
    /// Toolbar icon(s).
    pub icon: ActionIcon,
    /// Popup page.
    pub popup: Option<String>,
}

/// One `content_scripts` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentScript {
    pub matches: Vec<String>,
    pub js: Vec<String>,
    pub run_at: String,
    pub all_frames: bool,
    pub match_about_blank: bool,
}

/// Variables available to the manifest template.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestData {
    pub platform: String,
    pub is_chrome: bool,
    pub is_gecko: bool,
    pub is_edge: bool,
    pub release_build: bool,
    pub basename: String,
    pub version: String,
    pub author: Option<String>,
    pub homepage: Option<String>,
    pub minimum_version: Option<String>,
    pub app_id: Option<String>,
    pub options: Option<String>,
    pub browser_action: Option<ActionData>,
    pub page_action: Option<ActionData>,
    pub icons: Option<BTreeMap<u32, String>>,
    pub permissions: Option<Vec<String>>,
    pub optional_permissions: Option<Vec<String>>,
    pub background_scripts: Option<Vec<String>>,
    pub web_accessible: Option<Vec<String>>,
    pub content_scripts: Option<Vec<ContentScript>>,
}

/// Maps icon widths to file names, reading dimensions from the package.
///
/// Non-square icons raise a warning and are keyed by their width. An icon
/// missing from the package is a configuration error.
pub fn make_icons(
    files: &FileCollection,
    names: &[String],
    diagnostics: &mut Diagnostics,
) -> Result<BTreeMap<u32, String>> {
    let mut icons = BTreeMap::new();
    for name in names {
        let bytes = files.get(name).ok_or_else(|| {
            Error::Configuration(format!("icon {name} is not part of the package"))
        })?;
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        if width != height {
            diagnostics.warn(Warning::NonSquareIcon {
                file: name.clone(),
                width,
                height,
            });
        }
        icons.insert(width, name.clone());
    }
    Ok(icons)
}

/// Strips a leading block comment, drops `_dummy` and sorts keys.
pub fn normalize_manifest(rendered: &str) -> Result<String> {
    let stripped = LEADING_COMMENT.replace(rendered, "");
    let mut data: Value = serde_json::from_str(&stripped)?;
    if let Some(map) = data.as_object_mut() {
        map.remove("_dummy");
    }
    to_pretty_sorted(&data)
}

/// Renders the manifest of one build.
pub struct ManifestBuilder<'a> {
    templates: &'a Templates,
    platform: Platform,
    version: &'a str,
    release: bool,
    devenv: bool,
}

impl<'a> ManifestBuilder<'a> {
    /// `version` is the full build version written into the manifest.
    pub fn new(
        templates: &'a Templates,
        platform: Platform,
        version: &'a str,
        release: bool,
        devenv: bool,
    ) -> Self {
        Self {
            templates,
            platform,
            version,
            release,
            devenv,
        }
    }

    /// Computes the template variables.
    pub fn template_data(
        &self,
        metadata: &BuildMetadata,
        files: &FileCollection,
        diagnostics: &mut Diagnostics,
    ) -> Result<ManifestData> {
        let general = metadata.general();

        let browser_action = general
            .browser_action
            .as_deref()
            .map(|entries| action(files, entries, diagnostics))
            .transpose()?;
        let page_action = general
            .page_action
            .as_deref()
            .map(|entries| action(files, entries, diagnostics))
            .transpose()?;
        let icons = general
            .icons
            .as_deref()
            .map(|names| make_icons(files, names, diagnostics))
            .transpose()?;

        let mut background_scripts = general.background_scripts.clone();
        if self.devenv {
            if let Some(scripts) = background_scripts.as_mut() {
                scripts.push(DEVENV_POLLER_FILE.to_string());
            }
        }

        let content_scripts = metadata.content_scripts().map(|buckets| {
            buckets
                .into_iter()
                .filter(|(_, scripts)| !scripts.is_empty())
                .map(|(run_at, js)| ContentScript {
                    matches: CONTENT_SCRIPT_MATCHES.iter().map(|m| m.to_string()).collect(),
                    js,
                    run_at,
                    all_frames: true,
                    match_about_blank: true,
                })
                .collect::<Vec<_>>()
        });

        Ok(ManifestData {
            platform: self.platform.as_str().to_string(),
            is_chrome: self.platform == Platform::Chrome,
            is_gecko: self.platform == Platform::Gecko,
            is_edge: self.platform == Platform::Edge,
            release_build: self.release,
            basename: general.basename.clone(),
            version: self.version.to_string(),
            author: general.author.clone(),
            homepage: general.homepage.clone(),
            minimum_version: general.minimum_version.clone(),
            app_id: general.app_id.clone(),
            options: general.options.clone(),
            browser_action,
            page_action,
            icons,
            permissions: general.permissions.clone(),
            optional_permissions: general.optional_permissions.clone(),
            background_scripts,
            web_accessible: general.web_accessible.clone(),
            content_scripts,
        })
    }

    /// Renders and normalizes `manifest.json`.
    pub fn build(
        &self,
        metadata: &BuildMetadata,
        files: &FileCollection,
        diagnostics: &mut Diagnostics,
    ) -> Result<String> {
        let data = self.template_data(metadata, files, diagnostics)?;
        let rendered = self.templates.render(MANIFEST, &data)?;
        normalize_manifest(&rendered)
    }
}

/// `icon`, `icon popup`, or `icon-a icon-b ... popup`.
fn action(
    files: &FileCollection,
    entries: &[String],
    diagnostics: &mut Diagnostics,
) -> Result<ActionData> {
    Ok(match entries {
        [icon] => ActionData {
            icon: ActionIcon::Single(icon.clone()),
            popup: None,
        },
        [icon, popup] => ActionData {
            icon: ActionIcon::Single(icon.clone()),
            popup: Some(popup.clone()),
        },
        [icons @ .., popup] => ActionData {
            icon: ActionIcon::Sized(make_icons(files, icons, diagnostics)?),
            popup: Some(popup.clone()),
        },
        [] => return Err(Error::Configuration("empty action definition".to_string())),
    })
}
