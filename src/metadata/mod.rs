//! Build metadata loading.
//!
//! Each platform has a `metadata.<platform>.toml` file in the extension source
//! directory. A file may name a parent with a top-level `inherit` key; parent
//! options are loaded first and overridden per section by the child.
//!
//! ```toml
//! inherit = "metadata.common.toml"
//!
//! [general]
//! basename = "adblockpluschrome"
//! version = "1.2.3"
//! permissions = "tabs webRequest <all_urls>"
//!
//! [convert_js]
//! "lib/foo.js" = "lib/b.js ext/a.js"
//! "lib/foo.js[autoload]" = "b"
//! ```
//!
//! Values are strings of space-separated entries, or arrays of strings.
//! Every option remembers which file defined it so that paths in
//! `convert_js`, `import_locales` and `mapping` resolve relative to it.

mod general;

pub use general::GeneralSection;

use crate::bundler::{
    Platform,
    error::{Error, ErrorExt, Result},
};
use std::path::{Path, PathBuf};

/// Maximum `inherit` chain length, guards against cycles.
const MAX_INHERIT_DEPTH: usize = 16;

/// One metadata option together with the file that defined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataItem {
    name: String,
    value: String,
    origin: PathBuf,
}

impl MetadataItem {
    /// Creates an item defined in `origin`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            origin: origin.into(),
        }
    }

    /// Option name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw option value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value split on whitespace.
    pub fn values(&self) -> Vec<String> {
        self.value.split_whitespace().map(str::to_string).collect()
    }

    /// Metadata file that defined this option.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Directory of the defining metadata file.
    pub fn origin_dir(&self) -> &Path {
        self.origin.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Resolves a forward-slash relative path against [`origin_dir`](Self::origin_dir).
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.origin_dir().to_path_buf(), |path, part| path.join(part))
    }
}

/// Ordered options of one section.
#[derive(Debug, Clone, Default)]
pub struct Section {
    name: String,
    items: Vec<MetadataItem>,
}

impl Section {
    /// Section built from already parsed options.
    pub fn from_items(name: impl Into<String>, items: Vec<MetadataItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    /// Section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options in definition order.
    pub fn items(&self) -> &[MetadataItem] {
        &self.items
    }

    /// Looks up an option by name.
    pub fn get(&self, name: &str) -> Option<&MetadataItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Inserts or overrides an option, keeping the original position on override.
    fn upsert(&mut self, item: MetadataItem) {
        match self.items.iter_mut().find(|existing| existing.name == item.name) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }
}

/// Typed, validated build metadata.
#[derive(Debug, Clone)]
pub struct BuildMetadata {
    path: PathBuf,
    general: GeneralSection,
    sections: Vec<Section>,
}

impl BuildMetadata {
    /// The metadata file the build started from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `[general]` section.
    pub fn general(&self) -> &GeneralSection {
        &self.general
    }

    /// Any section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// `[contentScripts]` buckets: injection timing → script list.
    pub fn content_scripts(&self) -> Option<Vec<(String, Vec<String>)>> {
        self.section("contentScripts").map(|section| {
            section
                .items()
                .iter()
                .map(|item| (item.name().to_string(), item.values()))
                .collect()
        })
    }

    /// `[convert_js]` options.
    pub fn convert_js(&self) -> Option<&[MetadataItem]> {
        self.section("convert_js").map(Section::items)
    }

    /// `[import_locales]` options.
    pub fn import_locales(&self) -> Option<&[MetadataItem]> {
        self.section("import_locales").map(Section::items)
    }

    /// `[preprocess]` file list.
    pub fn preprocess(&self) -> Option<Vec<String>> {
        self.section("preprocess")
            .map(|section| section.items().iter().map(|i| i.name().to_string()).collect())
    }

    /// `[mapping]` options (package path → source path).
    pub fn mapping(&self) -> &[MetadataItem] {
        self.section("mapping").map(Section::items).unwrap_or(&[])
    }

    /// Builds metadata from parsed sections, validating required options.
    pub fn from_sections(path: PathBuf, sections: Vec<Section>) -> Result<Self> {
        let general = match sections.iter().find(|s| s.name == "general") {
            Some(section) => GeneralSection::from_section(section)?,
            None => {
                return Err(Error::Configuration(format!(
                    "{} has no [general] section",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path,
            general,
            sections,
        })
    }
}

/// Loads `metadata.<platform>.toml` from `base_dir`.
///
/// The inheritance chain is read on the blocking pool.
pub async fn load_metadata(base_dir: &Path, platform: Platform) -> Result<BuildMetadata> {
    let path = base_dir.join(platform.metadata_file_name());
    if !tokio::fs::try_exists(&path)
        .await
        .fs_context("checking metadata", &path)?
    {
        return Err(Error::Configuration(format!(
            "no metadata for {platform}: {} not found",
            path.display()
        )));
    }

    tokio::task::spawn_blocking(move || {
        let mut sections = Vec::new();
        read_into(&path, &mut sections, 0)?;
        log::debug!("Loaded metadata from {}", path.display());
        BuildMetadata::from_sections(path, sections)
    })
    .await
    .map_err(|e| Error::GenericError(format!("metadata task panicked: {e}")))?
}

/// Reads one metadata file (after its parent) into `sections`.
fn read_into(path: &Path, sections: &mut Vec<Section>, depth: usize) -> Result<()> {
    if depth > MAX_INHERIT_DEPTH {
        return Err(Error::Configuration(format!(
            "metadata inheritance is too deep at {}",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path).fs_context("reading metadata", path)?;
    let table: toml::Table = toml::from_str(&text).map_err(|e| {
        Error::Configuration(format!("failed to parse {}: {e}", path.display()))
    })?;

    if let Some(parent) = table.get("inherit") {
        let parent = parent.as_str().ok_or_else(|| {
            Error::Configuration(format!("{}: inherit must be a string", path.display()))
        })?;
        let parent_path = path.parent().unwrap_or_else(|| Path::new("")).join(parent);
        read_into(&parent_path, sections, depth + 1)?;
    }

    for (section_name, value) in &table {
        if section_name == "inherit" {
            continue;
        }
        let options = value.as_table().ok_or_else(|| {
            Error::Configuration(format!(
                "{}: top-level key {section_name} must be a section",
                path.display()
            ))
        })?;

        let index = match sections.iter().position(|s| &s.name == section_name) {
            Some(index) => index,
            None => {
                sections.push(Section {
                    name: section_name.clone(),
                    items: Vec::new(),
                });
                sections.len() - 1
            }
        };

        for (option, value) in options {
            let value = option_value(value).ok_or_else(|| {
                Error::Configuration(format!(
                    "{}: [{section_name}] {option} must be a string or a list of strings",
                    path.display()
                ))
            })?;
            sections[index].upsert(MetadataItem::new(option.clone(), value, path));
        }
    }
    Ok(())
}

/// Flattens a TOML option value into the space-separated string form.
fn option_value(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(" ")),
        _ => None,
    }
}
