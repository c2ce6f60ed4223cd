//! The package scratch area.
//!
//! A [`FileCollection`] maps normalized, forward-slash relative paths to file
//! contents. It is filled from the source tree, rewritten by every pipeline
//! stage, and finally serialized into the archive. Entries are kept sorted by
//! path.

use crate::{
    bundler::error::{Error, ErrorExt, Result},
    metadata::MetadataItem,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

/// Top-level directories that make up an extension package.
const PACKAGE_DIRECTORIES: &[&str] = &["_locales", "icons", "jquery-ui", "lib", "skin", "ui", "ext"];

/// Top-level file extensions that are packaged.
const PACKAGE_EXTENSIONS: &[&str] = &["json", "js", "html", "xml"];

/// Names that are never packaged, wherever they appear.
const IGNORED_FILES: &[&str] = &["store.description"];

/// Inclusion and exclusion rules of a package.
#[derive(Debug, Clone, Default)]
pub struct InclusionRules {
    package_files: BTreeSet<String>,
    ignored: BTreeSet<String>,
}

impl InclusionRules {
    /// Rules from explicit top-level names and ignored names.
    pub fn new<I, J>(package_files: I, ignored: J) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        Self {
            package_files: package_files.into_iter().map(Into::into).collect(),
            ignored: ignored.into_iter().map(Into::into).collect(),
        }
    }

    /// Standard extension layout for `base_dir`.
    ///
    /// Includes the well-known package directories, `qunit` for development
    /// builds, and every top-level `.json`, `.js`, `.html` and `.xml` file.
    pub async fn for_source(base_dir: &Path, devenv: bool) -> Result<Self> {
        let mut package_files: BTreeSet<String> =
            PACKAGE_DIRECTORIES.iter().map(|d| d.to_string()).collect();
        if devenv {
            package_files.insert("qunit".to_string());
        }

        let mut entries = tokio::fs::read_dir(base_dir)
            .await
            .fs_context("listing source directory", base_dir)?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .fs_context("listing source directory", base_dir)?
        {
            let path = entry.path();
            let packaged = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| PACKAGE_EXTENSIONS.contains(&e));
            if packaged {
                package_files.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }

        Ok(Self {
            package_files,
            ignored: IGNORED_FILES.iter().map(|f| f.to_string()).collect(),
        })
    }

    /// True if `relpath` belongs in the package.
    ///
    /// The first path component must be a package file and no component may
    /// be ignored.
    pub fn is_included(&self, relpath: &str) -> bool {
        let mut parts = relpath.split('/');
        let Some(first) = parts.next() else {
            return false;
        };
        self.package_files.contains(first)
            && !self.ignored.contains(first)
            && parts.all(|part| !self.ignored.contains(part))
    }
}

/// Ordered path → content store for one build.
#[derive(Debug, Clone, Default)]
pub struct FileCollection {
    entries: BTreeMap<String, Vec<u8>>,
    rules: InclusionRules,
}

impl FileCollection {
    /// Creates an empty collection governed by `rules`.
    pub fn new(rules: InclusionRules) -> Self {
        Self {
            entries: BTreeMap::new(),
            rules,
        }
    }

    /// Stores `content` at `path`, replacing any previous entry.
    pub fn set(&mut self, path: impl AsRef<str>, content: impl Into<Vec<u8>>) {
        self.entries
            .insert(normalize(path.as_ref()), content.into());
    }

    /// Returns the content at `path`.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(&normalize(path)).map(Vec::as_slice)
    }

    /// Returns the content at `path`, or `default` if there is none.
    pub fn get_or<'a>(&'a self, path: &str, default: &'a [u8]) -> &'a [u8] {
        self.get(path).unwrap_or(default)
    }

    /// Returns the content at `path` as UTF-8 text.
    pub fn text(&self, path: &str) -> Result<Option<&str>> {
        self.get(path)
            .map(|bytes| {
                std::str::from_utf8(bytes).map_err(|e| {
                    Error::GenericError(format!("{path} is not valid UTF-8: {e}"))
                })
            })
            .transpose()
    }

    /// Removes and returns the content at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.entries.remove(&normalize(path))
    }

    /// Removes the content at `path`, returning `default` if there was none.
    pub fn remove_or(&mut self, path: &str, default: Vec<u8>) -> Vec<u8> {
        self.remove(path).unwrap_or(default)
    }

    /// True if an entry exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize(path))
    }

    /// True if `path` matches the inclusion rules (whether or not it exists).
    pub fn is_included(&self, path: &str) -> bool {
        self.rules.is_included(&normalize(path))
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(path, content)| (path.as_str(), content.as_slice()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads one file into the collection at `relpath`.
    pub async fn read_file(&mut self, path: &Path, relpath: &str) -> Result<()> {
        let content = tokio::fs::read(path)
            .await
            .fs_context("reading package file", path)?;
        log::debug!("Added {} from {}", relpath, path.display());
        self.set(relpath, content);
        Ok(())
    }

    /// Walks `root` and adds every included file not under a `skip` path.
    pub async fn read_directory(&mut self, root: &Path, skip: &[String]) -> Result<()> {
        let found = collect_tree(root.to_path_buf(), String::new(), self.rules.clone(), skip.to_vec())
            .await?;
        log::debug!("Read {} files from {}", found.len(), root.display());
        for (relpath, content) in found {
            self.set(relpath, content);
        }
        Ok(())
    }

    /// Adds mapped files: each item's name is the package path, its value the
    /// source path relative to the metadata file that defined it.
    ///
    /// Targets inside a subdirectory must still pass the inclusion rules. A
    /// source that does not exist is a configuration error.
    pub async fn read_mapped(&mut self, mappings: &[MetadataItem]) -> Result<()> {
        for item in mappings {
            let target = normalize(item.name());
            if target.contains('/') && !self.rules.is_included(&target) {
                log::debug!("Skipping mapped file {} outside the package", target);
                continue;
            }

            let source = item.resolve(item.value());
            let metadata = match tokio::fs::metadata(&source).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(Error::Configuration(format!(
                        "mapped file {} doesn't exist (mapping for {})",
                        item.value(),
                        target
                    )));
                }
                Err(e) => return Err(e).fs_context("reading mapped file", &source),
            };

            if metadata.is_dir() {
                let found =
                    collect_tree(source, target.clone(), self.rules.clone(), Vec::new()).await?;
                for (relpath, content) in found {
                    self.set(relpath, content);
                }
            } else {
                self.read_file(&source, &target).await?;
            }
        }
        Ok(())
    }

    /// Writes every entry below `dir`, which is created if missing.
    pub async fn write_to_directory(&self, dir: &Path) -> Result<()> {
        crate::bundler::utils::fs::create_dir_all(dir, false).await?;
        for (relpath, content) in self.iter() {
            let target = relpath.split('/').fold(dir.to_path_buf(), |p, part| p.join(part));
            crate::bundler::utils::fs::write_file(&target, content).await?;
        }
        Ok(())
    }
}

/// Normalizes separators and strips a leading `./`.
fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

/// Reads a directory tree on the blocking pool.
///
/// Every directory and file below `root` is checked against `rules` and
/// `skip` using its package path (`prefix` joined with the relative path), so
/// excluded directories are never descended into.
async fn collect_tree(
    root: PathBuf,
    prefix: String,
    rules: InclusionRules,
    skip: Vec<String>,
) -> Result<Vec<(String, Vec<u8>)>> {
    tokio::task::spawn_blocking(move || {
        let package_path = |path: &Path| -> Option<String> {
            let rel = path.strip_prefix(&root).ok()?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            Some(match (prefix.is_empty(), rel.is_empty()) {
                (true, _) => rel,
                (false, true) => prefix.clone(),
                (false, false) => format!("{prefix}/{rel}"),
            })
        };

        let mut found = Vec::new();
        let walker = walkdir::WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                match package_path(entry.path()) {
                    Some(name) => !skip.contains(&name) && rules.is_included(&name),
                    None => false,
                }
            });

        for entry in walker {
            let entry = entry.map_err(|e| Error::GenericError(format!("walking source tree: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = package_path(entry.path()) else {
                continue;
            };
            let content =
                std::fs::read(entry.path()).fs_context("reading package file", entry.path())?;
            found.push((name, content));
        }
        Ok(found)
    })
    .await
    .map_err(|e| Error::GenericError(format!("source tree walk panicked: {e}")))?
}
