//! Deterministic ZIP serialization of a [`FileCollection`].
//!
//! Entries are written in path order with a fixed timestamp and fixed
//! permissions, so the same collection always yields the same bytes.

use crate::bundler::{error::Result, files::FileCollection};
use std::io::{Cursor, Write};
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

/// Permission bits of every archive entry.
const ENTRY_PERMISSIONS: u32 = 0o644;

/// Serializes `files` into an in-memory ZIP archive.
///
/// With a `prefix` (e.g. `Extension/`) every entry is placed below it.
pub fn zip_to_bytes(files: &FileCollection, prefix: Option<&str>) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(ENTRY_PERMISSIONS);

    for (path, content) in files.iter() {
        let name = match prefix {
            Some(prefix) => format!("{prefix}{path}"),
            None => path.to_string(),
        };
        zip.start_file(name, options)?;
        zip.write_all(content)?;
    }

    let archive = zip.finish()?.into_inner();
    log::debug!("Serialized {} files into {} bytes", files.len(), archive.len());
    Ok(archive)
}

/// [`zip_to_bytes`] on the blocking pool.
pub async fn zip_to_bytes_blocking(files: FileCollection, prefix: Option<String>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || zip_to_bytes(&files, prefix.as_deref()))
        .await
        .map_err(|e| crate::bundler::Error::GenericError(format!("archive task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::files::InclusionRules;
    use std::io::Read;

    fn collection() -> FileCollection {
        let mut files = FileCollection::new(InclusionRules::default());
        files.set("lib/b.js", "var b;");
        files.set("manifest.json", "{}");
        files.set("_locales/en_US/messages.json", "{}\n");
        files
    }

    #[test]
    fn identical_collections_serialize_identically() {
        let mut reversed = FileCollection::new(InclusionRules::default());
        reversed.set("_locales/en_US/messages.json", "{}\n");
        reversed.set("manifest.json", "{}");
        reversed.set("lib/b.js", "var b;");

        let first = zip_to_bytes(&collection(), None).unwrap();
        let second = zip_to_bytes(&reversed, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn entries_are_sorted_and_prefixed() {
        let bytes = zip_to_bytes(&collection(), Some("Extension/")).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let names: Vec<_> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "Extension/_locales/en_US/messages.json",
                "Extension/lib/b.js",
                "Extension/manifest.json"
            ]
        );

        let mut entry = archive.by_name("Extension/lib/b.js").unwrap();
        assert_eq!(entry.unix_mode().map(|m| m & 0o777), Some(0o644));
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        assert_eq!(text, "var b;");
    }
}
