//! Output checksums.
//!
//! Packages are hashed from their in-memory bytes. Development builds are
//! directories and are hashed as a tree.

use crate::{bail, bundler::Result, bundler::error::ErrorExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Hex encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex encoded SHA-256 of a file, or of a directory tree.
///
/// A tree hash covers every file's relative path and content in sorted
/// order, so it only changes when the written package changes.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading output metadata", path)?;

    if metadata.is_file() {
        let bytes = tokio::fs::read(path)
            .await
            .fs_context("reading output for hashing", path)?;
        Ok(sha256_hex(&bytes))
    } else if metadata.is_dir() {
        calculate_directory_sha256(path).await
    } else {
        bail!("Output is neither file nor directory: {}", path.display())
    }
}

async fn calculate_directory_sha256(dir_path: &Path) -> Result<String> {
    let root = dir_path.to_path_buf();
    let mut entries: Vec<PathBuf> = tokio::task::spawn_blocking(move || {
        walkdir::WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    })
    .await
    .map_err(|e| crate::bundler::Error::GenericError(format!("hashing task panicked: {e}")))?;
    entries.sort();

    let mut hasher = Sha256::new();
    for entry in entries {
        if let Ok(rel_path) = entry.strip_prefix(dir_path) {
            hasher.update(rel_path.to_string_lossy().as_bytes());
        }
        let content = tokio::fs::read(&entry)
            .await
            .fs_context("reading file for hash calculation", &entry)?;
        hasher.update(&content);
    }

    Ok(hex::encode(hasher.finalize()))
}
