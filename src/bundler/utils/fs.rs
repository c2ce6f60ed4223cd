//! File system utilities for packaging.
//!
//! Idempotent directory handling and atomic artifact writes, so that a failed
//! build never leaves a partially written package behind.

use crate::bundler::error::{ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Writes `contents` to `path`, creating any parent directories as needed.
pub async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating parent directory", parent)?;
    }
    fs::write(path, contents)
        .await
        .fs_context("writing file", path)
}

/// Writes `contents` to a sibling temporary file and renames it over `path`.
///
/// Readers either see the previous file or the complete new one.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = path.with_file_name(format!(".{file_name}.part"));

    write_file(&partial, contents).await?;
    if let Err(e) = fs::rename(&partial, path).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e).fs_context("moving artifact into place", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/ext.zip");

        write_atomic(&target, b"first").await.unwrap();
        write_atomic(&target, b"second").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn create_dir_all_erases_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("devenv.chrome");
        write_file(&target.join("stale.js"), b"x").await.unwrap();

        create_dir_all(&target, true).await.unwrap();

        assert!(target.is_dir());
        assert!(!target.join("stale.js").exists());
    }

    #[tokio::test]
    async fn remove_dir_all_ignores_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        remove_dir_all(&dir.path().join("missing")).await.unwrap();
    }
}
