//! External tool detection.
//!
//! Non-release builds take their build number from version control.

use std::{path::PathBuf, sync::LazyLock};

/// Location of `git`, looked up once.
pub static GIT: LazyLock<Option<PathBuf>> = LazyLock::new(|| match which::which("git") {
    Ok(path) => {
        log::debug!("Found git at: {}", path.display());
        Some(path)
    }
    Err(e) => {
        log::debug!("git not found in PATH: {}", e);
        None
    }
});

/// Number of commits reachable from `HEAD` in the repository at `dir`.
pub async fn git_commit_count(dir: &std::path::Path) -> Result<u64, String> {
    let git = GIT.as_ref().ok_or_else(|| "git is not installed".to_string())?;

    let output = tokio::process::Command::new(git)
        .args(["rev-list", "--count", "HEAD"])
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| format!("failed to run git: {e}"))?;

    if !output.status.success() {
        return Err(format!(
            "git rev-list exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let count = String::from_utf8_lossy(&output.stdout);
    count
        .trim()
        .parse()
        .map_err(|e| format!("unexpected git output {:?}: {e}", count.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A directory git cannot treat as a work tree, even if it has a
    /// repository among its ancestors.
    fn broken_work_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".git"), "not a gitdir link").unwrap();
        dir
    }

    #[tokio::test]
    async fn directory_without_usable_repository_has_no_count() {
        let dir = broken_work_tree();
        assert!(git_commit_count(dir.path()).await.is_err());
    }
}
