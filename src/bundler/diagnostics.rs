//! Non-fatal build findings.
//!
//! Warnings and skipped locale imports are logged as they happen and kept in
//! [`Diagnostics`] so callers (and tests) can inspect them after the build.

use std::{fmt, path::PathBuf};
use thiserror::Error;

/// A non-fatal validation finding. The build continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// A locale message was imported into a target that already defined it.
    #[error("locale string {key} defined multiple times in {target}")]
    DuplicateLocaleKey {
        /// Message id.
        key: String,
        /// Target locale file.
        target: String,
    },

    /// An icon whose width and height differ.
    #[error("{file} size is {width}x{height}, icon should be square")]
    NonSquareIcon {
        /// Icon path inside the package.
        file: String,
        /// Pixel width.
        width: u32,
        /// Pixel height.
        height: u32,
    },

    /// No build number could be derived from version control.
    #[error("could not determine build number, using 0: {reason}")]
    MissingBuildNumber {
        /// Why the lookup failed.
        reason: String,
    },
}

/// A locale import source that could not be read or parsed.
///
/// Only that file's contribution is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error importing locale data from {}: {reason}", .file.display())]
pub struct ImportFailure {
    /// The source file that failed.
    pub file: PathBuf,
    /// Human readable reason.
    pub reason: String,
}

/// Collected warnings and import failures of one build.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    import_failures: Vec<ImportFailure>,
}

impl Diagnostics {
    /// Records and logs a warning.
    pub fn warn(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Records and logs a skipped locale import.
    pub fn import_failed(&mut self, file: impl Into<PathBuf>, reason: impl fmt::Display) {
        let failure = ImportFailure {
            file: file.into(),
            reason: reason.to_string(),
        };
        log::warn!("{failure}");
        self.import_failures.push(failure);
    }

    /// Warnings in the order they were raised.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Skipped locale imports in the order they happened.
    pub fn import_failures(&self) -> &[ImportFailure] {
        &self.import_failures
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.import_failures.is_empty()
    }
}
