//! Error types for packaging operations.
//!
//! Every fatal condition of a build maps onto one [`Error`] variant. Non-fatal
//! conditions (duplicate locale keys, non-square icons, unreadable locale
//! import sources) never surface here; they are collected in
//! [`Diagnostics`](crate::bundler::Diagnostics) instead.

use std::{fmt::Display, path::PathBuf};
use thiserror::Error as ThisError;

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the packaging engine.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Free-form failure, mostly produced by [`bail!`](crate::bail) and [`Context`].
    #[error("{0}")]
    GenericError(String),

    /// Raw I/O failure without path information.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// I/O failure on a known path.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What the bundler was doing when the failure happened.
        context: &'static str,
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Template registration or rendering failure.
    #[error("template error: {0}")]
    TemplateError(String),

    /// Icon could not be decoded.
    #[error("image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Archive serialization failure.
    #[error("archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Signing key could not be loaded, generated, persisted or used.
    #[error("signing key error: {0}")]
    KeyError(String),

    /// Build metadata references something that does not exist or is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A manifest message placeholder has no value in the default locale.
    #[error("manifest integrity error: {0}")]
    ManifestIntegrity(String),

    /// Invalid glob pattern in `import_locales`.
    #[error("invalid glob pattern: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

impl From<handlebars::RenderError> for Error {
    fn from(error: handlebars::RenderError) -> Self {
        Error::TemplateError(error.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(error: handlebars::TemplateError) -> Self {
        Error::TemplateError(error.to_string())
    }
}

/// Attaches path context to I/O results.
pub trait ErrorExt<T> {
    /// Converts an I/O error into [`Error::Fs`] describing the operation and path.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Adds a human readable context message to fallible values.
pub trait Context<T> {
    /// Wraps the failure (or absence) with `context`.
    fn context<C: Display>(self, context: C) -> Result<T>;

    /// Like [`Context::context`] but evaluates the message lazily.
    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)).into())
    };
}
