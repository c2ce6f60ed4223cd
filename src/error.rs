//! Top-level error types of the command line tool.
//!
//! Packaging failures are [`crate::bundler::Error`]s; this module wraps them
//! together with argument errors and attaches recovery hints.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type of the command line tool
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Packaging errors
    #[error("Build failed: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Hints printed after the error message.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error;

        match self {
            BundlerError::Cli(_) => vec!["Run with --help to see the accepted arguments".to_string()],
            BundlerError::Bundler(Error::Configuration(_)) => vec![
                "Check the metadata.<platform>.toml file of the extension".to_string(),
                "Paths in convert_js, import_locales and mapping are relative to the metadata file that defines them".to_string(),
            ],
            BundlerError::Bundler(Error::ManifestIntegrity(_)) => vec![
                "Add the missing message to _locales/en_US/messages.json".to_string(),
            ],
            BundlerError::Bundler(Error::KeyError(_)) => vec![
                "The key file must be an RSA private key in PKCS#1 or PKCS#8 PEM format".to_string(),
            ],
            _ => vec!["Run with RUST_LOG=debug for details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_point_at_metadata() {
        let err = BundlerError::from(crate::bundler::Error::Configuration("x".into()));
        assert!(err.recovery_suggestions()[0].contains("metadata"));
        assert_eq!(err.to_string(), "Build failed: configuration error: x");
    }
}
