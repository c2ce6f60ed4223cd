//! Browser extension packaging library
//!
//! This library turns an extension source tree into:
//! - Chrome packages (.zip, or signed .crx)
//! - Gecko packages (.xpi)
//! - Edge packages (.appx)
//! - Unpacked development builds with live reload
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
