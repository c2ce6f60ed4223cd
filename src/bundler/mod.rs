//! Browser extension packaging engine.
//!
//! Turns an extension source tree plus its `metadata.<platform>.toml` into a
//! store-ready package for Chrome, Gecko or Edge, or into an unpacked
//! development build.
//!
//! # Example
//!
//! ```no_run
//! use webext_bundler::bundler::{Bundler, Platform, SettingsBuilder};
//!
//! # async fn example() -> webext_bundler::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .base_dir("adblockpluschrome")
//!     .platform(Platform::Gecko)
//!     .release(true)
//!     .build()?;
//!
//! let report = Bundler::new(settings)?.build().await?;
//! for warning in report.diagnostics.warnings() {
//!     println!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
mod builder;
pub mod diagnostics;
pub mod error;
pub mod files;
pub mod locales;
pub mod manifest;
pub mod modules;
pub mod preprocess;
mod settings;
pub mod signing;
pub mod templates;
pub mod utils;

pub use builder::{
    BuildReport, BuildStage, Bundler, DEVENV_VERSION_FILE, TEST_PAGE_FILE, build_version,
    calculate_sha256, default_output_path, devenv_directory, sha256_hex,
};
pub use diagnostics::{Diagnostics, ImportFailure, Warning};
pub use error::{Context, Error, ErrorExt, Result};
pub use files::{FileCollection, InclusionRules};
pub use locales::DuplicatePolicy;
pub use settings::{Platform, Settings, SettingsBuilder};
pub use signing::{NoopSigner, PackageSignature, RsaSigner, Signer};
