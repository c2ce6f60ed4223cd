//! Build orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that turns an
//! extension source directory into a package for one platform.
//!
//! # Overview
//!
//! The bundler:
//! 1. Reads build metadata for the platform from [`Settings`](crate::bundler::Settings)
//! 2. Collects package files and runs the transformation stages
//! 3. Serializes, optionally signs and writes the package
//! 4. Returns a [`BuildReport`] with checksum and diagnostics
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA-256 checksums of written packages
//! - [`orchestrator`] - Main [`Bundler`] struct and the build pipeline
//! - [`tool_detection`] - Locating `git` for build numbers
//! - [`version`] - Build versions and default output paths

mod checksum;
mod orchestrator;
mod tool_detection;
mod version;

pub use checksum::{calculate_sha256, sha256_hex};
pub use orchestrator::{Bundler, DEVENV_VERSION_FILE, TEST_PAGE_FILE};
pub use version::{build_version, default_output_path, devenv_directory};

use crate::bundler::{Platform, diagnostics::Diagnostics};
use std::path::PathBuf;

/// Pipeline stages in execution order. Stages a build does not need are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    MetadataLoaded,
    FilesCollected,
    ModulesConverted,
    Preprocessed,
    LocalesImported,
    ManifestGenerated,
    PlatformFixedUp,
    DevExtrasInjected,
    Serialized,
    Signed,
    Written,
}

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Target platform.
    pub platform: Platform,
    /// Version written into the manifest.
    pub version: String,
    /// Package file, or directory for development builds.
    pub output: PathBuf,
    /// Stages that ran.
    pub stages: Vec<BuildStage>,
    /// Warnings and skipped imports.
    pub diagnostics: Diagnostics,
    /// Hex encoded SHA-256 of the output.
    pub checksum: String,
    /// Output size in bytes.
    pub size: u64,
    /// Chrome extension id of signed packages.
    pub extension_id: Option<String>,
}
