//! Configuration structures for build invocations.
//!
//! This module provides the per-build input record ([`Settings`]), its
//! builder, and the [`Platform`] enumeration.

mod builder;
mod core;
mod platform;

// Re-export all public types
pub use builder::SettingsBuilder;
pub use core::Settings;
pub use platform::Platform;
