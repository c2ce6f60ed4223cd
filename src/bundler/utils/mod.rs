//! Shared filesystem and JSON helpers.

pub mod fs;
pub mod json;
