//! Localization message sets.
//!
//! Locale files live at `_locales/<lang>/messages.json` and map message ids
//! to `{"message": ..., "description": ..., "placeholders": ...}` objects.
//! [`import_locales`] merges messages from external sources into them;
//! [`fix_translations_for_chrome`] applies the Chrome Web Store rules.

mod chrome;
mod import;

pub use chrome::{fix_translations_for_chrome, truncate};
pub use import::import_locales;

/// Language whose messages back every placeholder in the manifest.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Store length limits of manifest fields that may reference a message.
pub const FIELD_LIMITS: &[(&str, usize)] = &[("name", 45), ("description", 132), ("short_name", 12)];

/// Package path of the message file of `locale`.
pub fn messages_path(locale: &str) -> String {
    format!("_locales/{locale}/messages.json")
}

/// Which value survives when an imported message id already exists.
///
/// A warning is raised either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicatePolicy {
    /// The imported value overwrites the existing one.
    #[default]
    LastWins,
    /// The existing value is kept.
    FirstWins,
}
