//! Directive resolution for flagged source files.
//!
//! Files listed in `[preprocess]` are treated as templates and rendered with
//! the build parameters, e.g. `{{#if isChrome}}...{{/if}}` blocks.

use crate::bundler::{
    error::{Error, Result},
    files::FileCollection,
};
use handlebars::Handlebars;
use serde_json::Value;

/// Resolves conditional directives in one file.
pub trait Preprocessor: Send + Sync {
    /// Returns `text` with every directive resolved against `params`.
    fn process(&self, path: &str, text: &str, params: &Value) -> Result<String>;
}

/// Handlebars based [`Preprocessor`]. Output is not escaped.
#[derive(Debug, Clone)]
pub struct HandlebarsPreprocessor {
    registry: Handlebars<'static>,
}

impl Default for HandlebarsPreprocessor {
    fn default() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }
}

impl Preprocessor for HandlebarsPreprocessor {
    fn process(&self, path: &str, text: &str, params: &Value) -> Result<String> {
        self.registry
            .render_template(text, params)
            .map_err(|e| Error::TemplateError(format!("preprocessing {path}: {e}")))
    }
}

/// Runs `preprocessor` over each of `paths` in the collection.
///
/// Every listed file must be part of the package.
pub fn preprocess_files(
    preprocessor: &dyn Preprocessor,
    files: &mut FileCollection,
    paths: &[String],
    params: &Value,
) -> Result<()> {
    for path in paths {
        let text = files.text(path)?.ok_or_else(|| {
            Error::Configuration(format!("preprocess lists {path}, which is not in the package"))
        })?;
        let processed = preprocessor.process(path, text, params)?;
        log::debug!("Preprocessed {}", path);
        files.set(path, processed);
    }
    Ok(())
}
