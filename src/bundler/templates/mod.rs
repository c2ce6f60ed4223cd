//! Built-in templates and the Handlebars renderer.
//!
//! JSON and JavaScript templates use triple-stash expressions together with
//! the `json` helper, so values are JSON encoded rather than HTML escaped.
//! The test page uses regular (escaped) expressions.

use crate::bundler::error::Result;
use handlebars::{Handlebars, handlebars_helper};
use serde::Serialize;

/// Template for `manifest.json`.
pub const MANIFEST_TEMPLATE: &str = include_str!("manifest.json.hbs");

/// Template for bundled module files.
pub const MODULES_TEMPLATE: &str = include_str!("modules.js.hbs");

/// Template for the development test page `qunit/index.html`.
pub const TEST_INDEX_TEMPLATE: &str = include_str!("testIndex.html.hbs");

/// Live-reload helper injected into development builds.
pub const DEVENV_POLLER_SCRIPT: &str = include_str!("devenvPoller__.js");

/// Registered name of [`MANIFEST_TEMPLATE`].
pub const MANIFEST: &str = "manifest.json";

/// Registered name of [`MODULES_TEMPLATE`].
pub const MODULES: &str = "modules.js";

/// Registered name of [`TEST_INDEX_TEMPLATE`].
pub const TEST_INDEX: &str = "testIndex.html";

handlebars_helper!(json: |value: Json| serde_json::to_string(value).unwrap_or_default());

/// Template registry used by the packaging stages.
#[derive(Debug, Clone)]
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Registry with the built-in templates.
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_helper("json", Box::new(json));
        registry.register_template_string(MANIFEST, MANIFEST_TEMPLATE)?;
        registry.register_template_string(MODULES, MODULES_TEMPLATE)?;
        registry.register_template_string(TEST_INDEX, TEST_INDEX_TEMPLATE)?;
        Ok(Self { registry })
    }

    /// Replaces a registered template, e.g. with a project-specific manifest.
    pub fn register(&mut self, name: &str, template: &str) -> Result<()> {
        self.registry.register_template_string(name, template)?;
        Ok(())
    }

    /// Renders the template registered as `name`.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        Ok(self.registry.render(name, data)?)
    }
}
