//! JavaScript module bundling (`[convert_js]`).
//!
//! Each `[convert_js]` option either defines the ordered inputs of an output
//! file (`"lib/foo.js" = "lib/b.js ext/a.js"`) or a named argument of that
//! output (`"lib/foo.js[autoload]" = "b"`). Inputs are registered under a
//! module name in the rendered bundle and removed from the package.

use crate::{
    bundler::{
        Platform,
        error::{Error, ErrorExt, Result},
        files::FileCollection,
        templates::{MODULES, Templates},
    },
    metadata::MetadataItem,
};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::{path::Path, sync::LazyLock};

/// Directory whose modules keep their bare name.
pub const LIBRARY_DIRECTORY: &str = "lib";

static OPTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(?:\[(.*)\])?$").expect("valid option name regex"));

/// One module inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Registry key.
    pub name: String,
    /// Module source text.
    pub source: String,
}

/// A rendered-to-be output file and its inputs.
#[derive(Debug, Clone, Default)]
pub struct ModuleBundle {
    /// Package path of the output.
    pub output: String,
    /// Modules in declaration order.
    pub modules: Vec<Module>,
    /// Modules required when the bundle loads.
    pub autoload: Vec<String>,
    /// Other named arguments, as written in the metadata.
    pub extra_args: Map<String, Value>,
}

impl ModuleBundle {
    /// Arguments as passed to the template (`args.autoload`, ...).
    fn args(&self) -> Value {
        let mut args = self.extra_args.clone();
        args.insert(
            "autoload".to_string(),
            Value::Array(self.autoload.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(args)
    }
}

#[derive(Serialize)]
struct BundleTemplateData<'a> {
    args: Value,
    basename: &'a str,
    modules: &'a [Module],
    #[serde(rename = "type")]
    platform: &'a str,
    version: &'a str,
}

/// Registry name of an input file.
///
/// The file stem, prefixed with `<parent>_` unless the parent directory is
/// the library directory, so that `lib/foo.js` and `ext/foo.js` do not clash.
pub fn module_name(input: &str) -> String {
    let path = Path::new(input);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = path
        .parent()
        .and_then(Path::file_name)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    if parent == LIBRARY_DIRECTORY {
        stem
    } else {
        format!("{parent}_{stem}")
    }
}

/// Splits `lib/foo.js[autoload]` into `("lib/foo.js", Some("autoload"))`.
fn split_option_name(name: &str) -> (&str, Option<&str>) {
    match OPTION_NAME.captures(name) {
        Some(captures) => (
            captures.get(1).map_or(name, |m| m.as_str()),
            captures.get(2).map(|m| m.as_str()),
        ),
        None => (name, None),
    }
}

/// Renders `[convert_js]` bundles into the package.
pub struct ModuleBundler<'a> {
    templates: &'a Templates,
    basename: &'a str,
    version: &'a str,
    platform: Platform,
}

impl<'a> ModuleBundler<'a> {
    /// Creates a bundler rendering with `templates`.
    pub fn new(templates: &'a Templates, basename: &'a str, version: &'a str, platform: Platform) -> Self {
        Self {
            templates,
            basename,
            version,
            platform,
        }
    }

    /// Reads the inputs of every declared bundle and stores the rendered
    /// outputs in `files`. Returns the bundles that were written.
    ///
    /// An output inside a subdirectory that the package does not include is
    /// skipped, which lets platform metadata opt out of a bundle.
    pub async fn convert(
        &self,
        items: &[MetadataItem],
        files: &mut FileCollection,
    ) -> Result<Vec<ModuleBundle>> {
        let mut declared: Vec<(&MetadataItem, ModuleBundle)> = Vec::new();
        let mut arguments: Vec<(String, String, String)> = Vec::new();

        for item in items {
            let (output, arg) = split_option_name(item.name());
            match arg {
                None => match declared.iter_mut().find(|(_, b)| b.output == output) {
                    Some(existing) => existing.0 = item,
                    None => declared.push((
                        item,
                        ModuleBundle {
                            output: output.to_string(),
                            ..Default::default()
                        },
                    )),
                },
                Some(arg) => arguments.push((
                    output.to_string(),
                    arg.to_string(),
                    item.value().to_string(),
                )),
            }
        }

        let mut written = Vec::new();
        for (item, mut bundle) in declared {
            if bundle.output.contains('/') && !files.is_included(&bundle.output) {
                log::debug!("Skipping bundle {} excluded from this package", bundle.output);
                continue;
            }

            for (output, arg, value) in &arguments {
                if output != &bundle.output {
                    continue;
                }
                if arg == "autoload" {
                    bundle.autoload = value
                        .split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect();
                } else {
                    bundle
                        .extra_args
                        .insert(arg.clone(), Value::String(value.clone()));
                }
            }

            for input in item.values() {
                let path = item.resolve(&input);
                let is_file = tokio::fs::metadata(&path)
                    .await
                    .map(|metadata| metadata.is_file())
                    .unwrap_or(false);
                if !is_file {
                    return Err(Error::Configuration(format!(
                        "{} lists {input}, which does not exist at {}",
                        bundle.output,
                        path.display()
                    )));
                }
                let source = tokio::fs::read_to_string(&path)
                    .await
                    .fs_context("reading module source", &path)?;
                files.remove(&input);
                bundle.modules.push(Module {
                    name: module_name(&input),
                    source,
                });
            }

            let rendered = self.templates.render(
                MODULES,
                &BundleTemplateData {
                    args: bundle.args(),
                    basename: self.basename,
                    modules: &bundle.modules,
                    platform: self.platform.as_str(),
                    version: self.version,
                },
            )?;
            log::info!(
                "Bundled {} module(s) into {}",
                bundle.modules.len(),
                bundle.output
            );
            files.set(&bundle.output, rendered);
            written.push(bundle);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::files::InclusionRules;
    use std::fs;

    #[test]
    fn module_names_prefix_non_library_parents() {
        assert_eq!(module_name("lib/b.js"), "b");
        assert_eq!(module_name("ext/a.js"), "ext_a");
        assert_eq!(module_name("vendor/lib/c.js"), "c");
        assert_eq!(module_name("vendor/x/c.min.js"), "x_c.min");
    }

    #[test]
    fn option_names_split_trailing_argument() {
        assert_eq!(split_option_name("lib/foo.js"), ("lib/foo.js", None));
        assert_eq!(
            split_option_name("lib/foo.js[autoload]"),
            ("lib/foo.js", Some("autoload"))
        );
    }

    fn source_tree() -> (tempfile::TempDir, FileCollection) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::create_dir_all(dir.path().join("ext")).unwrap();
        fs::write(dir.path().join("lib/b.js"), "var foo;").unwrap();
        fs::write(dir.path().join("ext/a.js"), "var bar;").unwrap();

        let mut files = FileCollection::new(InclusionRules::new(["lib", "ext"], Vec::<String>::new()));
        files.set("lib/b.js", "var foo;");
        files.set("ext/a.js", "var bar;");
        (dir, files)
    }

    #[tokio::test]
    async fn bundles_inputs_and_removes_originals() {
        let (dir, mut files) = source_tree();
        let origin = dir.path().join("metadata.chrome.toml");
        let items = vec![
            MetadataItem::new("lib/foo.js", "lib/b.js ext/a.js", &origin),
            MetadataItem::new("lib/foo.js[autoload]", "b,,ext_a,", &origin),
        ];
        let templates = Templates::new().unwrap();

        let bundles = ModuleBundler::new(&templates, "abp", "1.2.3", Platform::Chrome)
            .convert(&items, &mut files)
            .await
            .unwrap();

        assert_eq!(bundles[0].autoload, vec!["b", "ext_a"]);
        assert!(!files.contains("lib/b.js"));
        assert!(!files.contains("ext/a.js"));
        let output = files.text("lib/foo.js").unwrap().unwrap();
        assert!(output.contains(r#"require.modules["b"]"#));
        assert!(output.contains(r#"require.modules["ext_a"]"#));
        assert!(output.contains("var foo;"));
        assert!(output.contains("var bar;"));
        assert!(output.contains(r#"require("ext_a");"#));
        assert!(output.find("var foo;").unwrap() < output.find("var bar;").unwrap());
    }

    #[tokio::test]
    async fn excluded_output_directory_skips_bundle() {
        let (dir, mut files) = source_tree();
        let origin = dir.path().join("metadata.gecko.toml");
        let items = vec![MetadataItem::new("skin/foo.js", "lib/b.js", &origin)];
        let templates = Templates::new().unwrap();

        let bundles = ModuleBundler::new(&templates, "abp", "1", Platform::Gecko)
            .convert(&items, &mut files)
            .await
            .unwrap();

        assert!(bundles.is_empty());
        assert!(files.contains("lib/b.js"));
        assert!(!files.contains("skin/foo.js"));
    }

    #[tokio::test]
    async fn missing_input_is_a_configuration_error() {
        let (dir, mut files) = source_tree();
        let origin = dir.path().join("metadata.chrome.toml");
        let items = vec![MetadataItem::new("lib/foo.js", "lib/missing.js", &origin)];
        let templates = Templates::new().unwrap();

        let err = ModuleBundler::new(&templates, "abp", "1", Platform::Chrome)
            .convert(&items, &mut files)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
