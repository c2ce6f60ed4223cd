use super::{DuplicatePolicy, messages_path};
use crate::{
    bundler::{
        diagnostics::{Diagnostics, Warning},
        error::{Error, Result},
        files::FileCollection,
        utils::json::to_canonical_bytes,
    },
    metadata::MetadataItem,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Imports locale messages declared in `[import_locales]`.
///
/// Each option name is a glob relative to the metadata file that defined it;
/// the parent directory of every match names its locale. The option value
/// lists the message ids to import, or `*` for every id not starting with
/// `_`. Sources that cannot be read or parsed are recorded in `diagnostics`
/// and contribute nothing. A glob without any match is a configuration error.
pub async fn import_locales(
    items: &[MetadataItem],
    files: &mut FileCollection,
    policy: DuplicatePolicy,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    for item in items {
        let sources = expand(item, diagnostics)?;
        if sources.is_empty() {
            return Err(Error::Configuration(format!(
                "import_locales pattern {} matches no files",
                item.name()
            )));
        }

        for source in sources {
            let Some(locale) = source
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
            else {
                continue;
            };
            let target = messages_path(&locale);
            let mut data = load_target(files, &target)?;

            match read_source(&source).await {
                Ok(source_data) => {
                    let keys = if item.value().trim() == "*" {
                        source_data
                            .keys()
                            .filter(|key| !key.starts_with('_'))
                            .cloned()
                            .collect()
                    } else {
                        item.values()
                    };
                    merge(&mut data, &source_data, &keys, &target, policy, diagnostics);
                }
                Err(reason) => diagnostics.import_failed(&source, reason),
            }

            log::debug!("Imported locale data from {} into {}", source.display(), target);
            files.set(&target, to_canonical_bytes(&Value::Object(data))?);
        }
    }
    Ok(())
}

/// Matches of one import glob, sorted. Unreadable directories are recorded
/// as import failures.
fn expand(item: &MetadataItem, diagnostics: &mut Diagnostics) -> Result<Vec<PathBuf>> {
    let root = glob::Pattern::escape(&item.origin_dir().to_string_lossy());
    let pattern = if root.is_empty() {
        item.name().to_string()
    } else {
        format!("{root}/{}", item.name())
    };

    let mut sources = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => sources.push(path),
            Ok(_) => {}
            Err(e) => diagnostics.import_failed(e.path(), e.error()),
        }
    }
    sources.sort();
    Ok(sources)
}

/// Existing messages of `target`, or an empty set.
fn load_target(files: &FileCollection, target: &str) -> Result<Map<String, Value>> {
    match files.get(target) {
        None => Ok(Map::new()),
        Some(bytes) => match serde_json::from_slice(bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Configuration(format!("{target} is not a JSON object"))),
        },
    }
}

async fn read_source(path: &Path) -> std::result::Result<Map<String, Value>, String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())?;
    match serde_json::from_str(&text).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        _ => Err("not a JSON object".to_string()),
    }
}

fn merge(
    data: &mut Map<String, Value>,
    source: &Map<String, Value>,
    keys: &[String],
    target: &str,
    policy: DuplicatePolicy,
    diagnostics: &mut Diagnostics,
) {
    for key in keys {
        let Some(value) = source.get(key) else {
            continue;
        };
        if data.contains_key(key) {
            diagnostics.warn(Warning::DuplicateLocaleKey {
                key: key.clone(),
                target: target.to_string(),
            });
            if policy == DuplicatePolicy::FirstWins {
                continue;
            }
        }
        data.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::files::InclusionRules;
    use serde_json::json;
    use std::fs;

    struct Fixture {
        dir: tempfile::TempDir,
        files: FileCollection,
        diagnostics: Diagnostics,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                files: FileCollection::new(InclusionRules::new(["_locales"], Vec::<String>::new())),
                diagnostics: Diagnostics::default(),
            }
        }

        fn source(&self, relpath: &str, content: &str) {
            let path = self.dir.path().join(relpath);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn item(&self, pattern: &str, keys: &str) -> MetadataItem {
            MetadataItem::new(pattern, keys, self.dir.path().join("metadata.chrome.toml"))
        }

        fn messages(&self, locale: &str) -> Value {
            serde_json::from_slice(self.files.get(&messages_path(locale)).unwrap()).unwrap()
        }
    }

    #[tokio::test]
    async fn wildcard_skips_underscore_keys() {
        let mut fx = Fixture::new();
        fx.source(
            "translations/de/strings.json",
            r#"{"a": {"message": "A"}, "_comment": {"message": "internal"}}"#,
        );
        let items = vec![fx.item("translations/*/strings.json", "*")];

        import_locales(&items, &mut fx.files, DuplicatePolicy::default(), &mut fx.diagnostics)
            .await
            .unwrap();

        assert_eq!(fx.messages("de"), json!({"a": {"message": "A"}}));
        assert!(fx.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn reimport_is_idempotent_apart_from_warnings() {
        let mut fx = Fixture::new();
        fx.source("translations/fr/strings.json", r#"{"a": {"message": "A"}, "b": {"message": "B"}}"#);
        let items = vec![fx.item("translations/*/strings.json", "a b missing")];

        import_locales(&items, &mut fx.files, DuplicatePolicy::default(), &mut fx.diagnostics)
            .await
            .unwrap();
        let first = fx.files.get(&messages_path("fr")).unwrap().to_vec();
        import_locales(&items, &mut fx.files, DuplicatePolicy::default(), &mut fx.diagnostics)
            .await
            .unwrap();

        assert_eq!(fx.files.get(&messages_path("fr")).unwrap(), first.as_slice());
        assert_eq!(fx.diagnostics.warnings().len(), 2);
        assert!(String::from_utf8(first).unwrap().ends_with("}\n"));
    }

    #[tokio::test]
    async fn duplicate_policy_selects_surviving_value() {
        for (policy, expected) in [
            (DuplicatePolicy::LastWins, "imported"),
            (DuplicatePolicy::FirstWins, "existing"),
        ] {
            let mut fx = Fixture::new();
            fx.files
                .set(messages_path("de"), r#"{"a": {"message": "existing"}}"#);
            fx.source("translations/de/strings.json", r#"{"a": {"message": "imported"}}"#);
            let items = vec![fx.item("translations/*/strings.json", "a")];

            import_locales(&items, &mut fx.files, policy, &mut fx.diagnostics)
                .await
                .unwrap();

            assert_eq!(fx.messages("de")["a"]["message"], expected);
            assert!(matches!(
                fx.diagnostics.warnings(),
                [Warning::DuplicateLocaleKey { key, .. }] if key == "a"
            ));
        }
    }

    #[tokio::test]
    async fn unparsable_source_is_skipped_and_recorded() {
        let mut fx = Fixture::new();
        fx.source("translations/de/strings.json", r#"{"a": {"message": "A"}}"#);
        fx.source("translations/it/strings.json", "{ not json");
        let items = vec![fx.item("translations/*/strings.json", "*")];

        import_locales(&items, &mut fx.files, DuplicatePolicy::default(), &mut fx.diagnostics)
            .await
            .unwrap();

        assert_eq!(fx.messages("de"), json!({"a": {"message": "A"}}));
        assert_eq!(fx.messages("it"), json!({}));
        let failures = fx.diagnostics.import_failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].file.ends_with("translations/it/strings.json"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_locale_directory_is_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let mut fx = Fixture::new();
        fx.source("translations/de/strings.json", r#"{"a": {"message": "A"}}"#);
        fx.source("translations/it/strings.json", r#"{"a": {"message": "B"}}"#);
        let locked = fx.dir.path().join("translations/it");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Privileged users bypass directory permissions.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let items = vec![fx.item("translations/*/*.json", "*")];

        let result =
            import_locales(&items, &mut fx.files, DuplicatePolicy::default(), &mut fx.diagnostics)
                .await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        result.unwrap();
        assert_eq!(fx.messages("de"), json!({"a": {"message": "A"}}));
        assert!(fx.files.get(&messages_path("it")).is_none());
        let failures = fx.diagnostics.import_failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].file.ends_with("translations/it"));
    }

    #[tokio::test]
    async fn unmatched_glob_is_a_configuration_error() {
        let mut fx = Fixture::new();
        let items = vec![fx.item("nowhere/*/strings.json", "*")];

        let err = import_locales(&items, &mut fx.files, DuplicatePolicy::default(), &mut fx.diagnostics)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
