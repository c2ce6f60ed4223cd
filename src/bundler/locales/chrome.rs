use super::{DEFAULT_LOCALE, FIELD_LIMITS, messages_path};
use crate::bundler::{
    error::{Error, Result},
    files::FileCollection,
    manifest::MANIFEST_FILE,
    utils::json::to_canonical_bytes,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, sync::LazyLock};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__MSG_(\S+)__").expect("valid placeholder regex"));

static LOCALE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_locales/(?:es_(AR|CL|(MX))|[^/]+)/(.*)").expect("valid locale path regex"));

/// Shortens `text` to at most `limit` characters, ending in `…`.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(limit.saturating_sub(1)).collect();
    shortened.truncate(shortened.trim_end().len());
    shortened.push('…');
    shortened
}

/// Applies the Chrome Web Store locale rules to the package.
///
/// Every message referenced from `manifest.json` must exist in the default
/// locale and is copied into each other locale lacking it. Messages used for
/// `name`, `description` and `short_name` are truncated to the store limits.
/// `es_AR` and `es_CL` are dropped and `es_MX` becomes `es_419`.
pub fn fix_translations_for_chrome(files: &mut FileCollection) -> Result<()> {
    let manifest_text = files
        .text(MANIFEST_FILE)?
        .ok_or_else(|| Error::ManifestIntegrity(format!("{MANIFEST_FILE} is missing")))?
        .to_string();

    let defaults = manifest_defaults(files, &manifest_text)?;
    let limits = field_limits(&manifest_text)?;

    let paths: Vec<String> = files.paths().map(str::to_string).collect();
    for path in paths {
        let Some(captures) = LOCALE_PATH.captures(&path) else {
            continue;
        };
        let is_latam = captures.get(1).is_some();
        let is_mexican = captures.get(2).is_some();
        let filename = captures.get(3).map_or("", |m| m.as_str()).to_string();

        if filename == "messages.json" {
            let mut data: Map<String, Value> = match files.get(&path) {
                Some(bytes) => serde_json::from_slice(bytes)?,
                None => Map::new(),
            };
            for (name, info) in &defaults {
                data.entry(name.clone()).or_insert_with(|| info.clone());
            }
            for (name, limit) in &limits {
                if let Some(message) = data
                    .get_mut(name)
                    .and_then(|info| info.get_mut("message"))
                    .filter(|message| message.is_string())
                {
                    let text = message.as_str().unwrap_or_default();
                    *message = Value::String(truncate(text, *limit));
                }
            }
            files.set(&path, to_canonical_bytes(&Value::Object(data))?);
        }

        if is_latam {
            let content = files.remove_or(&path, Vec::new());
            if is_mexican {
                log::debug!("Moving {} to es_419", path);
                files.set(format!("_locales/es_419/{filename}"), content);
            } else {
                log::debug!("Dropping {}", path);
            }
        }
    }
    Ok(())
}

/// Default-locale messages of every placeholder in the manifest.
fn manifest_defaults(files: &FileCollection, manifest: &str) -> Result<BTreeMap<String, Value>> {
    let default_path = messages_path(DEFAULT_LOCALE);
    let mut defaults = BTreeMap::new();
    let mut messages: Option<Map<String, Value>> = None;

    for captures in PLACEHOLDER.captures_iter(manifest) {
        let name = &captures[1];
        if messages.is_none() {
            let bytes = files.get(&default_path).ok_or_else(|| {
                Error::ManifestIntegrity(format!(
                    "{MANIFEST_FILE} references {name} but {default_path} is missing"
                ))
            })?;
            messages = Some(serde_json::from_slice(bytes)?);
        }
        let info = messages
            .as_ref()
            .and_then(|m| m.get(name))
            .ok_or_else(|| {
                Error::ManifestIntegrity(format!(
                    "{MANIFEST_FILE} references {name}, which is not defined in {default_path}"
                ))
            })?;
        defaults.insert(name.to_string(), info.clone());
    }
    Ok(defaults)
}

/// Message id → length limit for manifest fields that use a placeholder.
fn field_limits(manifest: &str) -> Result<Vec<(String, usize)>> {
    let manifest: Value = serde_json::from_str(manifest)?;
    Ok(FIELD_LIMITS
        .iter()
        .filter_map(|(field, limit)| {
            let value = manifest.get(field)?.as_str()?;
            let captures = PLACEHOLDER.captures(value)?;
            Some((captures[1].to_string(), *limit))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::files::InclusionRules;
    use serde_json::json;

    fn package(manifest: Value) -> FileCollection {
        let mut files = FileCollection::new(InclusionRules::new(
            ["_locales", "manifest.json"],
            Vec::<String>::new(),
        ));
        files.set(MANIFEST_FILE, serde_json::to_string_pretty(&manifest).unwrap());
        files.set(
            messages_path("en_US"),
            json!({
                "name": {"message": "Adblock Plus"},
                "description": {"message": "x".repeat(200)},
            })
            .to_string(),
        );
        files
    }

    fn messages(files: &FileCollection, locale: &str) -> Value {
        serde_json::from_slice(files.get(&messages_path(locale)).unwrap()).unwrap()
    }

    #[test]
    fn truncates_by_characters() {
        assert_eq!(truncate("short", 12), "short");
        assert_eq!(truncate("Bloqueur de publicités", 12), "Bloqueur de…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn defaults_are_copied_and_description_truncated() {
        let mut files = package(json!({
            "name": "__MSG_name__",
            "description": "__MSG_description__",
        }));
        files.set(messages_path("de"), r#"{"name": {"message": "Werbeblocker"}}"#);

        fix_translations_for_chrome(&mut files).unwrap();

        let de = messages(&files, "de");
        assert_eq!(de["name"]["message"], "Werbeblocker");
        let description = de["description"]["message"].as_str().unwrap();
        assert_eq!(description.chars().count(), 132);
        assert!(description.ends_with('…'));
        assert_eq!(
            messages(&files, "en_US")["description"]["message"]
                .as_str()
                .unwrap()
                .chars()
                .count(),
            132
        );
    }

    #[test]
    fn latin_american_spanish_is_folded() {
        let mut files = package(json!({"name": "__MSG_name__"}));
        files.set(messages_path("es_AR"), "{}");
        files.set(messages_path("es_CL"), "{}");
        files.set(messages_path("es_MX"), r#"{"name": {"message": "Bloqueador"}}"#);

        fix_translations_for_chrome(&mut files).unwrap();

        assert!(!files.contains(&messages_path("es_AR")));
        assert!(!files.contains(&messages_path("es_CL")));
        assert!(!files.contains(&messages_path("es_MX")));
        assert_eq!(messages(&files, "es_419")["name"]["message"], "Bloqueador");
    }

    #[test]
    fn undefined_placeholder_is_an_integrity_error() {
        let mut files = package(json!({"name": "__MSG_name__", "short_name": "__MSG_short__"}));
        let err = fix_translations_for_chrome(&mut files).unwrap_err();
        assert!(matches!(err, Error::ManifestIntegrity(ref m) if m.contains("short")));
    }
}
