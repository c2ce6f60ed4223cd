//! Shared extension source tree for integration tests.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat};
use std::{
    fs,
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

pub const COMMON_METADATA: &str = r#"
[general]
basename = "abp"
version = "1.2.3"
icons = "icons/logo_16.png icons/logo_32.png"
browserAction = "icons/logo_16.png icons/logo_32.png popup.html"
backgroundScripts = "lib/foo.js ext/background.js"
testScripts = "ext/common.js ext/background.js"
appId = "abp@example.org"
minimumVersion = "50"

[contentScripts]
document_start = "ext/common.js include.preload.js"
document_end = ""

[convert_js]
"lib/foo.js" = "lib/b.js ext/a.js"
"lib/foo.js[autoload]" = "b"

[import_locales]
"_imp/*/strings.json" = "*"

[preprocess]
"ext/common.js" = ""

[mapping]
"ext/mapped.js" = "shared/mapped.js"
"#;

pub fn write(root: &Path, relpath: &str, content: impl AsRef<[u8]>) {
    let path = root.join(relpath);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::new_rgba8(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// A complete extension source tree with metadata for every platform.
pub fn source_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "metadata.common.toml", COMMON_METADATA);
    for platform in ["chrome", "gecko", "edge"] {
        write(
            root,
            &format!("metadata.{platform}.toml"),
            "inherit = \"metadata.common.toml\"\n\n[general]\npermissions = \"tabs storage\"\n",
        );
    }

    write(root, "bar.json", "{}");
    write(root, "popup.html", "<html></html>");
    write(root, "include.preload.js", "preload();");
    write(root, "README.md", "# not packaged");
    write(root, "tests/unit.js", "test();");

    write(root, "lib/b.js", "var foo;");
    write(root, "ext/a.js", "var bar;");
    write(root, "ext/background.js", "background();");
    write(
        root,
        "ext/common.js",
        "{{#if isChrome}}chrome();{{/if}}{{#if isGecko}}gecko();{{/if}}common();",
    );
    write(root, "ext/mapped.js", "original();");
    write(root, "shared/mapped.js", "mapped();");

    write(root, "icons/logo_16.png", png(16, 16));
    write(root, "icons/logo_32.png", png(32, 32));

    write(
        root,
        "_locales/en_US/messages.json",
        serde_json::json!({
            "name": {"message": "Adblock Plus"},
            "name_devbuild": {"message": "Adblock Plus (development)"},
            "description": {"message": "x".repeat(200)},
        })
        .to_string(),
    );
    write(root, "_locales/es_AR/messages.json", "{}");
    write(
        root,
        "_locales/es_MX/messages.json",
        r#"{"name": {"message": "Bloqueador"}}"#,
    );
    write(root, "_locales/de/store.description", "not packaged");
    write(
        root,
        "_imp/de/strings.json",
        r#"{"imported": {"message": "Importiert"}, "_note": {"message": "internal"}}"#,
    );

    dir
}

/// Copies the key fixture into `dir`.
pub fn key_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("chrome_rsa.pem");
    fs::copy(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/chrome_rsa.pem"),
        &path,
    )
    .unwrap();
    path
}

/// Opened ZIP archive from bytes.
pub fn archive(bytes: Vec<u8>) -> zip::ZipArchive<Cursor<Vec<u8>>> {
    zip::ZipArchive::new(Cursor::new(bytes)).unwrap()
}

pub fn entry_names(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>) -> Vec<String> {
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

pub fn read_entry(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

pub fn read_json(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> serde_json::Value {
    serde_json::from_str(&read_entry(archive, name)).unwrap()
}
