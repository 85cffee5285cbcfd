//! Built-in configuration layers and default value functions.
//!
//! The embedded YAML documents form the bottom layers of every
//! [`ConfigStore`](crate::ConfigStore): `config.yaml` first, then the default
//! theme. The free functions are used as `#[serde(default = "...")]`
//! attributes on [`Settings`](crate::Settings) fields, so a key that a user
//! deletes from every layer still has a sane value.

use crate::error::ConfigError;
use crate::tree::ConfigStore;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Embedded base configuration.
pub const CONFIG_DOCUMENT: &str = include_str!("config.yaml");

/// Embedded default theme.
pub const DEFAULT_THEME_DOCUMENT: &str = include_str!("default.theme");

/// Embedded theme for light backgrounds.
pub const LIGHT_THEME_DOCUMENT: &str = include_str!("light.theme");

/// Name of the theme that is always loaded first.
pub const DEFAULT_THEME: &str = "default";

/// Look up an embedded theme document by name.
pub fn builtin_theme(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "default" => Some(DEFAULT_THEME_DOCUMENT),
        "light" => Some(LIGHT_THEME_DOCUMENT),
        _ => None,
    }
}

/// Names of the themes compiled into the binary.
pub fn builtin_theme_names() -> &'static [&'static str] {
    &["default", "light"]
}

/// Build the bottom layer: embedded config plus the computed `log_file`.
pub fn builtin_store() -> Result<ConfigStore, ConfigError> {
    let mut store = ConfigStore::new();
    store.set("log_file", Value::String(log_file().display().to_string()));
    store.merge(parse_document(CONFIG_DOCUMENT, Path::new("builtin:config.yaml"))?);
    Ok(store)
}

/// Parse a YAML (or JSON) document into a top-level mapping.
///
/// `origin` is only used for error messages.
pub fn parse_document(contents: &str, origin: &Path) -> Result<Map<String, Value>, ConfigError> {
    let value: Value = serde_yaml_ng::from_str(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        // An empty document is a valid, empty layer.
        Value::Null => Ok(Map::new()),
        _ => Err(ConfigError::NotAMapping {
            path: origin.to_path_buf(),
        }),
    }
}

// ── Settings defaults ───────────────────────────────────────────────────────

pub fn log_file() -> PathBuf {
    std::env::temp_dir().join("par_dump.log")
}

pub fn line_endings() -> String {
    "LF".to_string()
}

pub fn output() -> String {
    "file".to_string()
}

pub fn output_encoding() -> String {
    "UTF-8".to_string()
}

pub fn use_colors() -> bool {
    true
}

pub fn indent() -> usize {
    4
}

pub fn string_cap() -> usize {
    100
}

pub fn string_format() -> String {
    "\"%s\"".to_string()
}

pub fn label_format() -> String {
    "%s".to_string()
}

pub fn label_token() -> String {
    ".dump".to_string()
}

pub fn print_timestamp() -> bool {
    true
}

pub fn timestamp_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

pub fn ascii_notation() -> String {
    "caret".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_documents_parse() {
        for (name, doc) in [
            ("config.yaml", CONFIG_DOCUMENT),
            ("default.theme", DEFAULT_THEME_DOCUMENT),
            ("light.theme", LIGHT_THEME_DOCUMENT),
        ] {
            let parsed = parse_document(doc, Path::new(name));
            assert!(parsed.is_ok(), "{name} should parse: {parsed:?}");
        }
    }

    #[test]
    fn test_builtin_store_has_log_file() {
        let store = builtin_store().expect("builtin store");
        assert!(store.get_string("log_file").is_some_and(|p| !p.is_empty()));
        assert_eq!(store.get_string("line_endings").as_deref(), Some("LF"));
        assert_eq!(store.get_usize("indent"), Some(4));
    }

    #[test]
    fn test_parse_document_rejects_scalars() {
        let err = parse_document("just a string", Path::new("x.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping { .. }));
    }

    #[test]
    fn test_parse_document_accepts_json() {
        let map = parse_document(r#"{"indent": 2, "theme": "light"}"#, Path::new("x.json"))
            .expect("json is valid yaml");
        assert_eq!(map.get("indent"), Some(&Value::from(2)));
    }

    #[test]
    fn test_builtin_theme_lookup() {
        assert!(builtin_theme("Default").is_some());
        assert!(builtin_theme("light").is_some());
        assert!(builtin_theme("neon").is_none());
        for name in builtin_theme_names() {
            assert!(builtin_theme(name).is_some(), "{name} has no document");
        }
    }
}
