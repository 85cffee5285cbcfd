//! Layered configuration loading.
//!
//! Layers are merged key by key in this order, later layers winning:
//!
//! 1. Built-in defaults (embedded `config.yaml` plus a computed `log_file`)
//! 2. `config.yaml` from the config directory
//! 3. `local.yaml` from the config directory
//! 4. The default theme (embedded, then `default.theme` on disk if present)
//! 5. The selected theme when it is not `default` (`<name>.theme` on disk,
//!    else a built-in theme of that name)
//! 6. Programmatic overrides (CLI flags, tests)
//!
//! Missing documents are skipped. A document that exists but cannot be read
//! or parsed aborts loading.

use crate::defaults::{self, DEFAULT_THEME};
use crate::error::ConfigError;
use crate::tree::ConfigStore;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration document.
pub const CONFIG_FILE: &str = "config.yaml";

/// Machine-local overrides, meant to stay out of version control.
pub const LOCAL_FILE: &str = "local.yaml";

/// Extension of theme documents.
pub const THEME_EXTENSION: &str = "theme";

/// Environment variable that relocates the config directory.
pub const CONFIG_DIR_ENV: &str = "PAR_DUMP_CONFIG_DIR";

/// Get the configuration directory (XDG convention on all platforms but Windows).
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("par-dump")
        } else {
            PathBuf::from(".")
        }
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".config").join("par-dump")
        } else {
            PathBuf::from(".")
        }
    }
}

/// Builds a [`ConfigStore`] from the layered documents in a base directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_dir: PathBuf,
    overrides: Vec<(String, Value)>,
}

impl ConfigLoader {
    /// Loader reading documents from `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            overrides: Vec::new(),
        }
    }

    /// Loader reading from [`config_dir`].
    pub fn from_default_dir() -> Self {
        Self::new(config_dir())
    }

    /// Add an override applied after every document.
    ///
    /// Overriding `theme` also changes which theme document is loaded.
    pub fn with_override(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.push((path.into(), value.into()));
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Load every layer and return the merged store.
    pub fn load(&self) -> Result<ConfigStore, ConfigError> {
        log::info!("Loading config from {:?}", self.base_dir);

        let mut store = defaults::builtin_store()?;

        for name in [CONFIG_FILE, LOCAL_FILE] {
            if let Some(layer) = load_document(&self.base_dir.join(name))? {
                store.merge(layer);
            }
        }

        let theme = self
            .theme_override()
            .or_else(|| store.get_string("theme"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        self.merge_theme(&mut store, DEFAULT_THEME)?;
        if let Some(theme) = theme.as_deref()
            && theme != DEFAULT_THEME
        {
            self.merge_theme(&mut store, theme)?;
        }

        for (path, value) in &self.overrides {
            store.set(path, value.clone());
        }

        Ok(store)
    }

    fn theme_override(&self) -> Option<String> {
        self.overrides
            .iter()
            .rev()
            .find(|(path, _)| path == "theme")
            .and_then(|(_, value)| value.as_str().map(str::to_string))
    }

    /// Merge the built-in theme of this name, then the on-disk one.
    fn merge_theme(&self, store: &mut ConfigStore, name: &str) -> Result<(), ConfigError> {
        let mut found = false;

        if let Some(document) = defaults::builtin_theme(name) {
            let origin = PathBuf::from(format!("builtin:{name}.{THEME_EXTENSION}"));
            store.merge(defaults::parse_document(document, &origin)?);
            found = true;
        }

        let path = self.base_dir.join(format!("{name}.{THEME_EXTENSION}"));
        if let Some(layer) = load_document(&path)? {
            store.merge(layer);
            found = true;
        }

        if !found {
            log::warn!(
                "Theme `{name}` not found in {:?} or built-ins ({})",
                self.base_dir,
                defaults::builtin_theme_names().join(", ")
            );
        }
        Ok(())
    }
}

/// Read and parse one document; `Ok(None)` when it does not exist.
pub fn load_document(path: &Path) -> Result<Option<Map<String, Value>>, ConfigError> {
    if !path.exists() {
        log::debug!("Config layer {:?} not present, skipping", path);
        return Ok(None);
    }

    log::info!("Loading config layer {:?}", path);
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    defaults::parse_document(&contents, path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).expect("Failed to write config layer");
    }

    #[test]
    fn test_empty_dir_yields_builtins() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ConfigLoader::new(temp_dir.path()).load().expect("load");

        assert_eq!(store.get_usize("indent"), Some(4));
        assert_eq!(
            store.get_string("theme_colors/dump_string").as_deref(),
            Some("208")
        );
    }

    #[test]
    fn test_local_overrides_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, CONFIG_FILE, "indent: 2\nstring_cap: 20\n");
        write(&temp_dir, LOCAL_FILE, "indent: 8\n");

        let store = ConfigLoader::new(temp_dir.path()).load().expect("load");
        assert_eq!(store.get_usize("indent"), Some(8));
        assert_eq!(store.get_usize("string_cap"), Some(20));
    }

    #[test]
    fn test_selected_theme_overrides_default_key_by_key() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, CONFIG_FILE, "theme: ocean\n");
        write(&temp_dir, "ocean.theme", "theme_colors:\n  dump_int: \"033\"\n");

        let store = ConfigLoader::new(temp_dir.path()).load().expect("load");
        assert_eq!(store.get_string("theme_colors/dump_int").as_deref(), Some("033"));
        // Untouched tags still come from the default theme.
        assert_eq!(
            store.get_string("theme_colors/dump_string").as_deref(),
            Some("208")
        );
    }

    #[test]
    fn test_builtin_light_theme() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ConfigLoader::new(temp_dir.path())
            .with_override("theme", "light")
            .load()
            .expect("load");
        assert_eq!(store.get_string("theme_colors/dump_string").as_deref(), Some("166"));
    }

    #[test]
    fn test_overrides_win() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, LOCAL_FILE, "use_colors: true\n");

        let store = ConfigLoader::new(temp_dir.path())
            .with_override("use_colors", false)
            .load()
            .expect("load");
        assert_eq!(store.get("use_colors"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn test_invalid_document_is_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, CONFIG_FILE, "indent: [unclosed\n");

        let result = ConfigLoader::new(temp_dir.path()).load();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_theme_is_not_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, CONFIG_FILE, "theme: nowhere\n");
        assert!(ConfigLoader::new(temp_dir.path()).load().is_ok());
    }
}
