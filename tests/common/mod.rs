//! Shared integration test helpers for par-dump.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{memory_dumper, output, plain_store};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers is used per file.

#![allow(dead_code)]

use par_dump::Dumper;
use par_dump::sink::MemoryBuffer;
use par_dump_config::defaults::builtin_store;
use par_dump_config::{ConfigLoader, ConfigStore};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Built-in configuration with colors off, so output can be compared as text.
pub fn plain_store() -> ConfigStore {
    let mut store = builtin_store().expect("Failed to build builtin store");
    store.set("use_colors", json!(false));
    store
}

/// Fully layered configuration (themes included) from an empty config dir.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub fn loaded_store() -> (ConfigStore, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = ConfigLoader::new(temp_dir.path())
        .load()
        .expect("Failed to load config");
    (store, temp_dir)
}

/// Dumper writing into memory.
pub fn memory_dumper(store: ConfigStore) -> (Dumper, MemoryBuffer) {
    Dumper::in_memory(store).expect("Failed to create dumper")
}

/// Everything written so far, as UTF-8.
pub fn output(buffer: &MemoryBuffer) -> String {
    String::from_utf8(buffer.lock().clone()).expect("Output is not UTF-8")
}

/// Write a config document into `dir`.
pub fn write_config(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).expect("Failed to write config document");
}
