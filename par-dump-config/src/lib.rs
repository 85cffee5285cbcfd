//! Configuration system for the par-dump value inspector.
//!
//! This crate provides the policy layer every dump reads from:
//!
//! - [`ConfigStore`]: nested key/value tree addressed by `/`-delimited paths
//! - [`ConfigLoader`]: layered loading (defaults, config, local, themes, overrides)
//! - [`Settings`]: typed, validated snapshot of the formatting policy
//! - [`ThemeResolver`]: semantic tag to ANSI color resolution

pub mod defaults;
pub mod error;
pub mod loader;
pub mod settings;
pub mod themes;
pub mod tree;

pub use error::ConfigError;
pub use loader::{ConfigLoader, config_dir};
pub use settings::{AsciiNotation, LineEnding, OutputMode, Settings, Template};
pub use themes::{ColorEntry, FOREGROUND_RESET, FULL_RESET, ThemeResolver};
pub use tree::ConfigStore;
