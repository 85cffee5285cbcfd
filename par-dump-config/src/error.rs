//! Typed error variants for the par-dump-config crate.
//!
//! Every variant here is a fatal initialization error: the inspector cannot
//! start without a readable configuration and a consistent formatting policy.
//! Rendering-time problems (unknown colour tags, odd values) never surface as
//! a `ConfigError`; they degrade to plain output instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use par_dump_config::ConfigError;
//!
//! fn describe(e: &ConfigError) -> &'static str {
//!     match e {
//!         ConfigError::Io { .. } => "unreadable document",
//!         ConfigError::Parse { .. } | ConfigError::NotAMapping { .. } => "malformed document",
//!         ConfigError::MissingLogFile => "no sink destination",
//!         ConfigError::UnknownLineEnding(_) => "bad line ending",
//!         ConfigError::Validation(_) => "invalid value",
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration document exists but could not be read.
    #[error("I/O error reading config {path:?}: {source}")]
    Io {
        /// Document that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration document contained invalid YAML/JSON.
    #[error("Invalid config document {path:?}: {source}")]
    Parse {
        /// Document that failed to parse. Embedded documents use a `builtin:` prefix.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// A configuration document parsed, but its top level is not a mapping.
    #[error("Config document {path:?} must contain a key/value mapping")]
    NotAMapping {
        /// Offending document.
        path: PathBuf,
    },

    /// `log_file` is absent or empty, so there is nowhere to write.
    #[error("No log file configured: set `log_file` to a writable path")]
    MissingLogFile,

    /// `line_endings` holds something other than LF, CR or CRLF.
    #[error("Unknown line ending: {0}")]
    UnknownLineEnding(String),

    /// A field value failed semantic validation.
    ///
    /// The inner string describes which field is invalid and why.
    #[error("Config validation error: {0}")]
    Validation(String),
}
