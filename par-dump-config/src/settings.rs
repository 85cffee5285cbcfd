//! Typed, validated view of the formatting policy held in a [`ConfigStore`].
//!
//! The store stays the source of truth for path lookups (themes in particular
//! are resolved straight from it). `Settings` is the snapshot that the
//! formatter, sink and session read on every call, produced once at startup so
//! that malformed values fail fast instead of surfacing mid-dump.

use crate::defaults;
use crate::error::ConfigError;
use crate::tree::ConfigStore;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Line-ending style applied to everything written to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Cr,
    CrLf,
}

impl LineEnding {
    /// The literal line terminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::CrLf => "\r\n",
        }
    }
}

impl FromStr for LineEnding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LF" => Ok(LineEnding::Lf),
            "CR" => Ok(LineEnding::Cr),
            "CRLF" => Ok(LineEnding::CrLf),
            other => Err(ConfigError::UnknownLineEnding(other.to_string())),
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineEnding::Lf => "LF",
            LineEnding::Cr => "CR",
            LineEnding::CrLf => "CRLF",
        };
        f.write_str(name)
    }
}

/// Where rendered output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Append to `log_file`.
    #[default]
    File,
    /// Echo straight to stdout.
    Print,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "file" | "log" => Ok(OutputMode::File),
            "print" | "echo" | "stdout" => Ok(OutputMode::Print),
            other => Err(ConfigError::Validation(format!(
                "output must be `file` or `print`, got `{other}`"
            ))),
        }
    }
}

/// How control characters inside dumped strings are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsciiNotation {
    /// `^` followed by the character 64 above the control code (`^A`, `^[`).
    #[default]
    Caret,
    /// Conventional escape mnemonics from `escape_chars` (`\n`, `\t`), else `\?`.
    Escape,
}

impl FromStr for AsciiNotation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "caret" => Ok(AsciiNotation::Caret),
            "escape" => Ok(AsciiNotation::Escape),
            other => Err(ConfigError::Validation(format!(
                "ascii_notation must be `caret` or `escape`, got `{other}`"
            ))),
        }
    }
}

/// Format string with a single `%s` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub const PLACEHOLDER: &'static str = "%s";

    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Substitute `value` for the first placeholder.
    ///
    /// A template without a placeholder renders as itself.
    pub fn apply(&self, value: &str) -> String {
        self.0.replacen(Self::PLACEHOLDER, value, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw shape of the settings keys, deserialized straight from the tree.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    log_file: Option<String>,
    #[serde(default = "defaults::line_endings")]
    line_endings: String,
    #[serde(default = "defaults::output")]
    output: String,
    #[serde(default = "defaults::output_encoding")]
    output_encoding: String,
    #[serde(default = "defaults::use_colors")]
    use_colors: bool,
    #[serde(default)]
    background: Option<String>,
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default = "defaults::indent")]
    indent: usize,
    #[serde(default = "defaults::string_cap")]
    string_cap: usize,
    #[serde(default = "defaults::string_format")]
    string_format: String,
    #[serde(default = "defaults::label_format")]
    label_format: String,
    #[serde(default = "defaults::label_token")]
    label_token: String,
    #[serde(default)]
    print_filename: bool,
    #[serde(default = "defaults::print_timestamp")]
    print_timestamp: bool,
    #[serde(default = "defaults::timestamp_format")]
    timestamp_format: String,
    #[serde(default = "defaults::ascii_notation")]
    ascii_notation: String,
    #[serde(default)]
    escape_chars: BTreeMap<String, String>,
}

/// Validated formatting policy.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_file: PathBuf,
    pub line_ending: LineEnding,
    pub output: OutputMode,
    /// Encoding label (e.g. `UTF-8`); interpreted by the output layer.
    pub output_encoding: String,
    /// Gate for every color and underline escape.
    pub use_colors: bool,
    /// Palette index or color name painted behind the whole session.
    pub background: Option<String>,
    /// Array recursion cap; `None` means unbounded.
    pub max_depth: Option<usize>,
    /// Spaces per nesting level.
    pub indent: usize,
    /// String truncation length; 0 disables truncation.
    pub string_cap: usize,
    pub string_format: Template,
    pub label_format: Template,
    /// Method name whose call arguments give inferred labels.
    pub label_token: String,
    pub print_filename: bool,
    pub print_timestamp: bool,
    /// chrono `strftime` pattern.
    pub timestamp_format: String,
    pub ascii_notation: AsciiNotation,
    /// Control-character ordinal to display mnemonic.
    pub escape_chars: BTreeMap<u32, String>,
}

impl Settings {
    /// Read and validate the settings keys of `store`.
    ///
    /// Fails on a missing `log_file`, an unknown `line_endings` value, or any
    /// key whose value has the wrong shape.
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        let root = serde_json::Value::Object(store.root().clone());
        let raw: RawSettings = serde_json::from_value(root)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let log_file = raw
            .log_file
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingLogFile)?;

        let line_ending = raw.line_endings.parse()?;
        let output = raw.output.parse()?;
        let ascii_notation = raw.ascii_notation.parse()?;

        let mut escape_chars = BTreeMap::new();
        for (ordinal, mnemonic) in raw.escape_chars {
            let code: u32 = ordinal.trim().parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "escape_chars keys must be character ordinals, got `{ordinal}`"
                ))
            })?;
            escape_chars.insert(code, mnemonic);
        }

        let settings = Self {
            log_file,
            line_ending,
            output,
            output_encoding: raw.output_encoding,
            use_colors: raw.use_colors,
            background: raw.background.filter(|b| !b.trim().is_empty()),
            max_depth: raw.max_depth,
            indent: raw.indent,
            string_cap: raw.string_cap,
            string_format: Template::new(raw.string_format),
            label_format: Template::new(raw.label_format),
            label_token: raw.label_token,
            print_filename: raw.print_filename,
            print_timestamp: raw.print_timestamp,
            timestamp_format: raw.timestamp_format,
            ascii_notation,
            escape_chars,
        };

        log::debug!(
            "Settings loaded: output={:?} line_ending={} max_depth={:?} string_cap={}",
            settings.output,
            settings.line_ending,
            settings.max_depth,
            settings.string_cap
        );
        Ok(settings)
    }

    /// The configured line terminator.
    pub fn eol(&self) -> &'static str {
        self.line_ending.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::builtin_store;
    use serde_json::json;

    #[test]
    fn test_builtin_settings_are_valid() {
        let store = builtin_store().expect("builtin store");
        let settings = Settings::from_store(&store).expect("valid settings");

        assert_eq!(settings.line_ending, LineEnding::Lf);
        assert_eq!(settings.output, OutputMode::File);
        assert_eq!(settings.indent, 4);
        assert_eq!(settings.max_depth, Some(5));
        assert_eq!(settings.ascii_notation, AsciiNotation::Caret);
        assert_eq!(settings.escape_chars.get(&10).map(String::as_str), Some("\\n"));
        assert_eq!(settings.label_format.apply("x"), "x");
        assert_eq!(settings.string_format.apply("x"), "\"x\"");
    }

    #[test]
    fn test_missing_log_file_is_fatal() {
        let mut store = builtin_store().expect("builtin store");
        store.set("log_file", json!(""));
        assert!(matches!(
            Settings::from_store(&store),
            Err(ConfigError::MissingLogFile)
        ));
    }

    #[test]
    fn test_unknown_line_ending_is_fatal() {
        let mut store = builtin_store().expect("builtin store");
        store.set("line_endings", json!("LFCR"));
        match Settings::from_store(&store) {
            Err(ConfigError::UnknownLineEnding(value)) => assert_eq!(value, "LFCR"),
            other => panic!("expected UnknownLineEnding, got {other:?}"),
        }
    }

    #[test]
    fn test_line_endings_are_case_insensitive() {
        assert_eq!("crlf".parse::<LineEnding>().unwrap(), LineEnding::CrLf);
        assert_eq!("Cr".parse::<LineEnding>().unwrap(), LineEnding::Cr);
        assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
    }

    #[test]
    fn test_null_max_depth_is_unbounded() {
        let mut store = builtin_store().expect("builtin store");
        store.set("max_depth", serde_json::Value::Null);
        let settings = Settings::from_store(&store).expect("valid settings");
        assert_eq!(settings.max_depth, None);
    }

    #[test]
    fn test_wrong_shape_is_a_validation_error() {
        let mut store = builtin_store().expect("builtin store");
        store.set("indent", json!("wide"));
        assert!(matches!(
            Settings::from_store(&store),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_template_without_placeholder() {
        let template = Template::new("[label]");
        assert_eq!(template.apply("ignored"), "[label]");
        assert_eq!(Template::new("<%s|%s>").apply("a"), "<a|%s>");
    }
}
