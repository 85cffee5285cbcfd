//! Labels for dumped values and array keys.
//!
//! An explicit label is used as-is. Without one, the label is inferred from
//! the source text of the call site: the line is read, the first call whose
//! name starts with the configured `label_token` (`.dump` by default, so
//! `.dump(`, `.dump_with(` and `.dump_at(` all match) is found, and its
//! arguments are taken up to the first top-level comma or the closing bracket.
//!
//! Inference is a best-effort slice of one source line, not a parse. It
//! tracks brackets and double-quoted strings, so `d.dump(f(a, b))` yields
//! `f(a, b)`, but generic argument lists (`HashMap::<K, V>::new()`) or calls
//! spread across lines still produce truncated labels. When no source is
//! available the label falls back to the line number.

use crate::value::Key;
use par_dump_config::{Settings, ThemeResolver};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::panic::Location;
use std::sync::Arc;

/// Where a formatting entry point was invoked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
}

impl CallSite {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The location of the caller, following `#[track_caller]` chains.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }
}

/// What a label names; selects the theme tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// The top-level label of a dump.
    Label,
    /// A field of an object.
    KeyProperty,
    /// An integer array key.
    KeyInt,
    /// A string array key.
    KeyString,
}

impl LabelRole {
    pub fn tag(&self) -> &'static str {
        match self {
            LabelRole::Label => "label",
            LabelRole::KeyProperty => "key_property",
            LabelRole::KeyInt => "key_int",
            LabelRole::KeyString => "key_string",
        }
    }
}

/// Access to source text for label inference and method listings.
pub trait SourceReader: Send + Sync {
    /// Lines `start..=end` (1-based) of `file`, clamped to the file length.
    fn read_lines(&self, file: &str, start: u32, end: u32) -> Option<Vec<String>>;

    /// One line (1-based) of `file`.
    fn read_line(&self, file: &str, line: u32) -> Option<String> {
        self.read_lines(file, line, line)?.into_iter().next()
    }
}

/// Reads source files from disk, caching each file after the first read.
#[derive(Debug, Default)]
pub struct FileSourceReader {
    cache: Mutex<HashMap<String, Arc<Vec<String>>>>,
}

impl FileSourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(&self, file: &str) -> Option<Arc<Vec<String>>> {
        if let Some(lines) = self.cache.lock().get(file) {
            return Some(Arc::clone(lines));
        }

        let contents = match fs::read(file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                log::debug!("Cannot read source {file:?} for label inference: {e}");
                return None;
            }
        };
        let lines: Arc<Vec<String>> = Arc::new(contents.lines().map(str::to_string).collect());
        self.cache
            .lock()
            .insert(file.to_string(), Arc::clone(&lines));
        Some(lines)
    }
}

impl SourceReader for FileSourceReader {
    fn read_lines(&self, file: &str, start: u32, end: u32) -> Option<Vec<String>> {
        if start == 0 || end < start {
            return None;
        }
        let lines = self.lines(file)?;
        let first = usize::try_from(start - 1).ok()?;
        if first >= lines.len() {
            return None;
        }
        let last = usize::try_from(end).ok()?.min(lines.len());
        Some(lines[first..last].to_vec())
    }
}

/// Source reader for explicit-label-only operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSource;

impl SourceReader for NoSource {
    fn read_lines(&self, _file: &str, _start: u32, _end: u32) -> Option<Vec<String>> {
        None
    }
}

/// Produces colored, templated labels.
#[derive(Clone, Copy)]
pub struct LabelResolver<'a> {
    settings: &'a Settings,
    theme: ThemeResolver<'a>,
    source: &'a dyn SourceReader,
}

impl<'a> LabelResolver<'a> {
    pub fn new(
        settings: &'a Settings,
        theme: ThemeResolver<'a>,
        source: &'a dyn SourceReader,
    ) -> Self {
        Self {
            settings,
            theme,
            source,
        }
    }

    /// Label for a top-level dump.
    pub fn resolve(&self, explicit: Option<&str>, call_site: &CallSite) -> String {
        let text = match explicit {
            Some(label) => label.to_string(),
            None => self
                .infer(call_site)
                .unwrap_or_else(|| format!("line {}", call_site.line)),
        };
        self.render(&text, LabelRole::Label, Some(call_site))
    }

    /// Slice the dumped expression out of the call-site line.
    pub fn infer(&self, call_site: &CallSite) -> Option<String> {
        let line = self.source.read_line(&call_site.file, call_site.line)?;
        let label = slice_argument(line.trim(), &self.settings.label_token);
        if label.is_none() {
            log::debug!(
                "No `{}*(` call found on {}:{}",
                self.settings.label_token,
                call_site.file,
                call_site.line
            );
        }
        label
    }

    /// Label for an array key.
    pub fn key(&self, key: &Key) -> String {
        let role = match key {
            Key::Int(_) => LabelRole::KeyInt,
            Key::Str(_) => LabelRole::KeyString,
        };
        self.render(&key.to_string(), role, None)
    }

    /// Label for an object field.
    pub fn property(&self, name: &str) -> String {
        self.render(name, LabelRole::KeyProperty, None)
    }

    /// Colorize `text` for `role`, apply `label_format`, and prefix the line
    /// number for top-level labels when filenames are being printed.
    pub fn render(&self, text: &str, role: LabelRole, call_site: Option<&CallSite>) -> String {
        let label = self
            .settings
            .label_format
            .apply(&self.theme.colorize(text, role.tag()));

        match call_site {
            Some(site) if role == LabelRole::Label && self.settings.print_filename => {
                format!("{:<4}{label}", site.line)
            }
            _ => label,
        }
    }
}

/// Byte offset just past the opening bracket of the first call matching `token`.
///
/// A token ending in `(` matches literally. Otherwise the token may be followed
/// by more identifier characters before the `(`.
fn argument_start(line: &str, token: &str) -> Option<usize> {
    if token.ends_with('(') {
        return line.find(token).map(|i| i + token.len());
    }
    line.match_indices(token).find_map(|(i, _)| {
        let after = i + token.len();
        let rest = &line[after..];
        let name_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        rest[name_len..]
            .starts_with('(')
            .then_some(after + name_len + 1)
    })
}

/// First argument of the call matching `token`: the text up to the first
/// top-level `,` or unmatched closing bracket.
pub fn slice_argument(line: &str, token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    let rest = &line[argument_start(line, token)?..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = rest.len();

    for (i, c) in rest.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    end = i;
                    break;
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    let argument = rest[..end].trim();
    (!argument.is_empty()).then(|| argument.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use par_dump_config::ConfigStore;
    use par_dump_config::defaults::builtin_store;
    use serde_json::json;

    struct OneLine(&'static str);

    impl SourceReader for OneLine {
        fn read_lines(&self, _file: &str, _start: u32, _end: u32) -> Option<Vec<String>> {
            Some(vec![self.0.to_string()])
        }
    }

    fn store(print_filename: bool) -> ConfigStore {
        let mut store = builtin_store().expect("builtin store");
        store.set("use_colors", json!(false));
        store.set("print_filename", json!(print_filename));
        store
    }

    #[test]
    fn test_slice_single_argument() {
        assert_eq!(slice_argument("d.dump(value);", ".dump(").as_deref(), Some("value"));
        assert_eq!(
            slice_argument("let x = d.dump(&config.indent);", ".dump(").as_deref(),
            Some("&config.indent")
        );
    }

    #[test]
    fn test_slice_stops_at_top_level_comma() {
        assert_eq!(
            slice_argument("d.dump_with(list, None, Some(2));", ".dump_with(").as_deref(),
            Some("list")
        );
    }

    #[test]
    fn test_method_name_token_matches_every_entry_point() {
        assert_eq!(slice_argument("d.dump(value);", ".dump").as_deref(), Some("value"));
        assert_eq!(
            slice_argument("d.dump_with(items, None, Some(0));", ".dump").as_deref(),
            Some("items")
        );
        assert_eq!(
            slice_argument("d.dump_at(&v, Some(\"x\"), None, &site);", ".dump").as_deref(),
            Some("&v")
        );
        // A field access sharing the prefix is not a call.
        assert_eq!(
            slice_argument("let n = self.dumps; d.dump(n);", ".dump").as_deref(),
            Some("n")
        );
        assert_eq!(slice_argument("let n = cfg.dump_dir;", ".dump"), None);
    }

    #[test]
    fn test_literal_token_matches_only_that_call() {
        assert_eq!(slice_argument("d.dump_with(items, None, None);", ".dump("), None);
    }

    #[test]
    fn test_slice_keeps_nested_commas_and_strings() {
        assert_eq!(
            slice_argument("d.dump(f(a, b));", ".dump(").as_deref(),
            Some("f(a, b)")
        );
        assert_eq!(
            slice_argument(r#"d.dump(format!("{}, {}", a, b));"#, ".dump(").as_deref(),
            Some(r#"format!("{}, {}", a, b)"#)
        );
        assert_eq!(
            slice_argument("d.dump(vec![1, 2]);", ".dump(").as_deref(),
            Some("vec![1, 2]")
        );
    }

    #[test]
    fn test_slice_without_token() {
        assert_eq!(slice_argument("println!(\"x\");", ".dump("), None);
        assert_eq!(slice_argument("d.dump();", ".dump("), None);
        assert_eq!(slice_argument("d.dump(x)", ""), None);
    }

    #[test]
    fn test_inferred_label() {
        let store = store(false);
        let settings = Settings::from_store(&store).expect("settings");
        let source = OneLine("    dumper.dump(user.name);");
        let labels = LabelResolver::new(&settings, ThemeResolver::new(&store, settings.use_colors), &source);

        assert_eq!(labels.resolve(None, &CallSite::new("x.rs", 3)), "user.name");
        assert_eq!(labels.resolve(Some("explicit"), &CallSite::new("x.rs", 3)), "explicit");
    }

    #[test]
    fn test_inferred_label_for_dump_with() {
        let store = store(false);
        let settings = Settings::from_store(&store).expect("settings");
        let source = OneLine("    dumper.dump_with(items, None, Some(0));");
        let labels = LabelResolver::new(&settings, ThemeResolver::new(&store, settings.use_colors), &source);
        assert_eq!(labels.resolve(None, &CallSite::new("x.rs", 9)), "items");
    }

    #[test]
    fn test_fallback_label_without_source() {
        let store = store(false);
        let settings = Settings::from_store(&store).expect("settings");
        let labels = LabelResolver::new(&settings, ThemeResolver::new(&store, settings.use_colors), &NoSource);
        assert_eq!(labels.resolve(None, &CallSite::new("x.rs", 12)), "line 12");
    }

    #[test]
    fn test_line_number_prefix_with_filenames() {
        let store = store(true);
        let settings = Settings::from_store(&store).expect("settings");
        let labels = LabelResolver::new(&settings, ThemeResolver::new(&store, settings.use_colors), &NoSource);

        assert_eq!(labels.resolve(Some("v"), &CallSite::new("x.rs", 7)), "7   v");
        // Keys never get the prefix.
        assert_eq!(labels.key(&Key::Int(0)), "0");
    }

    #[test]
    fn test_label_template_and_role_colors() {
        let mut store = store(false);
        store.set("label_format", json!("[%s]"));
        store.set("use_colors", json!(true));
        store.set("theme_colors", json!({ "key_string": "100", "key_int": "101" }));
        let settings = Settings::from_store(&store).expect("settings");
        let labels = LabelResolver::new(&settings, ThemeResolver::new(&store, settings.use_colors), &NoSource);

        assert_eq!(
            labels.key(&Key::Str("name".into())),
            "[\x1b[38;5;100mname\x1b[39m]"
        );
        assert_eq!(labels.key(&Key::Int(3)), "[\x1b[38;5;101m3\x1b[39m]");
    }

    #[test]
    fn test_file_source_reader() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("src.rs");
        fs::write(&path, "one\ntwo\nthree\n").expect("Failed to write source");
        let file = path.display().to_string();

        let reader = FileSourceReader::new();
        assert_eq!(reader.read_line(&file, 2).as_deref(), Some("two"));
        assert_eq!(
            reader.read_lines(&file, 2, 10),
            Some(vec!["two".to_string(), "three".to_string()])
        );
        assert_eq!(reader.read_line(&file, 9), None);
        assert_eq!(reader.read_line("/definitely/not/here.rs", 1), None);
    }
}
