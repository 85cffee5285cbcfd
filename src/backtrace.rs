//! Call-stack printing.
//!
//! Frames are plain descriptors. They are either supplied by the caller, for
//! hosts that know their own stack, or recovered from a captured
//! [`std::backtrace::Backtrace`]. That recovery parses the backtrace's
//! `Display` output. Its format is not stable, so the parse keeps whatever
//! it recognizes and skips the rest.

use crate::value::Value;
use par_dump_config::ThemeResolver;
use regex::Regex;
use std::backtrace::Backtrace;
use std::sync::OnceLock;

/// String arguments longer than this are shown as `...` plus their tail.
const MAX_STRING_ARG: usize = 20;

/// Symbols of the capture machinery itself, dropped from the top of a stack.
const INTERNAL_PREFIXES: [&str; 4] = [
    "std::backtrace",
    "par_dump::backtrace::",
    "par_dump::dumper::Dumper::backtrace",
    "<par_dump::dumper::Dumper>::backtrace",
];

/// Runtime entry points; nothing below them is interesting.
const RUNTIME_PREFIXES: [&str; 4] = [
    "std::rt::lang_start",
    "std::sys::backtrace::__rust_begin_short_backtrace",
    "__libc_start",
    "_start",
];

fn re_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+):\s+(.+?)\s*$").unwrap())
}

fn re_location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s+at\s+(.+):(\d+)(?::\d+)?\s*$").unwrap())
}

fn re_symbol_hash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"::h[0-9a-f]{16}$").unwrap())
}

/// One entry of a call stack.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Declaring type or module path, if any.
    pub type_name: Option<String>,
    /// Separator printed between type and function (`::`, `.`).
    pub separator: String,
    pub function: String,
    pub args: Vec<Value>,
}

impl Frame {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            separator: "::".to_string(),
            ..Default::default()
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn in_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Split a symbol such as `app::Server::run` into type path and function.
    pub fn from_symbol(symbol: &str) -> Self {
        let symbol = re_symbol_hash().replace(symbol, "");
        match split_symbol(&symbol) {
            Some((type_name, function)) => Self::new(function).in_type(type_name),
            None => Self::new(symbol.to_string()),
        }
    }
}

/// Split at the last `::` outside of `<...>`.
fn split_symbol(symbol: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut split = None;
    let bytes = symbol.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'<' => depth += 1,
            b'>' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => split = Some(i),
            _ => {}
        }
    }
    let i = split?;
    let (type_name, function) = (&symbol[..i], &symbol[i + 2..]);
    (!type_name.is_empty() && !function.is_empty()).then_some((type_name, function))
}

/// Capture the current thread's stack.
///
/// Frames without symbols are skipped, as are the capture machinery and the
/// runtime entry frames.
pub fn capture() -> Vec<Frame> {
    parse(&Backtrace::force_capture().to_string())
}

/// Parse the `Display` output of a [`Backtrace`].
pub fn parse(text: &str) -> Vec<Frame> {
    let root = std::env::current_dir()
        .ok()
        .map(|dir| format!("{}/", dir.display()));

    let mut frames: Vec<Frame> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = re_location().captures(line) {
            if let Some(frame) = frames.last_mut()
                && frame.file.is_none()
            {
                let file = &caps[1];
                let file = root
                    .as_deref()
                    .and_then(|root| file.strip_prefix(root))
                    .or_else(|| file.strip_prefix("./"))
                    .unwrap_or(file);
                frame.file = Some(file.to_string());
                frame.line = caps[2].parse().ok();
            }
        } else if let Some(caps) = re_frame().captures(line) {
            frames.push(Frame::from_symbol(&caps[2]));
        }
    }

    let start = frames
        .iter()
        .rposition(|frame| is_internal(&qualified(frame)))
        .map_or(0, |i| i + 1);
    let end = frames
        .iter()
        .position(|frame| is_runtime(&qualified(frame)))
        .filter(|&i| i >= start)
        .unwrap_or(frames.len());
    frames.drain(start..end).collect()
}

fn qualified(frame: &Frame) -> String {
    match &frame.type_name {
        Some(type_name) => format!("{type_name}{}{}", frame.separator, frame.function),
        None => frame.function.clone(),
    }
}

fn is_internal(symbol: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|prefix| symbol.starts_with(prefix))
}

fn is_runtime(symbol: &str) -> bool {
    RUNTIME_PREFIXES.iter().any(|prefix| symbol.starts_with(prefix))
}

/// Render `frames` under a `Printing callstack:` heading.
pub fn render(frames: &[Frame], theme: &ThemeResolver<'_>, eol: &str) -> String {
    let mut out = format!("{eol}Printing callstack:{eol}");
    for (row, frame) in frames.iter().enumerate() {
        let class = frame
            .type_name
            .as_deref()
            .map(|t| format!("{}{}", theme.colorize(t, "methods_class"), frame.separator))
            .unwrap_or_default();
        let args: Vec<String> = frame.args.iter().map(|arg| render_arg(arg, theme)).collect();
        out.push_str(&format!(
            "#{row} {}:({}) {class}{}({}){eol}",
            frame.file.as_deref().unwrap_or("?"),
            frame.line.unwrap_or(0),
            theme.colorize(&frame.function, "methods_function"),
            args.join(", ")
        ));
    }
    out
}

/// One argument, colored by type. Long strings keep only their tail.
pub fn render_arg(arg: &Value, theme: &ThemeResolver<'_>) -> String {
    match arg {
        Value::String(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            let count = text.chars().count();
            let shown = if count > MAX_STRING_ARG {
                let tail: String = text.chars().skip(count - MAX_STRING_ARG).collect();
                format!("...{tail}")
            } else {
                text.into_owned()
            };
            format!("'{}'", theme.colorize(&shown, "dump_string"))
        }
        Value::Int(i) => theme.colorize(&i.to_string(), "dump_int"),
        Value::Bool(b) => theme.colorize(if *b { "true" } else { "false" }, "dump_bool"),
        Value::Null => theme.colorize("null", "dump_null"),
        Value::Float(f) => theme.colorize(&f.to_string(), "dump_float"),
        other => theme.colorize(other.type_label(), "dump_value"),
    }
}
