//! Recursive value formatter.
//!
//! [`ValueFormatter`] turns a [`Value`] into the tagged, optionally colored
//! text that ends up in the log. The dispatch rules:
//!
//! - callables are only recognised as such at depth 0; deeper down they are
//!   plain objects
//! - objects expand their fields only at depth 0
//! - arrays expand while `depth < max_depth`, where `max_depth` is the
//!   caller's argument or else the configured `max_depth` (unbounded when both
//!   are absent)
//! - strings are truncated, made printable and labelled with their encoding
//!   (see [`strings`])
//! - shared nodes already being rendered print `(cycle)` instead of recursing
//!
//! Nothing in here fails. Odd values render as `Unknown Type`.

pub mod strings;

use crate::encoding::Encoding;
use crate::label::LabelResolver;
use crate::value::{Key, SharedValue, Value};
use par_dump_config::{Settings, ThemeResolver};
use std::collections::HashSet;
use std::sync::Arc;

/// Marker printed for a shared node reached again while it is being rendered.
pub const CYCLE_MARKER: &str = "(cycle)";

/// Literal used for values the model cannot classify.
pub const UNKNOWN_TYPE: &str = "Unknown Type";

/// Per-call state, created at the start of each dump and dropped at the end.
#[derive(Debug, Clone)]
pub struct FormatContext {
    /// Array recursion cap; `None` is unbounded.
    pub max_depth: Option<usize>,
    /// Depth passed by the caller, before falling back to the configured one.
    /// Only this value adjusts the string cap.
    pub caller_max_depth: Option<usize>,
    /// Nested lines get two extra spaces to line up under the filename banner.
    pub annotate_filename: bool,
    pub output_encoding: Encoding,
    /// Identities of shared nodes currently on the render path.
    visiting: HashSet<usize>,
}

impl FormatContext {
    /// Context for a call that passed `max_depth`; `None` uses the configured cap.
    pub fn new(max_depth: Option<usize>, settings: &Settings) -> Self {
        Self {
            max_depth: max_depth.or(settings.max_depth),
            caller_max_depth: max_depth,
            annotate_filename: settings.print_filename,
            output_encoding: Encoding::from_label(&settings.output_encoding).unwrap_or_default(),
            visiting: HashSet::new(),
        }
    }
}

/// Renders values using the formatting policy in [`Settings`].
#[derive(Clone, Copy)]
pub struct ValueFormatter<'a> {
    settings: &'a Settings,
    theme: ThemeResolver<'a>,
    labels: LabelResolver<'a>,
}

impl<'a> ValueFormatter<'a> {
    pub fn new(settings: &'a Settings, theme: ThemeResolver<'a>, labels: LabelResolver<'a>) -> Self {
        Self {
            settings,
            theme,
            labels,
        }
    }

    /// Render `value` as if found at `depth`, with a fresh [`FormatContext`].
    pub fn format(&self, value: &Value, depth: usize, max_depth: Option<usize>) -> String {
        let mut ctx = FormatContext::new(max_depth, self.settings);
        self.format_in(value, depth, &mut ctx)
    }

    /// Render `value` at `depth` within an existing context.
    pub fn format_in(&self, value: &Value, depth: usize, ctx: &mut FormatContext) -> String {
        match value {
            Value::Callable { name, .. } if depth == 0 => {
                format!("(callable) {}", self.theme.colorize(name, "dump_value"))
            }
            Value::Callable { type_name, .. } => self.object_header(type_name, 0),
            Value::Object { type_name, fields } => self.format_object(type_name, fields, depth, ctx),
            Value::Bool(b) => format!(
                "(boolean) {}",
                self.theme.colorize(if *b { "TRUE" } else { "FALSE" }, "dump_bool")
            ),
            Value::String(bytes) => strings::render(self, bytes, depth, ctx),
            Value::Array(entries) => self.format_array(entries, depth, ctx),
            Value::Null => self.theme.colorize("(NULL)", "dump_null"),
            Value::Int(i) => format!("(int) {}", self.theme.colorize(&i.to_string(), "dump_int")),
            Value::Float(f) => format!(
                "(float) {}",
                self.theme.colorize(&f.to_string(), "dump_float")
            ),
            Value::Resource { kind } => {
                format!("(resource) {}", self.theme.colorize(kind, "dump_value"))
            }
            Value::Shared(node) => self.format_shared(node, depth, ctx),
            Value::Unknown => UNKNOWN_TYPE.to_string(),
        }
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    pub fn theme(&self) -> ThemeResolver<'a> {
        self.theme
    }

    fn object_header(&self, type_name: &str, field_count: usize) -> String {
        format!(
            "(object:{field_count}) {}",
            self.theme.colorize(type_name, "dump_classname")
        )
    }

    fn format_object(
        &self,
        type_name: &str,
        fields: &[(String, Value)],
        depth: usize,
        ctx: &mut FormatContext,
    ) -> String {
        let mut out = self.object_header(type_name, fields.len());
        if depth < 1 {
            for (name, value) in fields {
                out.push_str(&self.nested_prefix(depth, ctx));
                out.push_str(&self.labels.property(name));
                out.push_str(" => ");
                out.push_str(&self.format_in(value, depth + 1, ctx));
            }
        }
        out
    }

    fn format_array(&self, entries: &[(Key, Value)], depth: usize, ctx: &mut FormatContext) -> String {
        let mut out = self
            .theme
            .colorize(&format!("(array:{}) ", entries.len()), "dump_array");
        if ctx.max_depth.is_none_or(|max| depth < max) {
            for (key, value) in entries {
                out.push_str(&self.nested_prefix(depth, ctx));
                out.push_str(&self.labels.key(key));
                out.push_str(" => ");
                out.push_str(&self.format_in(value, depth + 1, ctx));
            }
        }
        out
    }

    fn format_shared(&self, node: &SharedValue, depth: usize, ctx: &mut FormatContext) -> String {
        let id = Arc::as_ptr(node) as *const () as usize;
        if !ctx.visiting.insert(id) {
            return self.theme.colorize(CYCLE_MARKER, "dump_value");
        }
        let rendered = {
            let inner = node.read();
            self.format_in(&inner, depth, ctx)
        };
        ctx.visiting.remove(&id);
        rendered
    }

    /// Line break plus indentation for a child of a value at `depth`.
    fn nested_prefix(&self, depth: usize, ctx: &FormatContext) -> String {
        let mut prefix = String::from(self.settings.eol());
        if ctx.annotate_filename {
            prefix.push_str("  ");
        }
        prefix.push_str(&" ".repeat((depth + 1) * self.settings.indent));
        prefix
    }
}
