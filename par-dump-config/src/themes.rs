//! Semantic-tag to ANSI color resolution.
//!
//! Rendering code never names a color directly. It asks for a *tag* such as
//! `dump_string`, and the theme maps that tag through the config tree:
//!
//! 1. `theme_colors/<tag>` is read.
//! 2. A three digit value in `000`-`299` is a direct 256-color palette index
//!    (`38;5;<n>`). An unquoted YAML `077` arrives as the number 77 and is
//!    taken as the same index.
//! 3. Anything else is a name, looked up again under `color/<name>`, which
//!    holds a `style;index` pair. The index is turned into a foreground code
//!    (`0;4` becomes `0;34`).
//!
//! A tag that resolves to nothing leaves the text untouched. Colors are never
//! an error. Whether colors are used at all is the validated `use_colors`
//! setting, passed in by the caller.

use crate::tree::ConfigStore;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Resets the foreground color only.
pub const FOREGROUND_RESET: &str = "\x1b[39m";

/// Resets every SGR attribute.
pub const FULL_RESET: &str = "\x1b[0m";

const UNDERLINE_ON: &str = "\x1b[4m";
const UNDERLINE_OFF: &str = "\x1b[24m";

fn re_palette_index() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-2]\d\d$").unwrap())
}

/// A resolved theme entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorEntry {
    /// Raw 256-color palette slot.
    Palette(u16),
    /// Legacy `style;index` pair from the named color table.
    Named { style: String, index: String },
}

impl ColorEntry {
    /// Parse a palette reference like `"208"`.
    pub fn palette(value: &str) -> Option<Self> {
        let value = value.trim();
        if re_palette_index().is_match(value) {
            value.parse().ok().map(ColorEntry::Palette)
        } else {
            None
        }
    }

    /// Parse a named color definition like `"1;3"`.
    pub fn named(definition: &str) -> Option<Self> {
        let mut parts = definition.trim().splitn(2, ';');
        let style = parts.next()?.trim();
        let index = parts.next()?.trim();
        if style.is_empty() || index.is_empty() {
            return None;
        }
        Some(ColorEntry::Named {
            style: style.to_string(),
            index: index.to_string(),
        })
    }

    /// SGR parameters selecting this color as the foreground.
    pub fn foreground_sgr(&self) -> String {
        match self {
            ColorEntry::Palette(n) => format!("38;5;{n}"),
            ColorEntry::Named { style, index } => format!("{style};3{index}"),
        }
    }

    /// SGR parameters selecting this color as the background.
    pub fn background_sgr(&self) -> String {
        match self {
            ColorEntry::Palette(n) => format!("48;5;{n}"),
            ColorEntry::Named { index, .. } => format!("4{index}"),
        }
    }
}

/// Resolves semantic tags to escape sequences through a [`ConfigStore`].
#[derive(Debug, Clone, Copy)]
pub struct ThemeResolver<'a> {
    store: &'a ConfigStore,
    use_colors: bool,
}

impl<'a> ThemeResolver<'a> {
    /// Create a resolver reading `theme_colors` and `color` from `store`.
    ///
    /// `use_colors` is normally [`Settings::use_colors`](crate::Settings::use_colors).
    pub fn new(store: &'a ConfigStore, use_colors: bool) -> Self {
        Self { store, use_colors }
    }

    /// Whether colorization is enabled at all.
    pub fn use_colors(&self) -> bool {
        self.use_colors
    }

    /// Resolve a semantic tag to a color entry.
    pub fn resolve(&self, tag: &str) -> Option<ColorEntry> {
        let path = format!("theme_colors/{tag}");
        match self.store.get(&path)? {
            Value::Number(n) => {
                let entry = n
                    .as_u64()
                    .filter(|index| *index <= 299)
                    .and_then(|index| u16::try_from(index).ok())
                    .map(ColorEntry::Palette);
                if entry.is_none() {
                    log::warn!("Theme color `{tag}` = {n} is not a palette index (000-299)");
                }
                entry
            }
            _ => {
                let reference = self.store.get_string(&path)?;
                self.resolve_reference(&reference)
            }
        }
    }

    /// Resolve a palette index or a named color.
    pub fn resolve_reference(&self, reference: &str) -> Option<ColorEntry> {
        if let Some(entry) = ColorEntry::palette(reference) {
            return Some(entry);
        }
        let definition = self.store.get_string(&format!("color/{}", reference.trim()))?;
        let entry = ColorEntry::named(&definition);
        if entry.is_none() {
            log::debug!("Color `{reference}` has malformed definition `{definition}`");
        }
        entry
    }

    /// Wrap `text` in the color selected by `tag`.
    ///
    /// Returns `text` unchanged when colors are off or the tag does not resolve.
    pub fn colorize(&self, text: &str, tag: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        match self.resolve(tag) {
            Some(entry) => format!("\x1b[{}m{text}{FOREGROUND_RESET}", entry.foreground_sgr()),
            None => {
                log::trace!("No color for tag `{tag}`");
                text.to_string()
            }
        }
    }

    /// Underline `text`, gated by the same `use_colors` policy.
    pub fn underline(&self, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        format!("{UNDERLINE_ON}{text}{UNDERLINE_OFF}")
    }

    /// Escape sequence that paints the background with `reference`.
    pub fn background(&self, reference: &str) -> Option<String> {
        if !self.use_colors {
            return None;
        }
        self.resolve_reference(reference)
            .map(|entry| format!("\x1b[{}m", entry.background_sgr()))
    }
}
