//! String rendering: encoding detection, control characters and truncation.

use super::{FormatContext, ValueFormatter};
use crate::encoding::Encoding;
use par_dump_config::{AsciiNotation, Settings};

/// Appended to a string cut at the cap.
pub const ELLIPSIS: &str = "...";

/// Text for the control character with ordinal `code` (< 32).
pub fn control_notation(code: u32, settings: &Settings) -> String {
    match settings.ascii_notation {
        AsciiNotation::Caret => match char::from_u32(code + 64) {
            Some(c) => format!("^{c}"),
            None => "^?".to_string(),
        },
        AsciiNotation::Escape => settings
            .escape_chars
            .get(&code)
            .cloned()
            .unwrap_or_else(|| "\\?".to_string()),
    }
}

/// The string cap in force for a string at `depth`.
///
/// Only a top-level string reacts to the caller's depth argument: a depth of
/// zero lifts the cap, a depth larger than the cap widens it. The configured
/// `max_depth` never reaches here.
pub fn effective_cap(configured: usize, depth: usize, max_depth: Option<usize>) -> usize {
    if configured == 0 || depth != 0 {
        return configured;
    }
    match max_depth {
        Some(0) => 0,
        Some(d) if d > configured => d,
        _ => configured,
    }
}

/// Render `bytes` as `(string:<chars>:<ENCODING>) ` plus the templated body.
pub(super) fn render(
    formatter: &ValueFormatter<'_>,
    bytes: &[u8],
    depth: usize,
    ctx: &FormatContext,
) -> String {
    let settings = formatter.settings();
    let theme = formatter.theme();

    let detected = Encoding::detect(bytes);
    let text = detected.decode(bytes);
    let cap = effective_cap(settings.string_cap, depth, ctx.caller_max_depth);

    let mut body = String::with_capacity(text.len());
    let mut len = 0usize;
    for c in text.chars() {
        let code = c as u32;
        let width = if code < 32 { 2 } else { 1 };
        if cap > 0 && len + width > cap {
            body.push_str(ELLIPSIS);
            break;
        }
        if code < 32 {
            body.push_str(&theme.underline(&control_notation(code, settings)));
        } else {
            body.push(c);
        }
        len += width;
    }

    let body = ctx.output_encoding.restrict(&body);
    let body = theme.colorize(&body, "dump_string");

    format!(
        "(string:{}:{}) {}",
        text.chars().count(),
        detected.label(),
        settings.string_format.apply(&body)
    )
}
