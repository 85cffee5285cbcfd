//! Character-encoding detection and conversion.
//!
//! Dumped strings arrive as raw bytes. Detection is a best guess that never
//! fails: pure 7-bit input is `ASCII`, valid UTF-8 is `UTF-8`, and anything
//! else is treated as `ISO-8859-1`, where every byte maps to a code point.
//! Internally all text is Rust `String`s. The output encoding is applied when
//! text is handed to the sink.

use std::borrow::Cow;
use std::fmt;

/// Replacement for characters the output encoding cannot represent.
const REPLACEMENT: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Ascii,
    #[default]
    Utf8,
    Latin1,
}

impl Encoding {
    /// Guess the encoding of `bytes`.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.is_ascii() {
            Encoding::Ascii
        } else if std::str::from_utf8(bytes).is_ok() {
            Encoding::Utf8
        } else {
            Encoding::Latin1
        }
    }

    /// Parse an encoding label such as `UTF-8`, `utf8`, `latin1` or `US-ASCII`.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_uppercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "ASCII" | "US-ASCII" => Some(Encoding::Ascii),
            "UTF-8" | "UTF8" => Some(Encoding::Utf8),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" | "LATIN-1" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ASCII",
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Decode `bytes` from this encoding. Malformed input is replaced, never rejected.
    pub fn decode(self, bytes: &[u8]) -> Cow<'_, str> {
        match self {
            Encoding::Ascii | Encoding::Utf8 => String::from_utf8_lossy(bytes),
            Encoding::Latin1 => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Encode `text` into this encoding, replacing what it cannot represent.
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            Encoding::Utf8 => Cow::Borrowed(text.as_bytes()),
            Encoding::Ascii if text.is_ascii() => Cow::Borrowed(text.as_bytes()),
            Encoding::Ascii | Encoding::Latin1 => Cow::Owned(
                text.chars()
                    .map(|c| {
                        if self.represents(c) {
                            c as u8
                        } else {
                            REPLACEMENT as u8
                        }
                    })
                    .collect(),
            ),
        }
    }

    /// Replace characters this encoding cannot represent, staying in UTF-8.
    pub fn restrict(self, text: &str) -> Cow<'_, str> {
        if text.chars().all(|c| self.represents(c)) {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(
                text.chars()
                    .map(|c| if self.represents(c) { c } else { REPLACEMENT })
                    .collect(),
            )
        }
    }

    fn represents(self, c: char) -> bool {
        match self {
            Encoding::Utf8 => true,
            Encoding::Ascii => c.is_ascii(),
            Encoding::Latin1 => (c as u32) <= 0xFF,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
