//! Append-only output destination.
//!
//! Every entry point funnels its text through one [`Sink`]. Line endings are
//! normalized to the configured style and text is encoded into the output
//! encoding here, at the boundary. Writes are serialized by a mutex, so one
//! formatted value is never interleaved with another caller's output.

use crate::encoding::Encoding;
use crate::error::{DumpError, Result};
use par_dump_config::{LineEnding, OutputMode, Settings};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// In-memory buffer shared with a [`Sink::memory`] sink.
pub type MemoryBuffer = Arc<Mutex<Vec<u8>>>;

enum Target {
    File(File),
    Stdout,
    Memory(MemoryBuffer),
}

pub struct Sink {
    target: Mutex<Target>,
    line_ending: LineEnding,
    encoding: Encoding,
}

impl Sink {
    /// Open the destination selected by `settings`.
    ///
    /// In file mode the log file is created if needed and opened for
    /// appending. Failure here is fatal for the caller.
    pub fn open(settings: &Settings) -> Result<Self> {
        let encoding = output_encoding(settings)?;
        let target = match settings.output {
            OutputMode::Print => Target::Stdout,
            OutputMode::File => Target::File(open_append(&settings.log_file)?),
        };
        Ok(Self::with_target(target, settings.line_ending, encoding))
    }

    /// A sink writing into a shared buffer.
    pub fn memory(settings: &Settings) -> Result<(Self, MemoryBuffer)> {
        let buffer = MemoryBuffer::default();
        let sink = Self::with_target(
            Target::Memory(Arc::clone(&buffer)),
            settings.line_ending,
            output_encoding(settings)?,
        );
        Ok((sink, buffer))
    }

    fn with_target(target: Target, line_ending: LineEnding, encoding: Encoding) -> Self {
        Self {
            target: Mutex::new(target),
            line_ending,
            encoding,
        }
    }

    /// Encode `text` in the output encoding and append it, unchanged otherwise.
    pub fn write_raw(&self, text: &str) -> Result<()> {
        let bytes = self.encoding.encode(text);
        let mut target = self.target.lock();
        match &mut *target {
            Target::File(file) => {
                file.write_all(&bytes)?;
                file.flush()?;
            }
            Target::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
            Target::Memory(buffer) => buffer.lock().extend_from_slice(&bytes),
        }
        Ok(())
    }

    /// Decode `bytes` (from `source`, or detected), normalize line endings and append.
    pub fn write_text(&self, bytes: &[u8], source: Option<Encoding>) -> Result<()> {
        let encoding = source.unwrap_or_else(|| Encoding::detect(bytes));
        let text = encoding.decode(bytes);
        self.write_raw(&normalize_line_endings(&text, self.line_ending))
    }
}

fn output_encoding(settings: &Settings) -> Result<Encoding> {
    Encoding::from_label(&settings.output_encoding).ok_or_else(|| {
        DumpError::Config(par_dump_config::ConfigError::Validation(format!(
            "Unsupported output_encoding `{}`",
            settings.output_encoding
        )))
    })
}

fn open_append(path: &Path) -> Result<File> {
    log::info!("Opening dump log {:?}", path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| DumpError::SinkOpen {
            path: path.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| DumpError::SinkOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace every `\r\n`, `\r` and `\n` with `ending`.
pub fn normalize_line_endings(text: &str, ending: LineEnding) -> String {
    let target = ending.as_str();
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(target);
            }
            '\n' => out.push_str(target),
            _ => out.push(c),
        }
    }
    out
}
