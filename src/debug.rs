//! Diagnostics for par-dump itself
//!
//! Routes the `log` facade to a debug file so that tool diagnostics never mix
//! with dump output. The level comes from, in order:
//! - the `--log-level` CLI flag
//! - the DEBUG_LEVEL environment variable:
//!   - 0 or unset: No debugging
//!   - 1: Errors only
//!   - 2: Info level (config layers, sink setup)
//!   - 3: Debug level (label inference, color resolution misses)
//!   - 4: Trace level (every colorize call)
//! - RUST_LOG, when it names a level
//!
//! Output goes to `par_dump_debug.log` in the temp directory. When RUST_LOG is
//! set, records are mirrored to stderr as well.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    /// Parse a DEBUG_LEVEL value; anything unrecognized is `Off`.
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<u8>() {
            Ok(1) => DebugLevel::Error,
            Ok(2) => DebugLevel::Info,
            Ok(3) => DebugLevel::Debug,
            Ok(4) => DebugLevel::Trace,
            _ => DebugLevel::Off,
        }
    }

    fn from_env() -> Option<Self> {
        std::env::var("DEBUG_LEVEL").ok().map(|v| Self::parse(&v))
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            DebugLevel::Off => log::LevelFilter::Off,
            DebugLevel::Error => log::LevelFilter::Error,
            DebugLevel::Info => log::LevelFilter::Info,
            DebugLevel::Debug => log::LevelFilter::Debug,
            DebugLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Level from a RUST_LOG value such as `debug` or `par_dump=info`.
///
/// Only the last level name is honored; module filters are not supported.
pub fn level_from_rust_log(value: &str) -> Option<log::LevelFilter> {
    value
        .split(',')
        .filter_map(|directive| directive.rsplit('=').next())
        .filter_map(|level| level.trim().parse::<log::LevelFilter>().ok())
        .last()
}

/// Path of the debug log.
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("par_dump_debug.log")
}

struct LogBridge {
    level: log::LevelFilter,
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl LogBridge {
    fn new(level: log::LevelFilter, mirror_stderr: bool) -> Self {
        let file = if level == log::LevelFilter::Off {
            None
        } else {
            // Silently fail if the log file can't be opened; diagnostics are optional.
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(log_path())
                .ok()
        };

        let bridge = Self {
            level,
            file: Mutex::new(file),
            mirror_stderr,
        };
        bridge.write_raw(&format!(
            "\n{}\npar-dump debug session started at {} (level={})\n{}\n",
            "=".repeat(80),
            get_timestamp(),
            level,
            "=".repeat(80)
        ));
        bridge
    }

    fn write_raw(&self, msg: &str) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        self.write_raw(&line);
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Install the log bridge. Later calls keep the first configuration.
pub fn init_log_bridge(level_override: Option<log::LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = level_override
        .or_else(|| DebugLevel::from_env().map(DebugLevel::to_level_filter))
        .or_else(|| rust_log.as_deref().and_then(level_from_rust_log))
        .unwrap_or(log::LevelFilter::Off);

    let bridge = BRIDGE.get_or_init(|| LogBridge::new(level, rust_log.is_some()));
    if log::set_logger(bridge).is_ok() {
        log::set_max_level(bridge.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_level_parse() {
        assert_eq!(DebugLevel::parse("0"), DebugLevel::Off);
        assert_eq!(DebugLevel::parse(" 3 "), DebugLevel::Debug);
        assert_eq!(DebugLevel::parse("loud"), DebugLevel::Off);
        assert_eq!(DebugLevel::Info.to_level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_level_from_rust_log() {
        assert_eq!(level_from_rust_log("debug"), Some(log::LevelFilter::Debug));
        assert_eq!(
            level_from_rust_log("wgpu=warn,par_dump=trace"),
            Some(log::LevelFilter::Trace)
        );
        assert_eq!(level_from_rust_log("par_dump"), None);
    }
}
