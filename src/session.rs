//! Per-process header and footer.
//!
//! A [`Session`] writes a header line when it begins and a footer with the
//! elapsed time and memory use when it is dropped, so the footer appears on
//! every exit path of the scope that holds it, including `?` and panics
//! that unwind.

use crate::dumper::Dumper;
use chrono::Local;
use par_dump_config::FULL_RESET;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// CGI variables that make up a request header, in print order.
const REQUEST_VARS: [&str; 4] = ["REMOTE_ADDR", "HTTP_HOST", "REQUEST_METHOD", "REQUEST_URI"];

/// Scoped session guard; see [`Dumper::session`].
pub struct Session<'d> {
    dumper: &'d Dumper,
    started: Instant,
}

impl<'d> Session<'d> {
    /// Write the header and start the clock.
    pub fn begin(dumper: &'d Dumper) -> Self {
        let settings = dumper.settings();
        let theme = dumper.theme();

        if let Some(escape) = settings
            .background
            .as_deref()
            .and_then(|bg| theme.background(bg))
        {
            dumper.emit(&format!("{escape}{}", settings.eol()));
        }

        let mut header = theme.colorize(&header_text(|key| std::env::var(key).ok()), "header");
        if settings.print_timestamp {
            let timestamp = timestamp(&settings.timestamp_format);
            header = format!("{} {header}", theme.colorize(&timestamp, "timestamp"));
        }
        dumper.emit(&format!("{header}{eol}{eol}", eol = settings.eol()));

        log::debug!("Session started");
        Self {
            dumper,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn footer(&self) -> String {
        let settings = self.dumper.settings();
        let eol = settings.eol();
        let line = format!(
            "Request processing time: {}   Memory Usage: {} Mb",
            format_elapsed(self.elapsed()),
            resident_memory_mb()
        );
        format!(
            "{eol}{}{eol}{eol}{FULL_RESET}{eol}",
            self.dumper.theme().colorize(&line, "footer")
        )
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        let footer = self.footer();
        self.dumper.emit(&footer);
        log::debug!("Session finished after {:?}", self.elapsed());
    }
}

/// Header for the current run.
///
/// A run with `REQUEST_METHOD` in its environment is treated as a request and
/// described by the CGI variables that are present. Otherwise the header is
/// the invocation path.
pub fn header_text<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if lookup("REQUEST_METHOD").is_some() {
        let mut header = String::new();
        for key in REQUEST_VARS {
            if let Some(value) = lookup(key) {
                header.push_str(&value);
                header.push(' ');
            }
        }
        return header;
    }
    std::env::args().next().unwrap_or_default()
}

/// `Duration` as seconds, milliseconds or microseconds with two decimals.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs > 1.0 {
        format!("{secs:.2} s")
    } else if secs > 0.001 {
        format!("{:.2} ms", secs * 1_000.0)
    } else {
        format!("{:.2} µs", secs * 1_000_000.0)
    }
}

fn timestamp(format: &str) -> String {
    let now = Local::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() {
        log::warn!("Invalid timestamp_format `{format}`, using RFC 3339");
        return now.to_rfc3339();
    }
    out
}

/// Resident memory of this process in whole megabytes, 0 if unavailable.
#[cfg(feature = "system-monitor")]
fn resident_memory_mb() -> u64 {
    use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    sys.process(pid)
        .map(|process| process.memory() / (1024 * 1024))
        .unwrap_or(0)
}

#[cfg(not(feature = "system-monitor"))]
fn resident_memory_mb() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_format_elapsed_units() {
        assert_eq!(format_elapsed(Duration::from_millis(2500)), "2.50 s");
        assert_eq!(format_elapsed(Duration::from_micros(12_340)), "12.34 ms");
        assert_eq!(format_elapsed(Duration::from_nanos(750)), "0.75 µs");
    }

    #[test]
    fn test_request_header() {
        let env: HashMap<&str, &str> = [
            ("REMOTE_ADDR", "10.0.0.1"),
            ("REQUEST_METHOD", "GET"),
            ("REQUEST_URI", "/index"),
        ]
        .into_iter()
        .collect();
        let header = header_text(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(header, "10.0.0.1 GET /index ");
    }

    #[test]
    fn test_invocation_header() {
        let header = header_text(|_| None);
        assert_eq!(header, std::env::args().next().unwrap_or_default());
    }

    #[test]
    fn test_invalid_timestamp_format_does_not_panic() {
        assert!(!timestamp("%Q%").is_empty());
    }
}
