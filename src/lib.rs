//! Colored, depth-limited value dumps for debugging.
//!
//! A [`Dumper`] is built once from the layered configuration and then used for
//! every call:
//!
//! ```no_run
//! use par_dump::Dumper;
//! use par_dump_config::ConfigLoader;
//!
//! let dumper = Dumper::load(&ConfigLoader::from_default_dir())?;
//! let _session = dumper.session();
//! let total = dumper.dump(vec![1, 2, 3].iter().sum::<i32>());
//! # Ok::<(), par_dump::DumpError>(())
//! ```
//!
//! Output is appended to the configured log file (or stdout) and is meant to
//! be followed with `tail -f` in a color-capable terminal.

/// Application version (root crate version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod backtrace;
pub mod cli;
pub mod debug;
pub mod dumper;
pub mod encoding;
pub mod error;
pub mod formatter;
pub mod hex;
pub mod introspect;
pub mod label;
pub mod palette;
pub mod session;
pub mod sink;
pub mod value;

pub use dumper::Dumper;
pub use encoding::Encoding;
pub use error::DumpError;
pub use value::{Inspect, InspectKey, Key, Value};

/// Dump an expression labelled with its own source text.
///
/// ```no_run
/// # let dumper: par_dump::Dumper = unimplemented!();
/// let width = 80;
/// par_dump::dump!(dumper, width * 2);
/// par_dump::dump!(dumper, width, 0);
/// ```
///
/// The optional third argument is the array depth cap for this call.
#[macro_export]
macro_rules! dump {
    ($dumper:expr, $value:expr) => {
        $dumper.dump_with($value, Some(stringify!($value)), None)
    };
    ($dumper:expr, $value:expr, $max_depth:expr) => {
        $dumper.dump_with($value, Some(stringify!($value)), Some($max_depth))
    };
}
