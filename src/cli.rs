//! Command-line interface for par-dump.
//!
//! Each subcommand loads the layered configuration, opens a [`Dumper`] and runs
//! inside a [`Session`](crate::session::Session), so the log gets the usual
//! header and footer.

use crate::dumper::Dumper;
use crate::label::CallSite;
use crate::value::Value;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use par_dump_config::ConfigLoader;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Input name that means standard input.
const STDIN: &str = "-";

/// par-dump - Colored, depth-limited dumps of structured data to a log
#[derive(Parser)]
#[command(name = "par-dump")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory (default: $PAR_DUMP_CONFIG_DIR or ~/.config/par-dump)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Theme to use instead of the configured one
    #[arg(long, value_name = "NAME", global = true)]
    pub theme: Option<String>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Write to stdout instead of the log file
    #[arg(long, global = true)]
    pub print: bool,

    /// Set debug log level (overrides DEBUG_LEVEL and RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump a JSON document
    Json {
        /// File to read, or `-` for stdin
        input: PathBuf,

        /// Label for the dump (default: the input name)
        #[arg(long)]
        label: Option<String>,

        /// Array recursion cap (default: configured max_depth)
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
    },

    /// Dump a YAML document
    Yaml {
        /// File to read, or `-` for stdin
        input: PathBuf,

        /// Label for the dump (default: the input name)
        #[arg(long)]
        label: Option<String>,

        /// Array recursion cap (default: configured max_depth)
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
    },

    /// Hex dump of a file
    Hex {
        /// File to read, or `-` for stdin
        input: PathBuf,
    },

    /// Copy text to the log with line endings and encoding normalized
    Write {
        /// File to read, or `-` for stdin
        input: PathBuf,

        /// Encoding of the input (detected when omitted)
        #[arg(long)]
        encoding: Option<String>,
    },

    /// Show the 256-color palette with theme indices
    Palette,

    /// Dump the effective configuration, or one `/`-delimited path of it
    Config {
        /// Path such as `theme_colors/dump_string`
        path: Option<String>,
    },
}

impl Cli {
    /// Loader for the selected config directory with the flag overrides applied.
    pub fn loader(&self) -> ConfigLoader {
        let mut loader = match &self.config_dir {
            Some(dir) => ConfigLoader::new(dir),
            None => ConfigLoader::from_default_dir(),
        };
        if let Some(theme) = &self.theme {
            loader = loader.with_override("theme", theme.as_str());
        }
        if self.no_color {
            loader = loader.with_override("use_colors", false);
        }
        if self.print {
            loader = loader.with_override("output", "print");
        }
        loader
    }
}

/// Run the selected command.
pub fn run(cli: &Cli) -> Result<()> {
    let loader = cli.loader();
    let dumper = Dumper::load(&loader)
        .with_context(|| format!("Failed to initialize from {:?}", loader.base_dir()))?;
    let _session = dumper.session();

    match &cli.command {
        Commands::Json {
            input,
            label,
            max_depth,
        } => {
            let bytes = read_input(input)?;
            let document: serde_json::Value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse JSON from {}", input_name(input)))?;
            dump_document(&dumper, input, label.as_deref(), *max_depth, document.into());
        }
        Commands::Yaml {
            input,
            label,
            max_depth,
        } => {
            let bytes = read_input(input)?;
            let document: serde_json::Value = serde_yaml_ng::from_slice(&bytes)
                .with_context(|| format!("Failed to parse YAML from {}", input_name(input)))?;
            dump_document(&dumper, input, label.as_deref(), *max_depth, document.into());
        }
        Commands::Hex { input } => dumper.hex(read_input(input)?),
        Commands::Write { input, encoding } => {
            dumper.write(read_input(input)?, encoding.as_deref());
        }
        Commands::Palette => dumper.palette(),
        Commands::Config { path } => {
            let path = path.as_deref().unwrap_or("");
            let value = dumper
                .store()
                .get(path)
                .cloned()
                .map(Value::from)
                .unwrap_or_default();
            let label = if path.is_empty() { "config" } else { path };
            dumper.dump_at(&value, Some(label), None, &CallSite::new("config", 1));
        }
    }
    Ok(())
}

fn dump_document(
    dumper: &Dumper,
    input: &Path,
    label: Option<&str>,
    max_depth: Option<usize>,
    value: Value,
) {
    let name = input_name(input);
    let label = label.unwrap_or(&name);
    dumper.dump_at(&value, Some(label), max_depth, &CallSite::new(name.as_str(), 1));
}

fn input_name(input: &Path) -> String {
    if input.as_os_str() == STDIN {
        "stdin".to_string()
    } else {
        input.display().to_string()
    }
}

/// Read a file, or all of stdin for `-`.
fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input.as_os_str() == STDIN {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        return Ok(bytes);
    }
    std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["par-dump", "json", "data.json", "--print", "--no-color"])
            .expect("Failed to parse args");
        assert!(cli.print);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Json { .. }));
    }

    #[test]
    fn test_loader_applies_overrides() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().display().to_string();
        let cli = Cli::try_parse_from([
            "par-dump",
            "--config-dir",
            dir.as_str(),
            "--theme",
            "light",
            "--no-color",
            "palette",
        ])
        .expect("Failed to parse args");

        let store = cli.loader().load().expect("load");
        assert_eq!(store.get("use_colors"), Some(&serde_json::json!(false)));
        assert_eq!(store.get_string("theme").as_deref(), Some("light"));
        assert_eq!(
            store.get_string("theme_colors/dump_string").as_deref(),
            Some("166")
        );
    }

    #[test]
    fn test_input_name() {
        assert_eq!(input_name(Path::new("-")), "stdin");
        assert_eq!(input_name(Path::new("a.json")), "a.json");
    }
}
