use anyhow::Result;
use clap::Parser;
use par_dump::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Route log::info!() etc. to the debug log before anything is loaded.
    // The --log-level flag takes precedence over DEBUG_LEVEL and RUST_LOG.
    par_dump::debug::init_log_bridge(cli.log_level.map(|l| l.to_level_filter()));

    log::info!("Starting par-dump {}", par_dump::VERSION);

    let result = cli::run(&cli);
    if let Err(ref e) = result {
        eprintln!("par-dump: error: {e:#}");
    }
    result
}
