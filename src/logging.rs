use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, registry};

/// Map `-v` occurrences and `--quiet` onto a level filter.
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Logs go to stderr so they never mix with
/// status lines on stdout.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let console = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_filter(level_for(verbose, quiet));

    registry().with(console).try_init()?;
    Ok(())
}
