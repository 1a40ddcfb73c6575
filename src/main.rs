use std::sync::Arc;
use std::time::Duration;

use parallel_ping_rs::logging;
use parallel_ping_rs::probe::SystemPing;
use parallel_ping_rs::reporter::{ReportStyle, StatusReporter};
use parallel_ping_rs::session::{BatchConfig, LineInput, Prefill, Session};
use parallel_ping_rs::worklist;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

/// parallel-ping-rs — ping a list of hosts with a bounded number of probes in flight.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "parallel-ping-rs",
    version,
    about = "Ping a list of hosts with a bounded number of concurrent ICMP echo requests.",
    long_about = "Ping a list of hosts with a bounded number of concurrent ICMP echo requests.\n\n\
        Values not given on the command line are asked for interactively; an empty \
        answer exits. When concurrency, count and enough hosts are all given, a single \
        batch runs and the program exits."
)]
struct Cli {
    /// Maximum number of concurrently executing ping requests.
    #[arg(short = 'c', long, value_parser = worklist::parse_concurrency)]
    concurrency: Option<usize>,

    /// Number of ping requests to make. Defaults to the number of HOSTS given.
    #[arg(short = 'n', long, value_parser = worklist::parse_count)]
    count: Option<usize>,

    /// Host names or addresses to ping, in order.
    hosts: Vec<String>,

    /// Per-request reply timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 4000)]
    timeout_ms: u64,

    /// Emit one JSON object per outcome instead of text lines.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Disable colored status keywords.
    #[arg(long = "no-color", default_value_t = false)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

impl Cli {
    fn prefill(&self) -> Prefill {
        let count = self
            .count
            .or_else(|| (!self.hosts.is_empty()).then_some(self.hosts.len()));
        Prefill {
            concurrency: self.concurrency,
            count,
            hosts: self.hosts.clone(),
        }
    }

    fn style(&self) -> ReportStyle {
        if self.json {
            ReportStyle::Json
        } else {
            ReportStyle::Human {
                color: !self.no_color,
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet).context("failed to initialize logging")?;
    debug!("arguments: {:?}", cli);

    let probe = Arc::new(SystemPing::new(Duration::from_millis(cli.timeout_ms)));
    let console = Arc::new(StatusReporter::stdout(cli.style()));

    let prefill = cli.prefill();
    if prefill.is_complete() {
        let cfg = BatchConfig::from_prefill(&prefill)
            .context("invalid host list")?
            .context("incomplete configuration")?;
        // Nothing is asked for, so stdin is never read and only Ctrl-C cancels.
        let mut session = Session::new(LineInput::closed(), console, probe);
        let summary = session.run_unattended(cfg).await?;
        info!(
            "{} probed, {} succeeded, {} failed, {} cancelled",
            summary.probed, summary.succeeded, summary.failed, summary.cancelled
        );
        return Ok(());
    }

    Session::new(LineInput::stdin(), console, probe)
        .run_interactive(prefill)
        .await
}
