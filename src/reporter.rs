use crate::types::{OutcomeKind, ProbeOutcome, ProbeTask};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{format_description::well_known, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::warn;

/// How each status line is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportStyle {
    Human { color: bool },
    Json,
}

impl Default for ReportStyle {
    fn default() -> Self {
        ReportStyle::Human { color: false }
    }
}

/// Serializes outcome lines from concurrent workers onto one shared sink.
///
/// - Each line is rendered before the sink is locked; the lock covers only the
///   write and flush of that one line, never the probe itself.
/// - Sink failures are counted and logged, never returned to the caller.
pub struct StatusReporter {
    sink: Mutex<Box<dyn Write + Send>>,
    style: ReportStyle,
    reported: AtomicU64,
    lost: AtomicU64,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    index: usize,
    host: &'a str,
    #[serde(flatten)]
    outcome: &'a ProbeOutcome,
    timestamp: String,
}

impl StatusReporter {
    pub fn new(sink: impl Write + Send + 'static, style: ReportStyle) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            style,
            reported: AtomicU64::new(0),
            lost: AtomicU64::new(0),
        }
    }

    /// Reporter writing to the process's standard output.
    pub fn stdout(style: ReportStyle) -> Self {
        Self::new(std::io::stdout(), style)
    }

    /// Write one complete status line for `task`.
    pub async fn report(&self, task: &ProbeTask, outcome: &ProbeOutcome) {
        let line = match self.render(task, outcome) {
            Some(line) => line,
            None => {
                self.lost.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let res = {
            let mut sink = self.sink.lock().await;
            sink.write_all(line.as_bytes()).and_then(|_| sink.flush())
        };

        match res {
            Ok(()) => {
                self.reported.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.lost.fetch_add(1, Ordering::Relaxed);
                warn!(index = task.index, host = %task.host, "status line lost: {e}");
            }
        }
    }

    /// Write free-form text (prompts, notices) through the same guarded sink.
    /// Not counted as a status line.
    pub async fn message(&self, text: &str) {
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.write_all(text.as_bytes()).and_then(|_| sink.flush()) {
            warn!("console write failed: {e}");
        }
    }

    /// Lines written successfully so far.
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }

    /// Lines that could not be rendered or written.
    pub fn lost_reports(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    fn render(&self, task: &ProbeTask, outcome: &ProbeOutcome) -> Option<String> {
        match self.style {
            ReportStyle::Human { color } => Some(render_human(task, outcome, color)),
            ReportStyle::Json => {
                let line = JsonLine {
                    index: task.index,
                    host: &task.host,
                    outcome,
                    timestamp: now_rfc3339(),
                };
                match serde_json::to_string(&line) {
                    Ok(mut s) => {
                        s.push('\n');
                        Some(s)
                    }
                    Err(e) => {
                        warn!(index = task.index, "could not encode status line: {e}");
                        None
                    }
                }
            }
        }
    }
}

/// `Task #<index> pinging host <host>... <status>` plus a trailing newline.
pub fn render_human(task: &ProbeTask, outcome: &ProbeOutcome, color: bool) -> String {
    let status = outcome.to_string();
    let status = if color {
        match outcome.kind() {
            OutcomeKind::Success => status.green().to_string(),
            OutcomeKind::Cancelled => status.yellow().to_string(),
            OutcomeKind::Unreachable | OutcomeKind::TransportError => status.red().to_string(),
        }
    } else {
        status
    };
    format!("Task #{} pinging host {}... {}\n", task.index, task.host, status)
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
