use crate::cancel::CancelSignal;
use crate::dispatcher;
use crate::error::InputError;
use crate::probe::Probe;
use crate::reporter::StatusReporter;
use crate::types::{BatchSummary, ProbeTask};
use crate::worklist::{self, MAX_CONCURRENCY};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Lines typed by the user, read by one background reader for the whole program.
///
/// Prompts and the per-batch cancellation listener both pull from here, so a
/// read started by the listener can never swallow the answer to the next prompt.
pub struct LineInput {
    rx: mpsc::Receiver<String>,
}

impl LineInput {
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("input closed: {e}");
                        break;
                    }
                }
            }
        });
        Self { rx }
    }

    /// Read standard input on a dedicated OS thread.
    ///
    /// A blocking read on the runtime's blocking pool cannot be abandoned and
    /// would hold up runtime shutdown; a detached thread dies with the process.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(16);
        let spawned = std::thread::Builder::new()
            .name("stdin-lines".into())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!("input closed: {e}");
                            break;
                        }
                    }
                }
            });
        if let Err(e) = spawned {
            warn!("could not start input reader, running without input: {e}");
        }
        Self { rx }
    }

    /// Input fed by hand through the returned sender; closed once it is dropped.
    pub fn channel() -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(16);
        (tx, Self { rx })
    }

    /// Input that is already exhausted.
    pub fn closed() -> Self {
        Self::channel().1
    }

    /// Next line, or `None` once input is exhausted.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Discard lines already queued. Returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

/// Values supplied up front (e.g. on the command line) for the first cycle.
#[derive(Clone, Debug, Default)]
pub struct Prefill {
    pub concurrency: Option<usize>,
    pub count: Option<usize>,
    pub hosts: Vec<String>,
}

impl Prefill {
    /// True when a whole batch can be built without asking anything.
    pub fn is_complete(&self) -> bool {
        self.concurrency.is_some() && self.count.is_some_and(|n| self.hosts.len() >= n)
    }
}

/// A validated configuration for one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    pub concurrency: usize,
    pub tasks: Vec<ProbeTask>,
}

impl BatchConfig {
    pub fn from_prefill(prefill: &Prefill) -> Result<Option<Self>, InputError> {
        let (Some(concurrency), Some(count)) = (prefill.concurrency, prefill.count) else {
            return Ok(None);
        };
        let tasks = worklist::build_tasks(count, &prefill.hosts)?;
        Ok(Some(Self { concurrency, tasks }))
    }
}

/// Console front end: collects configuration, runs batches, listens for cancel.
pub struct Session {
    input: LineInput,
    console: Arc<StatusReporter>,
    probe: Arc<dyn Probe>,
}

impl Session {
    pub fn new(input: LineInput, console: Arc<StatusReporter>, probe: Arc<dyn Probe>) -> Self {
        Self {
            input,
            console,
            probe,
        }
    }

    /// Prompt for batches until the user enters an empty line or input ends.
    pub async fn run_interactive(mut self, mut prefill: Prefill) -> Result<()> {
        self.console
            .message("Enter empty line to exit the program at any time...\n\n")
            .await;

        while let Some(cfg) = self.collect_config(std::mem::take(&mut prefill)).await? {
            self.run_batch(cfg).await?;
        }
        Ok(())
    }

    /// Run one batch that a typed line or Ctrl-C can cancel.
    ///
    /// Lines typed after the cancel are dropped so they do not answer the next prompt.
    pub async fn run_batch(&mut self, cfg: BatchConfig) -> Result<BatchSummary> {
        self.console
            .message("Pinging... press Enter to cancel.\n")
            .await;
        let summary = self.dispatch(cfg, true).await?;
        if summary.was_cancelled {
            let dropped = self.input.drain();
            if dropped > 0 {
                debug!(dropped, "discarded input typed during cancellation");
            }
        }
        self.console.message("\n").await;
        Ok(summary)
    }

    /// Run one batch that only Ctrl-C can cancel. Standard input is left alone.
    pub async fn run_unattended(&mut self, cfg: BatchConfig) -> Result<BatchSummary> {
        self.dispatch(cfg, false).await
    }

    async fn dispatch(&mut self, cfg: BatchConfig, listen_lines: bool) -> Result<BatchSummary> {
        let cancel = CancelSignal::new();
        let batch = dispatcher::run_batch_with_cancel(
            cfg.tasks,
            cfg.concurrency,
            self.probe.clone(),
            self.console.clone(),
            cancel.clone(),
        );
        tokio::pin!(batch);

        // The listener lives inside this loop, so it is gone as soon as the batch is.
        let mut listening = listen_lines;
        let summary = loop {
            tokio::select! {
                res = &mut batch => break res.context("batch rejected")?,
                line = self.input.next_line(), if listening && !cancel.is_cancelled() => {
                    match line {
                        Some(_) => self.trigger_cancel(&cancel).await,
                        None => listening = false,
                    }
                }
                res = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                    if res.is_ok() {
                        self.trigger_cancel(&cancel).await;
                    }
                }
            }
        };
        Ok(summary)
    }

    async fn trigger_cancel(&self, cancel: &CancelSignal) {
        if cancel.trigger() {
            self.console.message("Ping canceled.\n").await;
        }
    }

    /// Ask for whatever `prefill` does not already provide. `None` means the
    /// user asked to exit.
    pub async fn collect_config(&mut self, prefill: Prefill) -> Result<Option<BatchConfig>> {
        let concurrency = match prefill.concurrency {
            Some(n) => n,
            None => {
                let prompt = format!(
                    "Enter the maximum number of concurrently executing ping requests (max {MAX_CONCURRENCY})"
                );
                match self.prompt(&prompt, worklist::parse_concurrency).await {
                    Some(n) => n,
                    None => return Ok(None),
                }
            }
        };

        let count = match prefill.count {
            Some(n) => n,
            None => match self
                .prompt("Enter the number of ping requests to be made", worklist::parse_count)
                .await
            {
                Some(n) => n,
                None => return Ok(None),
            },
        };

        let mut hosts = prefill.hosts;
        hosts.truncate(count);
        while hosts.len() < count {
            let prompt = format!("Enter host name or address {}/{}", hosts.len() + 1, count);
            match self.prompt(&prompt, parse_host).await {
                Some(h) => hosts.push(h),
                None => return Ok(None),
            }
        }

        let tasks = worklist::build_tasks(count, &hosts).context("building task list")?;
        Ok(Some(BatchConfig { concurrency, tasks }))
    }

    /// Re-prompt until `parse` accepts the line. Empty input, end of input, or
    /// Ctrl-C yields `None`.
    async fn prompt<T>(&mut self, prompt: &str, parse: fn(&str) -> Result<T, InputError>) -> Option<T> {
        loop {
            self.console.message(&format!("{prompt}: ")).await;
            let line = tokio::select! {
                line = self.input.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    self.console.message("\n").await;
                    return None;
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            match parse(&line) {
                Ok(v) => return Some(v),
                Err(e) => {
                    debug!("rejected input {line:?}: {e}");
                    self.console.message(&format!("  {e}\n")).await;
                }
            }
        }
    }
}

fn parse_host(s: &str) -> Result<String, InputError> {
    let s = s.trim();
    if s.is_empty() {
        Err(InputError::Empty)
    } else {
        Ok(s.to_string())
    }
}
