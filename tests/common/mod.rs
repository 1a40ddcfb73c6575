#![allow(dead_code)]

use async_trait::async_trait;
use parallel_ping_rs::cancel::CancelSignal;
use parallel_ping_rs::error::ProbeError;
use parallel_ping_rs::probe::Probe;
use parallel_ping_rs::types::ReplyStatus;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted host does when probed.
#[derive(Clone, Debug)]
pub enum Script {
    Reply(ReplyStatus),
    Fail(&'static str),
    Panic,
    /// Trigger the attached cancel signal, then reply with success.
    CancelThenSucceed,
}

/// Probe double with per-host scripts, an artificial delay and an in-flight gauge.
pub struct ScriptedProbe {
    scripts: HashMap<String, Script>,
    delay: Duration,
    cancel: Option<CancelSignal>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delay: Duration::ZERO,
            cancel: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(mut self, host: &str, script: Script) -> Self {
        self.scripts.insert(host.to_string(), script);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn cancel_with(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, host: &str) -> Result<ReplyStatus, ProbeError> {
        self.calls.lock().unwrap().push(host.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(host).cloned() {
            None => Ok(ReplyStatus::Success),
            Some(Script::Reply(status)) => Ok(status),
            Some(Script::Fail(msg)) => Err(ProbeError::with_cause("send failed", msg)),
            Some(Script::Panic) => panic!("scripted panic for {host}"),
            Some(Script::CancelThenSucceed) => {
                if let Some(c) = &self.cancel {
                    c.trigger();
                }
                Ok(ReplyStatus::Success)
            }
        }
    }
}

/// In-memory sink shared between the reporter and the test.
///
/// `chunk` limits how many bytes a single `write` accepts, so an unguarded
/// writer would interleave lines.
#[derive(Clone, Default)]
pub struct SharedBuf {
    buf: Arc<Mutex<Vec<u8>>>,
    chunk: Option<usize>,
}

impl SharedBuf {
    pub fn chunked(chunk: usize) -> Self {
        Self {
            buf: Arc::default(),
            chunk: Some(chunk),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.buf.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    /// Lines that are status reports (as opposed to prompts and notices).
    pub fn status_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with("Task #"))
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.chunk.map_or(data.len(), |c| c.min(data.len()));
        self.buf.lock().unwrap().extend_from_slice(&data[..n]);
        if self.chunk.is_some() {
            std::thread::yield_now();
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
