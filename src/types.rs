use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of work: a target host and its 1-based position in the batch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeTask {
    pub index: usize,
    pub host: String,
}

impl ProbeTask {
    pub fn new(index: usize, host: impl Into<String>) -> Self {
        Self {
            index,
            host: host.into(),
        }
    }
}

/// Status carried by an echo reply, or its absence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ReplyStatus {
    Success,
    /// The probe finished but nothing came back.
    NoReply,
    /// A named failure status, e.g. `DestinationHostUnreachable`.
    Failed(String),
}

/// Terminal result recorded for one dispatched task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success,
    Unreachable(Option<String>),
    TransportError(String),
    Cancelled,
}

impl ProbeOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ProbeOutcome::Success => OutcomeKind::Success,
            ProbeOutcome::Unreachable(_) => OutcomeKind::Unreachable,
            ProbeOutcome::TransportError(_) => OutcomeKind::TransportError,
            ProbeOutcome::Cancelled => OutcomeKind::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

impl From<ReplyStatus> for ProbeOutcome {
    fn from(status: ReplyStatus) -> Self {
        match status {
            ReplyStatus::Success => ProbeOutcome::Success,
            ReplyStatus::NoReply => ProbeOutcome::Unreachable(None),
            ReplyStatus::Failed(name) => ProbeOutcome::Unreachable(Some(name)),
        }
    }
}

/// Status keyword shown to the user: `Success`, the raw status name,
/// `no reply status`, a parenthesized error summary, or `Cancelled`.
impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Success => f.write_str("Success"),
            ProbeOutcome::Unreachable(Some(name)) => f.write_str(name),
            ProbeOutcome::Unreachable(None) => f.write_str("no reply status"),
            ProbeOutcome::TransportError(detail) => write!(f, "({detail})"),
            ProbeOutcome::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Discriminant of a [`ProbeOutcome`], used by displays to pick a style.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Unreachable,
    TransportError,
    Cancelled,
}

/// Counters for a single batch. Nothing is carried across batches.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub probed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub was_cancelled: bool,
}

impl BatchSummary {
    /// Tasks that produced a report (probed or cancelled after claim).
    pub fn reported(&self) -> usize {
        self.probed + self.cancelled
    }

    pub(crate) fn record(&mut self, outcome: &ProbeOutcome) {
        match outcome {
            ProbeOutcome::Cancelled => self.cancelled += 1,
            ProbeOutcome::Success => {
                self.probed += 1;
                self.succeeded += 1;
            }
            ProbeOutcome::Unreachable(_) | ProbeOutcome::TransportError(_) => {
                self.probed += 1;
                self.failed += 1;
            }
        }
    }
}
