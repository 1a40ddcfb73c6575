use crate::cancel::CancelSignal;
use crate::error::{DispatchError, InputError};
use crate::probe::Probe;
use crate::reporter::StatusReporter;
use crate::types::{BatchSummary, ProbeOutcome, ProbeTask};
use crate::worklist::MAX_CONCURRENCY;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Probe every task with at most `max_concurrency` probes in flight.
///
/// - Tasks are claimed in list order; each claimed task is probed and reported
///   exactly once through `reporter`.
/// - A failing or panicking probe becomes a `TransportError` outcome for that
///   task only; the rest of the batch carries on.
/// - Returns after every spawned task has reported. Only invalid parameters fail,
///   and they fail before anything is dispatched.
pub async fn run_batch(
    tasks: Vec<ProbeTask>,
    max_concurrency: usize,
    probe: Arc<dyn Probe>,
    reporter: Arc<StatusReporter>,
) -> Result<BatchSummary, DispatchError> {
    run_batch_internal(tasks, max_concurrency, probe, reporter, None).await
}

/// Variant that observes an external [`CancelSignal`].
///
/// Once the signal is set no further task is claimed. A task already claimed
/// reports `Cancelled` if it sees the signal before probing; probes already
/// running finish and report their real outcome.
pub async fn run_batch_with_cancel(
    tasks: Vec<ProbeTask>,
    max_concurrency: usize,
    probe: Arc<dyn Probe>,
    reporter: Arc<StatusReporter>,
    cancel: CancelSignal,
) -> Result<BatchSummary, DispatchError> {
    run_batch_internal(tasks, max_concurrency, probe, reporter, Some(cancel)).await
}

async fn run_batch_internal(
    tasks: Vec<ProbeTask>,
    max_concurrency: usize,
    probe: Arc<dyn Probe>,
    reporter: Arc<StatusReporter>,
    cancel_opt: Option<CancelSignal>,
) -> Result<BatchSummary, DispatchError> {
    if max_concurrency == 0 {
        return Err(InputError::Zero.into());
    }
    if max_concurrency > MAX_CONCURRENCY {
        return Err(InputError::TooLarge {
            value: max_concurrency as u64,
            max: MAX_CONCURRENCY as u64,
        }
        .into());
    }

    let mut summary = BatchSummary {
        total: tasks.len(),
        ..BatchSummary::default()
    };
    if tasks.is_empty() {
        return Ok(summary);
    }

    let cancel = cancel_opt.unwrap_or_default();
    let sem = Arc::new(Semaphore::new(max_concurrency.min(Semaphore::MAX_PERMITS)));
    let mut set = JoinSet::new();
    info!(tasks = summary.total, max_concurrency, "dispatching batch");

    for task in tasks {
        if cancel.is_cancelled() {
            break;
        }
        // Wait for a free slot, but give up the moment cancellation is requested.
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = sem.clone().acquire_owned() => match permit {
                Ok(p) => p,
                Err(_) => break,
            },
        };

        debug!(index = task.index, host = %task.host, "claimed");
        let probe = probe.clone();
        let reporter = reporter.clone();
        let cancel = cancel.clone();
        set.spawn(async move {
            let _permit = permit; // slot stays taken until the outcome is reported
            let outcome = probe_task(&task, probe, &cancel).await;
            reporter.report(&task, &outcome).await;
            outcome
        });

        while let Some(res) = set.try_join_next() {
            record(&mut summary, res);
        }
    }

    while let Some(res) = set.join_next().await {
        record(&mut summary, res);
    }

    summary.was_cancelled = cancel.is_cancelled();
    info!(
        probed = summary.probed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        cancelled = summary.cancelled,
        was_cancelled = summary.was_cancelled,
        "batch finished"
    );
    Ok(summary)
}

/// Check the signal, then probe. The probe runs in its own task so that a panic
/// is contained and surfaces as a transport error.
async fn probe_task(task: &ProbeTask, probe: Arc<dyn Probe>, cancel: &CancelSignal) -> ProbeOutcome {
    if cancel.is_cancelled() {
        debug!(index = task.index, "cancelled before probing");
        return ProbeOutcome::Cancelled;
    }

    let host = task.host.clone();
    match tokio::spawn(async move { probe.probe(&host).await }).await {
        Ok(Ok(status)) => status.into(),
        Ok(Err(e)) => {
            warn!(index = task.index, host = %task.host, "probe failed: {e}");
            ProbeOutcome::TransportError(e.to_string())
        }
        Err(e) => {
            error!(index = task.index, host = %task.host, "probe aborted: {e}");
            ProbeOutcome::TransportError(describe_join_error(&e))
        }
    }
}

fn describe_join_error(e: &JoinError) -> String {
    if e.is_panic() {
        "probe task panicked".to_string()
    } else {
        "probe task was aborted".to_string()
    }
}

fn record(summary: &mut BatchSummary, res: Result<ProbeOutcome, JoinError>) {
    match res {
        Ok(outcome) => summary.record(&outcome),
        Err(e) => error!("worker exited without an outcome: {e}"),
    }
}
