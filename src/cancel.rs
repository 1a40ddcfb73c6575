use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Single-fire cancellation signal shared by every worker of a batch.
///
/// Reads are plain atomic loads. The first `trigger` wins the compare-and-set
/// and wakes everything awaiting [`CancelSignal::cancelled`]; later calls are no-ops.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    fired: Arc<AtomicBool>,
    token: CancellationToken,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal. Returns `true` only for the call that actually set it.
    pub fn trigger(&self) -> bool {
        let won = self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.token.cancel();
        }
        won
    }

    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Resolves once the signal has been set.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
