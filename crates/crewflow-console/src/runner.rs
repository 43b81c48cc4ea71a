//! The single tick source.
//!
//! One interval drives every session. Each tick takes the write lock once,
//! advances all simulations and re-projects their graphs before releasing it.
//! Cancelling the handle (explicitly or by dropping it) stops the task; no tick
//! is applied after cancellation is observed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::dashboard::DashboardState;

/// Owner of a running tick loop.
pub struct RunnerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl RunnerHandle {
    /// Ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Token that is cancelled when the runner stops.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop ticking and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Runner task ended abnormally");
            }
        }
    }
}

impl Drop for RunnerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start ticking `state` every `period`. The first tick fires one period from now.
pub fn spawn_runner(state: Arc<RwLock<DashboardState>>, period: Duration) -> RunnerHandle {
    let cancel = CancellationToken::new();
    let ticks = Arc::new(AtomicU64::new(0));

    let task = tokio::spawn(run_loop(state, period, cancel.clone(), ticks.clone()));
    tracing::info!(period_ms = period.as_millis() as u64, "Runner started");

    RunnerHandle {
        cancel,
        task: Some(task),
        ticks,
    }
}

async fn run_loop(
    state: Arc<RwLock<DashboardState>>,
    period: Duration,
    cancel: CancellationToken,
    ticks: Arc<AtomicU64>,
) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let mut guard = state.write().await;
                if cancel.is_cancelled() {
                    break;
                }
                guard.tick_all();
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    tracing::info!(ticks = ticks.load(Ordering::SeqCst), "Runner stopped");
}
