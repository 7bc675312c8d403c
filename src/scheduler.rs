use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ToolConfig, MAX_CONCURRENCY};
use crate::probe::Probe;
use crate::types::{ProbeOutcome, ScanResults};

/// Admission gate size and per-probe timeout for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl RunOptions {
    pub fn new(concurrency: usize, timeout: Duration) -> Self {
        Self {
            concurrency,
            timeout,
        }
    }
}

impl From<&ToolConfig> for RunOptions {
    fn from(cfg: &ToolConfig) -> Self {
        Self::new(cfg.concurrency, cfg.timeout())
    }
}

/// Counters readable while a run is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub recorded: u64,
    pub positive: u64,
}

/// Shared sink every probe task writes its outcome into, exactly once.
#[derive(Clone, Debug, Default)]
pub struct ResultCollector {
    recorded: Arc<AtomicU64>,
    positive: Arc<AtomicU64>,
    entries: Arc<Mutex<Vec<ProbeOutcome>>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, outcome: ProbeOutcome) {
        let positive = outcome.positive;
        self.entries.lock().await.push(outcome);
        self.recorded.fetch_add(1, Ordering::Relaxed);
        if positive {
            self.positive.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            recorded: self.recorded.load(Ordering::Relaxed),
            positive: self.positive.load(Ordering::Relaxed),
        }
    }

    /// Move the recorded outcomes out, leaving the collector empty.
    pub async fn take(&self) -> Vec<ProbeOutcome> {
        std::mem::take(&mut *self.entries.lock().await)
    }
}

/// Probe every candidate with at most `opts.concurrency` probes in flight.
///
/// - Admission is a `Semaphore`; a permit is held from launch until the
///   outcome has been recorded.
/// - Each probe runs in its own task, so a panicking probe still produces a
///   negative outcome for its candidate.
/// - Returns only after every task has been joined.
pub async fn run_bounded<C, P, I>(
    subject: impl Into<String>,
    candidates: I,
    probe: Arc<P>,
    opts: RunOptions,
) -> ScanResults
where
    I: IntoIterator<Item = C>,
    C: Display + Send + 'static,
    P: Probe<C>,
{
    run_bounded_with(subject, candidates, probe, opts, ResultCollector::new()).await
}

/// Variant that records into a caller-supplied collector so progress can be
/// watched from elsewhere while the run is going.
pub async fn run_bounded_with<C, P, I>(
    subject: impl Into<String>,
    candidates: I,
    probe: Arc<P>,
    opts: RunOptions,
    collector: ResultCollector,
) -> ScanResults
where
    I: IntoIterator<Item = C>,
    C: Display + Send + 'static,
    P: Probe<C>,
{
    let subject = subject.into();
    let started = Instant::now();
    let sem = Arc::new(Semaphore::new(opts.concurrency.clamp(1, MAX_CONCURRENCY)));
    let mut set = JoinSet::new();
    let mut launched = 0u64;

    debug!(
        %subject,
        concurrency = opts.concurrency,
        timeout_ms = opts.timeout.as_millis() as u64,
        "starting run"
    );

    for candidate in candidates {
        let permit = sem
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed");
        let probe = probe.clone();
        let collector = collector.clone();
        let timeout = opts.timeout;
        launched += 1;

        set.spawn(async move {
            let target = candidate.to_string();
            let handle = tokio::spawn(async move { probe.probe(candidate, timeout).await });
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(candidate = %target, error = %e, "probe task failed");
                    ProbeOutcome::negative(target, Some(format!("probe task failed: {e}")))
                }
            };
            debug!(candidate = %outcome.target, positive = outcome.positive, "probe finished");
            collector.record(outcome).await;
            drop(permit);
        });
    }

    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "collector task failed");
        }
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let entries = collector.take().await;
    info!(
        %subject,
        scanned = launched,
        positive = entries.iter().filter(|e| e.positive).count(),
        elapsed_ms,
        "run complete"
    );

    ScanResults {
        subject,
        scanned_total: launched,
        elapsed_ms,
        entries,
    }
}
