use std::time::Duration;

use crate::types::{ProbeOutcome, ScanResults, Summary};

/// Split outcomes into (positive, negative), preserving their order.
pub fn partition(results: &ScanResults) -> (Vec<&ProbeOutcome>, Vec<&ProbeOutcome>) {
    results.entries.iter().partition(|e| e.positive)
}

/// Clone out only the positive outcomes.
pub fn positives(results: &ScanResults) -> Vec<ProbeOutcome> {
    results
        .entries
        .iter()
        .filter(|e| e.positive)
        .cloned()
        .collect()
}

/// Completed operations per second; `None` when no time elapsed.
pub fn ops_per_sec(count: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    (secs > 0.0).then(|| count as f64 / secs)
}

pub fn summarize(results: &ScanResults) -> Summary {
    let total = results.entries.len() as u64;
    let positives = positives(results);
    let positive = positives.len() as u64;
    Summary {
        subject: results.subject.clone(),
        total,
        positive,
        negative: total - positive,
        ops_per_sec: ops_per_sec(total, Duration::from_millis(results.elapsed_ms)),
        positives,
    }
}
