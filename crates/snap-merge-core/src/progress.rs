use crate::engine::RunStats;
use std::path::Path;

/// Trait for reporting batch progress.
///
/// The CLI implements it with indicatif; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait RunReporter {
    fn on_scan_complete(&self, _candidates: usize) {}
    fn on_pair_start(&self, _lead: &Path, _trailing: &Path) {}
    fn on_merged(&self, _lead: &Path, _trailing: &Path, _output: &Path) {}
    fn on_archived(&self, _file: &Path, _reason: &str) {}
    fn on_discarded(&self, _file: &Path, _reason: &str) {}
    fn on_run_complete(&self, _stats: &RunStats) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl RunReporter for SilentReporter {}
