/// Trait for reporting triage pass progress.
///
/// The CLI implements this with indicatif progress bars; tests and embedded
/// callers use [`SilentReporter`]. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_walk_start(&self) {}
    fn on_walk_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_fingerprint_start(&self) {}
    fn on_fingerprint_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_fingerprint_complete(&self, _files_resolved: usize, _duration_secs: f64) {}
    fn on_classify_start(&self) {}
    fn on_classify_complete(&self, _files_classified: usize, _duration_secs: f64) {}
    fn on_persist_start(&self) {}
    fn on_persist_complete(&self, _records_written: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
