use std::path::Path;

use crate::extract::{StageKind, StageStats};

/// Trait for reporting run progress.
///
/// The CLI implements it with indicatif bars. All methods have default
/// no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _roots: usize) {}
    fn on_root_scanned(&self, _root: &Path, _files: usize) {}
    fn on_scan_complete(&self, _total_files: usize, _stale: usize, _duration_secs: f64) {}
    fn on_stage_start(&self, _stage: StageKind, _pending: usize) {}
    fn on_stage_progress(&self, _stage: StageKind, _done: usize, _pending: usize) {}
    fn on_stage_complete(&self, _stage: StageKind, _stats: &StageStats, _duration_secs: f64) {}
    fn on_persist_complete(&self, _records: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
