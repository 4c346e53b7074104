use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use file_inventory::extract::{StageKind, StageStats};
use file_inventory::ProgressReporter;

/// Terminal progress using indicatif.
///
/// - Scan phase: spinner (file count unknown upfront)
/// - Extraction stages: one bar per stage
///
/// Draws nothing when stderr is not a terminal.
pub struct TermReporter {
    enabled: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl TermReporter {
    pub fn new() -> Self {
        Self {
            enabled: Term::stderr().is_term(),
            bar: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        // a panic while holding the lock only loses a bar
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Some(old) = self.slot().replace(pb) {
            old.finish_and_clear();
        }
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.slot().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for TermReporter {
    fn on_scan_start(&self, roots: usize) {
        if !self.enabled {
            return;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(format!("Scanning {} roots...", roots));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_root_scanned(&self, root: &Path, files: usize) {
        if let Some(pb) = self.slot().as_ref() {
            pb.println(format!("  {} files in {}", files, root.display()));
        }
    }

    fn on_scan_complete(&self, total_files: usize, stale: usize, duration_secs: f64) {
        self.finish_bar();
        if self.enabled {
            eprintln!(
                "  \x1b[32m✓\x1b[0m Scan complete: {} files, {} stale, in {:.2}s",
                total_files, stale, duration_secs
            );
        }
    }

    fn on_stage_start(&self, stage: StageKind, pending: usize) {
        if !self.enabled || pending == 0 {
            return;
        }
        let pb = ProgressBar::new(pending as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{msg:>15} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        ) {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(stage.to_string());
        self.set_bar(pb);
    }

    fn on_stage_progress(&self, _stage: StageKind, done: usize, _pending: usize) {
        if let Some(pb) = self.slot().as_ref() {
            pb.set_position(done as u64);
        }
    }

    fn on_stage_complete(&self, stage: StageKind, stats: &StageStats, duration_secs: f64) {
        self.finish_bar();
        if self.enabled && stats.pending > 0 {
            eprintln!(
                "  \x1b[32m✓\x1b[0m {}: {} extracted, {} failed in {:.2}s",
                stage, stats.succeeded, stats.failed, duration_secs
            );
        }
    }

    fn on_persist_complete(&self, records: usize) {
        if self.enabled {
            eprintln!("  \x1b[32m✓\x1b[0m Inventory saved: {} records", records);
        }
    }
}
