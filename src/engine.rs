use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{AppConfig, RootConfig};
use crate::dupes::{self, DuplicateReport};
use crate::error::Error;
use crate::extract::{ExtractionStats, ForceFlags, Pipeline};
use crate::model::{FileRecord, RecordKey};
use crate::progress::ProgressReporter;
use crate::scanner::{self, ScanStats};
use crate::store::InventoryStore;

/// Owns everything one run touches. Two engines never share state.
pub struct InventoryEngine {
    config: AppConfig,
    store: InventoryStore,
    force: ForceFlags,
    cancel: Arc<AtomicBool>,
}

/// Result of load, scan, extract and detect; not yet persisted.
#[derive(Debug)]
pub struct RunOutcome {
    /// Every current record in scan-discovery order.
    pub records: Vec<FileRecord>,
    /// Prior records that were not re-observed; dropped from the store.
    pub stale: Vec<FileRecord>,
    pub duplicates: DuplicateReport,
    pub scan_stats: ScanStats,
    pub extraction_stats: ExtractionStats,
    pub scan_duration: Duration,
    pub extract_duration: Duration,
}

impl InventoryEngine {
    pub fn new(config: AppConfig) -> Self {
        let store = InventoryStore::new(&config.store_path);
        Self {
            config,
            store,
            force: ForceFlags::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_force(mut self, force: ForceFlags) -> Self {
        self.force = force;
        self
    }

    pub fn with_store_path(mut self, path: impl AsRef<Path>) -> Self {
        self.store = InventoryStore::new(path.as_ref());
        self
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    /// Setting the token makes the run stop at the next check with
    /// `Error::Cancelled`; nothing is persisted.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Full run: `execute` followed by `persist`.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunOutcome, Error> {
        let outcome = self.execute(reporter)?;
        self.persist(&outcome, reporter)?;
        Ok(outcome)
    }

    /// Load the prior inventory, scan all enabled roots, run the extraction
    /// stages and detect duplicates. Any error aborts before persistence.
    pub fn execute(&self, reporter: &dyn ProgressReporter) -> Result<RunOutcome, Error> {
        let prior: DashMap<RecordKey, FileRecord> = self.store.load()?.into_iter().collect();
        info!("Loaded {} records from inventory", prior.len());
        self.check_cancelled()?;

        // Phase 1: Scan
        let roots: Vec<&RootConfig> = self.config.enabled_roots().collect();
        info!("Scanning {} roots...", roots.len());
        reporter.on_scan_start(roots.len());
        let scan_start = Instant::now();
        let scan = scanner::scan_roots(&roots, &prior, &self.cancel, reporter)?;
        let scan_duration = scan_start.elapsed();

        let mut stale: Vec<FileRecord> = prior.into_iter().map(|(_, record)| record).collect();
        stale.sort_by(|a, b| a.key().cmp(&b.key()));
        for record in &stale {
            debug!("Removed {}", record.full_path().display());
        }
        reporter.on_scan_complete(scan.records.len(), stale.len(), scan_duration.as_secs_f64());
        info!(
            "Scan completed in {:.2}s: {} records, {} stale",
            scan_duration.as_secs_f64(),
            scan.records.len(),
            stale.len()
        );
        self.check_cancelled()?;

        // Phase 2: Extract
        let mut records = scan.records;
        let extract_start = Instant::now();
        let pipeline = Pipeline::standard(self.config.workers)?;
        let extraction_stats = pipeline.run(&mut records, self.force, &self.cancel, reporter)?;
        let extract_duration = extract_start.elapsed();
        debug!("Extraction completed in {:.2}s", extract_duration.as_secs_f64());

        // Phase 3: Duplicates
        let duplicates = dupes::find_duplicates(&records);
        info!(
            "{} duplicate groups, {} files",
            duplicates.groups.len(),
            duplicates.duplicate_files()
        );

        Ok(RunOutcome {
            records,
            stale,
            duplicates,
            scan_stats: scan.stats,
            extraction_stats,
            scan_duration,
            extract_duration,
        })
    }

    /// Overwrite the store with the outcome's records.
    pub fn persist(
        &self,
        outcome: &RunOutcome,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), Error> {
        self.check_cancelled()?;
        self.store.save(&outcome.records)?;
        reporter.on_persist_complete(outcome.records.len());
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), Error> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}
