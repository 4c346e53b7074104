pub mod walk;

use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace};

use crate::config::RootConfig;
use crate::error::Error;
use crate::model::{FileRecord, FileStamp, RecordKey};
use crate::progress::ProgressReporter;
use crate::store::{reconcile, Reconciled};
use walk::{Flow, WalkEvent};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub directories: usize,
    pub pruned_directories: usize,
    pub files: usize,
    pub excluded_files: usize,
    pub symlinks: usize,
    pub special_files: usize,
    pub new: usize,
    pub changed: usize,
    pub unchanged: usize,
}

impl ScanStats {
    fn merge(&mut self, other: &ScanStats) {
        self.directories += other.directories;
        self.pruned_directories += other.pruned_directories;
        self.files += other.files;
        self.excluded_files += other.excluded_files;
        self.symlinks += other.symlinks;
        self.special_files += other.special_files;
        self.new += other.new;
        self.changed += other.changed;
        self.unchanged += other.unchanged;
    }

    fn count(&mut self, reconciled: &Reconciled) {
        match reconciled {
            Reconciled::New(_) => self.new += 1,
            Reconciled::Changed(_) => self.changed += 1,
            Reconciled::Unchanged(_) => self.unchanged += 1,
        }
    }
}

#[derive(Debug)]
pub struct RootScan {
    pub root: PathBuf,
    pub records: Vec<FileRecord>,
    pub stats: ScanStats,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Records of every root, roots in config order, each in discovery order.
    pub records: Vec<FileRecord>,
    pub stats: ScanStats,
}

/// Scan every root in parallel. Each observed file claims (removes) its
/// prior record from `prior`, so whatever remains afterwards is stale.
///
/// The first failing root fails the whole scan.
pub fn scan_roots(
    roots: &[&RootConfig],
    prior: &DashMap<RecordKey, FileRecord>,
    cancel: &AtomicBool,
    reporter: &dyn ProgressReporter,
) -> Result<ScanOutcome, Error> {
    let scans = roots
        .par_iter()
        .map(|root| {
            let scan = scan_root(root, prior, cancel)?;
            reporter.on_root_scanned(&scan.root, scan.records.len());
            Ok(scan)
        })
        .collect::<Result<Vec<RootScan>, Error>>()?;

    let mut outcome = ScanOutcome::default();
    for scan in scans {
        outcome.stats.merge(&scan.stats);
        outcome.records.extend(scan.records);
    }
    Ok(outcome)
}

pub fn scan_root(
    root: &RootConfig,
    prior: &DashMap<RecordKey, FileRecord>,
    cancel: &AtomicBool,
) -> Result<RootScan, Error> {
    info!("Scanning {}", root.path.display());
    let mut records = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut stats = ScanStats::default();
    let mut pruned = 0usize;
    let mut failure: Option<Error> = None;

    walk::walk(
        &root.path,
        |relative| {
            let skip = root.matcher.should_exclude_dir(relative);
            if skip {
                debug!("Skipping {} and children", relative);
                pruned += 1;
            }
            skip
        },
        |event| {
            if cancel.load(Ordering::Relaxed) {
                failure = Some(Error::Cancelled);
                return Flow::Stop;
            }
            match event {
                WalkEvent::Directory { path, .. } => {
                    trace!("Directory {}", path.display());
                    stats.directories += 1;
                }
                WalkEvent::File {
                    path,
                    relative_name,
                    metadata,
                } => {
                    if root.matcher.should_exclude_file(relative_name) {
                        trace!("Excluded {}", path.display());
                        stats.excluded_files += 1;
                        return Flow::Continue;
                    }
                    if !names.insert(relative_name.to_string()) {
                        failure = Some(Error::NameCollision {
                            root: root.path.clone(),
                            relative_name: relative_name.to_string(),
                        });
                        return Flow::Stop;
                    }
                    stats.files += 1;
                    let observed = FileRecord::observed(
                        &root.path,
                        relative_name.to_string(),
                        FileStamp::from_metadata(&metadata),
                    );
                    let previous = prior.remove(&observed.key()).map(|(_, record)| record);
                    let reconciled = reconcile(observed, previous);
                    if let Reconciled::Unchanged(_) = reconciled {
                        trace!("Unchanged {}", path.display());
                    }
                    stats.count(&reconciled);
                    records.push(reconciled.into_record());
                }
                WalkEvent::Symlink { path } => {
                    debug!("Symlink {} not inventoried", path.display());
                    stats.symlinks += 1;
                }
                WalkEvent::Special { path, kind } => {
                    debug!("{:?} {} not inventoried", kind, path.display());
                    stats.special_files += 1;
                }
                WalkEvent::Error { error } => {
                    let path = error
                        .path()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| root.path.clone());
                    failure = Some(Error::Walk {
                        root: root.path.clone(),
                        path,
                        source: error,
                    });
                    return Flow::Stop;
                }
                WalkEvent::End => {
                    debug!("All files under {} traversed", root.path.display());
                }
            }
            Flow::Continue
        },
    );

    if let Some(err) = failure {
        return Err(err);
    }

    stats.pruned_directories = pruned;
    info!(
        "{}: {} files ({} new, {} changed, {} unchanged), {} excluded, {} directories pruned",
        root.path.display(),
        stats.files,
        stats.new,
        stats.changed,
        stats.unchanged,
        stats.excluded_files,
        stats.pruned_directories,
    );

    Ok(RootScan {
        root: root.path.clone(),
        records,
        stats,
    })
}
