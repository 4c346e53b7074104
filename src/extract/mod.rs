pub mod audio;
pub mod hash;
pub mod image;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, ExtractionError};
use crate::model::FileRecord;
use crate::progress::ProgressReporter;

pub use audio::AudioTagStage;
pub use hash::HashStage;
pub use image::ImageMetadataStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Hash,
    AudioTags,
    ImageMetadata,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Hash => "hash",
            StageKind::AudioTags => "audio tags",
            StageKind::ImageMetadata => "image metadata",
        };
        f.write_str(name)
    }
}

/// Per-stage switches that re-run a stage even on records carrying its
/// output from a previous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForceFlags {
    pub hash: bool,
    pub audio_tags: bool,
    pub image_metadata: bool,
}

impl ForceFlags {
    pub fn all() -> Self {
        Self {
            hash: true,
            audio_tags: true,
            image_metadata: true,
        }
    }

    pub fn is_set(&self, kind: StageKind) -> bool {
        match kind {
            StageKind::Hash => self.hash,
            StageKind::AudioTags => self.audio_tags,
            StageKind::ImageMetadata => self.image_metadata,
        }
    }
}

/// One selective-recompute pass over the record list.
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Whether this kind of file is handled by the stage at all.
    fn applies_to(&self, record: &FileRecord) -> bool;

    /// Whether the record already carries this stage's output.
    fn is_done(&self, record: &FileRecord) -> bool;

    /// Extract from `path` and store the result on `record`. On error the
    /// record must be left as it was.
    fn apply(&self, path: &Path, record: &mut FileRecord) -> Result<(), ExtractionError>;

    /// A record that already failed this stage at its current stamp is only
    /// retried when forced.
    fn wants(&self, record: &FileRecord, force: bool) -> bool {
        if !self.applies_to(record) {
            return false;
        }
        force || !(self.is_done(record) || record.has_failed(self.kind()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub stages: Vec<(StageKind, StageStats)>,
}

impl ExtractionStats {
    pub fn get(&self, kind: StageKind) -> StageStats {
        self.stages
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, stats)| *stats)
            .unwrap_or_default()
    }
}

/// Runs each stage to completion, in order, over a bounded worker pool.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    pool: ThreadPool,
}

impl Pipeline {
    pub fn new(workers: usize, stages: Vec<Box<dyn Stage>>) -> Result<Self, Error> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("extract-{}", i))
            .build()?;
        Ok(Self { stages, pool })
    }

    /// Hash, audio-tag and image-metadata stages.
    pub fn standard(workers: usize) -> Result<Self, Error> {
        Self::new(
            workers,
            vec![
                Box::new(HashStage),
                Box::new(AudioTagStage),
                Box::new(ImageMetadataStage),
            ],
        )
    }

    pub fn run(
        &self,
        records: &mut [FileRecord],
        force: ForceFlags,
        cancel: &AtomicBool,
        reporter: &dyn ProgressReporter,
    ) -> Result<ExtractionStats, Error> {
        let mut stats = ExtractionStats::default();
        for stage in &self.stages {
            let stage_stats = self.run_stage(stage.as_ref(), records, force, cancel, reporter)?;
            stats.stages.push((stage.kind(), stage_stats));
        }
        Ok(stats)
    }

    fn run_stage(
        &self,
        stage: &dyn Stage,
        records: &mut [FileRecord],
        force: ForceFlags,
        cancel: &AtomicBool,
        reporter: &dyn ProgressReporter,
    ) -> Result<StageStats, Error> {
        let kind = stage.kind();
        let forced = force.is_set(kind);
        let pending = records.iter().filter(|r| stage.wants(r, forced)).count();

        info!("Running {} stage on {} records", kind, pending);
        reporter.on_stage_start(kind, pending);
        let start = Instant::now();

        let done = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        self.pool.install(|| {
            records
                .par_iter_mut()
                .filter(|record| stage.wants(record, forced))
                .for_each(|record| {
                    if cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    let path = record.full_path();
                    match stage.apply(&path, record) {
                        Ok(()) => {
                            record.failed_stages.remove(&kind);
                            debug!("{} extracted for {}", kind, path.display());
                        }
                        Err(err) => {
                            record.failed_stages.insert(kind);
                            warn!("Skipping {} for {}", kind, err);
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_stage_progress(kind, finished, pending);
                });
        });

        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        let failed = failed.into_inner();
        let stats = StageStats {
            pending,
            succeeded: done.into_inner() - failed,
            failed,
        };
        reporter.on_stage_complete(kind, &stats, start.elapsed().as_secs_f64());
        Ok(stats)
    }
}

/// Case-insensitive extension check against a lowercase list.
pub(crate) fn has_extension(record: &FileRecord, extensions: &[&str]) -> bool {
    record
        .extension()
        .map(|ext| extensions.contains(&ext.as_str()))
        .unwrap_or(false)
}
