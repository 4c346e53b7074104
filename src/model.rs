use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::StageKind;
use crate::platform;

/// Identity of a record: the owning root plus the path relative to it.
///
/// `relative_name` is `/` separated with every component encoded by
/// `platform::name_to_string`, so distinct file names never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub root_dir: PathBuf,
    pub relative_name: String,
}

/// The filesystem attributes compared between scans to detect change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    pub size: u64,
    pub mtime: DateTime<Utc>,
    pub ctime: DateTime<Utc>,
}

impl FileStamp {
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let (mtime, ctime) = platform::file_times(metadata);
        Self {
            size: metadata.len(),
            mtime,
            ctime,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

/// Image metadata as `tag name -> display value`, already stripped of
/// thumbnails and opaque binary sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageMetadata {
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub root_dir: PathBuf,
    pub relative_name: String,
    #[serde(flatten)]
    pub stamp: FileStamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_tags: Option<AudioTags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_metadata: Option<ImageMetadata>,
    /// Stages whose last attempt on this stamp failed.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub failed_stages: BTreeSet<StageKind>,
}

impl FileRecord {
    /// A freshly observed record with nothing extracted yet.
    pub fn observed(root_dir: &Path, relative_name: String, stamp: FileStamp) -> Self {
        Self {
            root_dir: root_dir.to_path_buf(),
            relative_name,
            stamp,
            content_hash: None,
            audio_tags: None,
            image_metadata: None,
            failed_stages: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            root_dir: self.root_dir.clone(),
            relative_name: self.relative_name.clone(),
        }
    }

    pub fn full_path(&self) -> PathBuf {
        self.relative_name
            .split('/')
            .fold(self.root_dir.clone(), |path, part| {
                path.join(platform::name_from_string(part))
            })
    }

    pub fn size(&self) -> u64 {
        self.stamp.size
    }

    /// Lowercased extension of the relative name, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.relative_name.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn has_failed(&self, stage: StageKind) -> bool {
        self.failed_stages.contains(&stage)
    }

    pub fn clear_extracted(&mut self) {
        self.content_hash = None;
        self.audio_tags = None;
        self.image_metadata = None;
        self.failed_stages.clear();
    }
}
