use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::Error;
use crate::model::{FileRecord, RecordKey};

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    records: Vec<FileRecord>,
}

#[derive(Debug, Serialize)]
struct StoreDocumentRef<'a> {
    version: u32,
    records: &'a [FileRecord],
}

/// The on-disk snapshot of the previous run.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    path: PathBuf,
}

impl InventoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the prior inventory. A missing file is an empty inventory.
    pub fn load(&self) -> Result<HashMap<RecordKey, FileRecord>, Error> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No inventory at {}, starting empty", self.path.display());
                return Ok(HashMap::new());
            }
            Err(err) => return Err(self.unavailable(err)),
        };

        let document: StoreDocument =
            serde_json::from_slice(&bytes).map_err(|err| self.unavailable(err))?;
        if document.version != STORE_VERSION {
            return Err(self.unavailable(format!(
                "unsupported version {} (expected {})",
                document.version, STORE_VERSION
            )));
        }

        let mut records = HashMap::with_capacity(document.records.len());
        for record in document.records {
            let key = record.key();
            if records.contains_key(&key) {
                return Err(self.unavailable(format!(
                    "duplicate record {} in root {}",
                    key.relative_name,
                    key.root_dir.display()
                )));
            }
            records.insert(key, record);
        }
        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Replace the store with `records`. The new document is written to a
    /// temporary file beside the store and renamed over it, so a failed
    /// write leaves the previous store intact.
    pub fn save(&self, records: &[FileRecord]) -> Result<(), Error> {
        self.write_atomically(records).map_err(|source| Error::Persist {
            path: self.path.clone(),
            source,
        })?;
        info!("Persisted {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn write_atomically(&self, records: &[FileRecord]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            let document = StoreDocumentRef {
                version: STORE_VERSION,
                records,
            };
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    fn unavailable(&self, reason: impl ToString) -> Error {
        Error::StoreUnavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// What the diff decided for one observed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Not in the prior inventory.
    New(FileRecord),
    /// Size or a timestamp differs; extracted fields were cleared.
    Changed(FileRecord),
    /// Identical stamp; the prior record is kept as is.
    Unchanged(FileRecord),
}

impl Reconciled {
    pub fn record(&self) -> &FileRecord {
        match self {
            Reconciled::New(r) | Reconciled::Changed(r) | Reconciled::Unchanged(r) => r,
        }
    }

    pub fn into_record(self) -> FileRecord {
        match self {
            Reconciled::New(r) | Reconciled::Changed(r) | Reconciled::Unchanged(r) => r,
        }
    }
}

pub fn reconcile(mut observed: FileRecord, prior: Option<FileRecord>) -> Reconciled {
    match prior {
        None => {
            observed.clear_extracted();
            Reconciled::New(observed)
        }
        Some(prior) if prior.stamp == observed.stamp => Reconciled::Unchanged(prior),
        Some(_) => {
            observed.clear_extracted();
            Reconciled::Changed(observed)
        }
    }
}
