use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{Stage, StageKind};
use crate::error::ExtractionError;
use crate::model::FileRecord;

const READ_BUFFER_SIZE: usize = 64 * 1024; // 64KB

/// Stream the whole file through BLAKE3 and return the lowercase hex digest.
/// Memory use is bounded by the read buffer regardless of file size.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(hasher.finalize().to_hex().to_string())
}

pub struct HashStage;

impl Stage for HashStage {
    fn kind(&self) -> StageKind {
        StageKind::Hash
    }

    fn applies_to(&self, _record: &FileRecord) -> bool {
        true
    }

    fn is_done(&self, record: &FileRecord) -> bool {
        record.content_hash.is_some()
    }

    fn apply(&self, path: &Path, record: &mut FileRecord) -> Result<(), ExtractionError> {
        let hash = hash_file(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        record.content_hash = Some(hash);
        Ok(())
    }
}
