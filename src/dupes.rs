use std::collections::HashMap;
use std::path::PathBuf;

use crate::model::FileRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub content_hash: String,
    pub size: u64,
    /// Members in scan-discovery order, the first observation included.
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Bytes that would be freed by keeping a single copy.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * (self.paths.len() as u64).saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Groups ordered by the discovery of their second member.
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }

    pub fn wasted_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_bytes).sum()
    }

    pub fn get(&self, content_hash: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.content_hash == content_hash)
    }
}

/// Group records by content hash in a single pass. Empty files and records
/// without a hash never take part.
pub fn find_duplicates(records: &[FileRecord]) -> DuplicateReport {
    // first observation of each hash
    let mut seeds: HashMap<&str, &FileRecord> = HashMap::new();
    // hash -> index into groups, once promoted
    let mut promoted: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for record in records {
        let hash = match record.content_hash.as_deref() {
            Some(hash) if record.size() > 0 => hash,
            _ => continue,
        };

        if let Some(&index) = promoted.get(hash) {
            groups[index].paths.push(record.full_path());
            continue;
        }

        match seeds.get(hash) {
            Some(first) => {
                promoted.insert(hash, groups.len());
                groups.push(DuplicateGroup {
                    content_hash: hash.to_string(),
                    size: record.size(),
                    paths: vec![first.full_path(), record.full_path()],
                });
            }
            None => {
                seeds.insert(hash, record);
            }
        }
    }

    DuplicateReport { groups }
}
