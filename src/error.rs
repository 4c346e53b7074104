use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Inventory store {} is unavailable: {reason}", .path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("Walk of root {} failed at {}: {source}", .root.display(), .path.display())]
    Walk {
        root: PathBuf,
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Two files under root {} map to the record name '{relative_name}'", .root.display())]
    NameCollision { root: PathBuf, relative_name: String },

    #[error("Failed to persist inventory to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Load(#[from] config::ConfigError),

    #[error("roots '{first}' and '{second}' both resolve to {}", .path.display())]
    DuplicateRoot {
        first: String,
        second: String,
        path: PathBuf,
    },

    #[error("root '{0}' is not an absolute path")]
    RelativeRoot(String),

    #[error("cannot expand '~' in '{0}': no home directory")]
    NoHomeDir(String),

    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure of one extraction stage on one record. Never aborts a run.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading audio tags from {}: {source}", .path.display())]
    AudioTags {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("{} has no embedded tags", .0.display())]
    NoTags(PathBuf),

    #[error("reading image metadata from {}: {source}", .path.display())]
    Exif {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },
}
