use clap::Parser;
use std::path::PathBuf;

use file_inventory::config::DEFAULT_CONFIG_NAME;
use file_inventory::ForceFlags;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "file-inventory")]
#[command(about = "Keep an inventory of files, their hashes and metadata, and report duplicates", long_about = None)]
pub struct Cli {
    /// Configuration file, with or without extension
    #[arg(short, long, default_value = DEFAULT_CONFIG_NAME)]
    pub config: String,

    /// Inventory store path, overriding the configuration
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Extraction worker count, overriding the configuration
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Re-hash every file
    #[arg(long)]
    pub force_hash: bool,

    /// Re-read tags from every audio file
    #[arg(long)]
    pub force_audio: bool,

    /// Re-read metadata from every image file
    #[arg(long)]
    pub force_image: bool,

    /// Recompute everything
    #[arg(long)]
    pub force_all: bool,

    /// Also write duplicate groups as CSV
    #[arg(long, value_name = "PATH")]
    pub duplicates_csv: Option<PathBuf>,

    /// Run everything but leave the store untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Log file, overriding LOG_FILE_PATH
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level unless TRACING_LEVEL is set
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn force_flags(&self) -> ForceFlags {
        if self.force_all {
            return ForceFlags::all();
        }
        ForceFlags {
            hash: self.force_hash,
            audio_tags: self.force_audio,
            image_metadata: self.force_image,
        }
    }
}
