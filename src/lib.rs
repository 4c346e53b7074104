pub mod config;
pub mod dupes;
pub mod engine;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod model;
pub mod platform;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod store;

pub use config::{AppConfig, RootConfig};
pub use engine::{InventoryEngine, RunOutcome};
pub use error::{ConfigError, Error, ExtractionError};
pub use extract::ForceFlags;
pub use model::{FileRecord, RecordKey};
pub use progress::{ProgressReporter, SilentReporter};
