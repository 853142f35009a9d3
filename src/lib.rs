//! # csv2sqlite - Simulation result loader
//!
//! Loads the delimited result files written by repeated simulation runs into a
//! single SQLite database.
//!
//! csv2sqlite provides:
//! - A static registry mapping filename tokens (`freq`, `g`, `n`, `status`, `trans`, `tree`) to tables
//! - Run directory resolution for explicit lists or a root of independent runs
//! - Lazy, line-by-line row parsing with a per-run instance override
//! - File-scoped or directory-scoped transactions
//! - An optional GenotypeFreq/Genotype join view built after the load

pub mod config;
pub mod importer;
pub mod loader;
pub mod output;
pub mod report;
pub mod resolver;
pub mod source;
pub mod storage;
pub mod transaction;
pub mod transform;
pub mod ui;
pub mod view;

// Re-exports for convenient access
pub use importer::{ImportObserver, Importer, NoopObserver};
pub use report::ImportReport;
pub use resolver::{RunDir, RunLayout};
pub use storage::{ContentSchema, SchemaRegistry, SqliteStore, Store};
pub use transaction::CommitPolicy;

/// Result type alias for csv2sqlite operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for csv2sqlite operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("{0} did not return any matches")]
    NoSourceFiles(String),

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("{file}:{line}: {source}")]
    AtRow {
        file: String,
        line: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("{view} requires table {table}, which does not exist")]
    MissingTable { view: String, table: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Attach the source file and line a row-level failure came from
    pub fn at_row(self, file: impl Into<String>, line: usize) -> Self {
        Error::AtRow {
            file: file.into(),
            line,
            source: Box::new(self),
        }
    }

    /// True for errors raised before the destination store is touched
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_) | Error::UnknownContentType(_) | Error::Config(_))
    }
}
