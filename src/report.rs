//! Import report

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::loader::{FileLoad, SkippedFile};
use crate::resolver::{RunDir, RunLayout};
use crate::transaction::CommitPolicy;
use crate::view::ViewOutcome;

/// Files loaded and skipped for one run directory
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub index: usize,
    pub path: PathBuf,
    pub loaded: Vec<FileLoad>,
    pub skipped: Vec<SkippedFile>,
}

/// Summary of a finished import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub layout: RunLayout,
    pub policy: CommitPolicy,
    pub directories: Vec<DirectoryReport>,
    pub rows_by_table: BTreeMap<String, usize>,
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub rows_loaded: usize,
    pub view: Option<ViewOutcome>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    pub fn new(layout: RunLayout, policy: CommitPolicy) -> Self {
        Self {
            layout,
            policy,
            directories: Vec::new(),
            rows_by_table: BTreeMap::new(),
            files_loaded: 0,
            files_skipped: 0,
            rows_loaded: 0,
            view: None,
            elapsed_ms: 0,
        }
    }

    /// Record a directory whose transaction(s) committed
    pub fn record_directory(&mut self, run: &RunDir, loaded: Vec<FileLoad>, skipped: Vec<SkippedFile>) {
        for load in &loaded {
            *self.rows_by_table.entry(load.table.to_string()).or_default() += load.rows;
            self.rows_loaded += load.rows;
        }
        self.files_loaded += loaded.len();
        self.files_skipped += skipped.len();
        self.directories.push(DirectoryReport {
            index: run.index,
            path: run.path.clone(),
            loaded,
            skipped,
        });
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Rows loaded into `table` during this import
    pub fn rows_for(&self, table: &str) -> usize {
        self.rows_by_table.get(table).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Import Statistics:")?;
        writeln!(f, "  Directories: {}", self.directories.len())?;
        writeln!(f, "  Files loaded: {}", self.files_loaded)?;
        writeln!(f, "  Files skipped: {}", self.files_skipped)?;
        writeln!(f, "  Rows: {}", self.rows_loaded)?;
        for (table, rows) in &self.rows_by_table {
            writeln!(f, "    {}: {}", table, rows)?;
        }
        if let Some(view) = &self.view {
            writeln!(f, "  View: {}", view)?;
        }
        write!(f, "  Commit policy: {}", self.policy.as_str())
    }
}
