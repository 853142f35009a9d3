//! Import orchestration
//!
//! Walks the resolved run directories in order, loads each one under the
//! configured [`CommitPolicy`], then builds the optional join view.
//!
//! Any error stops the import. Whatever transaction was open at that point has
//! already been rolled back when the error reaches the caller.

use std::time::Instant;

use crate::config::ImportOptions;
use crate::loader::{FileLoad, Loader, SkippedFile};
use crate::report::ImportReport;
use crate::resolver::{RunDir, RunLayout};
use crate::source::{SkipSet, discover_csv_files};
use crate::storage::{GENOTYPE_FREQ_VIEW, SchemaRegistry, Store, ViewDefinition};
use crate::transaction::CommitPolicy;
use crate::view::{ViewOutcome, build_view};
use crate::Result;

/// Progress callbacks; every method defaults to doing nothing
pub trait ImportObserver {
    fn directory_started(&mut self, _run: &RunDir, _files: usize) {}

    fn file_skipped(&mut self, _file: &SkippedFile) {}

    /// `committed` is true when the file's rows were committed on their own
    fn file_loaded(&mut self, _load: &FileLoad, _committed: bool) {}

    /// Only reported under [`CommitPolicy::PerDirectory`]
    fn directory_committed(&mut self, _run: &RunDir) {}

    fn view_finished(&mut self, _outcome: &ViewOutcome) {}
}

/// Observer for library callers that need no progress output
pub struct NoopObserver;

impl ImportObserver for NoopObserver {}

/// Loads run directories into a destination store
pub struct Importer<'r> {
    registry: &'r SchemaRegistry,
    skip: &'r SkipSet,
    layout: RunLayout,
    policy: CommitPolicy,
    views: Vec<ViewDefinition>,
}

impl<'r> Importer<'r> {
    pub fn new(registry: &'r SchemaRegistry, skip: &'r SkipSet) -> Self {
        Self {
            registry,
            skip,
            layout: RunLayout::default(),
            policy: CommitPolicy::default(),
            views: Vec::new(),
        }
    }

    pub fn from_options(registry: &'r SchemaRegistry, options: &'r ImportOptions) -> Self {
        Self::new(registry, &options.skip)
            .with_layout(options.layout)
            .with_policy(options.policy)
            .with_genotype_freq_view(options.genotype_freq_view)
    }

    pub fn with_layout(mut self, layout: RunLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_genotype_freq_view(mut self, enabled: bool) -> Self {
        self.views.retain(|v| v.name != GENOTYPE_FREQ_VIEW.name);
        if enabled {
            self.views.push(GENOTYPE_FREQ_VIEW);
        }
        self
    }

    /// Load every run directory, in order, then build the requested views
    pub fn run(
        &self,
        store: &mut dyn Store,
        runs: &[RunDir],
        observer: &mut dyn ImportObserver,
    ) -> Result<ImportReport> {
        let started = Instant::now();
        let loader = Loader::new(self.registry, self.skip, self.layout);
        let mut report = ImportReport::new(self.layout, self.policy);

        for run in runs {
            tracing::info!("Loading run {} from {}", run.index, run.path.display());

            let (planned, skipped) = loader.plan(discover_csv_files(&run.path)?);
            observer.directory_started(run, planned.len());
            for file in &skipped {
                tracing::debug!("Skipping {} ({})", file.path.display(), file.reason);
                observer.file_skipped(file);
            }

            let loaded = self.policy.load_directory(
                store,
                &planned,
                |store, file, scope| loader.load_file(store, run, file, scope),
                |_, load, committed| observer.file_loaded(load, committed),
            )?;
            if self.policy == CommitPolicy::PerDirectory {
                observer.directory_committed(run);
            }

            report.record_directory(run, loaded, skipped);
        }

        // Rows are durable by now; a failed view is reported, not raised
        for view in &self.views {
            let outcome = build_view(store, view);
            observer.view_finished(&outcome);
            report.view = Some(outcome);
        }

        report.set_elapsed(started.elapsed());
        tracing::info!(
            "Loaded {} rows from {} files in {:?}",
            report.rows_loaded,
            report.files_loaded,
            report.elapsed()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ContentSchema, SqliteStore};
    use crate::Error;
    use std::path::Path;

    /// SqliteStore that fails the n-th insert (1-based), creation of one
    /// table, or the view
    struct FailingStore {
        inner: SqliteStore,
        fail_at: Option<usize>,
        fail_create: Option<&'static str>,
        fail_view: bool,
        inserts: usize,
    }

    impl Store for FailingStore {
        fn begin(&mut self) -> Result<()> {
            self.inner.begin()
        }
        fn commit(&mut self) -> Result<()> {
            self.inner.commit()
        }
        fn rollback(&mut self) -> Result<()> {
            self.inner.rollback()
        }
        fn create_table(&mut self, schema: &ContentSchema) -> Result<()> {
            if self.fail_create == Some(schema.table) {
                return Err(Error::Storage(rusqlite::Error::InvalidQuery));
            }
            self.inner.create_table(schema)
        }
        fn insert_row(&mut self, schema: &ContentSchema, fields: &[String]) -> Result<()> {
            self.inserts += 1;
            if Some(self.inserts) == self.fail_at {
                return Err(Error::Storage(rusqlite::Error::ExecuteReturnedResults));
            }
            self.inner.insert_row(schema, fields)
        }
        fn create_view(&mut self, view: &ViewDefinition) -> Result<()> {
            if self.fail_view {
                return Err(Error::Storage(rusqlite::Error::InvalidQuery));
            }
            self.inner.create_view(view)
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ImportObserver for Recorder {
        fn file_skipped(&mut self, file: &SkippedFile) {
            self.events.push(format!("skip {}", file.path.file_name().unwrap().to_string_lossy()));
        }
        fn file_loaded(&mut self, load: &FileLoad, committed: bool) {
            self.events.push(format!("load {} {}", load.file, committed));
        }
        fn directory_committed(&mut self, run: &RunDir) {
            self.events.push(format!("commit {}", run.index));
        }
    }

    fn write(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).unwrap();
    }

    /// a.status.csv (2 rows) then b.status.csv (2 rows)
    fn two_file_run() -> (tempfile::TempDir, Vec<RunDir>) {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.status.csv", "h\n0,1,1,0\n0,1,2,0\n");
        write(dir.path(), "b.status.csv", "h\n0,2,1,1\n0,2,2,1\n");
        let runs = vec![RunDir { index: 0, path: dir.path().to_path_buf() }];
        (dir, runs)
    }

    fn failing(fail_at: Option<usize>, fail_view: bool) -> FailingStore {
        let mut inner = SqliteStore::open_in_memory().unwrap();
        let registry = SchemaRegistry::standard();
        inner.create_table(registry.lookup("status").unwrap()).unwrap();
        FailingStore {
            inner,
            fail_at,
            fail_create: None,
            fail_view,
            inserts: 0,
        }
    }

    #[test]
    fn test_commit_once_rolls_back_whole_directory() {
        let (_dir, runs) = two_file_run();
        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let importer = Importer::new(&registry, &skip).with_policy(CommitPolicy::PerDirectory);
        let mut store = failing(Some(4), false);

        let result = importer.run(&mut store, &runs, &mut NoopObserver);
        assert!(result.is_err());
        assert_eq!(store.inner.count_rows("Status").unwrap(), 0);
    }

    #[test]
    fn test_per_file_keeps_earlier_files() {
        let (_dir, runs) = two_file_run();
        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let importer = Importer::new(&registry, &skip).with_policy(CommitPolicy::PerFile);
        let mut store = failing(Some(4), false);

        let result = importer.run(&mut store, &runs, &mut NoopObserver);
        assert!(result.is_err());
        assert_eq!(store.inner.count_rows("Status").unwrap(), 2);
        let generations: i64 = store
            .inner
            .conn()
            .query_row("SELECT MAX(generation) FROM Status", [], |r| r.get(0))
            .unwrap();
        assert_eq!(generations, 1);
    }

    fn run_with_failing_create(policy: CommitPolicy) -> (Result<ImportReport>, FailingStore) {
        let (dir, runs) = two_file_run();
        write(dir.path(), "c.tree.csv", "h\n0,1,1,N0,N1\n");
        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let mut store = FailingStore {
            fail_create: Some("Tree"),
            ..failing(None, false)
        };

        let result = Importer::new(&registry, &skip)
            .with_policy(policy)
            .run(&mut store, &runs, &mut NoopObserver);
        (result, store)
    }

    #[test]
    fn test_failed_create_rolls_back_directory() {
        let (result, store) = run_with_failing_create(CommitPolicy::PerDirectory);
        match result {
            Err(Error::AtRow { file, source, .. }) => {
                assert_eq!(file, "c.tree.csv");
                assert!(matches!(*source, Error::Storage(_)));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.rows_loaded)),
        }
        assert_eq!(store.inner.count_rows("Status").unwrap(), 0);
        assert!(!store.inner.object_exists("Tree").unwrap());
    }

    #[test]
    fn test_failed_create_keeps_committed_files() {
        let (result, store) = run_with_failing_create(CommitPolicy::PerFile);
        assert!(matches!(result, Err(Error::AtRow { .. })));
        assert_eq!(store.inner.count_rows("Status").unwrap(), 4);
        assert!(!store.inner.object_exists("Tree").unwrap());
    }

    #[test]
    fn test_observer_sees_commit_points() {
        let (dir, runs) = two_file_run();
        write(dir.path(), "c.tree.csv", "h\n0,1,1,N0,N1\n");
        write(dir.path(), "notes.csv", "h\n");
        let registry = SchemaRegistry::standard();
        let skip = SkipSet::from_names(&registry, &["tree"]).unwrap();

        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut recorder = Recorder::default();
        Importer::new(&registry, &skip)
            .with_policy(CommitPolicy::PerDirectory)
            .run(&mut store, &runs, &mut recorder)
            .unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "skip c.tree.csv",
                "skip notes.csv",
                "load a.status.csv false",
                "load b.status.csv false",
                "commit 0",
            ]
        );

        let mut recorder = Recorder::default();
        Importer::new(&registry, &skip)
            .run(&mut store, &runs, &mut recorder)
            .unwrap();
        assert_eq!(recorder.events[2], "load a.status.csv true");
        assert!(!recorder.events.iter().any(|e| e.starts_with("commit")));
        assert!(!store.object_exists("Tree").unwrap());
    }

    #[test]
    fn test_directory_without_csv_stops_import() {
        let (_dir, mut runs) = two_file_run();
        let empty = tempfile::tempdir().unwrap();
        runs.push(RunDir { index: 1, path: empty.path().to_path_buf() });
        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = Importer::new(&registry, &skip)
            .run(&mut store, &runs, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, Error::NoSourceFiles(_)));
        // the first directory was already committed
        assert_eq!(store.count_rows("Status").unwrap(), 4);
    }

    #[test]
    fn test_view_failure_is_not_fatal() {
        let (_dir, runs) = two_file_run();
        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let mut store = failing(None, true);

        let report = Importer::new(&registry, &skip)
            .with_genotype_freq_view(true)
            .run(&mut store, &runs, &mut NoopObserver)
            .unwrap();
        assert!(matches!(report.view, Some(ViewOutcome::Failed { .. })));
        assert_eq!(report.rows_for("Status"), 4);
        assert_eq!(store.inner.count_rows("Status").unwrap(), 4);
    }
}
