//! Row loader
//!
//! Classifies a directory's files and streams each loadable file into its
//! table: header line -> `CREATE TABLE IF NOT EXISTS`, every later line -> one
//! insert.

use std::path::PathBuf;

use serde::Serialize;

use crate::resolver::{RunDir, RunLayout};
use crate::source::{Disposition, RowReader, SkipReason, SkipSet, SourceFile};
use crate::storage::{ContentSchema, SchemaRegistry, Store};
use crate::transaction::ScopeState;
use crate::transform::RowShape;
use crate::Result;

/// A file selected for loading, paired with its schema
#[derive(Debug, Clone)]
pub struct PlannedFile<'r> {
    pub file: SourceFile,
    pub schema: &'r ContentSchema,
}

/// A file left out of the load
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub token: Option<String>,
    pub reason: SkipReason,
}

/// Result of loading one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLoad {
    pub file: String,
    pub path: PathBuf,
    pub table: &'static str,
    pub run_index: usize,
    pub rows: usize,
}

/// Classifies and loads the CSV files of a run directory
pub struct Loader<'r> {
    registry: &'r SchemaRegistry,
    skip: &'r SkipSet,
    layout: RunLayout,
}

impl<'r> Loader<'r> {
    pub fn new(registry: &'r SchemaRegistry, skip: &'r SkipSet, layout: RunLayout) -> Self {
        Self {
            registry,
            skip,
            layout,
        }
    }

    /// Split discovered files into those to load and those to skip.
    ///
    /// Skipped files are never opened.
    pub fn plan(&self, files: Vec<SourceFile>) -> (Vec<PlannedFile<'r>>, Vec<SkippedFile>) {
        let mut planned = Vec::new();
        let mut skipped = Vec::new();
        for file in files {
            match file.disposition(self.registry, self.skip) {
                Disposition::Load(schema) => planned.push(PlannedFile { file, schema }),
                Disposition::Skip(reason) => skipped.push(SkippedFile {
                    path: file.path,
                    token: file.token,
                    reason,
                }),
            }
        }
        (planned, skipped)
    }

    /// Stream one file into the store inside the caller's transaction
    pub fn load_file(
        &self,
        store: &mut dyn Store,
        run: &RunDir,
        planned: &PlannedFile<'r>,
        scope: &mut ScopeState,
    ) -> Result<FileLoad> {
        let PlannedFile { file, schema } = planned;
        let mut load = FileLoad {
            file: file.name.clone(),
            path: file.path.clone(),
            table: schema.table,
            run_index: run.index,
            rows: 0,
        };

        let mut reader = RowReader::open(&file.path).map_err(|e| e.at_row(&file.name, 0))?;
        let header = match reader.read_header().map_err(|e| e.at_row(&file.name, 1))? {
            Some(header) => header,
            None => {
                tracing::warn!("{} is empty, nothing to load", file.path.display());
                return Ok(load);
            }
        };
        let shape = RowShape::from_header(&header, schema);
        if shape == RowShape::LeadingId {
            tracing::debug!("{} carries an id column, dropping it", file.name);
        }

        if scope.claim_create(schema.table) {
            store
                .create_table(schema)
                .map_err(|e| e.at_row(&file.name, reader.line_number()))?;
        }

        for row in reader {
            let row = row?;
            let line = row.line;
            shape
                .fit(row.fields, schema)
                .map(|fields| self.layout.apply(fields, run.index))
                .and_then(|fields| store.insert_row(schema, &fields))
                .map_err(|e| e.at_row(&file.name, line))?;
            load.rows += 1;
        }

        tracing::debug!("Loaded {} rows from {} into {}", load.rows, file.name, schema.table);
        Ok(load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use crate::transaction::atomically;
    use crate::Error;
    use std::path::Path;

    fn run_dir(path: &Path, index: usize) -> RunDir {
        RunDir {
            index,
            path: path.to_path_buf(),
        }
    }

    fn planned<'r>(registry: &'r SchemaRegistry, path: PathBuf) -> PlannedFile<'r> {
        let file = SourceFile::new(path);
        let schema = registry.lookup(file.token.as_deref().unwrap()).unwrap();
        PlannedFile { file, schema }
    }

    #[test]
    fn test_load_counts_data_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.000.trans.csv");
        std::fs::write(&path, "instance,generation,fromHostID,toHostID,nodeID\n0,1,2,3,N1\n0,2,3,4,N2\n").unwrap();

        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let loader = Loader::new(&registry, &skip, RunLayout::Explicit);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file = planned(&registry, path);

        let load = atomically(&mut store, |s, scope| loader.load_file(s, &run_dir(dir.path(), 0), &file, scope)).unwrap();
        assert_eq!(load.rows, 2);
        assert_eq!(load.table, "Transmission");

        let node: String = store
            .conn()
            .query_row("SELECT nodeID FROM Transmission WHERE toHostID = 4", [], |r| r.get(0))
            .unwrap();
        assert_eq!(node, "N2");
    }

    #[test]
    fn test_independent_layout_rewrites_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.000.freq.csv");
        std::fs::write(&path, "h\n7,0,1,G1,10\n7,1,1,G2,5\n").unwrap();

        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let loader = Loader::new(&registry, &skip, RunLayout::Independent);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file = planned(&registry, path);

        atomically(&mut store, |s, scope| loader.load_file(s, &run_dir(dir.path(), 2), &file, scope)).unwrap();

        let instances: Vec<i64> = store
            .conn()
            .prepare("SELECT instance FROM GenotypeFreq ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(instances, vec![2, 2]);
    }

    #[test]
    fn test_bad_row_reports_file_and_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.status.csv");
        std::fs::write(&path, "h\n0,1,3,0\n0,2,3\n").unwrap();

        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let loader = Loader::new(&registry, &skip, RunLayout::Explicit);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file = planned(&registry, path);

        let err = atomically(&mut store, |s, scope| loader.load_file(s, &run_dir(dir.path(), 0), &file, scope))
            .unwrap_err();
        match err {
            Error::AtRow { file, line, source } => {
                assert_eq!(file, "run.status.csv");
                assert_eq!(line, 3);
                assert!(matches!(*source, Error::FieldCount { expected: 4, found: 3 }));
            }
            other => panic!("unexpected error: {other}"),
        }
        // the whole file was rolled back, including the table
        assert!(!store.object_exists("Status").unwrap());
    }

    #[test]
    fn test_trailing_comma_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.status.csv");
        std::fs::write(&path, "h\n9,1,3,0,\n").unwrap();

        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let loader = Loader::new(&registry, &skip, RunLayout::Explicit);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file = planned(&registry, path);

        let err = atomically(&mut store, |s, scope| loader.load_file(s, &run_dir(dir.path(), 0), &file, scope))
            .unwrap_err();
        match err {
            Error::AtRow { line, source, .. } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, Error::FieldCount { expected: 4, found: 5 }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!store.object_exists("Status").unwrap());
    }

    #[test]
    fn test_id_header_drops_leading_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.n.csv");
        std::fs::write(&path, "id,nodeID,genotypeID\n1,N1,G1\nN2,G2\n").unwrap();

        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let loader = Loader::new(&registry, &skip, RunLayout::Explicit);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file = planned(&registry, path);

        // every row of an id-headed file must carry the id field
        let err = atomically(&mut store, |s, scope| loader.load_file(s, &run_dir(dir.path(), 0), &file, scope))
            .unwrap_err();
        assert!(matches!(err, Error::AtRow { line: 3, .. }));

        std::fs::write(&file.file.path, "id,nodeID,genotypeID\n1,N1,G1\n2,N2,G2\n").unwrap();
        let load = atomically(&mut store, |s, scope| loader.load_file(s, &run_dir(dir.path(), 0), &file, scope)).unwrap();
        assert_eq!(load.rows, 2);
        let node: String = store
            .conn()
            .query_row("SELECT nodeID FROM Node WHERE genotypeID = 'G2'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(node, "N2");
    }

    #[test]
    fn test_empty_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.n.csv");
        std::fs::write(&path, "").unwrap();

        let registry = SchemaRegistry::standard();
        let skip = SkipSet::new();
        let loader = Loader::new(&registry, &skip, RunLayout::Explicit);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file = planned(&registry, path);

        let load = atomically(&mut store, |s, scope| loader.load_file(s, &run_dir(dir.path(), 0), &file, scope)).unwrap();
        assert_eq!(load.rows, 0);
        assert!(!store.object_exists("Node").unwrap());
    }

    #[test]
    fn test_plan_separates_skipped() {
        let registry = SchemaRegistry::standard();
        let skip = SkipSet::from_names(&registry, &["status"]).unwrap();
        let loader = Loader::new(&registry, &skip, RunLayout::Explicit);
        let files = vec![
            SourceFile::new(PathBuf::from("r/a.g.csv")),
            SourceFile::new(PathBuf::from("r/a.status.csv")),
            SourceFile::new(PathBuf::from("r/a.mutations.csv")),
        ];

        let (planned, skipped) = loader.plan(files);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].schema.table, "Genotype");
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].reason, SkipReason::Excluded);
        assert_eq!(skipped[1].reason, SkipReason::UnknownContentType);
    }
}
