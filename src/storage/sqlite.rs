//! SQLite storage implementation

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params_from_iter};
use serde::Serialize;

use super::Store;
use super::schema::{ContentSchema, SchemaRegistry, ViewDefinition};
use crate::{Error, Result};

/// SQLite-backed destination for loaded rows
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist) tuned for a single bulk writer
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.apply_pragmas()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// WAL journal, exclusive lock held for the whole run, relaxed fsync
    fn apply_pragmas(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "locking_mode", "EXCLUSIVE")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    /// Underlying connection, for ad-hoc queries
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Check whether a table or view exists
    pub fn object_exists(&self, name: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Count rows in a table
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Row counts for every registry table present in the database
    pub fn table_row_counts(&self, registry: &SchemaRegistry) -> Result<Vec<TableCount>> {
        let mut counts = Vec::new();
        for schema in registry.iter() {
            if self.object_exists(schema.table)? {
                counts.push(TableCount {
                    table: schema.table.to_string(),
                    rows: self.count_rows(schema.table)?,
                });
            }
        }
        Ok(counts)
    }
}

impl Store for SqliteStore {
    fn begin(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    fn create_table(&mut self, schema: &ContentSchema) -> Result<()> {
        self.conn.execute(schema.create_table_sql(), [])?;
        Ok(())
    }

    fn insert_row(&mut self, schema: &ContentSchema, fields: &[String]) -> Result<()> {
        // One compiled statement per table, reused across files and transactions
        let mut stmt = self.conn.prepare_cached(schema.insert_sql())?;
        stmt.execute(params_from_iter(fields.iter()))?;
        Ok(())
    }

    fn create_view(&mut self, view: &ViewDefinition) -> Result<()> {
        // SQLite accepts a view over missing tables and only fails on select
        for table in view.sources {
            if !self.object_exists(table)? {
                return Err(Error::MissingTable {
                    view: view.name.to_string(),
                    table: table.to_string(),
                });
            }
        }
        self.conn.execute_batch(view.sql)?;
        Ok(())
    }
}

/// Rows held by one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}

impl std::fmt::Display for TableCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.table, self.rows)
    }
}
