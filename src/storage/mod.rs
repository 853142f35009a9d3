//! Storage Layer - SQLite-backed destination store
//!
//! The destination database holds one table per content type:
//! - GenotypeFreq(instance, generation, hostID, genotypeID, freq)
//! - Genotype(genotypeID, sequence)
//! - Node(nodeID, genotypeID)
//! - Status(instance, generation, hostID, status)
//! - Transmission(instance, generation, fromHostID, toHostID, nodeID)
//! - Tree(instance, generation, hostID, parentNodeID, nodeID)
//!
//! plus the optional `GenotypeFreqView`. Tables are created lazily and never dropped.

pub mod schema;
pub mod sqlite;

pub use schema::{Column, ColumnType, ContentSchema, SchemaRegistry, ViewDefinition, GENOTYPE_FREQ_VIEW};
pub use sqlite::{SqliteStore, TableCount};

use crate::Result;

/// Operations the loader needs from a destination store.
///
/// Transactions are flat: `begin` is never called twice without a
/// `commit` or `rollback` in between.
pub trait Store {
    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Create the schema's table if it does not exist yet
    fn create_table(&mut self, schema: &ContentSchema) -> Result<()>;

    /// Insert one row; `fields` are bound positionally in column order
    fn insert_row(&mut self, schema: &ContentSchema, fields: &[String]) -> Result<()>;

    fn create_view(&mut self, view: &ViewDefinition) -> Result<()>;
}
