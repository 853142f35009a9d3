//! Content schema registry
//!
//! Maps the content-type token found in a result filename (`run.007.freq.csv`)
//! to the table it loads into, the table's column definitions and the insert
//! statement used for every row. Every table carries an implicit
//! `id integer not null primary key` identity column that is never bound.

use serde::Serialize;

use crate::{Error, Result};

/// Declared type of a loaded column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Text,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Text => "text",
        }
    }
}

/// A single non-identity column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    const fn int(name: &'static str) -> Self {
        Self { name, ty: ColumnType::Int }
    }

    const fn text(name: &'static str) -> Self {
        Self { name, ty: ColumnType::Text }
    }
}

const GENOTYPE_FREQ_COLUMNS: &[Column] = &[
    Column::int("instance"),
    Column::int("generation"),
    Column::int("hostID"),
    Column::text("genotypeID"),
    Column::int("freq"),
];

const GENOTYPE_COLUMNS: &[Column] = &[Column::text("genotypeID"), Column::text("sequence")];

const NODE_COLUMNS: &[Column] = &[Column::text("nodeID"), Column::text("genotypeID")];

const STATUS_COLUMNS: &[Column] = &[
    Column::int("instance"),
    Column::int("generation"),
    Column::int("hostID"),
    Column::int("status"),
];

const TRANSMISSION_COLUMNS: &[Column] = &[
    Column::int("instance"),
    Column::int("generation"),
    Column::int("fromHostID"),
    Column::int("toHostID"),
    Column::text("nodeID"),
];

const TREE_COLUMNS: &[Column] = &[
    Column::int("instance"),
    Column::int("generation"),
    Column::int("hostID"),
    Column::text("parentNodeID"),
    Column::text("nodeID"),
];

/// Table layout and statements for one content type
#[derive(Debug, Clone)]
pub struct ContentSchema {
    /// Filename token, e.g. `freq`
    pub token: &'static str,
    /// Destination table name, e.g. `GenotypeFreq`
    pub table: &'static str,
    /// Bound columns in insert order (identity column excluded)
    pub columns: &'static [Column],
    create_sql: String,
    insert_sql: String,
}

impl ContentSchema {
    fn new(token: &'static str, table: &'static str, columns: &'static [Column]) -> Self {
        let definitions: Vec<String> = std::iter::once("id integer not null primary key".to_string())
            .chain(columns.iter().map(|c| format!("{} {}", c.name, c.ty.as_sql())))
            .collect();
        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table,
            definitions.join(", ")
        );

        let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders.join(", ")
        );

        Self {
            token,
            table,
            columns,
            create_sql,
            insert_sql,
        }
    }

    /// Idempotent `CREATE TABLE IF NOT EXISTS` statement
    pub fn create_table_sql(&self) -> &str {
        &self.create_sql
    }

    /// Parameterized insert with one positional placeholder per column
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// Number of fields a data row must provide
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Immutable token -> schema mapping, built once at startup
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<ContentSchema>,
}

impl SchemaRegistry {
    /// The six result tables written by the simulator's CSV logger
    pub fn standard() -> Self {
        Self {
            schemas: vec![
                ContentSchema::new("freq", "GenotypeFreq", GENOTYPE_FREQ_COLUMNS),
                ContentSchema::new("g", "Genotype", GENOTYPE_COLUMNS),
                ContentSchema::new("n", "Node", NODE_COLUMNS),
                ContentSchema::new("status", "Status", STATUS_COLUMNS),
                ContentSchema::new("trans", "Transmission", TRANSMISSION_COLUMNS),
                ContentSchema::new("tree", "Tree", TREE_COLUMNS),
            ],
        }
    }

    /// Schema for a token, if registered
    pub fn get(&self, token: &str) -> Option<&ContentSchema> {
        self.schemas.iter().find(|s| s.token == token)
    }

    /// Schema for a token; unregistered tokens are a configuration error
    pub fn lookup(&self, token: &str) -> Result<&ContentSchema> {
        self.get(token)
            .ok_or_else(|| Error::UnknownContentType(token.to_string()))
    }

    /// Schema by destination table name (case-insensitive)
    pub fn by_table(&self, table: &str) -> Option<&ContentSchema> {
        self.schemas
            .iter()
            .find(|s| s.table.eq_ignore_ascii_case(table))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentSchema> {
        self.schemas.iter()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schemas.iter().map(|s| s.token)
    }
}

/// A derived view created after the bulk load
#[derive(Debug, Clone, Copy)]
pub struct ViewDefinition {
    pub name: &'static str,
    /// Tables the view selects from
    pub sources: &'static [&'static str],
    pub sql: &'static str,
}

/// Frequencies joined with the genotype's sequence
pub const GENOTYPE_FREQ_VIEW: ViewDefinition = ViewDefinition {
    name: "GenotypeFreqView",
    sources: &["GenotypeFreq", "Genotype"],
    sql: r#"
CREATE VIEW IF NOT EXISTS GenotypeFreqView AS
SELECT
    GenotypeFreq.instance,
    GenotypeFreq.generation,
    GenotypeFreq.hostID,
    GenotypeFreq.genotypeID,
    GenotypeFreq.freq,
    Genotype.sequence
FROM GenotypeFreq
LEFT JOIN Genotype ON GenotypeFreq.genotypeID = Genotype.genotypeID
"#,
};
