//! Row transforms applied between parsing and binding

use crate::resolver::RunLayout;
use crate::storage::ContentSchema;
use crate::{Error, Result};

/// Field layout of a file's data rows, fixed by its header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// One field per schema column
    Columns,
    /// An `id` field in front of the schema columns; the store assigns its own id
    LeadingId,
}

impl RowShape {
    /// `LeadingId` only when the header starts with `id` and has one field
    /// more than the schema has columns
    pub fn from_header(header: &[String], schema: &ContentSchema) -> Self {
        let leading_id = header.len() == schema.column_count() + 1
            && header.first().is_some_and(|f| f.eq_ignore_ascii_case("id"));
        if leading_id {
            RowShape::LeadingId
        } else {
            RowShape::Columns
        }
    }

    /// Fields a data row of this shape must carry
    pub fn field_count(&self, schema: &ContentSchema) -> usize {
        match self {
            RowShape::Columns => schema.column_count(),
            RowShape::LeadingId => schema.column_count() + 1,
        }
    }

    /// Check the row's field count and strip the `id` field if present
    pub fn fit(&self, mut fields: Vec<String>, schema: &ContentSchema) -> Result<Vec<String>> {
        let expected = self.field_count(schema);
        if fields.len() != expected {
            return Err(Error::FieldCount {
                expected,
                found: fields.len(),
            });
        }
        if *self == RowShape::LeadingId {
            fields.remove(0);
        }
        Ok(fields)
    }
}

/// Replace the first field with the run index
pub fn with_run_index(mut fields: Vec<String>, run_index: usize) -> Vec<String> {
    if let Some(first) = fields.first_mut() {
        *first = run_index.to_string();
    }
    fields
}

impl RunLayout {
    /// Transform applied to every row loaded from the run at `run_index`
    pub fn apply(&self, fields: Vec<String>, run_index: usize) -> Vec<String> {
        match self {
            RunLayout::Explicit => fields,
            RunLayout::Independent => with_run_index(fields, run_index),
        }
    }
}
