//! Source files
//!
//! Discovery and classification of `*.csv` files inside a run directory, and
//! the lazy row reader that feeds the loader.

pub mod classify;
pub mod reader;

pub use classify::{Disposition, SkipReason, SkipSet, SourceFile, content_token, discover_csv_files};
pub use reader::{Row, RowReader, split_fields};
