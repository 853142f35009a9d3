//! Lazy CSV row reader
//!
//! Rows are produced one line at a time; nothing beyond the current line is
//! held in memory. Fields are split on commas with surrounding whitespace
//! ignored, and handed on as text. Column affinity in the store does any
//! numeric conversion.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::Result;

static FIELD_SEPARATOR: OnceLock<Regex> = OnceLock::new();

fn field_separator() -> &'static Regex {
    FIELD_SEPARATOR.get_or_init(|| Regex::new(r"\s*,\s*").expect("separator pattern is valid"))
}

/// Split one data line into its fields
pub fn split_fields(line: &str) -> Vec<String> {
    field_separator()
        .split(line.trim())
        .map(str::to_string)
        .collect()
}

/// A parsed data line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the source file
    pub line: usize,
    pub fields: Vec<String>,
}

/// Iterator over the data rows of one file
pub struct RowReader<R: BufRead = BufReader<File>> {
    lines: Lines<R>,
    line: usize,
    header_read: bool,
    header: Option<Vec<String>>,
}

impl RowReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RowReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            header_read: false,
            header: None,
        }
    }

    /// Consume the first line and return its column names, or `None` when the
    /// file is empty. The header is never loaded as a row.
    pub fn read_header(&mut self) -> Result<Option<Vec<String>>> {
        if !self.header_read {
            self.header_read = true;
            if let Some(line) = self.lines.next() {
                self.line += 1;
                self.header = Some(split_fields(&line?));
            }
        }
        Ok(self.header.clone())
    }

    /// Lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for RowReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.header_read {
            match self.read_header() {
                Ok(Some(_)) => {}
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            if line.trim().is_empty() {
                continue;
            }
            return Some(Ok(Row {
                line: self.line,
                fields: split_fields(&line),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> RowReader<Cursor<Vec<u8>>> {
        RowReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_split_tolerates_whitespace() {
        assert_eq!(split_fields("0, 12 ,3,G-1"), vec!["0", "12", "3", "G-1"]);
        assert_eq!(split_fields("  a ,b  "), vec!["a", "b"]);
        assert_eq!(split_fields("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_header_is_not_a_row() {
        let rows: Vec<Row> = reader("instance,generation,hostID,status\n9,1,3,0\n9,2,3,1\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].fields, vec!["9", "1", "3", "0"]);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let rows: Vec<Row> = reader("h\r\nG1,ACGT\r\n\r\nG2,TTGA\r\n\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].fields, vec!["G2", "TTGA"]);
        assert_eq!(rows[1].line, 4);
    }

    #[test]
    fn test_empty_input() {
        let mut r = reader("");
        assert_eq!(r.read_header().unwrap(), None);
        assert!(r.next().is_none());
    }

    #[test]
    fn test_header_only() {
        let mut r = reader("genotypeID , sequence\n");
        assert_eq!(r.read_header().unwrap(), Some(vec!["genotypeID".to_string(), "sequence".to_string()]));
        assert_eq!(r.line_number(), 1);
        assert_eq!(r.read_header().unwrap().map(|h| h.len()), Some(2));
        assert!(r.next().is_none());
    }
}
