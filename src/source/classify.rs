//! Filename classification
//!
//! Result files follow `<anything>.<token>.csv`, e.g. `log.003.freq.csv`. The
//! token selects the destination table.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::storage::{ContentSchema, SchemaRegistry};
use crate::{Error, Result};

/// Second-to-last dot-separated segment of the file name
pub fn content_token(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let mut segments = name.rsplit('.');
    segments.next()?;
    segments.next()
}

/// A CSV file found in a run directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name without directory, used in progress output
    pub name: String,
    /// Content-type token, fixed when the file is discovered
    pub token: Option<String>,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let token = content_token(&path).map(str::to_string);
        Self { path, name, token }
    }

    /// Decide whether this file is loaded, and into which table
    pub fn disposition<'r>(&self, registry: &'r SchemaRegistry, skip: &SkipSet) -> Disposition<'r> {
        let Some(schema) = self.token.as_deref().and_then(|t| registry.get(t)) else {
            return Disposition::Skip(SkipReason::UnknownContentType);
        };
        if skip.contains(schema.token) {
            Disposition::Skip(SkipReason::Excluded)
        } else {
            Disposition::Load(schema)
        }
    }
}

/// Outcome of classifying a source file
#[derive(Debug, Clone, Copy)]
pub enum Disposition<'r> {
    Load(&'r ContentSchema),
    Skip(SkipReason),
}

/// Why a file was left out of the load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The filename token is not registered
    UnknownContentType,
    /// The token's table was excluded by the operator
    Excluded,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnknownContentType => write!(f, "unknown content type"),
            SkipReason::Excluded => write!(f, "excluded"),
        }
    }
}

/// Content types excluded from loading
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipSet {
    tokens: BTreeSet<&'static str>,
}

impl SkipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from tokens (`freq`) or table names (`GenotypeFreq`).
    ///
    /// Names the registry does not know are rejected.
    pub fn from_names<S: AsRef<str>>(registry: &SchemaRegistry, names: &[S]) -> Result<Self> {
        let mut set = Self::new();
        for name in names {
            set.insert(registry, name.as_ref())?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, registry: &SchemaRegistry, name: &str) -> Result<()> {
        let schema = registry
            .get(name)
            .or_else(|| registry.by_table(name))
            .ok_or_else(|| Error::UnknownContentType(name.to_string()))?;
        self.tokens.insert(schema.token);
        Ok(())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tokens.iter().copied()
    }
}

/// All `*.csv` files directly inside `dir`, in lexical order.
///
/// An empty match is an error: every run directory is expected to hold results.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<SourceFile>> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.csv");
    let pattern = pattern.to_string_lossy().to_string();

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| Error::Discovery(e.to_string()))?;
        if path.is_file() {
            files.push(SourceFile::new(path));
        }
    }

    if files.is_empty() {
        return Err(Error::NoSourceFiles(pattern));
    }
    Ok(files)
}
