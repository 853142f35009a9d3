//! Run directory resolution
//!
//! Turns the positional arguments into the ordered list of directories whose
//! CSV files get loaded. The position of a directory in that list is its run
//! index, which independent mode writes into every row.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::{Error, Result};

/// How positional arguments map to run directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLayout {
    /// Every argument is a run directory
    #[default]
    Explicit,
    /// A single root whose child directories are separate runs
    Independent,
}

impl RunLayout {
    pub fn from_independent(independent: bool) -> Self {
        if independent {
            RunLayout::Independent
        } else {
            RunLayout::Explicit
        }
    }

    pub fn is_independent(&self) -> bool {
        matches!(self, RunLayout::Independent)
    }

    /// Reject argument lists the layout cannot accept; performs no I/O
    pub fn validate_args(&self, args: &[PathBuf]) -> Result<()> {
        if args.is_empty() {
            return Err(Error::Usage("CSV basepath was not specified".to_string()));
        }
        if self.is_independent() && args.len() > 1 {
            return Err(Error::Usage(
                "only one CSV basepath can be provided with --independent".to_string(),
            ));
        }
        Ok(())
    }
}

/// A directory of CSV files together with its position in the run list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunDir {
    pub index: usize,
    pub path: PathBuf,
}

/// Resolve arguments into run directories.
///
/// Directory contents are not inspected here; a directory without CSV files
/// is reported when it is loaded.
pub fn resolve_run_dirs(args: &[PathBuf], layout: RunLayout) -> Result<Vec<RunDir>> {
    layout.validate_args(args)?;

    let paths = match layout {
        RunLayout::Explicit => args.iter().map(|p| clean_path(p)).collect(),
        RunLayout::Independent => child_directories(&clean_path(&args[0]))?,
    };

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| RunDir { index, path })
        .collect())
}

/// Immediate subdirectories of `root` in lexical order
fn child_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root)
        .map_err(|e| Error::Discovery(format!("cannot read {}: {}", root.display(), e)))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        // metadata follows symlinks, so a linked run directory still counts
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => dirs.push(path),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
        }
    }

    if dirs.is_empty() {
        return Err(Error::Discovery(format!(
            "{} has no run directories",
            root.display()
        )));
    }

    dirs.sort();
    Ok(dirs)
}

/// Lexically normalize a path without touching the filesystem: drops `.`
/// segments and repeated or trailing separators, and folds `name/..` away.
/// `..` directly under the root is dropped; leading `..` of a relative path
/// is kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    let cleaned: PathBuf = parts.into_iter().collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
