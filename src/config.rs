use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::resolver::RunLayout;
use crate::source::SkipSet;
use crate::storage::SchemaRegistry;
use crate::transaction::CommitPolicy;
use crate::{Error, Result};

/// Settings read from `csv2sqlite.toml`; command-line flags are layered on top
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ImportConfig {
    pub out: Option<PathBuf>,
    pub independent: bool,
    pub commit_once: bool,
    pub genotype_freq_view: bool,
    /// Tokens or table names to leave out
    pub skip: Vec<String>,
}

/// Validated settings for one import
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub inputs: Vec<PathBuf>,
    pub out: PathBuf,
    pub layout: RunLayout,
    pub policy: CommitPolicy,
    pub skip: SkipSet,
    pub genotype_freq_view: bool,
}

impl ImportConfig {
    /// Layer `other` over `self`: set flags win, `out` is replaced when given,
    /// skip lists are combined
    pub fn merge(mut self, other: ImportConfig) -> Self {
        if other.out.is_some() {
            self.out = other.out;
        }
        self.independent |= other.independent;
        self.commit_once |= other.commit_once;
        self.genotype_freq_view |= other.genotype_freq_view;
        for name in other.skip {
            if !self.skip.contains(&name) {
                self.skip.push(name);
            }
        }
        self
    }

    /// Check the settings against the inputs. Touches no files.
    pub fn into_options(self, inputs: Vec<PathBuf>, registry: &SchemaRegistry) -> Result<ImportOptions> {
        let layout = RunLayout::from_independent(self.independent);
        layout.validate_args(&inputs)?;

        let out = match self.out {
            Some(out) if !out.as_os_str().is_empty() => out,
            _ => return Err(Error::Usage("--out was not specified".to_string())),
        };

        let skip = SkipSet::from_names(registry, &self.skip)?;

        Ok(ImportOptions {
            inputs,
            out,
            layout,
            policy: CommitPolicy::from_commit_once(self.commit_once),
            skip,
            genotype_freq_view: self.genotype_freq_view,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("csv2sqlite.toml")
}

/// Load the config file. A missing default file is not an error; a missing
/// explicitly named one is.
pub fn load_config(path: Option<&Path>) -> Result<Option<ImportConfig>> {
    let explicit = path.is_some();
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!("{} does not exist", path.display())));
        }
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ImportConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
