//! Transaction scopes
//!
//! A run commits either after every file or once per directory. Both go
//! through [`atomically`], which owns the commit-or-rollback decision.

use std::collections::HashSet;

use serde::Serialize;

use crate::Result;
use crate::storage::Store;

/// Transaction granularity, chosen once per import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// One transaction per file
    #[default]
    PerFile,
    /// One transaction per run directory (`--commit_once`)
    PerDirectory,
}

impl CommitPolicy {
    pub fn from_commit_once(commit_once: bool) -> Self {
        if commit_once {
            CommitPolicy::PerDirectory
        } else {
            CommitPolicy::PerFile
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitPolicy::PerFile => "per-file",
            CommitPolicy::PerDirectory => "per-directory",
        }
    }

    /// Load every item of one directory under this policy.
    ///
    /// `load` runs inside an open transaction. `after_item` is told whether the
    /// item's rows are already committed; under `PerDirectory` they are only
    /// committed when this returns `Ok`.
    pub fn load_directory<I, T>(
        &self,
        store: &mut dyn Store,
        items: &[I],
        mut load: impl FnMut(&mut dyn Store, &I, &mut ScopeState) -> Result<T>,
        mut after_item: impl FnMut(&I, &T, bool),
    ) -> Result<Vec<T>> {
        match self {
            CommitPolicy::PerFile => {
                let mut loaded = Vec::with_capacity(items.len());
                for item in items {
                    let out = atomically(store, |store, scope| load(store, item, scope))?;
                    after_item(item, &out, true);
                    loaded.push(out);
                }
                Ok(loaded)
            }
            CommitPolicy::PerDirectory => atomically(store, |store, scope| {
                let mut loaded = Vec::with_capacity(items.len());
                for item in items {
                    let out = load(store, item, scope)?;
                    after_item(item, &out, false);
                    loaded.push(out);
                }
                Ok(loaded)
            }),
        }
    }
}

/// Bookkeeping for the open transaction
#[derive(Debug, Default)]
pub struct ScopeState {
    created: HashSet<&'static str>,
}

impl ScopeState {
    /// Record that `table` needs creating; false if already done in this scope
    pub fn claim_create(&mut self, table: &'static str) -> bool {
        self.created.insert(table)
    }
}

/// Run `body` in a fresh transaction.
///
/// Commits when `body` succeeds. If `body` or the commit fails, the
/// transaction is rolled back and the first error is returned.
pub fn atomically<T>(
    store: &mut dyn Store,
    body: impl FnOnce(&mut dyn Store, &mut ScopeState) -> Result<T>,
) -> Result<T> {
    store.begin()?;
    let mut scope = ScopeState::default();
    let result = body(&mut *store, &mut scope).and_then(|value| store.commit().map(|()| value));
    if let Err(e) = &result {
        if let Err(rollback_err) = store.rollback() {
            tracing::error!("Rollback failed after {}: {}", e, rollback_err);
        }
    }
    result
}
