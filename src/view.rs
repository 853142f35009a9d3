//! Derived views built after the load

use serde::Serialize;

use crate::storage::{Store, ViewDefinition};

/// What happened when a view was requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewOutcome {
    Created { name: String },
    Failed { name: String, error: String },
}

impl ViewOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, ViewOutcome::Created { .. })
    }
}

impl std::fmt::Display for ViewOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewOutcome::Created { name } => write!(f, "{} created", name),
            ViewOutcome::Failed { name, error } => write!(f, "{} failed: {}", name, error),
        }
    }
}

/// Create `view` outside any transaction.
///
/// Rows are committed by the time this runs, so a failure is reported in the
/// outcome rather than returned as an error.
pub fn build_view(store: &mut dyn Store, view: &ViewDefinition) -> ViewOutcome {
    match store.create_view(view) {
        Ok(()) => {
            tracing::info!("Created view {}", view.name);
            ViewOutcome::Created {
                name: view.name.to_string(),
            }
        }
        Err(e) => {
            tracing::warn!("Could not create view {}: {}", view.name, e);
            ViewOutcome::Failed {
                name: view.name.to_string(),
                error: e.to_string(),
            }
        }
    }
}
