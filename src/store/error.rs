use thiserror::Error;

use crate::domain::EntityId;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Optimistic-lock failure: the row changed or vanished since it was read.
    #[error(
        "record {id} was modified concurrently (expected version {expected}, found {})",
        version_label(.actual)
    )]
    Conflict {
        id: EntityId,
        expected: i32,
        actual: Option<i32>,
    },

    #[error("cannot sort by '{0}': not a stored field")]
    UnknownSortField(String),

    #[error("cannot filter by '{0}': not a stored field")]
    UnknownFilterField(String),

    #[error("page size must be at least 1")]
    InvalidPage,

    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

fn version_label(version: &Option<i32>) -> String {
    match version {
        Some(version) => version.to_string(),
        None => "none".to_string(),
    }
}
