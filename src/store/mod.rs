//! The record store boundary and the in-memory implementation used by the
//! demo and the tests.

mod error;
mod memory;
mod query;

#[cfg(test)]
pub(crate) mod outage;

pub use error::StoreError;
pub use memory::{MemoryStore, Snapshot};
pub use query::{Direction, Filter, PageRequest, PageStream, SortOrder};

use crate::domain::{Entity, EntityId};

/// Persistence operations the views depend on.
///
/// Handles are cheap to clone and every clone addresses the same rows.
pub trait RecordStore: Clone {
    type Entity: Entity;

    fn get_by_id(&self, id: EntityId) -> Result<Option<Self::Entity>, StoreError>;

    /// Insert when the record has no id, otherwise update it if its version
    /// still matches the stored one. Returns the stored copy with its new
    /// identity and version.
    fn save(&self, record: &Self::Entity) -> Result<Self::Entity, StoreError>;

    /// Returns whether a row was removed.
    fn delete_by_id(&self, id: EntityId) -> Result<bool, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    fn count_matching(&self, filter: &Filter) -> Result<usize, StoreError>;

    /// Rows of one page, in the cursor's sort order.
    fn stream_page(&self, cursor: &PageRequest) -> Result<PageStream<Self::Entity>, StoreError>;
}
