use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::domain::{EntityId, SamplePerson, sample_people};

use super::{Filter, MemoryStore, PageRequest, PageStream, RecordStore, StoreError};

/// A seeded store whose single-row operations start failing once `go_down`
/// is called. Paging keeps working so the grid stays populated.
#[derive(Clone)]
pub(crate) struct OutageStore {
    rows: MemoryStore<SamplePerson>,
    down: Arc<AtomicBool>,
}

impl OutageStore {
    pub(crate) fn seeded(count: usize) -> Self {
        Self {
            rows: MemoryStore::seed(sample_people(count)).unwrap(),
            down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub(crate) fn rows(&self) -> &MemoryStore<SamplePerson> {
        &self.rows
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("db down".into()));
        }
        Ok(())
    }
}

impl RecordStore for OutageStore {
    type Entity = SamplePerson;

    fn get_by_id(&self, id: EntityId) -> Result<Option<SamplePerson>, StoreError> {
        self.check()?;
        self.rows.get_by_id(id)
    }

    fn save(&self, record: &SamplePerson) -> Result<SamplePerson, StoreError> {
        self.check()?;
        self.rows.save(record)
    }

    fn delete_by_id(&self, id: EntityId) -> Result<bool, StoreError> {
        self.check()?;
        self.rows.delete_by_id(id)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.rows.count()
    }

    fn count_matching(&self, filter: &Filter) -> Result<usize, StoreError> {
        self.rows.count_matching(filter)
    }

    fn stream_page(&self, cursor: &PageRequest) -> Result<PageStream<SamplePerson>, StoreError> {
        self.rows.stream_page(cursor)
    }
}
