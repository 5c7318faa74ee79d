use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    domain::{Entity, EntityId},
    io::{self, OutputDestination, OutputOptions},
};

use super::{
    RecordStore, StoreError,
    query::{Filter, PageRequest, PageStream, compare_values},
};

/// Persisted form of a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<E> {
    pub next_id: EntityId,
    pub rows: Vec<E>,
}

#[derive(Debug)]
struct Table<E> {
    rows: BTreeMap<EntityId, E>,
    next_id: EntityId,
}

/// Rows held in process memory, shared by every clone of the handle.
#[derive(Debug)]
pub struct MemoryStore<E: Entity> {
    table: Arc<RwLock<Table<E>>>,
    properties: Arc<BTreeSet<String>>,
}

impl<E: Entity> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            properties: Arc::clone(&self.properties),
        }
    }
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> Self {
        let schema = schema_for!(E);
        let properties = schema
            .schema
            .object
            .as_ref()
            .map(|object| object.properties.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
            properties: Arc::new(properties),
        }
    }

    /// Insert every record as new, assigning fresh ids.
    pub fn seed(records: impl IntoIterator<Item = E>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut table = store.write()?;
            for mut record in records {
                let id = table.next_id;
                table.next_id += 1;
                record.stamp(id, 0);
                table.rows.insert(id, record);
            }
        }
        Ok(store)
    }

    /// Restore rows exactly as they were persisted. Rows without an id are
    /// inserted as new.
    pub fn from_snapshot(snapshot: Snapshot<E>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut table = store.write()?;
            let mut fresh = Vec::new();
            for record in snapshot.rows {
                match record.id() {
                    Some(id) => {
                        table.rows.insert(id, record);
                    }
                    None => fresh.push(record),
                }
            }
            let highest = table.rows.keys().next_back().copied().unwrap_or(0);
            table.next_id = snapshot.next_id.max(highest + 1);
            for mut record in fresh {
                let id = table.next_id;
                table.next_id += 1;
                record.stamp(id, 0);
                table.rows.insert(id, record);
            }
        }
        Ok(store)
    }

    pub fn snapshot(&self) -> Result<Snapshot<E>, StoreError> {
        let table = self.read()?;
        Ok(Snapshot {
            next_id: table.next_id,
            rows: table.rows.values().cloned().collect(),
        })
    }

    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let snapshot: Snapshot<E> = io::load_document(path)
            .with_context(|| format!("{} is not a {} snapshot", path.display(), E::LABEL))?;
        let store = Self::from_snapshot(snapshot)?;
        info!(path = %path.display(), rows = store.count()?, "snapshot loaded");
        Ok(store)
    }

    pub fn write_snapshot(&self, destination: OutputDestination) -> Result<()> {
        let format = match &destination {
            OutputDestination::Stdout => io::DocumentFormat::Json,
            OutputDestination::File(path) => io::DocumentFormat::from_path(path)?,
        };
        let options = OutputOptions::new(format).add_destination(destination);
        io::emit(&self.snapshot()?, &options)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table<E>>, StoreError> {
        self.table
            .read()
            .map_err(|_| StoreError::Unavailable("table lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table<E>>, StoreError> {
        self.table
            .write()
            .map_err(|_| StoreError::Unavailable("table lock poisoned".into()))
    }

    fn check_fields(&self, cursor: &PageRequest) -> Result<(), StoreError> {
        if let Some(order) = cursor
            .sort
            .iter()
            .find(|order| !self.properties.contains(&order.property))
        {
            return Err(StoreError::UnknownSortField(order.property.clone()));
        }
        self.check_filter(&cursor.filter)
    }

    fn check_filter(&self, filter: &Filter) -> Result<(), StoreError> {
        match &filter.field {
            Some(field) if !self.properties.contains(field) => {
                Err(StoreError::UnknownFilterField(field.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Rows passing the filter, as (record, json) pairs in id order.
    fn matching(&self, filter: &Filter) -> Result<Vec<(E, Value)>, StoreError> {
        let table = self.read()?;
        let mut rows = Vec::with_capacity(table.rows.len());
        for record in table.rows.values() {
            let value = serde_json::to_value(record)?;
            if filter.matches(&value) {
                rows.push((record.clone(), value));
            }
        }
        Ok(rows)
    }
}

impl<E: Entity> RecordStore for MemoryStore<E> {
    type Entity = E;

    fn get_by_id(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    fn save(&self, record: &E) -> Result<E, StoreError> {
        let mut table = self.write()?;
        let mut stored = record.clone();
        match record.id() {
            None => {
                let id = table.next_id;
                table.next_id += 1;
                stored.stamp(id, 0);
                info!(entity = E::LABEL, id, "inserted");
            }
            Some(id) => {
                let actual = table.rows.get(&id).map(Entity::version);
                if actual != Some(record.version()) {
                    warn!(
                        entity = E::LABEL,
                        id,
                        expected = record.version(),
                        ?actual,
                        "optimistic lock failure"
                    );
                    return Err(StoreError::Conflict {
                        id,
                        expected: record.version(),
                        actual,
                    });
                }
                stored.stamp(id, record.version() + 1);
                info!(entity = E::LABEL, id, version = stored.version(), "updated");
            }
        }
        if let Some(id) = stored.id() {
            table.rows.insert(id, stored.clone());
        }
        Ok(stored)
    }

    fn delete_by_id(&self, id: EntityId) -> Result<bool, StoreError> {
        let removed = self.write()?.rows.remove(&id).is_some();
        if removed {
            info!(entity = E::LABEL, id, "deleted");
        }
        Ok(removed)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.rows.len())
    }

    fn count_matching(&self, filter: &Filter) -> Result<usize, StoreError> {
        self.check_filter(filter)?;
        if filter.is_empty() {
            return self.count();
        }
        Ok(self.matching(filter)?.len())
    }

    fn stream_page(&self, cursor: &PageRequest) -> Result<PageStream<E>, StoreError> {
        if cursor.size == 0 {
            return Err(StoreError::InvalidPage);
        }
        self.check_fields(cursor)?;
        let mut rows = self.matching(&cursor.filter)?;
        if !cursor.sort.is_empty() {
            rows.sort_by(|(left, a), (right, b)| {
                cursor
                    .sort
                    .iter()
                    .map(|order| {
                        let lhs = a.get(&order.property).unwrap_or(&Value::Null);
                        let rhs = b.get(&order.property).unwrap_or(&Value::Null);
                        order.direction.apply(compare_values(lhs, rhs))
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or_else(|| left.id().cmp(&right.id()))
            });
        }
        let page: Vec<E> = rows
            .into_iter()
            .skip(cursor.offset())
            .take(cursor.size)
            .map(|(record, _)| record)
            .collect();
        debug!(
            entity = E::LABEL,
            page = cursor.page,
            size = cursor.size,
            returned = page.len(),
            "page fetched"
        );
        Ok(PageStream::new(cursor.page, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SamplePerson, sample_people};
    use crate::store::SortOrder;

    fn person(first: &str, last: &str) -> SamplePerson {
        SamplePerson {
            first_name: first.into(),
            last_name: last.into(),
            email: format!("{}@example.com", first.to_lowercase()),
            ..SamplePerson::default()
        }
    }

    #[test]
    fn insert_assigns_ids_and_version_zero() {
        let store = MemoryStore::new();
        let first = store.save(&person("Ada", "Lovelace")).unwrap();
        let second = store.save(&person("Alan", "Turing")).unwrap();
        assert_eq!((first.id, first.version), (Some(1), 0));
        assert_eq!((second.id, second.version), (Some(2), 0));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn update_bumps_version_and_rejects_stale_copies() {
        let store = MemoryStore::new();
        let saved = store.save(&person("Ada", "Lovelace")).unwrap();
        let stale = saved.clone();

        let mut edited = saved.clone();
        edited.role = Some("Manager".into());
        let updated = store.save(&edited).unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(store.get_by_id(1).unwrap(), Some(updated));

        let err = store.save(&stale).unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(
            err,
            StoreError::Conflict {
                id: 1,
                expected: 0,
                actual: Some(1)
            }
        ));
    }

    #[test]
    fn updating_a_deleted_row_is_a_conflict() {
        let store = MemoryStore::new();
        let saved = store.save(&person("Ada", "Lovelace")).unwrap();
        assert!(store.delete_by_id(1).unwrap());
        assert!(!store.delete_by_id(1).unwrap());
        let err = store.save(&saved).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { actual: None, .. }));
        assert_eq!(store.get_by_id(1).unwrap(), None);
    }

    #[test]
    fn clones_share_rows() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.save(&person("Ada", "Lovelace")).unwrap();
        assert_eq!(other.count().unwrap(), 1);
    }

    #[test]
    fn pages_are_sorted_filtered_and_sliced() {
        let store = MemoryStore::seed(sample_people(30)).unwrap();
        let cursor = PageRequest::new(1, 10).with_sort(vec![SortOrder::desc("firstName")]);
        let page: Vec<_> = store.stream_page(&cursor).unwrap().collect();
        assert_eq!(page.len(), 10);
        let names: Vec<_> = page.iter().map(|p| p.first_name.to_lowercase()).collect();
        assert!(names.windows(2).all(|pair| pair[0] >= pair[1]));

        let filter = Filter::on("lastName", "lovelace");
        let expected = sample_people(30)
            .iter()
            .filter(|p| p.last_name == "Lovelace")
            .count();
        assert_eq!(store.count_matching(&filter).unwrap(), expected);

        let past_end = store.stream_page(&PageRequest::new(9, 10)).unwrap();
        assert_eq!(past_end.len(), 0);
    }

    #[test]
    fn rejects_unknown_fields_and_empty_pages() {
        let store = MemoryStore::<SamplePerson>::new();
        let by_version = PageRequest::new(0, 10).with_sort(vec![SortOrder::asc("version")]);
        assert!(matches!(
            store.stream_page(&by_version),
            Err(StoreError::UnknownSortField(field)) if field == "version"
        ));
        assert!(matches!(
            store.count_matching(&Filter::on("nickname", "x")),
            Err(StoreError::UnknownFilterField(_))
        ));
        assert!(matches!(
            store.stream_page(&PageRequest::new(0, 0)),
            Err(StoreError::InvalidPage)
        ));
    }

    #[test]
    fn snapshot_round_trip_keeps_ids_and_versions() {
        let store = MemoryStore::seed(sample_people(3)).unwrap();
        let mut edited = store.get_by_id(2).unwrap().unwrap();
        edited.occupation = Some("Pilot".into());
        store.save(&edited).unwrap();
        store.delete_by_id(3).unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot().unwrap()).unwrap();
        assert_eq!(restored.get_by_id(2).unwrap().unwrap().version, 1);
        let fresh = restored.save(&person("Grace", "Hopper")).unwrap();
        assert_eq!(fresh.id, Some(4));
    }

    #[test]
    fn snapshot_files_can_be_reloaded() {
        let dir = std::env::temp_dir().join(format!("masterdetail-store-{}", std::process::id()));
        let path = dir.join("people.json");
        let store = MemoryStore::seed(sample_people(5)).unwrap();
        store.write_snapshot(OutputDestination::file(&path)).unwrap();

        let reloaded = MemoryStore::<SamplePerson>::load_snapshot(&path).unwrap();
        assert_eq!(reloaded.snapshot().unwrap(), store.snapshot().unwrap());
        std::fs::remove_dir_all(dir).ok();
    }
}
