use crate::{
    domain::{Entity, EntityId},
    store::{RecordStore, StoreError},
};

use super::controller::ListController;

/// The page the grid is currently showing.
///
/// Refetches only when the page index changes or the list's generation has
/// moved since the last fetch.
#[derive(Debug, Clone)]
pub struct PageWindow<E> {
    page: usize,
    generation: Option<u64>,
    rows: Vec<E>,
    total: usize,
}

impl<E> Default for PageWindow<E> {
    fn default() -> Self {
        Self {
            page: 0,
            generation: None,
            rows: Vec::new(),
            total: 0,
        }
    }
}

impl<E: Entity> PageWindow<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale<S>(&self, list: &ListController<S>, page: usize) -> bool
    where
        S: RecordStore<Entity = E>,
    {
        self.generation != Some(list.generation()) || self.page != page
    }

    /// Rows of `page`, fetched through the list when stale.
    /// Returns whether a fetch happened.
    pub fn sync<S>(&mut self, list: &ListController<S>, page: usize) -> Result<bool, StoreError>
    where
        S: RecordStore<Entity = E>,
    {
        if !self.is_stale(list, page) {
            return Ok(false);
        }
        let total = list.total()?;
        let last_page = total.saturating_sub(1) / list.page_size();
        let page = page.min(last_page);
        self.rows = list.request_page(&list.cursor(page))?.collect();
        self.page = page;
        self.total = total;
        self.generation = Some(list.generation());
        Ok(true)
    }

    pub fn invalidate(&mut self) {
        self.generation = None;
    }

    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn position_of(&self, id: EntityId) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{SamplePerson, sample_people},
        list::person_columns,
        store::MemoryStore,
    };

    #[test]
    fn refetches_only_when_page_or_generation_moves() {
        let store = MemoryStore::seed(sample_people(12)).unwrap();
        let mut list = ListController::new(store.clone(), person_columns(), 5);
        let mut window = PageWindow::<SamplePerson>::new();

        assert!(window.sync(&list, 0).unwrap());
        assert_eq!(window.rows().len(), 5);
        assert!(!window.sync(&list, 0).unwrap());

        store.delete_by_id(1).unwrap();
        assert!(!window.sync(&list, 0).unwrap());
        assert_eq!(window.position_of(1), Some(0));

        list.refresh();
        assert!(window.sync(&list, 0).unwrap());
        assert_eq!(window.position_of(1), None);
        assert_eq!(window.total(), 11);

        assert!(window.sync(&list, 2).unwrap());
        assert_eq!(window.page(), 2);
        assert_eq!(window.rows().len(), 1);
    }

    #[test]
    fn clamps_to_the_last_page() {
        let store = MemoryStore::seed(sample_people(3)).unwrap();
        let list = ListController::new(store, person_columns(), 5);
        let mut window = PageWindow::new();
        window.sync(&list, 4).unwrap();
        assert_eq!(window.page(), 0);
        assert_eq!(window.rows().len(), 3);
    }
}
