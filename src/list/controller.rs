use tracing::debug;

use crate::{
    domain::EntityId,
    store::{Filter, PageRequest, PageStream, RecordStore, SortOrder, StoreError},
};

use super::{columns::Columns, error::ListError};

/// Lazy, page-at-a-time access to the store for the grid.
///
/// Holds only the cursor parameters (sort, filter, page size); pages are
/// never cached here. `generation` advances whenever previously fetched
/// pages may be stale, which is what [`super::PageWindow`] watches.
pub struct ListController<S: RecordStore> {
    store: S,
    columns: Columns<S::Entity>,
    sort: Option<SortOrder>,
    sort_column: Option<String>,
    filter: Filter,
    page_size: usize,
    generation: u64,
    selection: Option<EntityId>,
}

impl<S: RecordStore> ListController<S> {
    pub fn new(store: S, columns: Columns<S::Entity>, page_size: usize) -> Self {
        Self {
            store,
            columns,
            sort: None,
            sort_column: None,
            filter: Filter::default(),
            page_size: page_size.max(1),
            generation: 0,
            selection: None,
        }
    }

    pub fn request_page(&self, cursor: &PageRequest) -> Result<PageStream<S::Entity>, StoreError> {
        self.store.stream_page(cursor)
    }

    /// Cursor for `page` under the current sort, filter and page size.
    pub fn cursor(&self, page: usize) -> PageRequest {
        PageRequest::new(page, self.page_size)
            .with_sort(self.sort.iter().cloned().collect())
            .with_filter(self.filter.clone())
    }

    /// Drop the selection and make every held page stale.
    pub fn refresh(&mut self) {
        self.selection = None;
        self.invalidate();
        debug!(generation = self.generation, "list refreshed");
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn select(&mut self, id: Option<EntityId>) {
        self.selection = id;
    }

    pub fn selection(&self) -> Option<EntityId> {
        self.selection
    }

    /// First click sorts ascending; clicking the same column again flips it.
    pub fn sort_by(&mut self, column: &str) -> Result<&SortOrder, ListError> {
        let field = self.columns.sort_field(column)?.to_string();
        let next = match &self.sort {
            Some(current) if self.sort_column.as_deref() == Some(column) => SortOrder {
                property: field,
                direction: current.direction.toggled(),
            },
            _ => SortOrder::asc(field),
        };
        debug!(column, direction = %next.direction, "sort changed");
        self.sort_column = Some(column.to_string());
        self.invalidate();
        Ok(self.sort.insert(next))
    }

    pub fn clear_sort(&mut self) {
        if self.sort.take().is_some() {
            self.sort_column = None;
            self.invalidate();
        }
    }

    pub fn sort(&self) -> Option<(&str, &SortOrder)> {
        self.sort_column.as_deref().zip(self.sort.as_ref())
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if filter != self.filter {
            self.filter = filter;
            self.invalidate();
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.invalidate();
        }
    }

    /// Rows matching the current filter.
    pub fn total(&self) -> Result<usize, StoreError> {
        self.store.count_matching(&self.filter)
    }

    pub fn page_count(&self) -> Result<usize, StoreError> {
        Ok(self.total()?.div_ceil(self.page_size).max(1))
    }

    pub fn columns(&self) -> &Columns<S::Entity> {
        &self.columns
    }

    pub fn toggle_column(&mut self, key: &str) -> Result<bool, ListError> {
        let visible = self.columns.toggle_visibility(key)?;
        if !visible && self.sort_column.as_deref() == Some(key) {
            self.clear_sort();
        }
        Ok(visible)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
