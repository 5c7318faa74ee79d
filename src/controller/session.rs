use std::fmt;

use anyhow::Result;
use crossterm::event::KeyEvent;
use tracing::{debug, warn};

use crate::{
    config::{ValidationMode, ViewOptions},
    domain::{Entity, SamplePerson},
    form::{BindError, FieldInput, FormBinder},
    list::{Columns, ListController, ListError, person_columns},
    nav::{History, NavigationBridge, RouteError, RouteTemplate, SessionHistory},
    notify::{Notification, Notifications},
    store::{Filter, RecordStore, SortOrder, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A fresh, unsaved record is bound.
    New,
    /// A stored record is bound, possibly with edits.
    Editing,
    /// Inside the store call of `save`.
    Saving,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::New => write!(f, "new"),
            SessionState::Editing => write!(f, "editing"),
            SessionState::Saving => write!(f, "saving"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome<E> {
    /// Stored; carries the record with its new id and version.
    Saved(E),
    /// Some field breaks its rule; nothing was sent to the store.
    Invalid,
    /// Another writer changed or removed the row. The edits stay bound.
    Conflict,
}

/// One user's master-detail session over a shared store.
pub struct MasterDetail<S, N = RouteTemplate, H = SessionHistory>
where
    S: RecordStore,
{
    list: ListController<S>,
    form: FormBinder<S::Entity>,
    nav: N,
    history: H,
    options: ViewOptions,
    state: SessionState,
    notifications: Notifications,
}

impl<S> MasterDetail<S>
where
    S: RecordStore<Entity = SamplePerson>,
{
    /// The person view with its stock columns, route and options.
    pub fn with_defaults(store: S) -> Result<Self> {
        let route = RouteTemplate::master_detail()?;
        let history = SessionHistory::new(route.encode(None));
        Self::new(store, person_columns(), route, history, ViewOptions::default())
    }
}

impl<S, N, H> MasterDetail<S, N, H>
where
    S: RecordStore,
    N: NavigationBridge,
    H: History,
{
    pub fn new(
        store: S,
        columns: Columns<S::Entity>,
        nav: N,
        history: H,
        options: ViewOptions,
    ) -> Result<Self> {
        let mut form = FormBinder::new()?;
        form.load(S::Entity::default());
        let list = ListController::new(store, columns, options.page_size);
        Ok(Self {
            list,
            form,
            nav,
            history,
            options,
            state: SessionState::New,
            notifications: Notifications::default(),
        })
    }

    /// Navigation entry: open the record named by `url`, or a new one.
    ///
    /// Ids that cannot be resolved are reported and fall back to a new
    /// record. Store failures are reported too and then returned.
    pub fn enter(&mut self, url: &str) -> Result<(), StoreError> {
        let id = match self.nav.decode(url) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.prepare_new();
                return Ok(());
            }
            Err(err) => {
                warn!(url, error = %err, "unresolvable route");
                let shown = match &err {
                    RouteError::InvalidId(raw) => raw.clone(),
                    _ => url.to_string(),
                };
                self.notifications
                    .push(Notification::not_found(S::Entity::LABEL, shown));
                self.prepare_new();
                return Ok(());
            }
        };
        match self.list.store().get_by_id(id) {
            Ok(Some(record)) => {
                self.list.select(Some(id));
                self.edit(record);
                Ok(())
            }
            Ok(None) => {
                debug!(id, "deep link target missing");
                self.notifications
                    .push(Notification::not_found(S::Entity::LABEL, id));
                self.prepare_new();
                Ok(())
            }
            Err(err) => {
                warn!(id, error = %err, "failed to load deep link target");
                self.notifications.push(Notification::failure(err.to_string()));
                self.prepare_new();
                Err(err)
            }
        }
    }

    /// Grid selection changed. `None` means the row was deselected.
    pub fn select_row(&mut self, record: Option<S::Entity>) {
        match record {
            Some(record) => {
                self.list.select(record.id());
                self.edit(record);
            }
            None => {
                self.list.select(None);
                self.prepare_new();
            }
        }
    }

    pub fn set_field(&mut self, name: &str, input: impl Into<FieldInput>) -> Result<(), BindError> {
        self.form.set_field(name, input)?;
        self.after_edit(name);
        Ok(())
    }

    pub fn apply_key(&mut self, name: &str, key: &KeyEvent) -> Result<bool, BindError> {
        let changed = self.form.apply_key(name, key)?;
        if changed {
            self.after_edit(name);
        }
        Ok(changed)
    }

    /// Persist the bound record.
    ///
    /// Conflicts leave the user's edits bound and the grid untouched. Other
    /// store failures are reported, leave the form as it was, and are
    /// returned to the caller.
    pub fn save(&mut self) -> Result<SaveOutcome<S::Entity>, StoreError> {
        if !self.form.is_valid() {
            self.form.validate();
            self.notifications.push(Notification::invalid());
            debug!("save blocked by validation");
            return Ok(SaveOutcome::Invalid);
        }
        let Some(record) = self.form.current_record().cloned() else {
            return Ok(SaveOutcome::Invalid);
        };

        let previous = self.state;
        self.transition(SessionState::Saving);
        match self.list.store().save(&record) {
            Ok(saved) => {
                debug!(id = ?saved.id(), "save committed");
                self.prepare_new();
                self.list.refresh();
                self.notifications.push(Notification::saved());
                Ok(SaveOutcome::Saved(saved))
            }
            Err(err) if err.is_conflict() => {
                self.transition(previous);
                self.notifications.push(Notification::conflict());
                Ok(SaveOutcome::Conflict)
            }
            Err(err) => {
                warn!(error = %err, "save failed");
                self.transition(previous);
                self.notifications.push(Notification::failure(err.to_string()));
                Err(err)
            }
        }
    }

    /// Drop uncommitted edits and start a new record.
    pub fn cancel(&mut self) {
        self.prepare_new();
        self.list.refresh();
    }

    /// Remove the bound record from the store. Unsaved records are left
    /// alone and report `false`.
    pub fn delete(&mut self) -> Result<bool, StoreError> {
        let Some(id) = self.form.current_record().and_then(Entity::id) else {
            return Ok(false);
        };
        let removed = match self.list.store().delete_by_id(id) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(id, error = %err, "delete failed");
                self.notifications.push(Notification::failure(err.to_string()));
                return Err(err);
            }
        };
        if removed {
            self.notifications
                .push(Notification::deleted(S::Entity::LABEL, id));
        } else {
            self.notifications
                .push(Notification::not_found(S::Entity::LABEL, id));
        }
        self.prepare_new();
        self.list.refresh();
        Ok(removed)
    }

    /// Enabled iff the record is valid and the user changed something.
    pub fn save_enabled(&self) -> bool {
        self.state != SessionState::Saving && self.form.is_valid() && self.form.has_changes()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.form.has_changes()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    pub fn current_url(&self) -> &str {
        self.history.current()
    }

    pub fn sort_by(&mut self, column: &str) -> Result<SortOrder, ListError> {
        self.list.sort_by(column).cloned()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.list.set_filter(filter);
    }

    /// Show or hide a grid column; only with the column menu enabled.
    pub fn toggle_column(&mut self, key: &str) -> Result<bool, ListError> {
        if !self.options.column_menu {
            return Err(ListError::ColumnMenuDisabled);
        }
        self.list.toggle_column(key)
    }

    pub fn form(&self) -> &FormBinder<S::Entity> {
        &self.form
    }

    pub fn list(&self) -> &ListController<S> {
        &self.list
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn nav(&self) -> &N {
        &self.nav
    }

    fn edit(&mut self, record: S::Entity) {
        let state = if record.is_persisted() {
            SessionState::Editing
        } else {
            SessionState::New
        };
        self.form.load(record);
        self.form.clear_errors();
        self.transition(state);
        self.sync_url();
    }

    fn prepare_new(&mut self) {
        self.edit(S::Entity::default());
    }

    fn after_edit(&mut self, name: &str) {
        if self.options.validation == ValidationMode::Eager {
            self.form.validate_field(name);
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "session state");
            self.state = next;
        }
    }

    fn sync_url(&mut self) {
        if !self.options.deep_linking {
            return;
        }
        let id = self.form.current_record().and_then(Entity::id);
        let url = self.nav.encode(id);
        self.history.replace_state(&url);
    }
}
