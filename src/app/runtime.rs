use std::{collections::VecDeque, time::Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use tracing::{debug, info, warn};

use crate::{
    controller::{MasterDetail, SaveOutcome},
    domain::Entity,
    list::PageWindow,
    notify::Notification,
    store::{Filter, RecordStore, StoreError},
};

use super::{
    keymap::{KeyAction, Keymap, KeymapContext},
    status::StatusLine,
    terminal::TerminalGuard,
    view::{FieldLine, Header, OverlayRender, Screen},
};

/// Counters reported when the UI closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiExit {
    pub saves: usize,
    pub deletes: usize,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Grid,
    Form,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Columns { selected: usize },
    Filter { buffer: String },
}

struct Toast {
    note: Notification,
    since: Instant,
}

/// Terminal front end: the grid on the left, the bound form on the right.
pub struct MasterDetailApp<S: RecordStore> {
    session: MasterDetail<S>,
    window: PageWindow<S::Entity>,
    keymap: Keymap,
    page: usize,
    row: usize,
    column: usize,
    field: usize,
    focus: Focus,
    overlay: Option<Overlay>,
    toasts: VecDeque<Notification>,
    toast: Option<Toast>,
    status: StatusLine,
    show_help: bool,
    exit_armed: bool,
    should_quit: bool,
    exit: UiExit,
}

impl<S: RecordStore> MasterDetailApp<S> {
    pub fn new(session: MasterDetail<S>) -> Result<Self> {
        let show_help = session.options().show_help;
        Ok(Self {
            session,
            window: PageWindow::new(),
            keymap: Keymap::builtin()?,
            page: 0,
            row: 0,
            column: 0,
            field: 0,
            focus: Focus::Grid,
            overlay: None,
            toasts: VecDeque::new(),
            toast: None,
            status: StatusLine::default(),
            show_help,
            exit_armed: false,
            should_quit: false,
            exit: UiExit::default(),
        })
    }

    pub fn session(&self) -> &MasterDetail<S> {
        &self.session
    }

    pub fn run(mut self) -> Result<UiExit> {
        let mut terminal = TerminalGuard::new()?;
        let tick_rate = self.session.options().tick_rate();
        self.collect_notifications();
        while !self.should_quit {
            self.sync_window();
            self.expire_toast();
            terminal.render(&self.screen())?;
            if !event::poll(tick_rate)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize(width, height) => terminal.resize(width, height)?,
                _ => {}
            }
        }
        self.exit.url = self.session.current_url().to_string();
        info!(saves = self.exit.saves, deletes = self.exit.deletes, "ui closed");
        Ok(self.exit)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            self.sync_window();
            return;
        }
        let context = match self.focus {
            Focus::Grid => KeymapContext::Grid,
            Focus::Form => KeymapContext::Form,
        };
        let action = self.keymap.classify(context, &key);
        if action != Some(KeyAction::Quit) {
            self.exit_armed = false;
        }
        match action {
            Some(action) => self.handle_action(action),
            None if self.focus == Focus::Form => self.handle_field_input(&key),
            None => {}
        }
        self.collect_notifications();
        self.sync_window();
    }

    fn handle_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Save => self.on_save(),
            KeyAction::Quit => self.on_exit(),
            KeyAction::NewRecord => {
                self.session.select_row(None);
                self.focus_form();
            }
            KeyAction::Delete => match self.session.delete() {
                Ok(removed) => {
                    if removed {
                        self.exit.deletes += 1;
                    }
                    self.focus = Focus::Grid;
                }
                Err(err) => self.store_failed("delete", &err),
            },
            KeyAction::Cancel => {
                self.session.cancel();
                self.focus = Focus::Grid;
                self.status.ready();
            }
            KeyAction::SwitchFocus => match self.focus {
                Focus::Grid => self.focus_form(),
                Focus::Form => self.focus = Focus::Grid,
            },
            KeyAction::FieldStep(delta) => {
                let count = self.session.form().fields().len();
                self.field = step(self.field, delta, count);
                self.announce_field();
            }
            KeyAction::RowStep(delta) => self.move_row(delta),
            KeyAction::PageStep(delta) => {
                self.page = self.page.saturating_add_signed(delta as isize);
                self.row = 0;
            }
            KeyAction::ColumnStep(delta) => {
                let count = self.session.list().columns().visible().count();
                self.column = step(self.column, delta, count);
            }
            KeyAction::OpenRow => self.open_row(),
            KeyAction::SortColumn => self.sort_current_column(),
            KeyAction::ColumnMenu => {
                if self.session.options().column_menu {
                    self.overlay = Some(Overlay::Columns { selected: 0 });
                    self.status.set("Space toggles a column, Esc closes");
                } else {
                    self.status.set("The column menu is disabled");
                }
            }
            KeyAction::Filter => {
                let buffer = self.session.list().filter().text.clone();
                self.overlay = Some(Overlay::Filter { buffer });
                self.status.set("Type to filter, Enter applies, Esc clears");
            }
            KeyAction::ToggleHelp => self.show_help = !self.show_help,
        }
    }

    fn on_save(&mut self) {
        if !self.session.has_unsaved_changes() {
            self.status.set("No changes to save");
            return;
        }
        let outcome = match self.session.save() {
            Ok(outcome) => outcome,
            Err(err) => {
                self.store_failed("save", &err);
                return;
            }
        };
        match outcome {
            SaveOutcome::Saved(record) => {
                self.exit.saves += 1;
                debug!(id = ?record.id(), "saved from ui");
                self.focus = Focus::Grid;
                self.status.ready();
            }
            SaveOutcome::Invalid => {
                let issues = self.session.form().error_count();
                self.status.set(format!("{issues} issue(s) remaining"));
            }
            SaveOutcome::Conflict => {
                self.status.set("Save rejected; reload the row to see the stored version");
            }
        }
    }

    /// The session already queued an error notification; the form keeps
    /// whatever it had before the failed call.
    fn store_failed(&mut self, operation: &str, err: &StoreError) {
        warn!(operation, error = %err, "store call failed");
        self.status.set(format!("Could not {operation}: {err}"));
    }

    fn on_exit(&mut self) {
        let confirm = self.session.options().confirm_exit;
        if confirm && self.session.has_unsaved_changes() && !self.exit_armed {
            self.exit_armed = true;
            self.status.pending_exit();
            return;
        }
        self.should_quit = true;
    }

    fn handle_field_input(&mut self, key: &KeyEvent) {
        let Some(name) = self.focused_field_name() else {
            return;
        };
        match self.session.apply_key(&name, key) {
            Ok(true) => self.announce_field(),
            Ok(false) => {}
            Err(err) => self.status.set(err.to_string()),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) {
        let Some(overlay) = self.overlay.take() else {
            return;
        };
        match overlay {
            Overlay::Columns { selected } => {
                let count = self.session.list().columns().len();
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => {
                        self.column = 0;
                        self.status.ready();
                        return;
                    }
                    KeyCode::Up => {
                        self.overlay = Some(Overlay::Columns {
                            selected: step(selected, -1, count),
                        })
                    }
                    KeyCode::Down => {
                        self.overlay = Some(Overlay::Columns {
                            selected: step(selected, 1, count),
                        })
                    }
                    KeyCode::Char(' ') => {
                        let key = self
                            .session
                            .list()
                            .columns()
                            .all()
                            .get(selected)
                            .map(|column| column.key.clone());
                        if let Some(key) = key
                            && let Err(err) = self.session.toggle_column(&key)
                        {
                            self.status.set(err.to_string());
                        }
                        self.overlay = Some(Overlay::Columns { selected });
                    }
                    _ => self.overlay = Some(Overlay::Columns { selected }),
                }
            }
            Overlay::Filter { mut buffer } => match key.code {
                KeyCode::Esc => {
                    self.apply_filter(String::new());
                }
                KeyCode::Enter => {
                    self.apply_filter(buffer);
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    self.overlay = Some(Overlay::Filter { buffer });
                }
                KeyCode::Char(ch) => {
                    buffer.push(ch);
                    self.overlay = Some(Overlay::Filter { buffer });
                }
                _ => self.overlay = Some(Overlay::Filter { buffer }),
            },
        }
    }

    fn apply_filter(&mut self, text: String) {
        if text.is_empty() {
            self.status.ready();
        } else {
            self.status.set(format!("Filter: {text}"));
        }
        self.session.set_filter(Filter::any(text));
        self.page = 0;
        self.row = 0;
    }

    fn open_row(&mut self) {
        let Some(record) = self.window.rows().get(self.row).cloned() else {
            return;
        };
        if record.id().is_some() && record.id() == self.session.list().selection() {
            self.session.select_row(None);
            self.status.ready();
            return;
        }
        self.session.select_row(Some(record));
        self.focus_form();
    }

    fn sort_current_column(&mut self) {
        let key = self
            .session
            .list()
            .columns()
            .visible()
            .nth(self.column)
            .map(|column| column.key.clone());
        let Some(key) = key else {
            return;
        };
        match self.session.sort_by(&key) {
            Ok(order) => self
                .status
                .set(format!("Sorted by {} ({})", order.property, order.direction)),
            Err(err) => self.status.set(err.to_string()),
        }
    }

    /// Moving past either end of the page continues on the neighbouring page.
    fn move_row(&mut self, delta: i32) {
        let len = self.window.rows().len();
        let page_count = self
            .window
            .total()
            .div_ceil(self.session.list().page_size())
            .max(1);
        if delta > 0 && self.row + 1 >= len {
            if self.page + 1 < page_count {
                self.page += 1;
                self.row = 0;
            }
        } else if delta < 0 && self.row == 0 {
            if self.page > 0 {
                self.page -= 1;
                self.row = usize::MAX;
            }
        } else {
            self.row = self.row.saturating_add_signed(delta as isize);
        }
    }

    fn focus_form(&mut self) {
        self.focus = Focus::Form;
        self.announce_field();
    }

    fn announce_field(&mut self) {
        if let Some(field) = self.session.form().fields().get(self.field) {
            let label = field.schema.display_label();
            self.status.editing(&label);
        }
    }

    fn focused_field_name(&self) -> Option<String> {
        self.session
            .form()
            .fields()
            .get(self.field)
            .map(|field| field.name().to_string())
    }

    fn sync_window(&mut self) {
        match self.window.sync(self.session.list(), self.page) {
            Ok(_) => {}
            Err(err) => self.status.set(err.to_string()),
        }
        self.page = self.window.page();
        let len = self.window.rows().len();
        self.row = self.row.min(len.saturating_sub(1));
    }

    fn collect_notifications(&mut self) {
        self.toasts.extend(self.session.take_notifications());
        if self.toast.is_none() {
            self.next_toast();
        }
    }

    fn expire_toast(&mut self) {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.since.elapsed() >= toast.note.duration)
        {
            self.toast = None;
            self.next_toast();
        }
    }

    fn next_toast(&mut self) {
        self.toast = self.toasts.pop_front().map(|note| Toast {
            note,
            since: Instant::now(),
        });
    }

    fn screen(&self) -> Screen<'_> {
        let list = self.session.list();
        let columns = list.columns();
        let sort = list.sort();
        let headers = columns
            .visible()
            .map(|column| Header {
                label: column.header.clone(),
                direction: sort
                    .filter(|(key, _)| *key == column.key)
                    .map(|(_, order)| order.direction),
            })
            .collect();
        let selection = list.selection();
        let rows = self
            .window
            .rows()
            .iter()
            .map(|record| (columns.row_cells(record), selection.is_some() && record.id() == selection))
            .collect();
        let form = self.session.form();
        let fields = form
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| FieldLine {
                label: field.schema.display_label(),
                value: field.display_value(),
                error: field.error.clone(),
                focused: self.focus == Focus::Form && index == self.field,
            })
            .collect();
        let page_count = self.window.total().div_ceil(list.page_size()).max(1);
        let overlay = self.overlay.as_ref().map(|overlay| match overlay {
            Overlay::Columns { selected } => OverlayRender::Columns {
                entries: columns
                    .all()
                    .iter()
                    .map(|column| (column.header.clone(), column.visible))
                    .collect(),
                selected: *selected,
            },
            Overlay::Filter { buffer } => OverlayRender::Filter {
                buffer: buffer.as_str(),
            },
        });
        let context = match self.focus {
            Focus::Grid => KeymapContext::Grid,
            Focus::Form => KeymapContext::Form,
        };
        Screen {
            title: <S::Entity as Entity>::LABEL,
            headers,
            rows,
            cursor: (self.focus == Focus::Grid).then_some(self.row),
            column: self.column,
            page: self.page,
            page_count,
            total: self.window.total(),
            filter: &list.filter().text,
            fields,
            state: self.session.state(),
            save_enabled: self.session.save_enabled(),
            dirty: self.session.has_unsaved_changes(),
            url: self.session.current_url(),
            status: self.status.message(),
            help: self.show_help.then(|| self.keymap.help_text(context)),
            toast: self.toast.as_ref().map(|toast| &toast.note),
            overlay,
        }
    }
}

fn step(current: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    (current as i64 + delta as i64).rem_euclid(len) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        SessionState,
        domain::{SamplePerson, sample_people},
        notify::Severity,
        store::{MemoryStore, outage::OutageStore},
    };
    use crossterm::event::KeyModifiers;

    fn app(rows: usize) -> MasterDetailApp<MemoryStore<SamplePerson>> {
        let store = MemoryStore::seed(sample_people(rows)).unwrap();
        let session = MasterDetail::with_defaults(store).unwrap();
        let mut app = MasterDetailApp::new(session).unwrap();
        app.sync_window();
        app
    }

    fn press<S: RecordStore>(app: &mut MasterDetailApp<S>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl<S: RecordStore>(app: &mut MasterDetailApp<S>, ch: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL));
    }

    #[test]
    fn enter_opens_the_highlighted_row() {
        let mut app = app(5);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus, Focus::Form);
        assert_eq!(app.session.state(), SessionState::Editing);
        assert_eq!(app.session.current_url(), "/master-detail/2/edit");
    }

    #[test]
    fn typing_edits_the_focused_field_and_enter_saves() {
        let mut app = app(3);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('!'));
        assert!(app.session.save_enabled());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.exit.saves, 1);
        assert_eq!(app.session.state(), SessionState::New);
        assert_eq!(app.focus, Focus::Grid);
        assert_eq!(
            app.toast.as_ref().map(|toast| toast.note.message.as_str()),
            Some(crate::notify::SAVED)
        );
        assert!(app.window.rows()[0].first_name.ends_with('!'));
    }

    #[test]
    fn store_outage_is_reported_without_closing_the_ui() {
        let store = OutageStore::seeded(3);
        let session = MasterDetail::with_defaults(store.clone()).unwrap();
        let mut app = MasterDetailApp::new(session).unwrap();
        app.sync_window();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('!'));
        store.go_down();

        press(&mut app, KeyCode::Enter);
        assert!(!app.should_quit);
        assert_eq!(app.exit.saves, 0);
        assert_eq!(app.focus, Focus::Form);
        assert_eq!(app.session.state(), SessionState::Editing);
        assert!(app.session.has_unsaved_changes());
        let toast = app.toast.as_ref().map(|toast| &toast.note);
        assert_eq!(toast.map(|note| note.severity), Some(Severity::Error));
        assert!(app.status.message().starts_with("Could not save"));

        ctrl(&mut app, 'd');
        assert!(!app.should_quit);
        assert_eq!(app.exit.deletes, 0);
        assert!(app.status.message().starts_with("Could not delete"));
        assert_eq!(store.rows().count().unwrap(), 3);
    }

    #[test]
    fn quit_with_unsaved_edits_needs_confirmation() {
        let mut app = app(1);
        ctrl(&mut app, 'n');
        press(&mut app, KeyCode::Char('A'));
        ctrl(&mut app, 'q');
        assert!(!app.should_quit);
        assert!(app.exit_armed);
        ctrl(&mut app, 'q');
        assert!(app.should_quit);
    }

    #[test]
    fn row_movement_crosses_page_boundaries() {
        let store = MemoryStore::seed(sample_people(12)).unwrap();
        let session = MasterDetail::new(
            store,
            crate::list::person_columns(),
            crate::nav::RouteTemplate::master_detail().unwrap(),
            crate::nav::SessionHistory::default(),
            crate::ViewOptions::default().with_page_size(5),
        )
        .unwrap();
        let mut app = MasterDetailApp::new(session).unwrap();
        app.sync_window();
        for _ in 0..5 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!((app.page, app.row), (1, 0));
        for _ in 0..20 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!((app.page, app.row), (2, 1));
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!((app.page, app.row), (1, 4));
    }

    #[test]
    fn filter_prompt_narrows_the_grid() {
        let mut app = app(20);
        press(&mut app, KeyCode::Char('/'));
        for ch in "grace.".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.overlay.is_none());
        assert!(!app.window.rows().is_empty());
        assert!(app.window.rows().iter().all(|p| p.first_name == "Grace"));

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.window.total(), 20);
    }

    #[test]
    fn sort_key_sorts_the_highlighted_column() {
        let mut app = app(10);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('s'));
        let names: Vec<_> = app
            .window
            .rows()
            .iter()
            .map(|p| p.last_name.to_lowercase())
            .collect();
        assert!(names.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(app.status.message().starts_with("Sorted by lastName"));
    }
}
