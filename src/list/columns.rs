use std::fmt;

use serde_json::Value;

use crate::{
    domain::{Entity, SamplePerson},
    form::value_to_string,
};

use super::error::ListError;

pub const CHECKED: &str = "✔";
pub const UNCHECKED: &str = "·";

/// What a grid cell is read from.
pub enum ColumnSource<E> {
    /// The stored property of the same name, rendered as text.
    Field(String),
    /// A boolean property rendered as a check mark.
    CheckMark(String),
    /// Computed from the whole record; has no stored counterpart.
    Derived(fn(&E) -> String),
}

impl<E> ColumnSource<E> {
    /// The stored property sorting would order by, if any.
    pub fn backing_field(&self) -> Option<&str> {
        match self {
            ColumnSource::Field(name) | ColumnSource::CheckMark(name) => Some(name),
            ColumnSource::Derived(_) => None,
        }
    }
}

impl<E> Clone for ColumnSource<E> {
    fn clone(&self) -> Self {
        match self {
            ColumnSource::Field(name) => ColumnSource::Field(name.clone()),
            ColumnSource::CheckMark(name) => ColumnSource::CheckMark(name.clone()),
            ColumnSource::Derived(render) => ColumnSource::Derived(*render),
        }
    }
}

impl<E> fmt::Debug for ColumnSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSource::Field(name) => f.debug_tuple("Field").field(name).finish(),
            ColumnSource::CheckMark(name) => f.debug_tuple("CheckMark").field(name).finish(),
            ColumnSource::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column<E> {
    pub key: String,
    pub header: String,
    pub source: ColumnSource<E>,
    pub sortable: bool,
    pub visible: bool,
}

impl<E> Column<E> {
    pub fn field(name: impl Into<String>, header: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            header: header.into(),
            source: ColumnSource::Field(name),
            sortable: true,
            visible: true,
        }
    }

    pub fn check_mark(name: impl Into<String>, header: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            header: header.into(),
            source: ColumnSource::CheckMark(name),
            sortable: true,
            visible: true,
        }
    }

    /// Derived columns start unsortable.
    pub fn derived(key: impl Into<String>, header: impl Into<String>, render: fn(&E) -> String) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            source: ColumnSource::Derived(render),
            sortable: false,
            visible: true,
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// `row` is the record's JSON form; derived columns read `record` instead.
    pub fn render(&self, record: &E, row: &Value) -> String {
        match &self.source {
            ColumnSource::Field(name) => row.get(name).map(value_to_string).unwrap_or_default(),
            ColumnSource::CheckMark(name) => {
                if row.get(name).and_then(Value::as_bool).unwrap_or(false) {
                    CHECKED.to_string()
                } else {
                    UNCHECKED.to_string()
                }
            }
            ColumnSource::Derived(render) => render(record),
        }
    }
}

/// The grid's column set, in display order.
#[derive(Debug, Clone)]
pub struct Columns<E> {
    columns: Vec<Column<E>>,
}

impl<E> Columns<E> {
    pub fn new(columns: Vec<Column<E>>) -> Result<Self, ListError> {
        for (index, column) in columns.iter().enumerate() {
            if column.sortable && column.source.backing_field().is_none() {
                return Err(ListError::UnsortableColumn(column.key.clone()));
            }
            if columns[..index].iter().any(|other| other.key == column.key) {
                return Err(ListError::DuplicateColumn(column.key.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn get(&self, key: &str) -> Option<&Column<E>> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn all(&self) -> &[Column<E>] {
        &self.columns
    }

    pub fn visible(&self) -> impl Iterator<Item = &Column<E>> {
        self.columns.iter().filter(|column| column.visible)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Flip a column's visibility and return the new state.
    pub fn toggle_visibility(&mut self, key: &str) -> Result<bool, ListError> {
        let visible_count = self.visible().count();
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.key == key)
            .ok_or_else(|| ListError::UnknownColumn(key.to_string()))?;
        if column.visible && visible_count == 1 {
            return Err(ListError::LastVisibleColumn);
        }
        column.visible = !column.visible;
        Ok(column.visible)
    }

    /// The stored field a sortable column orders by.
    pub fn sort_field(&self, key: &str) -> Result<&str, ListError> {
        let column = self
            .get(key)
            .ok_or_else(|| ListError::UnknownColumn(key.to_string()))?;
        if !column.sortable {
            return Err(ListError::UnsortableColumn(key.to_string()));
        }
        column
            .source
            .backing_field()
            .ok_or_else(|| ListError::UnsortableColumn(key.to_string()))
    }
}

impl<E: Entity> Columns<E> {
    /// Render the visible cells of one record.
    pub fn row_cells(&self, record: &E) -> Vec<String> {
        let row = serde_json::to_value(record).unwrap_or(Value::Null);
        self.visible().map(|column| column.render(record, &row)).collect()
    }
}

fn full_name(person: &SamplePerson) -> String {
    format!("{} {}", person.first_name, person.last_name)
}

/// Grid layout of the person view. "Important" sorts by the stored flag.
pub fn person_columns() -> Columns<SamplePerson> {
    let columns = vec![
        Column::field("firstName", "First Name"),
        Column::field("lastName", "Last Name"),
        Column::derived("fullName", "Name", full_name).hidden(),
        Column::field("email", "Email"),
        Column::field("phone", "Phone"),
        Column::field("dateOfBirth", "Date Of Birth"),
        Column::field("occupation", "Occupation"),
        Column::field("role", "Role"),
        Column::check_mark("important", "Important"),
    ];
    Columns { columns }
}
