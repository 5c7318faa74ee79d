use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Sorting needs a stored field to order by.
    #[error("column '{0}' has no backing field and cannot be sorted")]
    UnsortableColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' is declared twice")]
    DuplicateColumn(String),

    #[error("at least one column must stay visible")]
    LastVisibleColumn,

    #[error("the column menu is disabled")]
    ColumnMenuDisabled,
}
