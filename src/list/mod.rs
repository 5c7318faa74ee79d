//! List Controller: lazy paging over the store, grid columns and the page
//! cache the presentation layer holds.

mod columns;
mod controller;
mod error;
mod window;

pub use columns::{CHECKED, Column, ColumnSource, Columns, UNCHECKED, person_columns};
pub use controller::ListController;
pub use error::ListError;
pub use window::PageWindow;
