//! Terminal front end for a [`crate::MasterDetail`] session.

mod keymap;
mod runtime;
mod status;
mod terminal;
mod view;

pub use runtime::{MasterDetailApp, UiExit};
