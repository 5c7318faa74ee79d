//! Navigation Bridge: deep links to the edited record.

mod error;
mod history;
mod route;

pub use error::RouteError;
pub use history::{History, SessionHistory};
pub use route::{EDIT_ACTION, NavigationBridge, RouteTemplate};
