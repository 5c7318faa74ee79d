#![deny(rust_2018_idioms)]

#[cfg(feature = "tui")]
pub mod app;
pub mod config;
pub mod controller;
pub mod domain;
pub mod form;
pub mod io;
pub mod list;
pub mod nav;
pub mod notify;
pub mod store;

#[cfg(feature = "tui")]
pub use app::{MasterDetailApp, UiExit};
pub use config::{ValidationMode, ViewOptions};
pub use controller::{MasterDetail, SaveOutcome, SessionState};
pub use domain::{Entity, EntityId, SamplePerson};
pub use store::{MemoryStore, RecordStore, StoreError};

pub mod prelude {
    #[cfg(feature = "tui")]
    pub use super::app::{MasterDetailApp, UiExit};
    pub use super::{
        Entity, MasterDetail, MemoryStore, RecordStore, SamplePerson, SaveOutcome, SessionState,
        ValidationMode, ViewOptions,
    };
}
