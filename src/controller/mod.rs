//! Master-Detail Controller: keeps the grid and the edit form in step.

mod session;

pub use session::{MasterDetail, SaveOutcome, SessionState};
