mod binder;
mod convert;
mod error;
mod field;
mod validation;

pub use binder::FormBinder;
pub use error::{BindError, FieldCoercionError};
pub use field::{FieldInput, FieldState, FieldValue};
pub use validation::ValidationOutcome;

pub(crate) use convert::value_to_string;
