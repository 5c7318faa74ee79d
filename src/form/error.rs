use thiserror::Error;

/// A field's text could not be turned into the value its schema expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCoercionError {
    pub pointer: String,
    pub message: String,
}

impl std::fmt::Display for FieldCoercionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

impl std::error::Error for FieldCoercionError {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("no record is bound to the form")]
    Inactive,

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{field}' does not accept {given} input")]
    KindMismatch { field: String, given: &'static str },
}
