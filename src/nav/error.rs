use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("'{0}' does not match this view's route")]
    NoMatch(String),

    #[error("'{0}' is not a record id")]
    InvalidId(String),

    #[error("unknown route action '{0}'")]
    UnknownAction(String),

    #[error("invalid route template: {0}")]
    Template(String),
}
