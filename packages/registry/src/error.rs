use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Neither the catalog id nor the message id matched a stored event.
    #[error("no event with id {0:?}")]
    NotFound(String),

    /// The candidate set of a time-window query is empty after filtering.
    /// Informational, not a failure of the store.
    #[error("no upcoming event with participants")]
    NoUpcomingEvent,

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}
