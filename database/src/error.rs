use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by the data access layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A by-id mutation matched no row.
    #[error("subscription {0} does not exist")]
    NotFound(Uuid),

    /// Any error reported by the store, constraint violations included.
    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}
