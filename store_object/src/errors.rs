use thiserror::Error;
use warehouse_database::DatabaseError;

/// Construction failures of a [`WarehousePagination`](crate::WarehousePagination)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Page size must be at least 1")]
    InvalidSize,

    #[error("Page number must be at least 1")]
    InvalidPage,

    #[error("{items} items do not fit in a page of size {size}")]
    TooManyItems { items: usize, size: usize },

    #[error("{items} items exceed the total count of {count}")]
    ItemsExceedCount { items: usize, count: usize },

    #[error("Page {page} is past the last page {pages}")]
    PageOutOfRange { page: usize, pages: usize },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Value cannot be null or empty: {0}")]
    ArgumentNull(&'static str),

    #[error("Invalid argument '{name}': {reason}")]
    Argument { name: &'static str, reason: String },

    #[error("Cannot access a disposed object: {0}")]
    Disposed(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pagination error: {0}")]
    Pagination(#[from] PaginationError),
}

impl StoreError {
    pub fn argument(name: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Argument {
            name,
            reason: reason.into(),
        }
    }

    /// Whether the failure came from cancelling the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Database(DatabaseError::Cancelled))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
