use crate::validation::IdentifierError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Value cannot be null or empty: {0}")]
    ArgumentNull(&'static str),

    #[error("Invalid argument '{name}': {reason}")]
    Argument { name: &'static str, reason: String },

    #[error("Cannot access a disposed object: {0}")]
    Disposed(&'static str),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Command was cancelled")]
    Cancelled,

    #[error("Driver error: {0}")]
    Driver(String),
}

impl DatabaseError {
    pub fn argument(name: &'static str, reason: impl Into<String>) -> Self {
        DatabaseError::Argument {
            name,
            reason: reason.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        DatabaseError::Conversion(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
