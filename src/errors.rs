//! Error types for the warehouse crate
//!
//! Managers return `Err` for argument and disposed errors, and re-throw the
//! failure captured by a store when an accessor has no value to return.

use std::sync::Arc;
use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ManagerError {
    #[error("Cannot access a disposed object: {0}")]
    Disposed(&'static str),

    #[error("Invalid argument '{name}': {reason}")]
    Argument { name: &'static str, reason: String },

    #[error(transparent)]
    Store(Arc<StoreError>),

    #[error("Configuration error: {0}")]
    Config(Arc<config::ConfigError>),

    #[error("Database error: {0}")]
    Database(Arc<warehouse_database::DatabaseError>),
}

impl From<StoreError> for ManagerError {
    fn from(error: StoreError) -> Self {
        ManagerError::Store(Arc::new(error))
    }
}

impl From<config::ConfigError> for ManagerError {
    fn from(error: config::ConfigError) -> Self {
        ManagerError::Config(Arc::new(error))
    }
}

impl From<warehouse_database::DatabaseError> for ManagerError {
    fn from(error: warehouse_database::DatabaseError) -> Self {
        ManagerError::Database(Arc::new(error))
    }
}

impl ManagerError {
    /// The store failure behind this error, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            ManagerError::Store(error) => Some(error),
            _ => None,
        }
    }
}
