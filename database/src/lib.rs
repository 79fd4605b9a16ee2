//! Database access layer for Warehouse
//!
//! This crate owns the physical connection lifecycle (`DatabaseConnector`,
//! `Connection`), the fluent command builder (`QueryBuilder`) and the
//! row materialization helpers (`RowReader`, `Rows`). The PostgreSQL driver
//! lives in [`postgres`]; a scripted in-memory driver for tests lives in
//! `fake` behind the `testing` feature.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        $crate::__tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

#[doc(hidden)]
pub use tracing as __tracing;

pub mod command;
pub mod connection;
pub mod connector;
pub mod errors;
pub mod postgres;
pub mod query_builder;
pub mod reader;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use command::{Command, CommandKind, DbType, Parameter, ParameterDirection};
pub use connection::{Connection, ConnectionState, DriverConnection};
pub use connector::{ConnectionFactory, DatabaseConnector};
pub use errors::{DatabaseError, Result};
pub use postgres::PostgresConnectionFactory;
pub use query_builder::QueryBuilder;
pub use reader::{RowReader, RowSet, Rows};
pub use validation::{validate_identifier, validate_parameter_name, validate_qualified_name, IdentifierError};

pub use tokio_util::sync::CancellationToken;
