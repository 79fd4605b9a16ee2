//! Connector: owns the connections issued against one database

use crate::connection::{Connection, ConnectionInner, DriverConnection};
use crate::errors::{DatabaseError, Result};
use crate::postgres::PostgresConnectionFactory;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// Creates physical connections for one database technology
pub trait ConnectionFactory: Send + Sync + fmt::Debug {
    /// Short technology name used in logs
    fn name(&self) -> &'static str;

    fn initialize_connection(&self, connection_string: &str) -> Result<Box<dyn DriverConnection>>;
}

/// Issues and tracks connections to a single database.
///
/// `count()` is the number of `create` calls made over the connector's
/// lifetime. Disposing the connector disposes every connection it issued
/// that is still alive.
pub struct DatabaseConnector {
    connection_string: String,
    factory: Box<dyn ConnectionFactory>,
    connections: Mutex<Vec<Weak<ConnectionInner>>>,
    created: AtomicU64,
    command_timeout: Option<Duration>,
    disposed: AtomicBool,
}

impl DatabaseConnector {
    pub fn new(
        connection_string: impl Into<String>,
        factory: impl ConnectionFactory + 'static,
    ) -> Result<Self> {
        let connection_string = connection_string.into();
        if connection_string.trim().is_empty() {
            return Err(DatabaseError::argument(
                "connection_string",
                "connection string must not be empty",
            ));
        }

        Ok(Self {
            connection_string,
            factory: Box::new(factory),
            connections: Mutex::new(Vec::new()),
            created: AtomicU64::new(0),
            command_timeout: None,
            disposed: AtomicBool::new(false),
        })
    }

    /// Connector backed by the PostgreSQL driver
    pub fn postgres(connection_string: impl Into<String>) -> Result<Self> {
        Self::new(connection_string, PostgresConnectionFactory)
    }

    /// Default timeout for commands run on issued connections
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    /// Number of connections created so far
    pub fn count(&self) -> usize {
        self.created.load(Ordering::SeqCst) as usize
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Create a connection, opening it when `open` is set
    pub async fn create(&self, open: bool) -> Result<Connection> {
        if self.is_disposed() {
            return Err(DatabaseError::Disposed("DatabaseConnector"));
        }

        let driver = self.factory.initialize_connection(&self.connection_string)?;
        let id = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::new(ConnectionInner::new(id, driver));
        {
            let mut connections = self
                .connections
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            connections.retain(|connection| connection.strong_count() > 0);
            connections.push(Arc::downgrade(&inner));
        }

        let connection = Connection::new(inner, self.command_timeout);
        debug!(
            "Created {} connection {} (open: {})",
            self.factory.name(),
            id,
            open
        );
        if open {
            connection.open().await?;
        }
        Ok(connection)
    }

    /// Shorthand for `create(true)`
    pub async fn open_connection(&self) -> Result<Connection> {
        self.create(true).await
    }

    /// Dispose every live connection and mark the connector disposed. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let connections = std::mem::take(
            &mut *self
                .connections
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        let mut released = 0;
        for connection in connections.iter().filter_map(Weak::upgrade) {
            if !connection.is_disposed() {
                connection.dispose();
                released += 1;
            }
        }
        if released > 0 {
            warn!("Connector disposed with {} connection(s) still open", released);
        }
        debug!("{} connector disposed after {} connection(s)", self.factory.name(), self.count());
    }
}

impl fmt::Debug for DatabaseConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConnector")
            .field("factory", &self.factory)
            .field("count", &self.count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for DatabaseConnector {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use crate::fake::FakeDatabase;

    #[test]
    fn test_empty_connection_string_is_rejected() {
        let result = DatabaseConnector::new("  ", FakeDatabase::new().factory());
        assert!(matches!(
            result,
            Err(DatabaseError::Argument {
                name: "connection_string",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_create_respects_open_flag() {
        let connector = FakeDatabase::new().connector();

        let open = connector.create(true).await.unwrap();
        let closed = connector.create(false).await.unwrap();

        assert_eq!(open.state(), ConnectionState::Open);
        assert_eq!(closed.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_count_tracks_every_create() {
        let connector = FakeDatabase::new().connector();
        assert_eq!(connector.count(), 0);

        for _ in 0..3 {
            let connection = connector.create(false).await.unwrap();
            drop(connection);
        }
        let _kept = connector.create(true).await.unwrap();

        assert_eq!(connector.count(), 4);
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_final() {
        let connector = FakeDatabase::new().connector();
        let connection = connector.create(true).await.unwrap();

        connector.dispose();
        connector.dispose();

        assert!(connector.is_disposed());
        assert!(connection.is_disposed());
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(matches!(
            connector.create(true).await,
            Err(DatabaseError::Disposed(_))
        ));
        assert!(matches!(connection.open().await, Err(DatabaseError::Disposed(_))));
    }

    #[tokio::test]
    async fn test_dropping_a_connection_releases_it() {
        let database = FakeDatabase::new();
        let connector = database.connector();

        let connection = connector.create(true).await.unwrap();
        assert_eq!(database.open_connections(), 1);
        drop(connection);
        assert_eq!(database.open_connections(), 0);
    }
}
