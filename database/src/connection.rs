//! Connection lifecycle
//!
//! A [`Connection`] is the caller-facing handle to one physical connection
//! issued by a [`DatabaseConnector`](crate::DatabaseConnector). Dropping the
//! handle disposes the physical connection.

use crate::command::{Command, CommandKind};
use crate::errors::{DatabaseError, Result};
use crate::query_builder::QueryBuilder;
use crate::reader::RowSet;
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Observable state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
    /// The last command was interrupted or lost its transport; the next
    /// command reopens the connection
    Broken,
}

/// Technology-specific physical connection
#[async_trait]
pub trait DriverConnection: Send {
    async fn open(&mut self) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
    /// Execute a command that returns no rows
    async fn execute(&mut self, command: &Command) -> Result<u64>;
    /// Execute a command and materialize its rows
    async fn query(&mut self, command: &Command) -> Result<RowSet>;
}

/// Shared state of one issued connection
pub(crate) struct ConnectionInner {
    id: u64,
    state: Mutex<ConnectionState>,
    driver: tokio::sync::Mutex<Option<Box<dyn DriverConnection>>>,
    disposed: AtomicBool,
}

impl ConnectionInner {
    pub(crate) fn new(id: u64, driver: Box<dyn DriverConnection>) -> Self {
        Self {
            id,
            state: Mutex::new(ConnectionState::Closed),
            driver: tokio::sync::Mutex::new(Some(driver)),
            disposed: AtomicBool::new(false),
        }
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Release the physical connection. Idempotent.
    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // A command still holding the driver releases it when it completes
        if let Ok(mut driver) = self.driver.try_lock() {
            driver.take();
        }
        self.set_state(ConnectionState::Closed);
        debug!("Connection {} disposed", self.id);
    }
}

/// Handle to one connection issued by a connector
pub struct Connection {
    inner: std::sync::Arc<ConnectionInner>,
    default_timeout: Option<Duration>,
}

impl Connection {
    pub(crate) fn new(
        inner: std::sync::Arc<ConnectionInner>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner,
            default_timeout,
        }
    }

    /// Sequence number assigned by the issuing connector
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Timeout applied to commands that do not set their own
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    fn ensure_not_disposed(&self) -> Result<()> {
        if self.inner.is_disposed() {
            return Err(DatabaseError::Disposed("Connection"));
        }
        Ok(())
    }

    /// Open the connection. Opening an open connection is a no-op.
    pub async fn open(&self) -> Result<()> {
        self.ensure_not_disposed()?;
        let mut driver = self.inner.driver.lock().await;
        let driver = driver.as_mut().ok_or(DatabaseError::Disposed("Connection"))?;
        if self.inner.state() != ConnectionState::Open {
            driver.open().await?;
            self.inner.set_state(ConnectionState::Open);
            debug!("Connection {} opened", self.inner.id);
        }
        Ok(())
    }

    /// Close the connection, keeping it reusable
    pub async fn close(&self) -> Result<()> {
        self.ensure_not_disposed()?;
        let mut driver = self.inner.driver.lock().await;
        let driver = driver.as_mut().ok_or(DatabaseError::Disposed("Connection"))?;
        if self.inner.state() != ConnectionState::Closed {
            driver.close().await?;
            self.inner.set_state(ConnectionState::Closed);
        }
        Ok(())
    }

    /// Release the physical connection. Idempotent; also runs on drop.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Start a plain SQL command
    pub fn query(&self, text: &str) -> Result<QueryBuilder<'_>> {
        QueryBuilder::new(self, text, CommandKind::Text)
    }

    /// Start a stored procedure call
    pub fn stored_procedure(&self, name: &str) -> Result<QueryBuilder<'_>> {
        QueryBuilder::new(self, name, CommandKind::StoredProcedure)
    }

    pub(crate) async fn execute(
        &self,
        command: &Command,
        cancellation: &CancellationToken,
    ) -> Result<u64> {
        self.ensure_not_disposed()?;
        let mut guard = self.inner.driver.lock().await;
        let driver = guard.as_mut().ok_or(DatabaseError::Disposed("Connection"))?;
        if self.inner.state() != ConnectionState::Open {
            driver.open().await?;
            self.inner.set_state(ConnectionState::Open);
        }
        debug_log!("[CONNECTION {}] execute: {}", self.inner.id, command.text);
        trace_log!("[CONNECTION {}] parameters: {:?}", self.inner.id, command.parameters());
        let result = bounded(command.timeout, cancellation, driver.execute(command)).await;
        self.track_failure(&result);
        result
    }

    pub(crate) async fn fetch(
        &self,
        command: &Command,
        cancellation: &CancellationToken,
    ) -> Result<RowSet> {
        self.ensure_not_disposed()?;
        let mut guard = self.inner.driver.lock().await;
        let driver = guard.as_mut().ok_or(DatabaseError::Disposed("Connection"))?;
        if self.inner.state() != ConnectionState::Open {
            driver.open().await?;
            self.inner.set_state(ConnectionState::Open);
        }
        debug_log!("[CONNECTION {}] query: {}", self.inner.id, command.text);
        trace_log!("[CONNECTION {}] parameters: {:?}", self.inner.id, command.parameters());
        let result = bounded(command.timeout, cancellation, driver.query(command)).await;
        self.track_failure(&result);
        result
    }

    fn track_failure<T>(&self, result: &Result<T>) {
        if let Err(
            DatabaseError::Cancelled | DatabaseError::Timeout(_) | DatabaseError::Sqlx(sqlx::Error::Io(_)),
        ) = result
        {
            self.inner.set_state(ConnectionState::Broken);
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state())
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

/// Run `work` under an optional timeout, aborting when `cancellation` fires
async fn bounded<T>(
    timeout: Option<Duration>,
    cancellation: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    let limited = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| DatabaseError::Timeout(limit))?,
            None => work.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(DatabaseError::Cancelled),
        result = limited => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_times_out() {
        let token = CancellationToken::new();
        let result: Result<()> = bounded(Some(Duration::from_millis(10)), &token, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(DatabaseError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_bounded_observes_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<()> = bounded(None, &token, std::future::pending()).await;

        assert!(matches!(result, Err(DatabaseError::Cancelled)));
    }

    #[tokio::test]
    async fn test_bounded_passes_results_through() {
        let token = CancellationToken::new();
        let result = bounded(Some(Duration::from_secs(1)), &token, async { Ok(7u64) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[cfg(feature = "debug-logging")]
    #[derive(Clone)]
    struct SharedWriter(std::sync::Arc<Mutex<Vec<u8>>>);

    #[cfg(feature = "debug-logging")]
    impl std::io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(feature = "debug-logging")]
    #[tokio::test]
    async fn test_debug_logging_reports_commands() {
        let output = SharedWriter(Default::default());
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let database = crate::fake::FakeDatabase::new();
        let connection = database.connector().open_connection().await.unwrap();
        connection
            .query("SELECT 1")
            .unwrap()
            .add_parameter("code", "773")
            .unwrap()
            .run()
            .await
            .unwrap();

        let logged = String::from_utf8(output.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("execute: SELECT 1"));
        assert!(logged.contains("parameters: ["));
    }
}
