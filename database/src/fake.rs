//! Scripted in-memory driver for tests
//!
//! Handlers are registered per command text and receive the built command;
//! every executed command is recorded. Commands without a handler return no
//! rows.

use crate::command::Command;
use crate::connection::DriverConnection;
use crate::connector::{ConnectionFactory, DatabaseConnector};
use crate::errors::{DatabaseError, Result};
use crate::reader::RowSet;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type Handler = Arc<dyn Fn(&Command) -> Result<RowSet> + Send + Sync>;

#[derive(Default)]
struct FakeState {
    handlers: Mutex<HashMap<String, Handler>>,
    commands: Mutex<Vec<Command>>,
    open_connections: AtomicUsize,
    refuse_connections: AtomicBool,
}

/// Shared script and command log for fake connections
#[derive(Clone, Default)]
pub struct FakeDatabase {
    state: Arc<FakeState>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose text equals `text`
    pub fn on<F>(&self, text: &str, handler: F) -> &Self
    where
        F: Fn(&Command) -> Result<RowSet> + Send + Sync + 'static,
    {
        self.state
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(text.to_string(), Arc::new(handler));
        self
    }

    /// Fail commands whose text equals `text` with a driver error
    pub fn fail(&self, text: &str, message: &str) -> &Self {
        let message = message.to_string();
        self.on(text, move |_| Err(DatabaseError::Driver(message.clone())))
    }

    /// Make opening a connection fail
    pub fn refuse_connections(&self, refuse: bool) {
        self.state.refuse_connections.store(refuse, Ordering::SeqCst);
    }

    /// Commands executed so far, in order
    pub fn commands(&self) -> Vec<Command> {
        self.state
            .commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of times a command with this text ran
    pub fn calls(&self, text: &str) -> usize {
        self.commands()
            .iter()
            .filter(|command| command.text == text)
            .count()
    }

    /// Connections currently open and not yet released
    pub fn open_connections(&self) -> usize {
        self.state.open_connections.load(Ordering::SeqCst)
    }

    pub fn factory(&self) -> FakeConnectionFactory {
        FakeConnectionFactory {
            state: self.state.clone(),
        }
    }

    pub fn connector(&self) -> DatabaseConnector {
        // The factory never fails on a non-empty connection string
        match DatabaseConnector::new("fake://warehouse", self.factory()) {
            Ok(connector) => connector,
            Err(error) => panic!("fake connector: {}", error),
        }
    }

    fn dispatch(&self, command: &Command) -> Result<RowSet> {
        self.state
            .commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command.clone());
        let handler = self
            .state
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&command.text)
            .cloned();
        match handler {
            Some(handler) => handler(command),
            None => Ok(RowSet::empty()),
        }
    }
}

impl fmt::Debug for FakeDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeDatabase")
            .field("open_connections", &self.open_connections())
            .finish()
    }
}

pub struct FakeConnectionFactory {
    state: Arc<FakeState>,
}

impl fmt::Debug for FakeConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FakeConnectionFactory")
    }
}

impl ConnectionFactory for FakeConnectionFactory {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn initialize_connection(&self, _connection_string: &str) -> Result<Box<dyn DriverConnection>> {
        Ok(Box::new(FakeConnection {
            database: FakeDatabase {
                state: self.state.clone(),
            },
            open: false,
        }))
    }
}

struct FakeConnection {
    database: FakeDatabase,
    open: bool,
}

impl FakeConnection {
    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.database
                .state
                .open_connections
                .fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl DriverConnection for FakeConnection {
    async fn open(&mut self) -> Result<()> {
        if self.database.state.refuse_connections.load(Ordering::SeqCst) {
            return Err(DatabaseError::Driver("connection refused".to_string()));
        }
        if !self.open {
            self.open = true;
            self.database
                .state
                .open_connections
                .fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }

    async fn execute(&mut self, command: &Command) -> Result<u64> {
        command.to_sql()?;
        self.database
            .dispatch(command)
            .map(|rows| rows.rows_affected)
    }

    async fn query(&mut self, command: &Command) -> Result<RowSet> {
        command.to_sql()?;
        self.database.dispatch(command)
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.release();
    }
}
