//! PostgreSQL stores
//!
//! Each operation calls one function of the warehouse schema created by
//! `scripts/build.sql`. Items are sent as a `jsonb` parameter and come back
//! as a single JSON column, which is bound to the model type.

mod dictionary;
mod entity;
mod types;

pub use dictionary::PostgresDictionaryStore;
pub use entity::PostgresEntityStore;
pub use types::PostgresTypeStore;

use crate::errors::{StoreError, StoreResult};
use crate::id_type::EntityKey;
use crate::result::WarehouseResult;
use config::WarehouseOptions;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use warehouse_database::{debug_log, DatabaseConnector, DbType, Parameter};

/// Connector, options and disposed flag shared by the PostgreSQL stores
#[derive(Debug)]
pub(crate) struct StoreContext {
    name: &'static str,
    connector: Arc<DatabaseConnector>,
    options: WarehouseOptions,
    disposed: AtomicBool,
}

impl StoreContext {
    pub(crate) fn new(name: &'static str, connector: Arc<DatabaseConnector>, options: WarehouseOptions) -> Self {
        Self {
            name,
            connector,
            options,
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn options(&self) -> &WarehouseOptions {
        &self.options
    }

    /// Fail when the store or its connector has been disposed
    pub(crate) fn ensure_live(&self) -> StoreResult<()> {
        if self.is_disposed() || self.connector.is_disposed() {
            return Err(StoreError::Disposed(self.name));
        }
        Ok(())
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// The connector is shared with other stores and stays alive
    pub(crate) fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            debug!("{} disposed", self.name);
        }
    }

    /// Call `procedure` and bind its JSON result; `None` when it returned nothing
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        procedure: &str,
        parameters: Vec<Parameter>,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<T>> {
        let connection = self.connector.open_connection().await?;
        let mut query = connection.stored_procedure(&self.options.procedure(procedure))?;
        for parameter in parameters {
            query.push_parameter(parameter)?;
        }
        query
            .timeout(self.options.command_timeout_seconds)
            .cancellation(cancel);

        let mut reader = query.execute().await?;
        let item = reader.build()?;
        debug_log!("[{}] {} returned {}", self.name, procedure, if item.is_some() { "a value" } else { "nothing" });
        Ok(item)
    }

    /// Call a procedure that returns no rows
    pub(crate) async fn run(
        &self,
        procedure: &str,
        parameters: Vec<Parameter>,
        cancel: &CancellationToken,
    ) -> StoreResult<u64> {
        let connection = self.connector.open_connection().await?;
        let mut query = connection.stored_procedure(&self.options.procedure(procedure))?;
        for parameter in parameters {
            query.push_parameter(parameter)?;
        }
        query
            .timeout(self.options.command_timeout_seconds)
            .cancellation(cancel);

        Ok(query.run().await?)
    }
}

/// Turn a failure into a failed result carrying it
pub(crate) fn capture<T>(operation: &'static str, outcome: StoreResult<WarehouseResult<T>>) -> WarehouseResult<T> {
    outcome.unwrap_or_else(|error| {
        warn!("[{}] {}", operation, error);
        WarehouseResult::from_error(error)
    })
}

pub(crate) fn require(name: &'static str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::ArgumentNull(name));
    }
    Ok(())
}

pub(crate) fn key_parameter<K: EntityKey>(name: &str, key: &K) -> StoreResult<Parameter> {
    Ok(Parameter::new(name, serde_json::to_value(key)?).with_db_type(K::DB_TYPE))
}

pub(crate) fn json_parameter<T: Serialize + ?Sized>(name: &str, item: &T) -> StoreResult<Parameter> {
    Ok(Parameter::new(name, serde_json::to_value(item)?).with_db_type(DbType::Jsonb))
}

pub(crate) fn text_parameter(name: &str, value: &str) -> Parameter {
    Parameter::new(name, serde_json::Value::String(value.to_string())).with_db_type(DbType::String)
}
