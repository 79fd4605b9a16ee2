//! Fluent command builder bound to one connection
//!
//! A builder is owned by a single caller while it is being configured;
//! configuration methods return `&mut Self` so calls can be chained.

use crate::command::{Command, CommandKind, DbType, Parameter, ParameterDirection};
use crate::connection::Connection;
use crate::errors::{DatabaseError, Result};
use crate::reader::{coerce_value, RowReader, Rows};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct QueryBuilder<'c> {
    connection: &'c Connection,
    command: Command,
    cancellation: CancellationToken,
}

impl<'c> QueryBuilder<'c> {
    pub fn new(connection: &'c Connection, text: &str, kind: CommandKind) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(DatabaseError::ArgumentNull("text"));
        }
        if connection.is_disposed() {
            return Err(DatabaseError::Disposed("Connection"));
        }

        let mut command = Command::new(text, kind);
        command.timeout = connection.default_timeout();
        Ok(Self {
            connection,
            command,
            cancellation: CancellationToken::new(),
        })
    }

    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.command.parameter(name)
    }

    /// Append an input parameter whose database type follows its value
    pub fn add_parameter<V: Serialize>(&mut self, name: &str, value: V) -> Result<&mut Self> {
        let value = serde_json::to_value(value)?;
        self.push_parameter(Parameter::new(name, value))
    }

    /// Append a parameter with an explicit type, size and direction
    pub fn add_typed_parameter<V: Serialize>(
        &mut self,
        name: &str,
        value: V,
        db_type: DbType,
        size: Option<usize>,
        direction: ParameterDirection,
    ) -> Result<&mut Self> {
        let mut parameter = Parameter::new(name, serde_json::to_value(value)?)
            .with_db_type(db_type)
            .with_direction(direction);
        parameter.size = size;
        self.push_parameter(parameter)
    }

    pub fn push_parameter(&mut self, parameter: Parameter) -> Result<&mut Self> {
        if parameter.name.trim().is_empty() {
            return Err(DatabaseError::ArgumentNull("name"));
        }
        self.command.push(parameter);
        Ok(self)
    }

    /// Add one parameter per field of `bag`, named after the field.
    ///
    /// `bag` must serialize to a map (a struct or a map type).
    pub fn parameters<B: Serialize + ?Sized>(&mut self, bag: &B) -> Result<&mut Self> {
        match serde_json::to_value(bag)? {
            Value::Object(fields) => {
                for (name, value) in fields {
                    self.push_parameter(Parameter::new(name, value))?;
                }
                Ok(self)
            }
            other => Err(DatabaseError::argument(
                "bag",
                format!("expected a map of parameters, got {}", other),
            )),
        }
    }

    /// Command timeout in seconds; `0` waits indefinitely
    pub fn timeout(&mut self, seconds: u64) -> &mut Self {
        self.command.timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
        self
    }

    /// Abort the command when `token` is cancelled
    pub fn cancellation(&mut self, token: &CancellationToken) -> &mut Self {
        self.cancellation = token.clone();
        self
    }

    /// Execute without reading rows; returns the number of rows affected
    pub async fn run(&self) -> Result<u64> {
        debug!("Running command: {}", self.command.text);
        self.connection.execute(&self.command, &self.cancellation).await
    }

    /// First column of the first row converted to `T`; `None` for no rows or NULL
    pub async fn run_scalar<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let mut reader = self.execute().await?;
        if !reader.read() {
            return Ok(None);
        }
        match reader.get(0) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => coerce_value(value).map(Some),
        }
    }

    /// Execute and return a reader over the result rows
    pub async fn execute(&self) -> Result<RowReader> {
        debug!("Executing command: {}", self.command.text);
        let rows = self.connection.fetch(&self.command, &self.cancellation).await?;
        Ok(RowReader::new(rows))
    }

    /// Execute and bind each row to `T`
    pub async fn execute_as<T: DeserializeOwned>(&self) -> Result<Rows<T>> {
        Ok(self.execute().await?.into_rows())
    }
}

impl std::fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("connection", &self.connection.id())
            .field("command", &self.command)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDatabase;
    use crate::reader::RowSet;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let connector = FakeDatabase::new().connector();
        let connection = connector.create(false).await.unwrap();

        assert!(matches!(
            QueryBuilder::new(&connection, "", CommandKind::Text),
            Err(DatabaseError::ArgumentNull("text"))
        ));
        assert!(matches!(
            connection.stored_procedure(" "),
            Err(DatabaseError::ArgumentNull("text"))
        ));
    }

    #[tokio::test]
    async fn test_disposed_connection_is_rejected() {
        let connector = FakeDatabase::new().connector();
        let connection = connector.create(false).await.unwrap();
        connection.dispose();

        assert!(matches!(
            connection.query("SELECT 1"),
            Err(DatabaseError::Disposed(_))
        ));
    }

    #[tokio::test]
    async fn test_fluent_methods_return_the_same_builder() {
        let connector = FakeDatabase::new().connector();
        let connection = connector.create(false).await.unwrap();
        let mut builder = connection.query("SELECT 1").unwrap();
        let original: *const QueryBuilder<'_> = &builder;

        let chained = builder.add_parameter("alias", "AIRCRAFT").unwrap();
        assert!(std::ptr::eq(original, chained));
        let chained = chained.timeout(5);
        assert!(std::ptr::eq(original, chained));
        let token = CancellationToken::new();
        assert!(std::ptr::eq(original, builder.cancellation(&token)));
    }

    #[tokio::test]
    async fn test_parameters_are_retrievable_by_name() {
        let connector = FakeDatabase::new().connector();
        let connection = connector.create(false).await.unwrap();
        let mut builder = connection.stored_procedure("warehouse.find_entity_type_by_alias").unwrap();

        builder
            .add_typed_parameter("alias", "AIRCRAFT", DbType::String, Some(64), ParameterDirection::Input)
            .unwrap()
            .add_parameter("key", 7)
            .unwrap();

        let alias = builder.parameter("alias").unwrap();
        assert_eq!(alias.value, json!("AIRCRAFT"));
        assert_eq!(alias.db_type, Some(DbType::String));
        assert_eq!(alias.size, Some(64));
        assert_eq!(alias.direction, ParameterDirection::Input);

        let key = builder.parameter("key").unwrap();
        assert_eq!(key.value, json!(7));
        assert_eq!(key.db_type, None);
        assert_eq!(key.effective_db_type(), DbType::BigInt);
    }

    #[tokio::test]
    async fn test_empty_parameter_name_is_rejected() {
        let connector = FakeDatabase::new().connector();
        let connection = connector.create(false).await.unwrap();
        let mut builder = connection.query("SELECT 1").unwrap();

        assert!(matches!(
            builder.add_parameter("", 1),
            Err(DatabaseError::ArgumentNull("name"))
        ));
    }

    #[tokio::test]
    async fn test_parameter_bag() {
        let connector = FakeDatabase::new().connector();
        let connection = connector.create(false).await.unwrap();
        let mut builder = connection.query("SELECT 1").unwrap();

        let mut bag = BTreeMap::new();
        bag.insert("alias", json!("AIRCRAFT"));
        bag.insert("removed", json!(false));
        builder.parameters(&bag).unwrap();

        assert_eq!(builder.command().parameters().len(), 2);
        assert_eq!(builder.parameter("removed").unwrap().value, json!(false));
        assert!(builder.parameters(&vec![1, 2]).is_err());
    }

    #[tokio::test]
    async fn test_timeout_zero_disables_the_limit() {
        let connector = FakeDatabase::new().connector().with_command_timeout(Duration::from_secs(30));
        let connection = connector.create(false).await.unwrap();
        let mut builder = connection.query("SELECT 1").unwrap();

        assert_eq!(builder.command().timeout, Some(Duration::from_secs(30)));
        builder.timeout(0);
        assert_eq!(builder.command().timeout, None);
    }

    #[tokio::test]
    async fn test_execution_opens_a_closed_connection() {
        let database = FakeDatabase::new();
        database.on("SELECT count(*) FROM warehouse.entity_type", |_| {
            Ok(RowSet::scalar("count", json!(3)))
        });
        let connector = database.connector();
        let connection = connector.create(false).await.unwrap();

        let count: Option<i64> = connection
            .query("SELECT count(*) FROM warehouse.entity_type")
            .unwrap()
            .run_scalar()
            .await
            .unwrap();

        assert_eq!(count, Some(3));
        assert_eq!(connection.state(), crate::ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_cancelled_command_marks_connection_broken() {
        let database = FakeDatabase::new();
        let connector = database.connector();
        let connection = connector.create(true).await.unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let mut builder = connection.query("SELECT pg_sleep(10)").unwrap();
        let result = builder.cancellation(&token).run().await;

        assert!(matches!(result, Err(DatabaseError::Cancelled)));
        assert_eq!(connection.state(), crate::ConnectionState::Broken);
    }
}
