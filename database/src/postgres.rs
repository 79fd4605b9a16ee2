//! PostgreSQL driver built on sqlx

use crate::command::{Command, CommandKind, DbType, Parameter};
use crate::connection::DriverConnection;
use crate::connector::ConnectionFactory;
use crate::errors::{DatabaseError, Result};
use crate::reader::{coerce_value, RowSet};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Column, Connection as _, Row, TypeInfo};
use std::str::FromStr;
use type_mapping::{is_array_type, pg_type_to_column_kind, ColumnKind};
use uuid::Uuid;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Creates [`PostgresConnection`]s from a libpq-style URL or key/value string
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnectionFactory;

impl ConnectionFactory for PostgresConnectionFactory {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn initialize_connection(&self, connection_string: &str) -> Result<Box<dyn DriverConnection>> {
        let options = PgConnectOptions::from_str(connection_string)?;
        Ok(Box::new(PostgresConnection {
            options,
            connection: None,
        }))
    }
}

/// One physical PostgreSQL connection
pub struct PostgresConnection {
    options: PgConnectOptions,
    connection: Option<PgConnection>,
}

impl PostgresConnection {
    fn connection(&mut self) -> Result<&mut PgConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| DatabaseError::Driver("connection is not open".to_string()))
    }
}

#[async_trait]
impl DriverConnection for PostgresConnection {
    async fn open(&mut self) -> Result<()> {
        // A broken connection is replaced rather than reused
        self.connection = None;
        self.connection = Some(PgConnection::connect_with(&self.options).await?);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.close().await?;
        }
        Ok(())
    }

    async fn execute(&mut self, command: &Command) -> Result<u64> {
        let sql = command.to_sql()?;
        if command.kind == CommandKind::Text && command.bound_parameters().next().is_none() {
            // Simple protocol, so a script may hold several statements
            let connection: &mut PgConnection = self.connection()?;
            let result = sqlx::Executor::execute(&mut *connection, sqlx::raw_sql(&sql)).await?;
            return Ok(result.rows_affected());
        }
        let query = bind_parameters(sqlx::query(&sql), command)?;
        let result = query.execute(self.connection()?).await?;
        Ok(result.rows_affected())
    }

    async fn query(&mut self, command: &Command) -> Result<RowSet> {
        let sql = command.to_sql()?;
        let query = bind_parameters(sqlx::query(&sql), command)?;
        let rows = query.fetch_all(self.connection()?).await?;
        decode_rows(&rows)
    }
}

fn bind_parameters<'q>(mut query: PgQuery<'q>, command: &Command) -> Result<PgQuery<'q>> {
    for parameter in command.bound_parameters() {
        query = match parameter.db_type {
            Some(db_type) => bind_typed(query, parameter, db_type)?,
            None => bind_inferred(query, parameter.value.clone()),
        };
    }
    Ok(query)
}

fn typed<T: DeserializeOwned>(parameter: &Parameter) -> Result<Option<T>> {
    match &parameter.value {
        Value::Null => Ok(None),
        value => coerce_value(value).map(Some).map_err(|error| {
            DatabaseError::conversion(format!("parameter '{}': {}", parameter.name, error))
        }),
    }
}

fn bind_typed<'q>(query: PgQuery<'q>, parameter: &Parameter, db_type: DbType) -> Result<PgQuery<'q>> {
    Ok(match db_type {
        DbType::Boolean => query.bind(typed::<bool>(parameter)?),
        DbType::SmallInt => query.bind(typed::<i16>(parameter)?),
        DbType::Integer => query.bind(typed::<i32>(parameter)?),
        DbType::BigInt => query.bind(typed::<i64>(parameter)?),
        DbType::Double => query.bind(typed::<f64>(parameter)?),
        // Sent as text and cast server side
        DbType::Decimal => query.bind(text_of(&parameter.value)),
        DbType::String => query.bind(text_of(&parameter.value)),
        DbType::Uuid => query.bind(typed::<Uuid>(parameter)?),
        DbType::DateTime => query.bind(typed::<DateTime<Utc>>(parameter)?),
        DbType::Json | DbType::Jsonb => match &parameter.value {
            Value::Null => query.bind(Option::<sqlx::types::Json<Value>>::None),
            value => query.bind(sqlx::types::Json(value.clone())),
        },
    })
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn bind_inferred(query: PgQuery<'_>, value: Value) -> PgQuery<'_> {
    match value {
        Value::String(text) => {
            if let Ok(timestamp) = DateTime::parse_from_rfc3339(&text) {
                query.bind(timestamp.with_timezone(&Utc))
            } else if let Ok(uuid) = Uuid::parse_str(&text) {
                query.bind(uuid)
            } else {
                query.bind(text)
            }
        }
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                if i32::try_from(integer).is_ok() {
                    query.bind(integer as i32)
                } else {
                    query.bind(integer)
                }
            } else if let Some(float) = number.as_f64() {
                query.bind(float)
            } else {
                query.bind(number.to_string())
            }
        }
        Value::Bool(flag) => query.bind(flag),
        Value::Null => query.bind(Option::<String>::None),
        other => query.bind(sqlx::types::Json(other)),
    }
}

fn decode_rows(rows: &[PgRow]) -> Result<RowSet> {
    let Some(first) = rows.first() else {
        return Ok(RowSet::empty());
    };
    let columns = first
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    let mut decoded = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(row.len());
        for (ordinal, column) in row.columns().iter().enumerate() {
            values.push(decode_cell(row, ordinal, column.type_info().name())?);
        }
        decoded.push(values);
    }
    Ok(RowSet::new(columns, decoded))
}

fn decode_cell(row: &PgRow, ordinal: usize, type_name: &str) -> Result<Value> {
    fn json<T: serde::Serialize>(value: Option<T>) -> Result<Value> {
        Ok(match value {
            Some(value) => serde_json::to_value(value)?,
            None => Value::Null,
        })
    }

    if is_array_type(type_name) {
        return decode_array(row, ordinal, type_name);
    }

    match pg_type_to_column_kind(type_name) {
        ColumnKind::Text => json(row.try_get::<Option<String>, _>(ordinal)?),
        ColumnKind::Json => Ok(row.try_get::<Option<Value>, _>(ordinal)?.unwrap_or(Value::Null)),
        ColumnKind::Boolean => json(row.try_get::<Option<bool>, _>(ordinal)?),
        ColumnKind::SmallInt => json(row.try_get::<Option<i16>, _>(ordinal)?),
        ColumnKind::Integer => json(row.try_get::<Option<i32>, _>(ordinal)?),
        ColumnKind::BigInt => json(row.try_get::<Option<i64>, _>(ordinal)?),
        ColumnKind::Float => match row.try_get::<Option<f64>, _>(ordinal) {
            Ok(value) => json(value),
            Err(_) => json(row.try_get::<Option<f32>, _>(ordinal)?),
        },
        ColumnKind::Uuid => json(row.try_get::<Option<Uuid>, _>(ordinal)?),
        ColumnKind::Timestamp => json(row.try_get::<Option<NaiveDateTime>, _>(ordinal)?),
        ColumnKind::TimestampTz => json(row.try_get::<Option<DateTime<Utc>>, _>(ordinal)?),
        ColumnKind::Date => json(row.try_get::<Option<NaiveDate>, _>(ordinal)?),
        ColumnKind::Numeric | ColumnKind::Unsupported => Err(DatabaseError::conversion(format!(
            "column {} of type {} cannot be read; cast it to text",
            ordinal, type_name
        ))),
    }
}

fn decode_array(row: &PgRow, ordinal: usize, type_name: &str) -> Result<Value> {
    let element = type_name.trim_start_matches('_').trim_end_matches("[]");
    let value = match pg_type_to_column_kind(element) {
        ColumnKind::Text => serde_json::to_value(row.try_get::<Option<Vec<String>>, _>(ordinal)?)?,
        ColumnKind::SmallInt => serde_json::to_value(row.try_get::<Option<Vec<i16>>, _>(ordinal)?)?,
        ColumnKind::Integer => serde_json::to_value(row.try_get::<Option<Vec<i32>>, _>(ordinal)?)?,
        ColumnKind::BigInt => serde_json::to_value(row.try_get::<Option<Vec<i64>>, _>(ordinal)?)?,
        ColumnKind::Uuid => serde_json::to_value(row.try_get::<Option<Vec<Uuid>>, _>(ordinal)?)?,
        ColumnKind::Boolean => serde_json::to_value(row.try_get::<Option<Vec<bool>>, _>(ordinal)?)?,
        _ => {
            return Err(DatabaseError::conversion(format!(
                "array column {} of type {} cannot be read",
                ordinal, type_name
            )))
        }
    };
    Ok(value)
}

impl crate::connector::DatabaseConnector {
    /// Run a trivial query on a fresh connection
    pub async fn ping(&self) -> Result<()> {
        let connection = self.create(true).await?;
        connection.query("SELECT 1")?.run_scalar::<i32>().await?;
        Ok(())
    }
}
