//! Row materialization
//!
//! Drivers hand back a fully fetched [`RowSet`]. [`RowReader`] walks it
//! forward one row at a time and [`Rows`] binds each row to a typed value.
//! Both are consumed as they are read; reading again means running the
//! command again.

use crate::errors::{DatabaseError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// Rows returned by one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: u64,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let rows_affected = rows.len() as u64;
        Self {
            columns,
            rows,
            rows_affected,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// One column named `column`, one row per value
    pub fn from_values(column: &str, values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(
            vec![column.to_string()],
            values.into_iter().map(|value| vec![value]).collect(),
        )
    }

    /// A single cell
    pub fn scalar(column: &str, value: Value) -> Self {
        Self::from_values(column, [value])
    }

    pub fn with_rows_affected(mut self, rows_affected: u64) -> Self {
        self.rows_affected = rows_affected;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Forward-only cursor over a [`RowSet`]
#[derive(Debug)]
pub struct RowReader {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
    current: Option<Vec<Value>>,
    rows_affected: u64,
}

impl RowReader {
    pub fn new(set: RowSet) -> Self {
        Self {
            columns: set.columns,
            rows: set.rows.into_iter(),
            current: None,
            rows_affected: set.rows_affected,
        }
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Advance to the next row. Returns `false` once the rows are exhausted.
    pub fn read(&mut self) -> bool {
        self.current = self.rows.next();
        self.current.is_some()
    }

    /// Value of a column in the current row
    pub fn get(&self, ordinal: usize) -> Option<&Value> {
        self.current.as_ref().and_then(|row| row.get(ordinal))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let ordinal = self.columns.iter().position(|column| column == name)?;
        self.get(ordinal)
    }

    /// Text of a column in the current row; `None` for SQL NULL
    pub fn get_string(&self, ordinal: usize) -> Option<String> {
        match self.get(ordinal)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Concatenate column 0 of every remaining row
    pub fn read_string(&mut self) -> String {
        let mut payload = String::new();
        while self.read() {
            if let Some(text) = self.get_string(0) {
                payload.push_str(&text);
            }
        }
        payload
    }

    /// Decode the remaining rows as one JSON document.
    ///
    /// An empty payload yields `None`.
    pub fn build<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        let payload = self.read_string();
        if payload.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&payload)?))
    }

    /// Bind every remaining row to `T`
    pub fn into_rows<T: DeserializeOwned>(self) -> Rows<T> {
        Rows {
            reader: self,
            _marker: PhantomData,
        }
    }
}

/// Lazily binds rows to `T`, one item per row.
///
/// A single-column row is decoded from its value (a JSON text payload is
/// parsed first). A multi-column row is decoded from an object keyed by
/// column name. A row whose single value is NULL or empty yields `None`.
#[derive(Debug)]
pub struct Rows<T> {
    reader: RowReader,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Iterator for Rows<T> {
    type Item = Result<Option<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.reader.rows.next()?;
        Some(bind_row(&self.reader.columns, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.reader.rows.size_hint()
    }
}

fn bind_row<T: DeserializeOwned>(columns: &[String], mut row: Vec<Value>) -> Result<Option<T>> {
    if row.len() == 1 {
        return match row.pop().unwrap_or(Value::Null) {
            Value::Null => Ok(None),
            Value::String(text) if text.trim().is_empty() => Ok(None),
            value => coerce_value(&value).map(Some),
        };
    }

    let object: Map<String, Value> = columns.iter().cloned().zip(row).collect();
    Ok(Some(serde_json::from_value(Value::Object(object))?))
}

/// Convert a cell into `T`.
///
/// Text that holds JSON is parsed; scalars are also tried as their textual
/// form so that e.g. a numeric key can be read into a `String`.
pub fn coerce_value<T: DeserializeOwned>(value: &Value) -> Result<T> {
    if let Ok(typed) = serde_json::from_value::<T>(value.clone()) {
        return Ok(typed);
    }

    match value {
        Value::String(text) => serde_json::from_str(text).map_err(|error| {
            DatabaseError::conversion(format!("cannot convert '{}': {}", text, error))
        }),
        other => serde_json::from_value(Value::String(other.to_string())).map_err(|error| {
            DatabaseError::conversion(format!("cannot convert {}: {}", other, error))
        }),
    }
}
