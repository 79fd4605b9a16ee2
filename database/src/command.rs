//! Command model
//!
//! A `Command` is the driver-independent description of one statement: its
//! text, whether the text is plain SQL or a stored procedure name, its
//! parameters and its timeout.

use crate::errors::Result;
use crate::validation::{validate_parameter_name, validate_qualified_name};
use serde_json::Value;
use std::fmt::Write;
use std::time::Duration;

/// How the command text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    /// The text is a SQL statement
    #[default]
    Text,
    /// The text is the (optionally schema-qualified) name of a stored procedure
    StoredProcedure,
}

/// Database type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Double,
    Decimal,
    String,
    Uuid,
    DateTime,
    Json,
    Jsonb,
}

impl DbType {
    /// Cast appended to the placeholder when rendering stored procedure calls
    pub fn pg_cast(self) -> &'static str {
        match self {
            DbType::Boolean => "::boolean",
            DbType::SmallInt => "::smallint",
            DbType::Integer => "::integer",
            DbType::BigInt => "::bigint",
            DbType::Double => "::double precision",
            DbType::Decimal => "::numeric",
            DbType::String => "::text",
            DbType::Uuid => "::uuid",
            DbType::DateTime => "::timestamptz",
            DbType::Json => "::json",
            DbType::Jsonb => "::jsonb",
        }
    }

    /// Type used when the caller does not give one
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => DbType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => DbType::BigInt,
            Value::Number(_) => DbType::Double,
            Value::Array(_) | Value::Object(_) => DbType::Jsonb,
            Value::String(_) | Value::Null => DbType::String,
        }
    }
}

/// Direction of a parameter relative to the command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl ParameterDirection {
    /// Whether the parameter carries a value into the command
    pub fn is_input(self) -> bool {
        matches!(self, ParameterDirection::Input | ParameterDirection::InputOutput)
    }
}

/// One named command parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    pub db_type: Option<DbType>,
    pub size: Option<usize>,
    pub direction: ParameterDirection,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            db_type: None,
            size: None,
            direction: ParameterDirection::Input,
        }
    }

    pub fn with_db_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Declared type, or the type inferred from the value
    pub fn effective_db_type(&self) -> DbType {
        self.db_type.unwrap_or_else(|| DbType::infer(&self.value))
    }
}

/// A parameterized command
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub text: String,
    pub kind: CommandKind,
    pub timeout: Option<Duration>,
    parameters: Vec<Parameter>,
}

impl Command {
    pub fn new(text: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            text: text.into(),
            kind,
            timeout: None,
            parameters: Vec::new(),
        }
    }

    /// All parameters in insertion order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// First parameter with the given name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub(crate) fn push(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    /// Parameters that are bound as placeholders, in placeholder order
    pub fn bound_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.direction.is_input())
    }

    /// Render the SQL sent to PostgreSQL.
    ///
    /// Stored procedures are called as set-returning functions with named
    /// notation: `SELECT * FROM schema.proc(name => $1, ...)`.
    pub fn to_sql(&self) -> Result<String> {
        match self.kind {
            CommandKind::Text => Ok(self.text.clone()),
            CommandKind::StoredProcedure => {
                validate_qualified_name(&self.text)?;
                let mut sql = String::with_capacity(self.text.len() + 32);
                let _ = write!(sql, "SELECT * FROM {}(", self.text);
                for (index, parameter) in self.bound_parameters().enumerate() {
                    validate_parameter_name(&parameter.name)?;
                    if index > 0 {
                        sql.push_str(", ");
                    }
                    let cast = parameter.db_type.map(DbType::pg_cast).unwrap_or_default();
                    let _ = write!(sql, "{} => ${}{}", parameter.name, index + 1, cast);
                }
                sql.push(')');
                Ok(sql)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_command_is_sent_verbatim() {
        let command = Command::new("SELECT 1", CommandKind::Text);
        assert_eq!(command.to_sql().unwrap(), "SELECT 1");
    }

    #[test]
    fn test_stored_procedure_uses_named_notation() {
        let mut command = Command::new("warehouse.create_or_update_entity_type", CommandKind::StoredProcedure);
        command.push(Parameter::new("item", json!({"alias": "AIRCRAFT"})).with_db_type(DbType::Jsonb));
        command.push(Parameter::new("key", json!(3)));

        assert_eq!(
            command.to_sql().unwrap(),
            "SELECT * FROM warehouse.create_or_update_entity_type(item => $1::jsonb, key => $2)"
        );
    }

    #[test]
    fn test_output_parameters_are_not_bound() {
        let mut command = Command::new("warehouse.get_all_entity_types", CommandKind::StoredProcedure);
        command.push(Parameter::new("total", Value::Null).with_direction(ParameterDirection::Output));

        assert_eq!(command.bound_parameters().count(), 0);
        assert_eq!(command.to_sql().unwrap(), "SELECT * FROM warehouse.get_all_entity_types()");
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let command = Command::new("warehouse.proc(); DROP", CommandKind::StoredProcedure);
        assert!(command.to_sql().is_err());

        let mut command = Command::new("warehouse.proc", CommandKind::StoredProcedure);
        command.push(Parameter::new("a b", json!(1)));
        assert!(command.to_sql().is_err());
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(DbType::infer(&json!(true)), DbType::Boolean);
        assert_eq!(DbType::infer(&json!(7)), DbType::BigInt);
        assert_eq!(DbType::infer(&json!(7.5)), DbType::Double);
        assert_eq!(DbType::infer(&json!({"a": 1})), DbType::Jsonb);
        assert_eq!(DbType::infer(&json!("x")), DbType::String);
    }
}
