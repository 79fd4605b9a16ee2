//! Unified type mapping between warehouse value kinds and PostgreSQL
//! This crate provides the mapping logic shared by the database driver and the stores

pub mod sql;
pub mod types;
pub mod validate;

pub use sql::{attribute_type_to_pg_type, pg_type_to_column_kind, is_array_type};
pub use types::{AttributeType, ColumnKind, UnknownAttributeType};
pub use validate::{parse_default_value, validate_default_value, DefaultValueError};
