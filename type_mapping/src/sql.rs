//! SQL type conversion utilities
//!
//! This module handles conversion between warehouse value kinds
//! and their PostgreSQL equivalents.

use crate::types::{AttributeType, ColumnKind};

/// Map an attribute kind to the PostgreSQL column type used to store its values
pub fn attribute_type_to_pg_type(kind: AttributeType) -> &'static str {
    match kind {
        AttributeType::Boolean => "BOOLEAN",
        AttributeType::Integer => "BIGINT",
        AttributeType::Decimal => "NUMERIC",
        AttributeType::Money => "NUMERIC(19,4)",
        AttributeType::String => "VARCHAR(255)",
        AttributeType::Text => "TEXT",
        AttributeType::DateTime => "TIMESTAMP WITH TIME ZONE",
        AttributeType::Json => "JSONB",
        AttributeType::Dictionary => "INTEGER",
        AttributeType::DictionarySet => "INTEGER[]",
        AttributeType::Entity => "UUID",
        AttributeType::EntitySet => "UUID[]",
    }
}

/// Map a PostgreSQL type name (as reported by the driver) to the shape it is decoded into
pub fn pg_type_to_column_kind(pg_type: &str) -> ColumnKind {
    // Normalize type string for consistent matching
    let normalized = pg_type.trim().to_ascii_uppercase();
    match normalized.as_str() {
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => ColumnKind::Text,
        "JSON" | "JSONB" => ColumnKind::Json,
        "BOOL" | "BOOLEAN" => ColumnKind::Boolean,
        "INT2" | "SMALLINT" => ColumnKind::SmallInt,
        "INT4" | "INT" | "INTEGER" => ColumnKind::Integer,
        "INT8" | "BIGINT" => ColumnKind::BigInt,
        "FLOAT4" | "FLOAT8" | "REAL" | "DOUBLE PRECISION" => ColumnKind::Float,
        "NUMERIC" | "DECIMAL" | "MONEY" => ColumnKind::Numeric,
        "UUID" => ColumnKind::Uuid,
        "TIMESTAMP" => ColumnKind::Timestamp,
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => ColumnKind::TimestampTz,
        "DATE" => ColumnKind::Date,
        _ => ColumnKind::Unsupported,
    }
}

/// Check if a PostgreSQL type name denotes an array
pub fn is_array_type(pg_type: &str) -> bool {
    let trimmed = pg_type.trim();
    trimmed.ends_with("[]") || trimmed.starts_with('_')
}
