//! Type mapping definitions
//!
//! This module defines the value kinds an attribute can hold and the
//! decoded shapes of PostgreSQL columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Value kind of a warehouse attribute.
///
/// The numeric codes are the wire representation stored by the database
/// (`attribute_type_id`) and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AttributeType {
    /// A boolean (true or false) value.
    Boolean = 1,
    /// An integer number.
    Integer = 2,
    /// A decimal floating-point number.
    Decimal = 3,
    /// A monetary amount.
    Money = 4,
    /// A short string.
    String = 5,
    /// A big text.
    Text = 6,
    /// An instant in time.
    DateTime = 7,
    /// Arbitrary JSON data.
    Json = 8,
    /// A reference to a dictionary item.
    Dictionary = 9,
    /// References to dictionary items.
    DictionarySet = 10,
    /// A reference to an entity instance.
    Entity = 11,
    /// References to entity instances.
    EntitySet = 12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown attribute type code: {0}")]
pub struct UnknownAttributeType(pub u8);

impl AttributeType {
    pub const ALL: [AttributeType; 12] = [
        AttributeType::Boolean,
        AttributeType::Integer,
        AttributeType::Decimal,
        AttributeType::Money,
        AttributeType::String,
        AttributeType::Text,
        AttributeType::DateTime,
        AttributeType::Json,
        AttributeType::Dictionary,
        AttributeType::DictionarySet,
        AttributeType::Entity,
        AttributeType::EntitySet,
    ];

    /// Wire code of the kind
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Kinds holding a reference to another warehouse object
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            AttributeType::Dictionary
                | AttributeType::DictionarySet
                | AttributeType::Entity
                | AttributeType::EntitySet
        )
    }

    /// Kinds holding a set of values
    pub fn is_set(self) -> bool {
        matches!(self, AttributeType::DictionarySet | AttributeType::EntitySet)
    }
}

impl TryFrom<u8> for AttributeType {
    type Error = UnknownAttributeType;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        AttributeType::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == code)
            .ok_or(UnknownAttributeType(code))
    }
}

impl From<AttributeType> for u8 {
    fn from(kind: AttributeType) -> Self {
        kind.code()
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Shape a PostgreSQL column is decoded into when rows are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Json,
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Numeric,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Unsupported,
}
