//! Convenience re-exports for common store-object usage

// Results and pagination
pub use crate::pagination::WarehousePagination;
pub use crate::result::{WarehouseError, WarehouseResult};

// Error types
pub use crate::errors::{StoreError, StoreResult};

// Keys and models
pub use crate::id_type::{EntityKey, UniversalId};
pub use crate::models::{
    Aliased, AttributeCollection, DictionaryValue, Entity, WarehouseAttribute, WarehouseDictionary,
    WarehouseEntity, WarehouseType,
};

// Store contracts and PostgreSQL stores
pub use crate::postgres::{PostgresDictionaryStore, PostgresEntityStore, PostgresTypeStore};
pub use crate::traits::{DictionaryOf, DictionaryStore, EntityStore, TypeOf, TypeStore};

// Error descriptions
pub use crate::describer::{DefaultErrorDescriber, ErrorDescriber};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use tokio_util::sync::CancellationToken;
pub use type_mapping::AttributeType;
pub use uuid::Uuid;
