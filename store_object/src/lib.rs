//! Store Object - persistence model and store contracts for the warehouse
//!
//! This crate provides the result and pagination types returned by every
//! operation, the entity/type/dictionary models, the store traits consumed by
//! the managers and their PostgreSQL implementations.

pub mod describer;
pub mod errors;
pub mod id_type;
pub mod models;
pub mod pagination;
pub mod postgres;
pub mod prelude;
pub mod result;
pub mod traits;

pub use describer::{DefaultErrorDescriber, ErrorDescriber};
pub use errors::{PaginationError, StoreError, StoreResult};
pub use id_type::{assign_key, EntityKey, UniversalId};
pub use models::{
    Aliased, AliasedCollection, AttributeCollection, DictionaryItems, DictionaryValue, Entity, WarehouseAttribute,
    WarehouseDictionary, WarehouseEntity, WarehouseType,
};
pub use pagination::WarehousePagination;
pub use postgres::{PostgresDictionaryStore, PostgresEntityStore, PostgresTypeStore};
pub use result::{WarehouseError, WarehouseResult};
pub use traits::{DictionaryOf, DictionaryStore, EntityStore, TypeOf, TypeStore};
