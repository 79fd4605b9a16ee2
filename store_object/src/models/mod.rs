//! Persisted data shapes

pub mod collection;
pub mod dictionary;
pub mod entity;
pub mod warehouse_type;

pub use collection::{Aliased, AliasedCollection};
pub use dictionary::{DictionaryItems, DictionaryValue, WarehouseDictionary};
pub use entity::{Entity, WarehouseEntity};
pub use warehouse_type::{AttributeCollection, WarehouseAttribute, WarehouseType};
