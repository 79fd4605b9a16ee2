//! Store contracts
//!
//! Managers talk to storage only through these traits. Every operation
//! returns a [`WarehouseResult`](crate::WarehouseResult): infrastructure
//! failures are captured into a failed result, while argument and disposed
//! errors are returned as `Err` before any I/O.

pub mod dictionary;
pub mod entity;
pub mod types;

pub use dictionary::{DictionaryOf, DictionaryStore};
pub use entity::EntityStore;
pub use types::{TypeOf, TypeStore};
