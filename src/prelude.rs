//! Convenience re-exports for common Warehouse usage
//!
//! # Example
//!
//! ```rust
//! use warehouse::prelude::*;
//!
//! let options = WarehouseOptions::default().with_schema("inventory");
//! assert_eq!(options.procedure("find_entity_by_id"), "inventory.find_entity_by_id");
//! ```

// Core Warehouse components
pub use crate::core::Warehouse;
pub use crate::errors::ManagerError;
pub use crate::migration::DatabaseBuilder;

// Managers and validators
pub use crate::manager::{
    AliasValidator, AttributeDefaultValidator, DictionaryManager, DictionaryValidator, EntityValidator, TypeManager,
    TypeNameValidator, TypeValidator, UniqueTypeAliasValidator, WarehouseManager,
};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, WarehouseOptions};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Database access
pub use warehouse_database::{DatabaseConnector, DatabaseError};

// Re-export internal crates
pub use store_object;
pub use warehouse_database;
