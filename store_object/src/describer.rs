//! Error descriptions reported by validators
//!
//! Every method has a default message; implement the trait and override
//! the methods that need different (for example localized) wording.

use crate::result::WarehouseError;
use type_mapping::DefaultValueError;

pub trait ErrorDescriber: Send + Sync {
    fn default_error(&self) -> WarehouseError {
        WarehouseError::new("DefaultError", "An unknown failure has occurred.")
    }

    fn invalid_alias(&self, alias: &str) -> WarehouseError {
        WarehouseError::new(
            "InvalidAlias",
            format!(
                "Alias '{}' is invalid, it can only contain upper case letters, digits and underscores.",
                alias
            ),
        )
    }

    fn duplicate_alias(&self, alias: &str) -> WarehouseError {
        WarehouseError::new("DuplicateAlias", format!("Alias '{}' is already taken.", alias))
    }

    fn invalid_default_value(&self, attribute: &str, error: &DefaultValueError) -> WarehouseError {
        WarehouseError::new(
            "InvalidDefaultValue",
            format!("Attribute '{}' has an invalid default value: {}.", attribute, error),
        )
    }

    fn missing_name(&self) -> WarehouseError {
        WarehouseError::new("MissingName", "Name is required.")
    }
}

/// Describer with the built-in messages
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorDescriber;

impl ErrorDescriber for DefaultErrorDescriber {}
