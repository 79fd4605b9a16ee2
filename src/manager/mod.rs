//! Managers: the entry point application code uses
//!
//! A manager wraps one store with an ordered list of validators and an error
//! describer. `save` runs every validator and only reaches the store when all
//! of them pass. Read accessors return the bare value: `Ok(None)` when nothing
//! was found, `Err(ManagerError::Store(..))` when the store captured a failure.

pub mod dictionary;
pub mod entity;
pub mod types;
pub mod validators;

pub use dictionary::{DictionaryManager, DictionaryValidator};
pub use entity::{EntityValidator, WarehouseManager};
pub use types::{TypeManager, TypeValidator};
pub use validators::{AliasValidator, AttributeDefaultValidator, TypeNameValidator, UniqueTypeAliasValidator};

use crate::errors::ManagerError;
use store_object::{ErrorDescriber, WarehouseError, WarehouseResult};

/// Value of a store result, re-throwing a captured failure
pub(crate) fn unwrap_result<T>(result: WarehouseResult<T>) -> Result<Option<T>, ManagerError> {
    match result.into_parts() {
        (_, Some(exception)) => Err(ManagerError::Store(exception)),
        (value, None) => Ok(value),
    }
}

/// Merge validator outcomes, keeping every error in registration order.
///
/// A validator that fails without reporting an error contributes the
/// describer's default error.
pub(crate) fn aggregate(outcomes: Vec<WarehouseResult>, describer: &dyn ErrorDescriber) -> WarehouseResult {
    let mut errors: Vec<WarehouseError> = Vec::new();
    let mut failed = false;
    for outcome in outcomes.iter().filter(|outcome| !outcome.succeeded()) {
        failed = true;
        match outcome.errors() {
            Some(reported) if !reported.is_empty() => errors.extend_from_slice(reported),
            _ => errors.push(describer.default_error()),
        }
    }

    if failed {
        WarehouseResult::failed(errors)
    } else {
        WarehouseResult::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_object::{DefaultErrorDescriber, StoreError};

    #[test]
    fn test_aggregate_keeps_all_errors() {
        let outcomes = vec![
            WarehouseResult::failed([WarehouseError::new("A", "a")]),
            WarehouseResult::SUCCESS,
            WarehouseResult::failed([]),
            WarehouseResult::failed([WarehouseError::new("B", "b"), WarehouseError::new("C", "c")]),
        ];

        let result = aggregate(outcomes, &DefaultErrorDescriber);

        assert!(!result.succeeded());
        assert_eq!(result.to_string(), "Failed : A,DefaultError,B,C");
    }

    #[test]
    fn test_aggregate_success() {
        let result = aggregate(vec![WarehouseResult::SUCCESS], &DefaultErrorDescriber);
        assert!(result.succeeded());
        assert!(aggregate(Vec::new(), &DefaultErrorDescriber).succeeded());
    }

    #[test]
    fn test_unwrap_result() {
        assert_eq!(unwrap_result(WarehouseResult::success(3)).unwrap(), Some(3));
        assert_eq!(unwrap_result(WarehouseResult::<i32>::found(None)).unwrap(), None);
        assert_eq!(unwrap_result(WarehouseResult::<i32>::failed([])).unwrap(), None);

        let failure = WarehouseResult::<i32>::from_error(StoreError::NotFound("x".into()));
        assert!(matches!(unwrap_result(failure), Err(ManagerError::Store(_))));
    }
}
