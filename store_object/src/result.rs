//! Outcome of store and manager operations

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One reported problem: a stable code and a human readable description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarehouseError {
    pub code: String,
    pub description: String,
}

impl WarehouseError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }

    /// An error without a code
    pub fn described(description: impl Into<String>) -> Self {
        Self::new(String::new(), description)
    }
}

impl fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            f.write_str(&self.description)
        } else {
            write!(f, "{}: {}", self.code, self.description)
        }
    }
}

/// Success or failure of an operation, with an optional value.
///
/// A successful result never carries errors. A failed result carries
/// errors (possibly none), and the captured failure when one caused it.
#[derive(Debug, Clone)]
pub struct WarehouseResult<T = ()> {
    succeeded: bool,
    value: Option<T>,
    errors: Option<Vec<WarehouseError>>,
    exception: Option<Arc<StoreError>>,
}

impl<T> WarehouseResult<T> {
    /// Succeeded with no value
    pub const SUCCESS: Self = Self {
        succeeded: true,
        value: None,
        errors: None,
        exception: None,
    };

    pub fn success(value: T) -> Self {
        Self {
            value: Some(value),
            ..Self::SUCCESS
        }
    }

    /// Succeeded; `None` means nothing was found
    pub fn found(value: Option<T>) -> Self {
        Self {
            value,
            ..Self::SUCCESS
        }
    }

    pub fn failed(errors: impl IntoIterator<Item = WarehouseError>) -> Self {
        Self {
            succeeded: false,
            value: None,
            errors: Some(errors.into_iter().collect()),
            exception: None,
        }
    }

    /// Failed because of `error`; carries one error describing it
    pub fn from_error(error: impl Into<StoreError>) -> Self {
        Self::from_shared(Arc::new(error.into()))
    }

    pub fn from_shared(error: Arc<StoreError>) -> Self {
        Self {
            succeeded: false,
            value: None,
            errors: Some(vec![WarehouseError::described(error.to_string())]),
            exception: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn errors(&self) -> Option<&[WarehouseError]> {
        self.errors.as_deref()
    }

    pub fn exception(&self) -> Option<&Arc<StoreError>> {
        self.exception.as_ref()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WarehouseResult<U> {
        WarehouseResult {
            succeeded: self.succeeded,
            value: self.value.map(f),
            errors: self.errors,
            exception: self.exception,
        }
    }

    /// Drop the value, keeping the outcome
    pub fn discard(self) -> WarehouseResult {
        self.map(|_| ())
    }

    /// Split into the value or the captured failure
    pub fn into_parts(self) -> (Option<T>, Option<Arc<StoreError>>) {
        (self.value, self.exception)
    }
}

impl<T> Default for WarehouseResult<T> {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl<T> fmt::Display for WarehouseResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            return f.write_str("Succeeded");
        }
        let codes: Vec<&str> = self
            .errors
            .iter()
            .flatten()
            .map(|error| error.code.as_str())
            .collect();
        write!(f, "Failed : {}", codes.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_constant() {
        let result = WarehouseResult::<()>::SUCCESS;

        assert!(result.succeeded());
        assert!(result.errors().is_none());
        assert!(result.exception().is_none());
        assert!(result.value().is_none());
    }

    #[test]
    fn test_failed_without_errors_has_empty_errors() {
        let result = WarehouseResult::<()>::failed([]);

        assert!(!result.succeeded());
        assert_eq!(result.errors(), Some(&[][..]));
        assert!(result.exception().is_none());
    }

    #[test]
    fn test_failed_keeps_error_order() {
        let result = WarehouseResult::<()>::failed([
            WarehouseError::new("First", "first"),
            WarehouseError::new("Second", "second"),
        ]);

        let codes: Vec<_> = result.errors().unwrap().iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, ["First", "Second"]);
        assert_eq!(result.to_string(), "Failed : First,Second");
    }

    #[test]
    fn test_from_error_describes_the_failure() {
        let error = StoreError::NotFound("AIRCRAFT".into());
        let message = error.to_string();
        let result = WarehouseResult::<String>::from_error(error);

        assert!(!result.succeeded());
        let errors = result.errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].description, message);
        assert_eq!(errors[0].code, "");
        assert!(matches!(
            result.exception().map(|e| e.as_ref()),
            Some(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_found_and_map() {
        let result = WarehouseResult::found(Some(3)).map(|v| v * 2);
        assert_eq!(result.value(), Some(&6));

        let missing = WarehouseResult::<i32>::found(None);
        assert!(missing.succeeded());
        assert!(missing.into_value().is_none());
    }
}
