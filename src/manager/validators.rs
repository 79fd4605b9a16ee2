//! Built-in validators
//!
//! Each validator reports its problems through the manager's error
//! describer, so their messages can be replaced without touching the checks.

use super::dictionary::{DictionaryManager, DictionaryValidator};
use super::types::{TypeManager, TypeValidator};
use async_trait::async_trait;
use store_object::{DictionaryOf, DictionaryStore, EntityKey, ErrorDescriber, TypeOf, TypeStore, WarehouseError, WarehouseResult};

/// Aliases are upper case letters, digits and underscores, starting with a letter
pub fn is_valid_alias(alias: &str) -> bool {
    let mut chars = alias.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn outcome(errors: Vec<WarehouseError>) -> WarehouseResult {
    if errors.is_empty() {
        WarehouseResult::SUCCESS
    } else {
        WarehouseResult::failed(errors)
    }
}

/// Checks the format of type, attribute and dictionary aliases.
///
/// Repeated attribute aliases cannot reach it: the attribute collection
/// rejects them on add, rename and deserialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasValidator;

impl AliasValidator {
    fn check_type<K, A>(&self, describer: &dyn ErrorDescriber, item: &store_object::WarehouseType<K, A>) -> WarehouseResult
    where
        K: EntityKey,
        A: EntityKey,
    {
        let mut errors = Vec::new();
        if !is_valid_alias(&item.alias) {
            errors.push(describer.invalid_alias(&item.alias));
        }

        for attribute in &item.attributes {
            if !is_valid_alias(attribute.alias()) {
                errors.push(describer.invalid_alias(attribute.alias()));
            }
        }
        outcome(errors)
    }

    fn check_dictionary<K: EntityKey>(
        &self,
        describer: &dyn ErrorDescriber,
        item: &store_object::WarehouseDictionary<K>,
    ) -> WarehouseResult {
        let mut errors = Vec::new();
        if !is_valid_alias(&item.alias) {
            errors.push(describer.invalid_alias(&item.alias));
        }
        let mut pending: Vec<_> = item.items.iter().collect();
        while let Some(value) = pending.pop() {
            if !is_valid_alias(value.alias()) {
                errors.push(describer.invalid_alias(value.alias()));
            }
            pending.extend(value.items.iter());
        }
        outcome(errors)
    }
}

#[async_trait]
impl<S: TypeStore> TypeValidator<S> for AliasValidator {
    async fn validate(&self, manager: &TypeManager<S>, item: &TypeOf<S>) -> WarehouseResult {
        self.check_type(manager.describer(), item)
    }
}

#[async_trait]
impl<S: DictionaryStore> DictionaryValidator<S> for AliasValidator {
    async fn validate(&self, manager: &DictionaryManager<S>, item: &DictionaryOf<S>) -> WarehouseResult {
        self.check_dictionary(manager.describer(), item)
    }
}

/// Rejects a type whose alias is already used by another stored type
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueTypeAliasValidator;

#[async_trait]
impl<S: TypeStore> TypeValidator<S> for UniqueTypeAliasValidator {
    async fn validate(&self, manager: &TypeManager<S>, item: &TypeOf<S>) -> WarehouseResult {
        if item.alias.is_empty() {
            return WarehouseResult::SUCCESS;
        }
        let found = match manager
            .store()
            .find_by_alias(&item.alias, manager.cancellation())
            .await
        {
            Ok(found) => found,
            Err(error) => return WarehouseResult::from_error(error),
        };
        if !found.succeeded() {
            return found.discard();
        }
        match found.value() {
            Some(existing) if existing.key() != item.key() => {
                WarehouseResult::failed([manager.describer().duplicate_alias(&item.alias)])
            }
            _ => WarehouseResult::SUCCESS,
        }
    }
}

/// Checks that every attribute default parses as its attribute type
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeDefaultValidator;

#[async_trait]
impl<S: TypeStore> TypeValidator<S> for AttributeDefaultValidator {
    async fn validate(&self, manager: &TypeManager<S>, item: &TypeOf<S>) -> WarehouseResult {
        let errors = item
            .attributes
            .iter()
            .filter_map(|attribute| {
                let value = attribute.default_value.as_deref()?;
                type_mapping::validate_default_value(attribute.kind, value)
                    .err()
                    .map(|error| manager.describer().invalid_default_value(attribute.alias(), &error))
            })
            .collect();
        outcome(errors)
    }
}

/// Requires a display name on types, attributes and dictionaries
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeNameValidator;

#[async_trait]
impl<S: TypeStore> TypeValidator<S> for TypeNameValidator {
    async fn validate(&self, manager: &TypeManager<S>, item: &TypeOf<S>) -> WarehouseResult {
        let missing = item.name.trim().is_empty()
            || item.attributes.iter().any(|attribute| attribute.name.trim().is_empty());
        if missing {
            WarehouseResult::failed([manager.describer().missing_name()])
        } else {
            WarehouseResult::SUCCESS
        }
    }
}

#[async_trait]
impl<S: DictionaryStore> DictionaryValidator<S> for TypeNameValidator {
    async fn validate(&self, manager: &DictionaryManager<S>, item: &DictionaryOf<S>) -> WarehouseResult {
        if item.display.trim().is_empty() {
            WarehouseResult::failed([manager.describer().missing_name()])
        } else {
            WarehouseResult::SUCCESS
        }
    }
}
