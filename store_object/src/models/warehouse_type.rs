use crate::errors::StoreResult;
use crate::id_type::{assign_key, EntityKey};
use crate::models::collection::{Aliased, AliasedCollection};
use serde::{Deserialize, Serialize};
use type_mapping::AttributeType;

/// One named, typed field declared on a [`WarehouseType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "A: EntityKey"))]
pub struct WarehouseAttribute<A = i32> {
    #[serde(rename = "attribute_id")]
    key: A,
    #[serde(rename = "attribute_type_id")]
    pub kind: AttributeType,
    alias: String,
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_unique: bool,
}

impl<A: EntityKey> WarehouseAttribute<A> {
    pub fn new(name: impl Into<String>, alias: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            key: A::new_key(),
            kind,
            alias: alias.into(),
            name: name.into(),
            summary: None,
            default_value: None,
            is_required: false,
            is_unique: false,
        }
    }

    pub fn key(&self) -> &A {
        &self.key
    }

    pub fn assign_key(&mut self, key: A) -> StoreResult<()> {
        assign_key(&mut self.key, key)
    }

    /// Take the key the database reports, even over an assigned one
    pub(crate) fn replace_key(&mut self, key: A) {
        self.key = key;
    }

    /// Changed through the owning collection's `rename`
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }
}

impl<A> Aliased for WarehouseAttribute<A> {
    fn alias(&self) -> &str {
        &self.alias
    }
}

/// Attributes of one type, unique by alias
pub type AttributeCollection<A = i32> = AliasedCollection<WarehouseAttribute<A>>;

impl<A: EntityKey> AliasedCollection<WarehouseAttribute<A>> {
    /// Build an attribute and append it
    pub fn add_new(
        &mut self,
        name: impl Into<String>,
        alias: impl Into<String>,
        kind: AttributeType,
        summary: Option<&str>,
    ) -> StoreResult<&mut WarehouseAttribute<A>> {
        let mut attribute = WarehouseAttribute::new(name, alias, kind);
        attribute.summary = summary.map(str::to_string);
        self.add(attribute)
    }

    /// Change an attribute's alias; the new alias must be free
    pub fn rename(&mut self, alias: &str, new_alias: impl Into<String>) -> StoreResult<()> {
        self.rename_with(alias, new_alias.into(), |attribute, new_alias| attribute.alias = new_alias)
    }
}

/// Descriptor of one entity class and its attributes.
///
/// Created with an unset key; the store assigns the type key and every
/// attribute key on create, matching attributes back by alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: EntityKey, A: EntityKey"))]
pub struct WarehouseType<K = i16, A = i32> {
    #[serde(rename = "entity_type_id")]
    key: K,
    pub alias: String,
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub privated: bool,
    #[serde(default)]
    pub attributes: AttributeCollection<A>,
}

impl<K: EntityKey, A: EntityKey> WarehouseType<K, A> {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            key: K::new_key(),
            alias: alias.into(),
            name: name.into(),
            class: None,
            summary: None,
            removed: false,
            privated: false,
            attributes: AttributeCollection::new(),
        }
    }

    /// Type bound to the Rust type `T`
    pub fn for_class<T: ?Sized>(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(name, alias).with_class(class_name::<T>())
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn assign_key(&mut self, key: K) -> StoreResult<()> {
        assign_key(&mut self.key, key)
    }
}

impl<K, A> Aliased for WarehouseType<K, A> {
    fn alias(&self) -> &str {
        &self.alias
    }
}

/// Class name recorded for the Rust type `T`
pub fn class_name<T: ?Sized>() -> &'static str {
    std::any::type_name::<T>()
}
