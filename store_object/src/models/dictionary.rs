use crate::errors::StoreResult;
use crate::id_type::{assign_key, EntityKey};
use crate::models::collection::{Aliased, AliasedCollection};
use serde::{Deserialize, Serialize};

/// Items of one dictionary level, unique by alias
pub type DictionaryItems<K = i32> = AliasedCollection<DictionaryValue<K>>;

/// Entry of a dictionary, possibly with nested sub-items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: EntityKey"))]
pub struct DictionaryValue<K = i32> {
    #[serde(rename = "dictionary_value_id")]
    key: K,
    alias: String,
    pub display: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub items: DictionaryItems<K>,
}

impl<K: EntityKey> DictionaryValue<K> {
    pub fn new(alias: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            key: K::new_key(),
            alias: alias.into(),
            display: display.into(),
            summary: None,
            items: DictionaryItems::new(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn assign_key(&mut self, key: K) -> StoreResult<()> {
        assign_key(&mut self.key, key)
    }

    pub(crate) fn replace_key(&mut self, key: K) {
        self.key = key;
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl<K> Aliased for DictionaryValue<K> {
    fn alias(&self) -> &str {
        &self.alias
    }
}

impl<K: EntityKey> AliasedCollection<DictionaryValue<K>> {
    /// Change a value's alias within this level; the new alias must be free
    pub fn rename(&mut self, alias: &str, new_alias: impl Into<String>) -> StoreResult<()> {
        self.rename_with(alias, new_alias.into(), |value, new_alias| value.alias = new_alias)
    }

    /// Find an item by key at this level or below
    pub fn find_by_key(&self, key: &K) -> Option<&DictionaryValue<K>> {
        self.iter().find_map(|value| {
            if value.key() == key {
                Some(value)
            } else {
                value.items.find_by_key(key)
            }
        })
    }

    /// Find an item by alias at this level or below
    pub fn find_by_alias(&self, alias: &str) -> Option<&DictionaryValue<K>> {
        self.get(alias)
            .or_else(|| self.iter().find_map(|value| value.items.find_by_alias(alias)))
    }
}

/// Named enumeration of values usable as an attribute's domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: EntityKey"))]
pub struct WarehouseDictionary<K = i32> {
    #[serde(rename = "dictionary_id")]
    key: K,
    pub alias: String,
    pub display: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub items: DictionaryItems<K>,
}

impl<K: EntityKey> WarehouseDictionary<K> {
    pub fn new(alias: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            key: K::new_key(),
            alias: alias.into(),
            display: display.into(),
            summary: None,
            items: DictionaryItems::new(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn assign_key(&mut self, key: K) -> StoreResult<()> {
        assign_key(&mut self.key, key)
    }
}

impl<K> Aliased for WarehouseDictionary<K> {
    fn alias(&self) -> &str {
        &self.alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn colors() -> WarehouseDictionary {
        serde_json::from_value(json!({
            "dictionary_id": 1,
            "alias": "COLOR",
            "display": "Color",
            "items": [
                {"dictionary_value_id": 10, "alias": "RED", "display": "Red"},
                {"dictionary_value_id": 20, "alias": "BLUE", "display": "Blue", "items": [
                    {"dictionary_value_id": 21, "alias": "NAVY", "display": "Navy"}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_nested_lookup() {
        let colors = colors();

        assert_eq!(colors.items.find_by_key(&21).map(|v| v.alias.as_str()), Some("NAVY"));
        assert_eq!(colors.items.find_by_alias("RED").map(|v| *v.key()), Some(10));
        assert!(colors.items.find_by_alias("GREEN").is_none());
        assert!(colors.items.get("NAVY").is_none());
    }

    #[test]
    fn test_new_dictionary() {
        let mut sizes: WarehouseDictionary = WarehouseDictionary::new("SIZE", "Size");
        sizes.items.add(DictionaryValue::new("S", "Small")).unwrap();

        assert!(sizes.key().is_unset());
        assert!(sizes.items.add(DictionaryValue::new("S", "Again")).is_err());

        let json = serde_json::to_value(&sizes).unwrap();
        assert_eq!(json["items"][0]["dictionary_value_id"], 0);
    }
}
