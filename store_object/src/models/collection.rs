use crate::errors::{StoreError, StoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Index;

/// Items identified by an alias
pub trait Aliased {
    fn alias(&self) -> &str;
}

/// Ordered collection whose items have unique aliases.
///
/// Serialized as a plain array; deserializing an array with a repeated
/// alias fails. Items expose their alias read-only, so `get_mut` and
/// `iter_mut` cannot break uniqueness; aliases change through `rename`.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedCollection<T> {
    items: Vec<T>,
}

impl<T> Default for AliasedCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Aliased> AliasedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item`; fails when its alias is already present
    pub fn add(&mut self, item: T) -> StoreResult<&mut T> {
        if item.alias().is_empty() {
            return Err(StoreError::ArgumentNull("alias"));
        }
        if self.contains(item.alias()) {
            return Err(StoreError::argument(
                "alias",
                format!("alias '{}' is already in the collection", item.alias()),
            ));
        }
        let index = self.items.len();
        self.items.push(item);
        Ok(&mut self.items[index])
    }

    pub fn get(&self, alias: &str) -> Option<&T> {
        self.items.iter().find(|item| item.alias() == alias)
    }

    pub fn get_mut(&mut self, alias: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.alias() == alias)
    }

    /// Move the item at `alias` to `new_alias` using `set`
    pub(crate) fn rename_with(
        &mut self,
        alias: &str,
        new_alias: String,
        set: impl FnOnce(&mut T, String),
    ) -> StoreResult<()> {
        if new_alias.is_empty() {
            return Err(StoreError::ArgumentNull("alias"));
        }
        if alias != new_alias && self.contains(&new_alias) {
            return Err(StoreError::argument(
                "alias",
                format!("alias '{}' is already in the collection", new_alias),
            ));
        }
        let item = self
            .get_mut(alias)
            .ok_or_else(|| StoreError::argument("alias", format!("no item with alias '{}'", alias)))?;
        set(item, new_alias);
        Ok(())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    /// Remove and return the item with `alias`
    pub fn remove(&mut self, alias: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.alias() == alias)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T: Aliased> TryFrom<Vec<T>> for AliasedCollection<T> {
    type Error = StoreError;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        let mut collection = Self::with_capacity(items.len());
        for item in items {
            collection.add(item)?;
        }
        Ok(collection)
    }
}

impl<T> AliasedCollection<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }
}

impl<T: Aliased> Index<&str> for AliasedCollection<T> {
    type Output = T;

    /// Panics when no item has `alias`; use [`AliasedCollection::get`] otherwise.
    fn index(&self, alias: &str) -> &T {
        match self.get(alias) {
            Some(item) => item,
            None => panic!("no item with alias '{}'", alias),
        }
    }
}

impl<'a, T> IntoIterator for &'a AliasedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for AliasedCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: Serialize> Serialize for AliasedCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Aliased> Deserialize<'de> for AliasedCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::try_from(items).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        alias: String,
    }

    impl Aliased for Item {
        fn alias(&self) -> &str {
            &self.alias
        }
    }

    fn item(alias: &str) -> Item {
        Item {
            alias: alias.to_string(),
        }
    }

    #[test]
    fn test_aliases_are_unique() {
        let mut items = AliasedCollection::new();
        items.add(item("RED")).unwrap();

        assert!(items.add(item("RED")).is_err());
        assert!(matches!(items.add(item("")), Err(StoreError::ArgumentNull("alias"))));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_lookup_and_remove() {
        let mut items = AliasedCollection::try_from(vec![item("RED"), item("GREEN")]).unwrap();

        assert_eq!(items["GREEN"], item("GREEN"));
        assert!(items.contains("RED"));
        assert_eq!(items.remove("RED"), Some(item("RED")));
        assert_eq!(items.remove("RED"), None);
        assert_eq!(items.iter().map(|i| i.alias.as_str()).collect::<Vec<_>>(), ["GREEN"]);
    }

    #[test]
    fn test_rename_keeps_aliases_unique() {
        let mut items = AliasedCollection::try_from(vec![item("RED"), item("GREEN")]).unwrap();
        let rename = |items: &mut AliasedCollection<Item>, from: &str, to: &str| {
            items.rename_with(from, to.to_string(), |item, alias| item.alias = alias)
        };

        assert!(rename(&mut items, "RED", "GREEN").is_err());
        assert!(matches!(rename(&mut items, "RED", ""), Err(StoreError::ArgumentNull("alias"))));
        assert!(rename(&mut items, "BLUE", "NAVY").is_err());
        assert!(rename(&mut items, "RED", "RED").is_ok());

        rename(&mut items, "RED", "CRIMSON").unwrap();
        assert!(items.contains("CRIMSON"));
        assert!(!items.contains("RED"));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let ok: AliasedCollection<Item> = serde_json::from_str(r#"[{"alias":"A"},{"alias":"B"}]"#).unwrap();
        assert_eq!(ok.len(), 2);

        let duplicate = serde_json::from_str::<AliasedCollection<Item>>(r#"[{"alias":"A"},{"alias":"A"}]"#);
        assert!(duplicate.is_err());
    }
}
