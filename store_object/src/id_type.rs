//! Id Type module
//!
//! Primary keys of entities, types, attributes and dictionaries are generic
//! over [`EntityKey`]. Numeric keys start unset (zero) and are assigned by the
//! store; UUID and string keys are generated when the object is created.

use crate::errors::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Debug, Display, Write};
use std::hash::Hash;
use uuid::Uuid;
use warehouse_database::DbType;

/// Universal ID type that can handle both numeric IDs and UUIDs efficiently
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniversalId {
    /// Numeric ID (i16, i32, i64)
    Numeric(i64),
    /// UUID ID
    Uuid(Uuid),
    /// String-based ID
    String(String),
}

impl UniversalId {
    /// Text form used when a key is passed as a text parameter
    pub fn to_string_fast(&self) -> String {
        match self {
            UniversalId::Numeric(n) => {
                let mut buffer = String::with_capacity(20);
                let _ = write!(buffer, "{}", n);
                buffer
            }
            UniversalId::Uuid(uuid) => uuid.to_string(),
            UniversalId::String(s) => s.clone(),
        }
    }
}

impl Display for UniversalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniversalId::Numeric(n) => write!(f, "{}", n),
            UniversalId::Uuid(uuid) => write!(f, "{}", uuid),
            UniversalId::String(s) => write!(f, "{}", s),
        }
    }
}

/// A primary key type
pub trait EntityKey:
    Clone + Eq + Hash + Debug + Display + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Parameter type used when the key is sent to the database
    const DB_TYPE: DbType;

    /// Key given to a freshly constructed object
    fn new_key() -> Self;

    /// Whether the key still has to be assigned by the store
    fn is_unset(&self) -> bool;

    fn universal_id(&self) -> UniversalId;
}

macro_rules! numeric_key {
    ($($ty:ty => $db_type:expr),* $(,)?) => {
        $(
            impl EntityKey for $ty {
                const DB_TYPE: DbType = $db_type;

                fn new_key() -> Self {
                    0
                }

                fn is_unset(&self) -> bool {
                    *self == 0
                }

                fn universal_id(&self) -> UniversalId {
                    UniversalId::Numeric(*self as i64)
                }
            }
        )*
    };
}

numeric_key!(i16 => DbType::SmallInt, i32 => DbType::Integer, i64 => DbType::BigInt);

impl EntityKey for Uuid {
    const DB_TYPE: DbType = DbType::Uuid;

    fn new_key() -> Self {
        Uuid::new_v4()
    }

    fn is_unset(&self) -> bool {
        self.is_nil()
    }

    fn universal_id(&self) -> UniversalId {
        UniversalId::Uuid(*self)
    }
}

impl EntityKey for String {
    const DB_TYPE: DbType = DbType::String;

    fn new_key() -> Self {
        Uuid::new_v4().to_string()
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn universal_id(&self) -> UniversalId {
        UniversalId::String(self.clone())
    }
}

/// Set `slot` to `key` unless it already holds a different key.
///
/// Keys are assigned once; re-assigning the same key is accepted.
pub fn assign_key<K: EntityKey>(slot: &mut K, key: K) -> StoreResult<()> {
    if !slot.is_unset() && *slot != key {
        return Err(StoreError::argument(
            "key",
            format!("key is already assigned ({} != {})", slot, key),
        ));
    }
    *slot = key;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_start_unset() {
        assert!(i16::new_key().is_unset());
        assert!(i32::new_key().is_unset());
        assert!(!7i64.is_unset());
        assert_eq!(7i16.universal_id(), UniversalId::Numeric(7));
    }

    #[test]
    fn test_generated_keys_are_set() {
        assert!(!Uuid::new_key().is_unset());
        assert!(!String::new_key().is_unset());
        assert_ne!(Uuid::new_key(), Uuid::new_key());
    }

    #[test]
    fn test_assign_key_once() {
        let mut key = 0i32;
        assign_key(&mut key, 12).unwrap();
        assert_eq!(key, 12);

        assign_key(&mut key, 12).unwrap();
        assert!(assign_key(&mut key, 13).is_err());
        assert_eq!(key, 12);
    }

    #[test]
    fn test_to_string_fast() {
        let uuid = Uuid::new_v4();
        assert_eq!(UniversalId::Numeric(42).to_string_fast(), "42");
        assert_eq!(UniversalId::Uuid(uuid).to_string_fast(), uuid.to_string());
        assert_eq!(UniversalId::String("abc".into()).to_string_fast(), "abc");
    }
}
