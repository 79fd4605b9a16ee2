use crate::errors::StoreResult;
use crate::id_type::{assign_key, EntityKey};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and lifecycle fields shared by every persisted entity.
///
/// The key is assigned once: at construction for generated keys, or by the
/// store on first save for numeric keys. A removed entity always has a
/// deletion date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity<K = Uuid> {
    #[serde(rename = "entity_id")]
    key: K,
    creation_date: DateTime<Utc>,
    updation_date: DateTime<Utc>,
    #[serde(default)]
    deletion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    removed: bool,
    #[serde(default)]
    is_read_only: bool,
}

impl<K: EntityKey> Entity<K> {
    pub fn new() -> Self {
        Self::with_key(K::new_key())
    }

    pub fn with_key(key: K) -> Self {
        let now = Utc::now();
        Self {
            key,
            creation_date: now,
            updation_date: now,
            deletion_date: None,
            removed: false,
            is_read_only: false,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Record the key given by the store
    pub fn assign_key(&mut self, key: K) -> StoreResult<()> {
        assign_key(&mut self.key, key)
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn updation_date(&self) -> DateTime<Utc> {
        self.updation_date
    }

    pub fn deletion_date(&self) -> Option<DateTime<Utc>> {
        self.deletion_date
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.is_read_only = read_only;
    }

    pub(crate) fn touch(&mut self) {
        self.updation_date = Utc::now();
    }

    /// Soft-delete in memory
    pub fn mark_removed(&mut self) {
        if !self.removed {
            self.removed = true;
            self.deletion_date = Some(Utc::now());
        }
    }

    /// Copy the lifecycle fields persisted by the store
    pub(crate) fn sync_from(&mut self, stored: &Entity<K>) -> StoreResult<()> {
        self.assign_key(stored.key.clone())?;
        self.creation_date = stored.creation_date;
        self.updation_date = stored.updation_date;
        self.deletion_date = stored.deletion_date;
        self.removed = stored.removed;
        Ok(())
    }
}

impl<K: EntityKey> Default for Entity<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// An application entity persisted by an entity store.
///
/// Implementors embed an [`Entity`] and serialize it flattened, so that
/// `entity_id` and the lifecycle fields sit at the top level of the JSON
/// document:
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use store_object::models::{Entity, WarehouseEntity};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Aircraft {
///     #[serde(flatten)]
///     entity: Entity,
///     code: String,
/// }
///
/// impl WarehouseEntity for Aircraft {
///     type Key = uuid::Uuid;
///
///     fn type_alias() -> &'static str {
///         "AIRCRAFT"
///     }
///
///     fn entity(&self) -> &Entity {
///         &self.entity
///     }
///
///     fn entity_mut(&mut self) -> &mut Entity {
///         &mut self.entity
///     }
/// }
/// ```
pub trait WarehouseEntity: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    type Key: EntityKey;

    /// Alias of the warehouse type describing this entity
    fn type_alias() -> &'static str;

    fn entity(&self) -> &Entity<Self::Key>;

    fn entity_mut(&mut self) -> &mut Entity<Self::Key>;

    fn key(&self) -> &Self::Key {
        self.entity().key()
    }
}
