use crate::errors::StoreResult;
use crate::id_type::EntityKey;
use crate::models::WarehouseEntity;
use crate::pagination::WarehousePagination;
use crate::result::WarehouseResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Storage of application entities keyed by `Key`
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Key: EntityKey;

    /// Persist a new entity; the stored key and dates are copied back onto it
    async fn create<E>(&self, entity: &mut E, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = Self::Key>;

    async fn update<E>(&self, entity: &mut E, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = Self::Key>;

    /// Insert or update, as decided by the store
    async fn save<E>(&self, entity: &mut E, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = Self::Key>;

    /// Soft-delete the entity of type `E` with `key`
    async fn delete<E>(&self, key: &Self::Key, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = Self::Key>;

    async fn delete_entity<E>(&self, entity: &E, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = Self::Key>,
    {
        self.delete::<E>(entity.key(), cancel).await
    }

    /// Succeeds with no value when nothing has `key`
    async fn find_by_id<E>(&self, key: &Self::Key, cancel: &CancellationToken) -> StoreResult<WarehouseResult<E>>
    where
        E: WarehouseEntity<Key = Self::Key>;

    /// One page of the entities of type `E`; `page` is 1-based
    async fn find<E>(
        &self,
        page: usize,
        size: usize,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<WarehousePagination<E>>>
    where
        E: WarehouseEntity<Key = Self::Key>;

    /// Release the store; later calls fail with a disposed error
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
