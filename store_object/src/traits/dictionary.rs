use crate::errors::StoreResult;
use crate::id_type::EntityKey;
use crate::models::WarehouseDictionary;
use crate::result::WarehouseResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Dictionary handled by the store `S`
pub type DictionaryOf<S: ?Sized> = WarehouseDictionary<<S as DictionaryStore>::Key>;

/// Storage of dictionaries and their values
#[async_trait]
pub trait DictionaryStore: Send + Sync {
    type Key: EntityKey;

    async fn create(&self, item: &mut DictionaryOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult>;

    async fn update(&self, item: &mut DictionaryOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult>;

    async fn save(&self, item: &mut DictionaryOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        if item.key().is_unset() {
            self.create(item, cancel).await
        } else {
            self.update(item, cancel).await
        }
    }

    async fn delete(&self, key: &Self::Key, cancel: &CancellationToken) -> StoreResult<WarehouseResult>;

    async fn delete_dictionary(
        &self,
        item: &DictionaryOf<Self>,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult> {
        self.delete(item.key(), cancel).await
    }

    async fn find_by_alias(
        &self,
        alias: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<DictionaryOf<Self>>>;

    async fn find_by_id(
        &self,
        key: &Self::Key,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<DictionaryOf<Self>>>;

    async fn get_all(&self, cancel: &CancellationToken) -> StoreResult<WarehouseResult<Vec<DictionaryOf<Self>>>>;

    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
