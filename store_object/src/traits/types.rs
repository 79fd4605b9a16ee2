use crate::errors::StoreResult;
use crate::id_type::EntityKey;
use crate::models::WarehouseType;
use crate::result::WarehouseResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Type descriptor handled by the store `S`
pub type TypeOf<S: ?Sized> = WarehouseType<<S as TypeStore>::Key, <S as TypeStore>::AttributeKey>;

/// Storage of warehouse types and their attributes
#[async_trait]
pub trait TypeStore: Send + Sync {
    type Key: EntityKey;
    type AttributeKey: EntityKey;

    /// Persist a new type. The type key and every attribute key are
    /// assigned by the store, attributes being matched by alias.
    async fn create(&self, item: &mut TypeOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult>;

    async fn update(&self, item: &mut TypeOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult>;

    /// Create when the key is unset, update otherwise
    async fn save(&self, item: &mut TypeOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        if item.key().is_unset() {
            self.create(item, cancel).await
        } else {
            self.update(item, cancel).await
        }
    }

    async fn delete(&self, key: &Self::Key, cancel: &CancellationToken) -> StoreResult<WarehouseResult>;

    async fn delete_type(&self, item: &TypeOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        self.delete(item.key(), cancel).await
    }

    async fn find_by_alias(&self, alias: &str, cancel: &CancellationToken) -> StoreResult<WarehouseResult<TypeOf<Self>>>;

    /// Type bound to the application class `class`
    async fn find_by_class(&self, class: &str, cancel: &CancellationToken) -> StoreResult<WarehouseResult<TypeOf<Self>>>;

    async fn find_by_id(&self, key: &Self::Key, cancel: &CancellationToken) -> StoreResult<WarehouseResult<TypeOf<Self>>>;

    async fn get_all(&self, cancel: &CancellationToken) -> StoreResult<WarehouseResult<Vec<TypeOf<Self>>>>;

    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
