use super::{aggregate, unwrap_result};
use crate::errors::ManagerError;
use async_trait::async_trait;
use config::WarehouseOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use store_object::models::warehouse_type::class_name;
use store_object::{DefaultErrorDescriber, ErrorDescriber, TypeOf, TypeStore, WarehouseResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Check applied to a type before it is saved
#[async_trait]
pub trait TypeValidator<S: TypeStore>: Send + Sync {
    async fn validate(&self, manager: &TypeManager<S>, item: &TypeOf<S>) -> WarehouseResult;
}

/// Validated access to warehouse types
pub struct TypeManager<S: TypeStore> {
    store: S,
    options: WarehouseOptions,
    describer: Arc<dyn ErrorDescriber>,
    validators: Vec<Arc<dyn TypeValidator<S>>>,
    cancellation: CancellationToken,
    disposed: AtomicBool,
}

impl<S: TypeStore> TypeManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            options: WarehouseOptions::default(),
            describer: Arc::new(DefaultErrorDescriber),
            validators: Vec::new(),
            cancellation: CancellationToken::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn with_options(mut self, options: WarehouseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_describer(mut self, describer: Arc<dyn ErrorDescriber>) -> Self {
        self.describer = describer;
        self
    }

    /// Validators run in the order they were added
    pub fn add_validator<V: TypeValidator<S> + 'static>(&mut self, validator: V) -> &mut Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &WarehouseOptions {
        &self.options
    }

    pub fn describer(&self) -> &dyn ErrorDescriber {
        self.describer.as_ref()
    }

    /// Token passed to every store call
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }

    fn ensure_live(&self) -> Result<(), ManagerError> {
        if self.is_disposed() {
            return Err(ManagerError::Disposed("TypeManager"));
        }
        Ok(())
    }

    /// Run every validator against `item`
    pub async fn validate(&self, item: &TypeOf<S>) -> Result<WarehouseResult, ManagerError> {
        self.ensure_live()?;
        let mut outcomes = Vec::with_capacity(self.validators.len());
        for validator in &self.validators {
            outcomes.push(validator.validate(self, item).await);
        }
        Ok(aggregate(outcomes, self.describer()))
    }

    /// Validate then create or update `item`
    pub async fn save(&self, item: &mut TypeOf<S>) -> Result<WarehouseResult, ManagerError> {
        let validation = self.validate(item).await?;
        if !validation.succeeded() {
            debug!("[SAVE_TYPE] {} rejected: {}", item.alias, validation);
            return Ok(validation);
        }
        Ok(self.store.save(item, &self.cancellation).await?)
    }

    pub async fn delete(&self, item: &TypeOf<S>) -> Result<WarehouseResult, ManagerError> {
        self.delete_by_key(item.key()).await
    }

    pub async fn delete_by_key(&self, key: &S::Key) -> Result<WarehouseResult, ManagerError> {
        self.ensure_live()?;
        Ok(self.store.delete(key, &self.cancellation).await?)
    }

    pub async fn find_by_alias(&self, alias: &str) -> Result<Option<TypeOf<S>>, ManagerError> {
        self.ensure_live()?;
        unwrap_result(self.store.find_by_alias(alias, &self.cancellation).await?)
    }

    pub async fn find_by_id(&self, key: &S::Key) -> Result<Option<TypeOf<S>>, ManagerError> {
        self.ensure_live()?;
        unwrap_result(self.store.find_by_id(key, &self.cancellation).await?)
    }

    /// Type bound to the Rust type `T`
    pub async fn find_by_class<T: ?Sized>(&self) -> Result<Option<TypeOf<S>>, ManagerError> {
        self.find_by_class_name(class_name::<T>()).await
    }

    pub async fn find_by_class_name(&self, class: &str) -> Result<Option<TypeOf<S>>, ManagerError> {
        self.ensure_live()?;
        unwrap_result(self.store.find_by_class(class, &self.cancellation).await?)
    }

    pub async fn get_all(&self) -> Result<Vec<TypeOf<S>>, ManagerError> {
        self.ensure_live()?;
        Ok(unwrap_result(self.store.get_all(&self.cancellation).await?)?.unwrap_or_default())
    }

    /// New in-memory type bound to `T`; nothing is stored until `save`
    pub fn new_type<T: ?Sized>(&self, name: &str, alias: &str) -> Result<TypeOf<S>, ManagerError> {
        self.ensure_live()?;
        Ok(TypeOf::<S>::for_class::<T>(name, alias))
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Dispose the store once. Idempotent.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.store.dispose();
        }
    }
}

impl<S: TypeStore> Drop for TypeManager<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
