use super::{aggregate, unwrap_result};
use crate::errors::ManagerError;
use async_trait::async_trait;
use config::WarehouseOptions;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use store_object::{
    DefaultErrorDescriber, EntityStore, ErrorDescriber, WarehouseEntity, WarehousePagination, WarehouseResult,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Check applied to entities of type `E` before they are saved
#[async_trait]
pub trait EntityValidator<S, E>: Send + Sync
where
    S: EntityStore,
    E: WarehouseEntity<Key = S::Key>,
{
    async fn validate(&self, manager: &WarehouseManager<S>, entity: &E) -> WarehouseResult;
}

/// Validator registered for one entity type, stored as `Arc<dyn EntityValidator<S, E>>`
struct Registration {
    entity: TypeId,
    validator: Box<dyn Any + Send + Sync>,
}

/// Validated access to application entities
pub struct WarehouseManager<S: EntityStore> {
    store: S,
    options: WarehouseOptions,
    describer: Arc<dyn ErrorDescriber>,
    validators: Vec<Registration>,
    cancellation: CancellationToken,
    disposed: AtomicBool,
}

impl<S: EntityStore + 'static> WarehouseManager<S> {
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

    /// Register a validator for entities of type `E`
    pub fn add_validator<E, V>(&mut self, validator: V) -> &mut Self
    where
        E: WarehouseEntity<Key = S::Key>,
        V: EntityValidator<S, E> + 'static,
    {
        let validator: Arc<dyn EntityValidator<S, E>> = Arc::new(validator);
        self.validators.push(Registration {
            entity: TypeId::of::<E>(),
            validator: Box::new(validator),
        });
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

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }

    fn ensure_live(&self) -> Result<(), ManagerError> {
        if self.is_disposed() {
            return Err(ManagerError::Disposed("WarehouseManager"));
        }
        Ok(())
    }

    fn validators_for<E>(&self) -> Vec<Arc<dyn EntityValidator<S, E>>>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        self.validators
            .iter()
            .filter(|registration| registration.entity == TypeId::of::<E>())
            .filter_map(|registration| {
                registration
                    .validator
                    .downcast_ref::<Arc<dyn EntityValidator<S, E>>>()
                    .cloned()
            })
            .collect()
    }

    /// Fresh in-memory entity; nothing is stored until `save`
    pub fn new_entity<E>(&self) -> Result<E, ManagerError>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        self.ensure_live()?;
        Ok(E::default())
    }

    /// Run the validators registered for `E` against `entity`
    pub async fn validate<E>(&self, entity: &E) -> Result<WarehouseResult, ManagerError>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        self.ensure_live()?;
        let validators = self.validators_for::<E>();
        let mut outcomes = Vec::with_capacity(validators.len());
        for validator in validators {
            outcomes.push(validator.validate(self, entity).await);
        }
        Ok(aggregate(outcomes, self.describer()))
    }

    /// Validate then persist `entity`; the store decides between insert and update
    pub async fn save<E>(&self, entity: &mut E) -> Result<WarehouseResult, ManagerError>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        let validation = self.validate(&*entity).await?;
        if !validation.succeeded() {
            debug!("[SAVE_ENTITY] {} rejected: {}", E::type_alias(), validation);
            return Ok(validation);
        }
        Ok(self.store.save(entity, &self.cancellation).await?)
    }

    pub async fn delete<E>(&self, entity: &E) -> Result<WarehouseResult, ManagerError>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        self.delete_by_key::<E>(entity.key()).await
    }

    pub async fn delete_by_key<E>(&self, key: &S::Key) -> Result<WarehouseResult, ManagerError>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        self.ensure_live()?;
        Ok(self.store.delete::<E>(key, &self.cancellation).await?)
    }

    pub async fn find_by_id<E>(&self, key: &S::Key) -> Result<Option<E>, ManagerError>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        self.ensure_live()?;
        unwrap_result(self.store.find_by_id::<E>(key, &self.cancellation).await?)
    }

    /// One page of entities; `size` defaults to the configured page size
    pub async fn find<E>(&self, page: usize, size: Option<usize>) -> Result<Option<WarehousePagination<E>>, ManagerError>
    where
        E: WarehouseEntity<Key = S::Key>,
    {
        self.ensure_live()?;
        let size = size.unwrap_or(self.options.default_page_size);
        unwrap_result(self.store.find::<E>(page, size, &self.cancellation).await?)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.store.dispose();
        }
    }
}

impl<S: EntityStore> Drop for WarehouseManager<S> {
    fn drop(&mut self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.store.dispose();
        }
    }
}
