use super::{aggregate, unwrap_result};
use crate::errors::ManagerError;
use async_trait::async_trait;
use config::WarehouseOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use store_object::{DefaultErrorDescriber, DictionaryOf, DictionaryStore, ErrorDescriber, WarehouseResult};
use tokio_util::sync::CancellationToken;

/// Check applied to a dictionary before it is saved
#[async_trait]
pub trait DictionaryValidator<S: DictionaryStore>: Send + Sync {
    async fn validate(&self, manager: &DictionaryManager<S>, item: &DictionaryOf<S>) -> WarehouseResult;
}

/// Validated access to dictionaries
pub struct DictionaryManager<S: DictionaryStore> {
    store: S,
    options: WarehouseOptions,
    describer: Arc<dyn ErrorDescriber>,
    validators: Vec<Arc<dyn DictionaryValidator<S>>>,
    cancellation: CancellationToken,
    disposed: AtomicBool,
}

impl<S: DictionaryStore> DictionaryManager<S> {
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

    pub fn add_validator<V: DictionaryValidator<S> + 'static>(&mut self, validator: V) -> &mut Self {
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

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }

    fn ensure_live(&self) -> Result<(), ManagerError> {
        if self.is_disposed() {
            return Err(ManagerError::Disposed("DictionaryManager"));
        }
        Ok(())
    }

    pub async fn validate(&self, item: &DictionaryOf<S>) -> Result<WarehouseResult, ManagerError> {
        self.ensure_live()?;
        let mut outcomes = Vec::with_capacity(self.validators.len());
        for validator in &self.validators {
            outcomes.push(validator.validate(self, item).await);
        }
        Ok(aggregate(outcomes, self.describer()))
    }

    pub async fn save(&self, item: &mut DictionaryOf<S>) -> Result<WarehouseResult, ManagerError> {
        let validation = self.validate(item).await?;
        if !validation.succeeded() {
            return Ok(validation);
        }
        Ok(self.store.save(item, &self.cancellation).await?)
    }

    pub async fn delete(&self, item: &DictionaryOf<S>) -> Result<WarehouseResult, ManagerError> {
        self.delete_by_key(item.key()).await
    }

    pub async fn delete_by_key(&self, key: &S::Key) -> Result<WarehouseResult, ManagerError> {
        self.ensure_live()?;
        Ok(self.store.delete(key, &self.cancellation).await?)
    }

    pub async fn find_by_alias(&self, alias: &str) -> Result<Option<DictionaryOf<S>>, ManagerError> {
        self.ensure_live()?;
        unwrap_result(self.store.find_by_alias(alias, &self.cancellation).await?)
    }

    pub async fn find_by_id(&self, key: &S::Key) -> Result<Option<DictionaryOf<S>>, ManagerError> {
        self.ensure_live()?;
        unwrap_result(self.store.find_by_id(key, &self.cancellation).await?)
    }

    pub async fn get_all(&self) -> Result<Vec<DictionaryOf<S>>, ManagerError> {
        self.ensure_live()?;
        Ok(unwrap_result(self.store.get_all(&self.cancellation).await?)?.unwrap_or_default())
    }

    pub fn new_dictionary(&self, alias: &str, display: &str) -> Result<DictionaryOf<S>, ManagerError> {
        self.ensure_live()?;
        Ok(DictionaryOf::<S>::new(alias, display))
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

impl<S: DictionaryStore> Drop for DictionaryManager<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
