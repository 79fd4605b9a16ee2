use super::{capture, json_parameter, key_parameter, require, text_parameter, StoreContext};
use crate::errors::{StoreError, StoreResult};
use crate::id_type::EntityKey;
use crate::models::{DictionaryItems, WarehouseDictionary};
use crate::result::WarehouseResult;
use crate::traits::{DictionaryOf, DictionaryStore};
use async_trait::async_trait;
use config::WarehouseOptions;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warehouse_database::{debug_log, DatabaseConnector};

/// Dictionaries stored in PostgreSQL
#[derive(Debug)]
pub struct PostgresDictionaryStore<K = i32> {
    context: StoreContext,
    _key: PhantomData<fn() -> K>,
}

impl<K: EntityKey> PostgresDictionaryStore<K> {
    pub fn new(connector: Arc<DatabaseConnector>, options: WarehouseOptions) -> Self {
        Self {
            context: StoreContext::new("PostgresDictionaryStore", connector, options),
            _key: PhantomData,
        }
    }

    async fn persist(&self, item: &mut WarehouseDictionary<K>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        let stored: Option<WarehouseDictionary<K>> = self
            .context
            .call("create_or_update_dictionary", vec![json_parameter("item", &*item)?], cancel)
            .await?;
        let stored = stored.ok_or_else(|| StoreError::NotFound(format!("dictionary '{}'", item.alias)))?;

        item.assign_key(stored.key().clone())?;
        sync_items(&mut item.items, &stored.items)?;
        Ok(WarehouseResult::SUCCESS)
    }

    async fn find_one(
        &self,
        procedure: &'static str,
        parameter: warehouse_database::Parameter,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<WarehouseDictionary<K>>> {
        let found = self.context.call(procedure, vec![parameter], cancel).await?;
        Ok(WarehouseResult::found(found))
    }
}

/// Copy value keys level by level, matching by alias; stored keys win
fn sync_items<K: EntityKey>(items: &mut DictionaryItems<K>, stored: &DictionaryItems<K>) -> StoreResult<()> {
    for value in items.iter_mut() {
        let stored_value = stored
            .get(value.alias())
            .ok_or_else(|| StoreError::NotFound(format!("dictionary value '{}'", value.alias())))?;
        if value.key() != stored_value.key() {
            debug_log!("[SAVE_DICTIONARY] value {} key {} -> {}", value.alias(), value.key(), stored_value.key());
            value.replace_key(stored_value.key().clone());
        }
        sync_items(&mut value.items, &stored_value.items)?;
    }
    Ok(())
}

#[async_trait]
impl<K: EntityKey> DictionaryStore for PostgresDictionaryStore<K> {
    type Key = K;

    async fn create(&self, item: &mut DictionaryOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        self.context.ensure_live()?;
        require("alias", &item.alias)?;
        if !item.key().is_unset() {
            return Err(StoreError::argument("item", "a new dictionary cannot have a key"));
        }
        Ok(capture("CREATE_DICTIONARY", self.persist(item, cancel).await))
    }

    async fn update(&self, item: &mut DictionaryOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        self.context.ensure_live()?;
        require("alias", &item.alias)?;
        if item.key().is_unset() {
            return Err(StoreError::argument("item", "a dictionary must be created before it is updated"));
        }
        Ok(capture("UPDATE_DICTIONARY", self.persist(item, cancel).await))
    }

    async fn delete(&self, key: &K, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        self.context.ensure_live()?;
        let outcome: StoreResult<WarehouseResult> = async {
            self.context
                .run("delete_dictionary", vec![key_parameter("dictionary_id", key)?], cancel)
                .await?;
            Ok(WarehouseResult::SUCCESS)
        }
        .await;
        Ok(capture("DELETE_DICTIONARY", outcome))
    }

    async fn find_by_alias(
        &self,
        alias: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<DictionaryOf<Self>>> {
        self.context.ensure_live()?;
        require("alias", alias)?;
        Ok(capture(
            "FIND_DICTIONARY_BY_ALIAS",
            self.find_one("find_dictionary_by_alias", text_parameter("alias", alias), cancel)
                .await,
        ))
    }

    async fn find_by_id(
        &self,
        key: &K,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<DictionaryOf<Self>>> {
        self.context.ensure_live()?;
        let outcome: StoreResult<WarehouseResult<DictionaryOf<Self>>> = async {
            self.find_one("find_dictionary_by_id", key_parameter("dictionary_id", key)?, cancel)
                .await
        }
        .await;
        Ok(capture("FIND_DICTIONARY_BY_ID", outcome))
    }

    async fn get_all(&self, cancel: &CancellationToken) -> StoreResult<WarehouseResult<Vec<DictionaryOf<Self>>>> {
        self.context.ensure_live()?;
        let outcome: StoreResult<WarehouseResult<Vec<DictionaryOf<Self>>>> = async {
            let dictionaries: Option<Vec<WarehouseDictionary<K>>> =
                self.context.call("get_all_dictionaries", Vec::new(), cancel).await?;
            Ok(WarehouseResult::success(dictionaries.unwrap_or_default()))
        }
        .await;
        Ok(capture("GET_ALL_DICTIONARIES", outcome))
    }

    fn dispose(&self) {
        self.context.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.context.is_disposed()
    }
}
