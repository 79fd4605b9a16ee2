use super::{capture, json_parameter, key_parameter, require, text_parameter, StoreContext};
use crate::errors::{StoreError, StoreResult};
use crate::id_type::EntityKey;
use crate::models::WarehouseType;
use crate::result::WarehouseResult;
use crate::traits::{TypeOf, TypeStore};
use async_trait::async_trait;
use config::WarehouseOptions;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use warehouse_database::{debug_log, DatabaseConnector};

/// Warehouse types stored in PostgreSQL
#[derive(Debug)]
pub struct PostgresTypeStore<K = i16, A = i32> {
    context: StoreContext,
    _keys: PhantomData<fn() -> (K, A)>,
}

impl<K: EntityKey, A: EntityKey> PostgresTypeStore<K, A> {
    pub fn new(connector: Arc<DatabaseConnector>, options: WarehouseOptions) -> Self {
        Self {
            context: StoreContext::new("PostgresTypeStore", connector, options),
            _keys: PhantomData,
        }
    }

    /// Persist `item` and copy the keys assigned by the database back onto it
    async fn persist(&self, item: &mut WarehouseType<K, A>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        let stored: Option<WarehouseType<K, A>> = self
            .context
            .call(
                "create_or_update_entity_type",
                vec![json_parameter("item", &*item)?],
                cancel,
            )
            .await?;
        let stored = stored.ok_or_else(|| StoreError::NotFound(format!("entity type '{}'", item.alias)))?;

        sync_keys(item, &stored)?;
        debug!(
            "[SAVE_TYPE] {} stored with key {} and {} attributes",
            item.alias,
            item.key(),
            item.attributes.len()
        );
        Ok(WarehouseResult::SUCCESS)
    }

    async fn find_one(
        &self,
        procedure: &'static str,
        parameter: warehouse_database::Parameter,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<WarehouseType<K, A>>> {
        let found = self.context.call(procedure, vec![parameter], cancel).await?;
        Ok(WarehouseResult::found(found))
    }
}

/// Copy the type key and every attribute key from the stored type.
///
/// The stored attributes are matched by alias and their keys win over the
/// ones held in memory: an attribute the database re-created comes back
/// under a new key.
fn sync_keys<K: EntityKey, A: EntityKey>(item: &mut WarehouseType<K, A>, stored: &WarehouseType<K, A>) -> StoreResult<()> {
    item.assign_key(stored.key().clone())?;
    for attribute in item.attributes.iter_mut() {
        let stored_attribute = stored.attributes.get(attribute.alias()).ok_or_else(|| {
            StoreError::NotFound(format!("attribute '{}' of entity type '{}'", attribute.alias(), stored.alias))
        })?;
        if attribute.key() != stored_attribute.key() {
            debug_log!(
                "[SAVE_TYPE] attribute {} key {} -> {}",
                attribute.alias(),
                attribute.key(),
                stored_attribute.key()
            );
            attribute.replace_key(stored_attribute.key().clone());
        }
    }
    Ok(())
}

#[async_trait]
impl<K: EntityKey, A: EntityKey> TypeStore for PostgresTypeStore<K, A> {
    type Key = K;
    type AttributeKey = A;

    async fn create(&self, item: &mut TypeOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        self.context.ensure_live()?;
        require("alias", &item.alias)?;
        if !item.key().is_unset() {
            return Err(StoreError::argument("item", "a new entity type cannot have a key"));
        }
        Ok(capture("CREATE_TYPE", self.persist(item, cancel).await))
    }

    async fn update(&self, item: &mut TypeOf<Self>, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        self.context.ensure_live()?;
        require("alias", &item.alias)?;
        if item.key().is_unset() {
            return Err(StoreError::argument("item", "an entity type must be created before it is updated"));
        }
        Ok(capture("UPDATE_TYPE", self.persist(item, cancel).await))
    }

    async fn delete(&self, key: &K, cancel: &CancellationToken) -> StoreResult<WarehouseResult> {
        self.context.ensure_live()?;
        let outcome: StoreResult<WarehouseResult> = async {
            self.context
                .run("delete_entity_type", vec![key_parameter("key", key)?], cancel)
                .await?;
            Ok(WarehouseResult::SUCCESS)
        }
        .await;
        Ok(capture("DELETE_TYPE", outcome))
    }

    async fn find_by_alias(&self, alias: &str, cancel: &CancellationToken) -> StoreResult<WarehouseResult<TypeOf<Self>>> {
        self.context.ensure_live()?;
        require("alias", alias)?;
        Ok(capture(
            "FIND_TYPE_BY_ALIAS",
            self.find_one("find_entity_type_by_alias", text_parameter("alias", alias), cancel)
                .await,
        ))
    }

    async fn find_by_class(&self, class: &str, cancel: &CancellationToken) -> StoreResult<WarehouseResult<TypeOf<Self>>> {
        self.context.ensure_live()?;
        require("class", class)?;
        Ok(capture(
            "FIND_TYPE_BY_CLASS",
            self.find_one("find_entity_type_by_class", text_parameter("class", class), cancel)
                .await,
        ))
    }

    async fn find_by_id(&self, key: &K, cancel: &CancellationToken) -> StoreResult<WarehouseResult<TypeOf<Self>>> {
        self.context.ensure_live()?;
        let outcome: StoreResult<WarehouseResult<TypeOf<Self>>> = async {
            self.find_one("find_entity_type_by_id", key_parameter("entity_type_id", key)?, cancel)
                .await
        }
        .await;
        Ok(capture("FIND_TYPE_BY_ID", outcome))
    }

    async fn get_all(&self, cancel: &CancellationToken) -> StoreResult<WarehouseResult<Vec<TypeOf<Self>>>> {
        self.context.ensure_live()?;
        let outcome: StoreResult<WarehouseResult<Vec<TypeOf<Self>>>> = async {
            let types: Option<Vec<WarehouseType<K, A>>> =
                self.context.call("get_all_entity_types", Vec::new(), cancel).await?;
            Ok(WarehouseResult::success(types.unwrap_or_default()))
        }
        .await;
        Ok(capture("GET_ALL_TYPES", outcome))
    }

    fn dispose(&self) {
        self.context.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.context.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use type_mapping::AttributeType;
    use warehouse_database::fake::FakeDatabase;
    use warehouse_database::{DatabaseError, RowSet};

    const SAVE: &str = "warehouse.create_or_update_entity_type";

    fn store(database: &FakeDatabase) -> PostgresTypeStore {
        PostgresTypeStore::new(Arc::new(database.connector()), WarehouseOptions::default())
    }

    fn aircraft() -> WarehouseType {
        let mut aircraft = WarehouseType::new("Aircraft", "AIRCRAFT");
        for (name, alias, kind) in [
            ("Code", "AIRCRAFT_CODE", AttributeType::String),
            ("Model", "AIRCRAFT_MODEL", AttributeType::String),
            ("Range", "AIRCRAFT_RANGE", AttributeType::Integer),
        ] {
            aircraft.attributes.add_new(name, alias, kind, None).unwrap();
        }
        aircraft
    }

    /// Echo the submitted type with keys assigned in reverse attribute order
    fn assign_keys(database: &FakeDatabase) {
        database.on(SAVE, |command| {
            let mut item = command.parameter("item").map(|p| p.value.clone()).unwrap_or(Value::Null);
            item["entity_type_id"] = json!(7);
            if let Some(attributes) = item["attributes"].as_array_mut() {
                attributes.reverse();
                for (index, attribute) in attributes.iter_mut().enumerate() {
                    attribute["attribute_id"] = json!(100 + index);
                }
            }
            Ok(RowSet::scalar("create_or_update_entity_type", item))
        });
    }

    #[tokio::test]
    async fn test_create_assigns_keys_by_alias() {
        let database = FakeDatabase::new();
        assign_keys(&database);
        let store = store(&database);
        let mut aircraft = aircraft();

        let result = store.create(&mut aircraft, &CancellationToken::new()).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(*aircraft.key(), 7);
        assert_eq!(*aircraft.attributes["AIRCRAFT_RANGE"].key(), 100);
        assert_eq!(*aircraft.attributes["AIRCRAFT_MODEL"].key(), 101);
        assert_eq!(*aircraft.attributes["AIRCRAFT_CODE"].key(), 102);
        assert_eq!(database.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_update_takes_keys_of_renamed_attributes() {
        let database = FakeDatabase::new();
        database.on(SAVE, |command| {
            let mut item = command.parameter("item").map(|p| p.value.clone()).unwrap_or(Value::Null);
            item["attributes"][0]["attribute_id"] = json!(102);
            Ok(RowSet::scalar("create_or_update_entity_type", item))
        });
        let store = store(&database);
        let mut aircraft: WarehouseType = serde_json::from_value(json!({
            "entity_type_id": 7, "alias": "AIRCRAFT", "name": "Aircraft",
            "attributes": [{"attribute_id": 101, "attribute_type_id": 1, "alias": "A", "name": "A"}]
        }))
        .unwrap();

        aircraft.attributes.rename("A", "B").unwrap();
        let result = store.update(&mut aircraft, &CancellationToken::new()).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(*aircraft.key(), 7);
        assert!(!aircraft.attributes.contains("A"));
        assert_eq!(*aircraft.attributes["B"].key(), 102);

        // the previous key goes out so the database can keep the row
        let commands = database.commands();
        let sent = &commands[0].parameter("item").unwrap().value;
        assert_eq!(sent["attributes"][0]["attribute_id"], 101);
        assert_eq!(sent["attributes"][0]["alias"], "B");
    }

    #[tokio::test]
    async fn test_sends_item_as_jsonb() {
        let database = FakeDatabase::new();
        assign_keys(&database);
        let store = store(&database);

        store.create(&mut aircraft(), &CancellationToken::new()).await.unwrap();

        let commands = database.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0].to_sql().unwrap(),
            "SELECT * FROM warehouse.create_or_update_entity_type(item => $1::jsonb)"
        );
        assert_eq!(commands[0].parameter("item").unwrap().value["alias"], "AIRCRAFT");
    }

    #[tokio::test]
    async fn test_missing_attribute_in_response_fails() {
        let database = FakeDatabase::new();
        database.on(SAVE, |_| {
            Ok(RowSet::scalar(
                "create_or_update_entity_type",
                json!({"entity_type_id": 7, "alias": "AIRCRAFT", "name": "Aircraft", "attributes": []}),
            ))
        });
        let store = store(&database);

        let result = store.create(&mut aircraft(), &CancellationToken::new()).await.unwrap();

        assert!(!result.succeeded());
        assert!(matches!(result.exception().map(|e| e.as_ref()), Some(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_argument_errors_are_returned_before_io() {
        let database = FakeDatabase::new();
        let store = store(&database);
        let cancel = CancellationToken::new();

        let mut keyed: WarehouseType = serde_json::from_value(json!({
            "entity_type_id": 3, "alias": "KEYED", "name": "Keyed"
        }))
        .unwrap();
        assert!(matches!(
            store.create(&mut keyed, &cancel).await,
            Err(StoreError::Argument { .. })
        ));
        assert!(matches!(
            store.update(&mut aircraft(), &cancel).await,
            Err(StoreError::Argument { .. })
        ));
        assert!(matches!(
            store.find_by_alias("", &cancel).await,
            Err(StoreError::ArgumentNull("alias"))
        ));
        assert!(database.commands().is_empty());
    }

    #[tokio::test]
    async fn test_driver_failure_is_captured() {
        let database = FakeDatabase::new();
        database.fail("warehouse.find_entity_type_by_alias", "relation does not exist");
        let store = store(&database);

        let result = store.find_by_alias("AIRCRAFT", &CancellationToken::new()).await.unwrap();

        assert!(!result.succeeded());
        assert!(matches!(
            result.exception().map(|e| e.as_ref()),
            Some(StoreError::Database(DatabaseError::Driver(_)))
        ));
    }

    #[tokio::test]
    async fn test_find_missing_succeeds_without_value() {
        let database = FakeDatabase::new();
        database.on("warehouse.find_entity_type_by_id", |_| {
            Ok(RowSet::scalar("find_entity_type_by_id", Value::Null))
        });
        let store = store(&database);

        let result = store.find_by_id(&42, &CancellationToken::new()).await.unwrap();

        assert!(result.succeeded());
        assert!(result.value().is_none());
    }

    #[tokio::test]
    async fn test_get_all_and_save() {
        let database = FakeDatabase::new();
        assign_keys(&database);
        database.on("warehouse.get_all_entity_types", |_| {
            Ok(RowSet::scalar(
                "get_all_entity_types",
                json!([{"entity_type_id": 7, "alias": "AIRCRAFT", "name": "Aircraft"}]),
            ))
        });
        let store = store(&database);
        let cancel = CancellationToken::new();

        let mut aircraft = aircraft();
        assert!(store.save(&mut aircraft, &cancel).await.unwrap().succeeded());
        assert!(store.save(&mut aircraft, &cancel).await.unwrap().succeeded());
        assert_eq!(database.calls(SAVE), 2);

        let all = store.get_all(&cancel).await.unwrap();
        assert_eq!(all.value().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_disposed_store_rejects_calls() {
        let database = FakeDatabase::new();
        let store = store(&database);

        store.dispose();
        store.dispose();

        assert!(store.is_disposed());
        assert!(matches!(
            store.get_all(&CancellationToken::new()).await,
            Err(StoreError::Disposed(_))
        ));
    }
}
