use super::{capture, json_parameter, text_parameter, StoreContext};
use crate::errors::{StoreError, StoreResult};
use crate::id_type::EntityKey;
use crate::models::{Entity, WarehouseEntity};
use crate::pagination::WarehousePagination;
use crate::result::WarehouseResult;
use crate::traits::EntityStore;
use async_trait::async_trait;
use config::WarehouseOptions;
use serde::Deserialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;
use warehouse_database::{DatabaseConnector, DbType, Parameter};

/// Page returned by `find_entities`
#[derive(Deserialize)]
#[serde(bound(deserialize = "E: serde::de::DeserializeOwned"))]
struct EntityPage<E> {
    count: usize,
    #[serde(default = "Vec::new")]
    items: Vec<E>,
}

/// Application entities stored in PostgreSQL, one JSON document per entity.
///
/// Entities of every type share one table and are told apart by the alias of
/// their warehouse type. Keys are passed as text; a numeric key that is still
/// unset is generated by the database on first save.
#[derive(Debug)]
pub struct PostgresEntityStore<K = Uuid> {
    context: StoreContext,
    _key: PhantomData<fn() -> K>,
}

impl<K: EntityKey> PostgresEntityStore<K> {
    pub fn new(connector: Arc<DatabaseConnector>, options: WarehouseOptions) -> Self {
        Self {
            context: StoreContext::new("PostgresEntityStore", connector, options),
            _key: PhantomData,
        }
    }

    fn identify<E: WarehouseEntity<Key = K>>(key: &K) -> Vec<Parameter> {
        vec![text_parameter("entity_type", E::type_alias()), id_parameter(key)]
    }

    async fn persist<E: WarehouseEntity<Key = K>>(
        &self,
        procedure: &'static str,
        entity: &mut E,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult> {
        let mut parameters = Self::identify::<E>(entity.key());
        parameters.push(json_parameter("item", &*entity)?);

        let stored: Option<Entity<K>> = self.context.call(procedure, parameters, cancel).await?;
        let stored = stored.ok_or_else(|| {
            StoreError::NotFound(format!("{} entity {}", E::type_alias(), entity.key()))
        })?;
        entity.entity_mut().sync_from(&stored)?;

        debug!("[{}] {} {}", procedure, E::type_alias(), entity.key());
        Ok(WarehouseResult::SUCCESS)
    }

    async fn page<E: WarehouseEntity<Key = K>>(
        &self,
        page: usize,
        size: usize,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<WarehousePagination<E>>> {
        let parameters = vec![
            text_parameter("entity_type", E::type_alias()),
            Parameter::new("page_number", Value::from(page)).with_db_type(DbType::Integer),
            Parameter::new("page_size", Value::from(size)).with_db_type(DbType::Integer),
        ];
        let found: Option<EntityPage<E>> = self.context.call("find_entities", parameters, cancel).await?;
        let found = found.unwrap_or(EntityPage {
            count: 0,
            items: Vec::new(),
        });
        let pagination = WarehousePagination::new(found.items, found.count, size, page)?;
        Ok(WarehouseResult::success(pagination))
    }
}

/// Key as text; NULL asks the database to generate one
fn id_parameter<K: EntityKey>(key: &K) -> Parameter {
    let value = if key.is_unset() {
        Value::Null
    } else {
        Value::String(key.universal_id().to_string_fast())
    };
    Parameter::new("entity_id", value).with_db_type(DbType::String)
}

#[async_trait]
impl<K: EntityKey> EntityStore for PostgresEntityStore<K> {
    type Key = K;

    async fn create<E>(&self, entity: &mut E, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = K>,
    {
        self.context.ensure_live()?;
        Ok(capture("CREATE_ENTITY", self.persist("create_entity", entity, cancel).await))
    }

    async fn update<E>(&self, entity: &mut E, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = K>,
    {
        self.context.ensure_live()?;
        if entity.key().is_unset() {
            return Err(StoreError::argument("entity", "an entity must be created before it is updated"));
        }
        entity.entity_mut().touch();
        Ok(capture("UPDATE_ENTITY", self.persist("update_entity", entity, cancel).await))
    }

    async fn save<E>(&self, entity: &mut E, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = K>,
    {
        self.context.ensure_live()?;
        if !entity.key().is_unset() {
            entity.entity_mut().touch();
        }
        Ok(capture("SAVE_ENTITY", self.persist("save_entity", entity, cancel).await))
    }

    async fn delete<E>(&self, key: &K, cancel: &CancellationToken) -> StoreResult<WarehouseResult>
    where
        E: WarehouseEntity<Key = K>,
    {
        self.context.ensure_live()?;
        if key.is_unset() {
            return Err(StoreError::ArgumentNull("key"));
        }
        let outcome: StoreResult<WarehouseResult> = async {
            self.context
                .run("delete_entity", Self::identify::<E>(key), cancel)
                .await?;
            Ok(WarehouseResult::SUCCESS)
        }
        .await;
        Ok(capture("DELETE_ENTITY", outcome))
    }

    async fn find_by_id<E>(&self, key: &K, cancel: &CancellationToken) -> StoreResult<WarehouseResult<E>>
    where
        E: WarehouseEntity<Key = K>,
    {
        self.context.ensure_live()?;
        let outcome: StoreResult<WarehouseResult<E>> = async {
            let found = self
                .context
                .call("find_entity_by_id", Self::identify::<E>(key), cancel)
                .await?;
            Ok(WarehouseResult::found(found))
        }
        .await;
        Ok(capture("FIND_ENTITY_BY_ID", outcome))
    }

    async fn find<E>(
        &self,
        page: usize,
        size: usize,
        cancel: &CancellationToken,
    ) -> StoreResult<WarehouseResult<WarehousePagination<E>>>
    where
        E: WarehouseEntity<Key = K>,
    {
        self.context.ensure_live()?;
        if page < 1 {
            return Err(StoreError::argument("page", "page numbers start at 1"));
        }
        if size < 1 {
            return Err(StoreError::argument("size", "page size must be at least 1"));
        }
        Ok(capture("FIND_ENTITIES", self.page(page, size, cancel).await))
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
    use serde::Serialize;
    use serde_json::json;
    use warehouse_database::fake::FakeDatabase;
    use warehouse_database::RowSet;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Aircraft {
        #[serde(flatten)]
        entity: Entity,
        code: String,
    }

    impl WarehouseEntity for Aircraft {
        type Key = Uuid;

        fn type_alias() -> &'static str {
            "AIRCRAFT"
        }

        fn entity(&self) -> &Entity {
            &self.entity
        }

        fn entity_mut(&mut self) -> &mut Entity {
            &mut self.entity
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Airport {
        #[serde(flatten)]
        entity: Entity<i64>,
        iata: String,
    }

    impl WarehouseEntity for Airport {
        type Key = i64;

        fn type_alias() -> &'static str {
            "AIRPORT"
        }

        fn entity(&self) -> &Entity<i64> {
            &self.entity
        }

        fn entity_mut(&mut self) -> &mut Entity<i64> {
            &mut self.entity
        }
    }

    fn echo(database: &FakeDatabase, procedure: &str) {
        let column = procedure.to_string();
        database.on(&format!("warehouse.{}", procedure), move |command| {
            let mut item = command.parameter("item").map(|p| p.value.clone()).unwrap_or(Value::Null);
            if item["entity_id"] == json!(0) {
                item["entity_id"] = json!(31);
            }
            Ok(RowSet::scalar(&column, item))
        });
    }

    fn uuid_store(database: &FakeDatabase) -> PostgresEntityStore {
        PostgresEntityStore::new(Arc::new(database.connector()), WarehouseOptions::default())
    }

    #[tokio::test]
    async fn test_save_sends_type_key_and_document() {
        let database = FakeDatabase::new();
        echo(&database, "save_entity");
        let store = uuid_store(&database);
        let mut aircraft = Aircraft {
            code: "A320".to_string(),
            ..Default::default()
        };
        let key = *aircraft.key();

        let result = store.save(&mut aircraft, &CancellationToken::new()).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(*aircraft.key(), key);
        let command = &database.commands()[0];
        assert_eq!(
            command.to_sql().unwrap(),
            "SELECT * FROM warehouse.save_entity(entity_type => $1::text, entity_id => $2::text, item => $3::jsonb)"
        );
        assert_eq!(command.parameter("entity_type").unwrap().value, json!("AIRCRAFT"));
        assert_eq!(command.parameter("entity_id").unwrap().value, json!(key.to_string()));
        assert_eq!(command.parameter("item").unwrap().value["code"], "A320");
    }

    #[tokio::test]
    async fn test_numeric_key_is_generated_by_the_database() {
        let database = FakeDatabase::new();
        echo(&database, "create_entity");
        let store: PostgresEntityStore<i64> =
            PostgresEntityStore::new(Arc::new(database.connector()), WarehouseOptions::default());
        let mut airport = Airport::default();

        let result = store.create(&mut airport, &CancellationToken::new()).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(*airport.key(), 31);
        assert!(database.commands()[0].parameter("entity_id").unwrap().value.is_null());
    }

    #[tokio::test]
    async fn test_update_of_missing_entity_fails() {
        let database = FakeDatabase::new();
        database.on("warehouse.update_entity", |_| Ok(RowSet::scalar("update_entity", Value::Null)));
        let store = uuid_store(&database);

        let result = store.update(&mut Aircraft::default(), &CancellationToken::new()).await.unwrap();

        assert!(!result.succeeded());
        assert!(matches!(result.exception().map(|e| e.as_ref()), Some(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_returns_a_page() {
        let database = FakeDatabase::new();
        let first = Aircraft::default();
        let document = serde_json::to_value(&first).unwrap();
        database.on("warehouse.find_entities", move |_| {
            Ok(RowSet::scalar("find_entities", json!({"count": 3, "items": [document.clone()]})))
        });
        let store = uuid_store(&database);

        let result = store.find::<Aircraft>(2, 2, &CancellationToken::new()).await.unwrap();

        let page = result.value().unwrap();
        assert_eq!(page.count(), 3);
        assert_eq!(page.pages(), 2);
        assert!(page.has_previous());
        assert_eq!(page[0].key(), first.key());
    }

    #[tokio::test]
    async fn test_inconsistent_page_is_a_failed_result() {
        let database = FakeDatabase::new();
        database.on("warehouse.find_entities", |_| {
            Ok(RowSet::scalar("find_entities", json!({"count": 0, "items": []})))
        });
        let store = uuid_store(&database);
        let cancel = CancellationToken::new();

        let result = store.find::<Aircraft>(4, 10, &cancel).await.unwrap();
        assert!(matches!(
            result.exception().map(|e| e.as_ref()),
            Some(StoreError::Pagination(_))
        ));

        assert!(matches!(
            store.find::<Aircraft>(0, 10, &cancel).await,
            Err(StoreError::Argument { name: "page", .. })
        ));
    }

    #[tokio::test]
    async fn test_find_missing_and_delete() {
        let database = FakeDatabase::new();
        let store = uuid_store(&database);
        let cancel = CancellationToken::new();
        let aircraft = Aircraft::default();

        let found = store.find_by_id::<Aircraft>(aircraft.key(), &cancel).await.unwrap();
        assert!(found.succeeded());
        assert!(found.value().is_none());

        let deleted = store.delete_entity(&aircraft, &cancel).await.unwrap();
        assert!(deleted.succeeded());
        assert_eq!(database.calls("warehouse.delete_entity"), 1);
    }

    #[tokio::test]
    async fn test_cancelled_call_is_captured() {
        let database = FakeDatabase::new();
        let store = uuid_store(&database);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = store.find_by_id::<Aircraft>(&Uuid::new_v4(), &cancel).await.unwrap();

        assert!(!result.succeeded());
        assert!(result.exception().unwrap().is_cancelled());
    }
}
