//! Core Warehouse functionality
//!
//! `Warehouse` owns the database connector shared by every store and hands
//! out managers backed by the PostgreSQL stores.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::ManagerError;
use crate::manager::{DictionaryManager, TypeManager, WarehouseManager};
use crate::migration::DatabaseBuilder;
use config::{AppConfig, DatabaseConfig, WarehouseOptions};
use store_object::{EntityKey, PostgresDictionaryStore, PostgresEntityStore, PostgresTypeStore, WarehouseResult};
use tracing::{debug, info};
use warehouse_database::DatabaseConnector;

/// Entry point tying a connector to the warehouse options
pub struct Warehouse {
    connector: Arc<DatabaseConnector>,
    options: WarehouseOptions,
}

impl Warehouse {
    /// Create a warehouse over a PostgreSQL database.
    ///
    /// No connection is opened here; each store call opens its own.
    pub fn new(config: DatabaseConfig, options: WarehouseOptions) -> Result<Self, ManagerError> {
        let connector = DatabaseConnector::postgres(config.connection_string())?
            .with_command_timeout(Duration::from_secs(config.command_timeout_seconds));
        info!("Warehouse configured on schema '{}'", options.schema);
        Ok(Self::with_connector(Arc::new(connector), options))
    }

    /// Create a warehouse from a loaded application configuration
    pub fn from_config(config: AppConfig) -> Result<Self, ManagerError> {
        config.validate()?;
        Self::new(config.database, config.warehouse)
    }

    /// Load `warehouse.toml` (or `WAREHOUSE_CONFIG`) and create the warehouse
    pub fn load() -> Result<Self, ManagerError> {
        Self::from_config(AppConfig::load()?)
    }

    pub fn with_connector(connector: Arc<DatabaseConnector>, options: WarehouseOptions) -> Self {
        Self { connector, options }
    }

    pub fn connector(&self) -> &Arc<DatabaseConnector> {
        &self.connector
    }

    pub fn options(&self) -> &WarehouseOptions {
        &self.options
    }

    /// Type manager with no validators registered
    pub fn type_manager<K: EntityKey, A: EntityKey>(&self) -> TypeManager<PostgresTypeStore<K, A>> {
        TypeManager::new(PostgresTypeStore::new(self.connector.clone(), self.options.clone()))
            .with_options(self.options.clone())
    }

    pub fn dictionary_manager<K: EntityKey>(&self) -> DictionaryManager<PostgresDictionaryStore<K>> {
        DictionaryManager::new(PostgresDictionaryStore::new(self.connector.clone(), self.options.clone()))
            .with_options(self.options.clone())
    }

    pub fn entity_manager<K: EntityKey>(&self) -> WarehouseManager<PostgresEntityStore<K>> {
        WarehouseManager::new(PostgresEntityStore::new(self.connector.clone(), self.options.clone()))
            .with_options(self.options.clone())
    }

    pub fn database_builder(&self) -> DatabaseBuilder<'_> {
        DatabaseBuilder::new(&self.connector, &self.options)
    }

    /// Install the warehouse schema when missing
    pub async fn build_schema(&self) -> Result<WarehouseResult, ManagerError> {
        self.database_builder().build().await
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), ManagerError> {
        self.connector.ping().await?;
        Ok(())
    }

    /// Dispose the connector and every connection it still tracks
    pub fn dispose(&self) {
        if !self.connector.is_disposed() {
            debug!("Disposing warehouse after {} connection(s)", self.connector.count());
        }
        self.connector.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use warehouse_database::fake::FakeDatabase;

    fn warehouse(database: &FakeDatabase) -> Warehouse {
        Warehouse::with_connector(
            Arc::new(database.connector()),
            WarehouseOptions::default().with_default_page_size(5),
        )
    }

    #[test]
    fn test_new_does_not_connect() {
        let config = DatabaseConfig::from_url("postgres://warehouse@localhost/warehouse");
        let warehouse = Warehouse::new(config, WarehouseOptions::default()).unwrap();

        assert_eq!(warehouse.connector().count(), 0);
        assert_eq!(warehouse.connector().command_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_managers_share_options() {
        let database = FakeDatabase::new();
        let warehouse = warehouse(&database);

        let types = warehouse.type_manager::<i16, i32>();
        let dictionaries = warehouse.dictionary_manager::<i32>();
        let entities = warehouse.entity_manager::<Uuid>();

        assert_eq!(types.options().default_page_size, 5);
        assert_eq!(dictionaries.options(), warehouse.options());
        assert_eq!(entities.options(), warehouse.options());
    }

    #[test]
    fn test_disposing_a_manager_keeps_the_connector() {
        let database = FakeDatabase::new();
        let warehouse = warehouse(&database);

        let types = warehouse.type_manager::<i16, i32>();
        types.dispose();
        drop(warehouse.entity_manager::<Uuid>());

        assert!(types.is_disposed());
        assert!(!warehouse.connector().is_disposed());

        warehouse.dispose();
        assert!(warehouse.connector().is_disposed());
    }

    #[tokio::test]
    async fn test_health_check_reports_refused_connection() {
        let database = FakeDatabase::new();
        let warehouse = warehouse(&database);

        database.refuse_connections(true);
        assert!(matches!(warehouse.health_check().await, Err(ManagerError::Database(_))));
    }
}
