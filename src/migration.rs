//! Schema installation
//!
//! The warehouse tables and stored procedures ship as two embedded scripts.
//! `build` is idempotent (`IF NOT EXISTS` / `CREATE OR REPLACE`), `clear`
//! drops the whole schema.

use crate::errors::ManagerError;
use config::WarehouseOptions;
use store_object::{StoreError, WarehouseResult};
use tracing::{info, warn};
use warehouse_database::{debug_log, validate_identifier, DatabaseConnector};

const BUILD_SCRIPT: &str = include_str!("../scripts/build.sql");
const CLEAR_SCRIPT: &str = include_str!("../scripts/clear.sql");
const SCHEMA_PLACEHOLDER: &str = "{schema}";

/// Installs or removes the warehouse schema on the connector's database
pub struct DatabaseBuilder<'a> {
    connector: &'a DatabaseConnector,
    options: &'a WarehouseOptions,
}

impl<'a> DatabaseBuilder<'a> {
    pub fn new(connector: &'a DatabaseConnector, options: &'a WarehouseOptions) -> Self {
        Self { connector, options }
    }

    /// Build script with the configured schema substituted
    pub fn build_script(&self) -> Result<String, ManagerError> {
        self.render(BUILD_SCRIPT)
    }

    /// Clear script with the configured schema substituted
    pub fn clear_script(&self) -> Result<String, ManagerError> {
        self.render(CLEAR_SCRIPT)
    }

    /// Create the schema, tables and procedures when missing
    pub async fn build(&self) -> Result<WarehouseResult, ManagerError> {
        let script = self.build_script()?;
        let outcome = self.run(&script).await;
        if outcome.succeeded() {
            info!("Warehouse schema '{}' is ready", self.options.schema);
        }
        Ok(outcome)
    }

    /// Drop the schema with everything in it
    pub async fn clear(&self) -> Result<WarehouseResult, ManagerError> {
        let script = self.clear_script()?;
        let outcome = self.run(&script).await;
        if outcome.succeeded() {
            info!("Warehouse schema '{}' dropped", self.options.schema);
        }
        Ok(outcome)
    }

    fn render(&self, script: &str) -> Result<String, ManagerError> {
        validate_identifier(&self.options.schema).map_err(|error| ManagerError::Argument {
            name: "schema",
            reason: error.to_string(),
        })?;
        Ok(script.replace(SCHEMA_PLACEHOLDER, &self.options.schema))
    }

    async fn run(&self, script: &str) -> WarehouseResult {
        debug_log!("[BUILD_SCHEMA] running {} lines on '{}'", script.lines().count(), self.options.schema);
        let outcome: Result<u64, StoreError> = async {
            let connection = self.connector.open_connection().await?;
            let affected = connection
                .query(script)?
                .timeout(self.options.command_timeout_seconds)
                .run()
                .await?;
            Ok(affected)
        }
        .await;

        match outcome {
            Ok(_) => WarehouseResult::SUCCESS,
            Err(error) => {
                warn!("[BUILD_SCHEMA] {}", error);
                WarehouseResult::from_error(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warehouse_database::fake::FakeDatabase;

    #[test]
    fn test_scripts_use_configured_schema() {
        let connector = FakeDatabase::new().connector();
        let options = WarehouseOptions::default().with_schema("stock");
        let builder = DatabaseBuilder::new(&connector, &options);

        let build = builder.build_script().unwrap();
        assert!(build.contains("CREATE SCHEMA IF NOT EXISTS stock;"));
        assert!(build.contains("FUNCTION stock.create_or_update_entity_type(item JSONB)"));
        assert!(!build.contains(SCHEMA_PLACEHOLDER));
        // jsonb paths are left alone
        assert!(build.contains("'{entity_id}'"));

        assert_eq!(
            builder.clear_script().unwrap().lines().last(),
            Some("DROP SCHEMA IF EXISTS stock CASCADE;")
        );
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let connector = FakeDatabase::new().connector();
        let options = WarehouseOptions::default().with_schema("stock; DROP TABLE x");
        let builder = DatabaseBuilder::new(&connector, &options);

        assert!(matches!(
            builder.build_script(),
            Err(ManagerError::Argument { name: "schema", .. })
        ));
    }

    #[tokio::test]
    async fn test_build_runs_script_once() {
        let database = FakeDatabase::new();
        let connector = database.connector();
        let options = WarehouseOptions::default();
        let builder = DatabaseBuilder::new(&connector, &options);

        let result = builder.build().await.unwrap();

        assert!(result.succeeded());
        let commands = database.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].text.starts_with("-- Warehouse schema"));
        assert_eq!(database.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_driver_failure_is_captured() {
        let database = FakeDatabase::new();
        let connector = database.connector();
        let options = WarehouseOptions::default();
        database.fail(&DatabaseBuilder::new(&connector, &options).clear_script().unwrap(), "permission denied");

        let result = DatabaseBuilder::new(&connector, &options).clear().await.unwrap();

        assert!(!result.succeeded());
        assert!(result.exception().is_some());
    }
}
