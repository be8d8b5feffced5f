//! Backend seam for item persistence.
//!
//! `ItemBackend` is the only thing `ItemStore` knows about; implementations
//! translate its calls into a concrete key-value service.

use std::sync::Arc;

use async_trait::async_trait;
use configs::{BackendKind, StoreConfig};
use models::Item;
use tracing::info;

use crate::errors::ServiceError;

pub mod attribute;
pub mod dynamodb;
pub mod expression;
pub mod memory;

pub use dynamodb::DynamoBackend;
pub use expression::{Assignment, UpdateExpression};
pub use memory::MemoryBackend;

/// Key-value operations keyed by the item's `id`.
#[async_trait]
pub trait ItemBackend: Send + Sync {
    async fn get_item(&self, id: &str) -> Result<Option<Item>, ServiceError>;
    /// Every stored item; implementations must exhaust any native paging.
    async fn scan(&self) -> Result<Vec<Item>, ServiceError>;
    /// Create or fully replace the record with `item.id`.
    async fn put_item(&self, item: Item) -> Result<(), ServiceError>;
    /// Apply `expr` to an existing record. Returns `false` without writing
    /// anything when no record with `id` exists.
    async fn update_item(&self, id: &str, expr: &UpdateExpression) -> Result<bool, ServiceError>;
    /// Remove the record; absent ids are not an error.
    async fn delete_item(&self, id: &str) -> Result<(), ServiceError>;
}

/// Build the backend selected by configuration. Called once at startup.
pub async fn connect(cfg: &StoreConfig) -> Result<Arc<dyn ItemBackend>, ServiceError> {
    let backend: Arc<dyn ItemBackend> = match cfg.backend {
        BackendKind::DynamoDb => {
            info!(table = %cfg.table_name, region = %cfg.region, endpoint = ?cfg.endpoint_url, "using dynamodb backend");
            Arc::new(DynamoBackend::from_config(cfg).await)
        }
        BackendKind::Memory => {
            info!("using in-memory backend");
            Arc::new(MemoryBackend::new())
        }
        BackendKind::File => {
            info!(path = %cfg.file_path, "using file backend");
            Arc::new(MemoryBackend::persistent(&cfg.file_path).await?)
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn connect_memory_backend_starts_empty() -> Result<(), anyhow::Error> {
        let cfg = StoreConfig { backend: BackendKind::Memory, ..StoreConfig::default() };
        let backend = connect(&cfg).await?;
        assert!(backend.scan().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn connect_file_backend_persists_across_connections() -> Result<(), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("items_{}.json", uuid::Uuid::new_v4()));
        let cfg = StoreConfig {
            backend: BackendKind::File,
            file_path: path.to_string_lossy().into_owned(),
            ..StoreConfig::default()
        };

        let backend = connect(&cfg).await?;
        let item = Item::from_record(json!({"id": "a", "x": 1}).as_object().cloned().unwrap())?;
        backend.put_item(item.clone()).await?;

        let reopened = connect(&cfg).await?;
        assert_eq!(reopened.get_item("a").await?, Some(item));

        tokio::fs::remove_file(&path).await?;
        Ok(())
    }
}
