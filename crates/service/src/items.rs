use std::sync::Arc;

use models::{item::validate_id, Item, Patch};
use tracing::debug;

use crate::errors::ServiceError;
use crate::store::{ItemBackend, UpdateExpression};

/// Item CRUD on top of an injected backend.
///
/// Cheap to clone; all clones share the same backend handle.
#[derive(Clone)]
pub struct ItemStore {
    backend: Arc<dyn ItemBackend>,
}

impl ItemStore {
    pub fn new(backend: Arc<dyn ItemBackend>) -> Self {
        Self { backend }
    }

    /// `Ok(None)` when no item has this id.
    pub async fn get(&self, id: &str) -> Result<Option<Item>, ServiceError> {
        self.backend.get_item(id).await
    }

    /// Complete, unordered set of items.
    pub async fn list(&self) -> Result<Vec<Item>, ServiceError> {
        self.backend.scan().await
    }

    /// Create or fully replace; returns the item as stored.
    pub async fn put(&self, item: Item) -> Result<Item, ServiceError> {
        item.validate()?;
        self.backend.put_item(item.clone()).await?;
        debug!(id = %item.id, "item stored");
        Ok(item)
    }

    /// Set every field in `patch` on an existing item and return the result.
    ///
    /// Absent ids fail with `NotFound`; nothing is written for them.
    pub async fn update(&self, id: &str, patch: Patch) -> Result<Item, ServiceError> {
        if validate_id(id).is_err() {
            return Err(ServiceError::not_found("item"));
        }
        if !patch.is_empty() {
            let expr = UpdateExpression::from_patch(&patch);
            debug!(%id, expression = %expr.expression(), "updating item");
            if !self.backend.update_item(id, &expr).await? {
                return Err(ServiceError::not_found("item"));
            }
        }
        self.backend
            .get_item(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("item"))
    }

    /// Remove the item; succeeds whether or not it existed.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.backend.delete_item(id).await
    }
}
