use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use models::{item::ID_FIELD, Item};
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use super::{ItemBackend, UpdateExpression};
use crate::errors::ServiceError;

/// Process-local backend: a map guarded by an async `RwLock`.
///
/// With a file path it snapshots the whole map as JSON after every mutation,
/// which is enough for local development without a DynamoDB endpoint. A
/// mutation whose snapshot cannot be written is rolled back, so the map never
/// shows state that is not on disk.
pub struct MemoryBackend {
    inner: RwLock<HashMap<String, Item>>,
    file_path: Option<PathBuf>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_error(path: &Path, err: impl std::fmt::Display) -> ServiceError {
    ServiceError::Backend(format!("{}: {err}", path.display()))
}

/// `items.json` -> `items.json.tmp`, next to the snapshot so `rename` stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self { inner: RwLock::new(HashMap::new()), file_path: None }
    }

    /// Load the JSON snapshot at `path`, creating an empty one only when the
    /// file does not exist. Any other I/O or parse failure is an error.
    pub async fn persistent<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| snapshot_error(parent, e))?;
        }

        let map: HashMap<String, Item> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| snapshot_error(&file_path, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %file_path.display(), "no snapshot yet, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(snapshot_error(&file_path, e)),
        };

        let backend = Self { inner: RwLock::new(HashMap::new()), file_path: Some(file_path) };
        backend.save(&map).await?;
        *backend.inner.write().await = map;
        Ok(backend)
    }

    /// Write the snapshot to a temp file and rename it over the old one.
    async fn save(&self, map: &HashMap<String, Item>) -> Result<(), ServiceError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let data = serde_json::to_vec(map).map_err(ServiceError::backend)?;
        let tmp = temp_path(path);
        fs::write(&tmp, data).await.map_err(|e| snapshot_error(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, path).await {
            fs::remove_file(&tmp).await.ok();
            return Err(snapshot_error(path, e));
        }
        Ok(())
    }

    /// Persist `map` after `id` changed; if that fails put `previous` back.
    async fn commit(
        &self,
        map: &mut HashMap<String, Item>,
        id: &str,
        previous: Option<Item>,
    ) -> Result<(), ServiceError> {
        if let Err(e) = self.save(map).await {
            warn!(%id, error = %e, "snapshot write failed, rolling back");
            match previous {
                Some(item) => {
                    map.insert(id.to_string(), item);
                }
                None => {
                    map.remove(id);
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl ItemBackend for MemoryBackend {
    async fn get_item(&self, id: &str) -> Result<Option<Item>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.get(id).cloned())
    }

    async fn scan(&self) -> Result<Vec<Item>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.values().cloned().collect())
    }

    async fn put_item(&self, item: Item) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let id = item.id.clone();
        let previous = map.insert(id.clone(), item);
        self.commit(&mut map, &id, previous).await
    }

    async fn update_item(&self, id: &str, expr: &UpdateExpression) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        let Some(existing) = map.get(id) else {
            debug!(%id, "update of absent id");
            return Ok(false);
        };

        let mut record = existing.clone().into_record();
        for a in expr.assignments() {
            if a.field == ID_FIELD {
                return Err(ServiceError::Backend(format!("cannot update key attribute {ID_FIELD}")));
            }
            record.insert(a.field.clone(), a.value.clone());
        }
        let updated = Item::from_record(record)?;
        let previous = map.insert(id.to_string(), updated);
        self.commit(&mut map, id, previous).await?;
        Ok(true)
    }

    async fn delete_item(&self, id: &str) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        if let Some(previous) = map.remove(id) {
            self.commit(&mut map, id, Some(previous)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(v: serde_json::Value) -> Item {
        Item::from_record(v.as_object().cloned().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn update_sets_only_named_fields() {
        let backend = MemoryBackend::new();
        backend.put_item(item(json!({"id": "a", "x": 1, "y": 2}))).await.unwrap();

        let expr = UpdateExpression::builder().set("y", json!(9)).set("z", json!("new")).build();
        assert!(backend.update_item("a", &expr).await.unwrap());

        let stored = backend.get_item("a").await.unwrap().unwrap();
        assert_eq!(serde_json::to_value(&stored).unwrap(), json!({"id": "a", "x": 1, "y": 9, "z": "new"}));
    }

    #[tokio::test]
    async fn update_of_absent_id_writes_nothing() {
        let backend = MemoryBackend::new();
        let expr = UpdateExpression::builder().set("y", json!(9)).build();
        assert!(!backend.update_item("missing", &expr).await.unwrap());
        assert!(backend.get_item("missing").await.unwrap().is_none());
        assert!(backend.scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_key_attribute_is_rejected() {
        let backend = MemoryBackend::new();
        backend.put_item(item(json!({"id": "a"}))).await.unwrap();
        let expr = UpdateExpression::builder().set("id", json!("b")).build();
        assert!(matches!(backend.update_item("a", &expr).await, Err(ServiceError::Backend(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.put_item(item(json!({"id": "a"}))).await.unwrap();
        backend.delete_item("a").await.unwrap();
        backend.delete_item("a").await.unwrap();
        assert!(backend.get_item("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_snapshot_survives_reload() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("items_{}.json", uuid::Uuid::new_v4()));
        let backend = MemoryBackend::persistent(&tmp).await?;
        assert!(backend.scan().await?.is_empty());

        backend.put_item(item(json!({"id": "a", "x": 1}))).await?;
        backend.put_item(item(json!({"id": "b"}))).await?;
        backend.update_item("a", &UpdateExpression::builder().set("x", json!(2)).build()).await?;
        backend.delete_item("b").await?;

        let reloaded = MemoryBackend::persistent(&tmp).await?;
        let items = reloaded.scan().await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].attributes.get("x"), Some(&json!(2)));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_backend_error() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("items_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, b"not json").await?;
        assert!(matches!(MemoryBackend::persistent(&tmp).await, Err(ServiceError::Backend(_))));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    /// Swap the snapshot file for a directory so every later rename fails.
    async fn break_snapshot(path: &std::path::Path) -> Result<(), anyhow::Error> {
        tokio::fs::remove_file(path).await?;
        tokio::fs::create_dir(path).await?;
        Ok(())
    }

    #[tokio::test]
    async fn failed_snapshot_write_rolls_back_every_mutation() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("items_{}.json", uuid::Uuid::new_v4()));
        let backend = MemoryBackend::persistent(&tmp).await?;
        backend.put_item(item(json!({"id": "a", "x": 1}))).await?;
        break_snapshot(&tmp).await?;

        assert!(matches!(backend.put_item(item(json!({"id": "b"}))).await, Err(ServiceError::Backend(_))));
        assert!(backend.get_item("b").await?.is_none());

        assert!(matches!(
            backend.put_item(item(json!({"id": "a", "x": 99}))).await,
            Err(ServiceError::Backend(_))
        ));
        let expr = UpdateExpression::builder().set("x", json!(2)).build();
        assert!(matches!(backend.update_item("a", &expr).await, Err(ServiceError::Backend(_))));
        assert!(matches!(backend.delete_item("a").await, Err(ServiceError::Backend(_))));

        let a = backend.get_item("a").await?.expect("a is still stored");
        assert_eq!(a.attributes.get("x"), Some(&json!(1)));
        assert_eq!(backend.scan().await?.len(), 1);
        assert!(!temp_path(&tmp).exists());

        tokio::fs::remove_dir(&tmp).await?;
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_snapshot_is_an_error_not_a_reset() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("items_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::create_dir(&tmp).await?;

        assert!(matches!(MemoryBackend::persistent(&tmp).await, Err(ServiceError::Backend(_))));
        assert!(tokio::fs::metadata(&tmp).await?.is_dir());

        tokio::fs::remove_dir(&tmp).await?;
        Ok(())
    }

    #[tokio::test]
    async fn missing_snapshot_is_created_without_temp_leftovers() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("items_{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("items.json");
        let backend = MemoryBackend::persistent(&path).await?;
        assert_eq!(tokio::fs::read(&path).await?, b"{}");

        backend.put_item(item(json!({"id": "a"}))).await?;
        assert!(!temp_path(&path).exists());
        let saved: HashMap<String, Item> = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
        assert!(saved.contains_key("a"));

        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}
