use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Well-known storage keys shared by the gateway and its collaborators.
pub mod keys {
    /// Bearer token of the current session.
    pub const AUTH_TOKEN: &str = "authToken";
    /// Serialized user record returned by the login endpoint.
    pub const USER: &str = "user";
    /// Serialized offline request queue.
    pub const OFFLINE_QUEUE: &str = "apiOfflineQueue";

    /// Per-resource snapshot keys served by the legacy read fallback.
    pub const PRODUCTS: &str = "products";
    pub const CLIENTS: &str = "clients";
    pub const DELIVERIES: &str = "deliveries";
    pub const PRODUCTION_BATCHES: &str = "productionBatches";
    pub const MATERIALS: &str = "materials";
    pub const PURCHASES: &str = "purchases";
}

/// String-keyed durable blob store, the local-storage analog the gateway
/// persists its session and offline queue into.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    async fn remove(&self, key: &str) -> CoreResult<()>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CoreError::storage("memory storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CoreError::storage("memory storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CoreError::storage("memory storage lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Durable backend keeping the whole key space in a single JSON file.
///
/// Every mutation rewrites the file; the map is small (a session, a queue and
/// a handful of snapshots), so the simplicity wins over journaling. Writes
/// from concurrent processes sharing the same file are last-writer-wins.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: tokio::sync::Mutex<HashMap<String, String>>,
}

impl JsonFileStorage {
    /// Open the store at `path`, loading any previously persisted entries.
    /// A missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: tokio::sync::Mutex::new(entries),
        })
    }

    async fn flush(&self, entries: &HashMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for JsonFileStorage {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries).await
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        self.flush(&entries).await
    }
}

// Mock implementation for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub StorageBackend {}

        #[async_trait]
        impl StorageBackend for StorageBackend {
            async fn get(&self, key: &str) -> CoreResult<Option<String>>;
            async fn set(&self, key: &str, value: &str) -> CoreResult<()>;
            async fn remove(&self, key: &str) -> CoreResult<()>;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("missing").await.unwrap(), None);

        storage.set("authToken", "t1").await.unwrap();
        assert_eq!(storage.get("authToken").await.unwrap().as_deref(), Some("t1"));

        storage.remove("authToken").await.unwrap();
        assert_eq!(storage.get("authToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockdesk.json");

        {
            let storage = JsonFileStorage::open(&path).await.unwrap();
            storage.set("products", r#"[{"id":1}]"#).await.unwrap();
            storage.set("authToken", "t1").await.unwrap();
            storage.remove("authToken").await.unwrap();
        }

        let storage = JsonFileStorage::open(&path).await.unwrap();
        assert_eq!(
            storage.get("products").await.unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert_eq!(storage.get("authToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_storage_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(storage.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn mocked_backend_get() {
        use mock::MockStorageBackend;

        let mut storage = MockStorageBackend::new();
        storage
            .expect_get()
            .withf(|key| key == "user")
            .returning(|_| Ok(Some("{\"id\":1}".to_string())));

        assert_eq!(
            storage.get("user").await.unwrap().as_deref(),
            Some("{\"id\":1}")
        );
    }
}
