//! Durable FIFO queue of mutating requests deferred while disconnected

use crate::CoreResult;
use crate::storage::{StorageBackend, keys};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Methods eligible for offline queuing. Reads are never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueuedMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl QueuedMethod {
    /// Map an HTTP method name to a queueable method, if it is one.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// A mutating request captured while the device was offline, held until a
/// replay pass confirms the backend accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub id: String,
    pub endpoint: String,
    pub method: QueuedMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedRequest {
    /// Capture a request with a fresh time-derived id. The uuid suffix
    /// keeps two captures within the same millisecond distinct.
    pub fn new(
        endpoint: impl Into<String>,
        method: QueuedMethod,
        headers: BTreeMap<String, String>,
        body: Option<String>,
    ) -> Self {
        let enqueued_at = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: format!("{}-{}", enqueued_at.timestamp_millis(), &suffix[..8]),
            endpoint: endpoint.into(),
            method,
            headers,
            body,
            enqueued_at,
        }
    }
}

/// In-memory view of the persisted queue. Insertion order is the replay
/// order; entries leave only after a confirmed successful replay.
#[derive(Debug, Clone, Default)]
pub struct OfflineQueue {
    pending: Vec<QueuedRequest>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Append a captured request, preserving FIFO order.
    pub fn push(&mut self, request: QueuedRequest) {
        self.pending.push(request);
    }

    /// Clone the pending entries, oldest first.
    pub fn snapshot(&self) -> Vec<QueuedRequest> {
        self.pending.clone()
    }

    /// Drop the entries whose replay succeeded; everything else stays,
    /// still in order.
    pub fn remove_completed(&mut self, ids: &[String]) {
        self.pending.retain(|entry| !ids.contains(&entry.id));
    }

    /// Rehydrate the queue persisted by an earlier process lifetime.
    pub async fn load(storage: &dyn StorageBackend) -> CoreResult<Self> {
        let pending = match storage.get(keys::OFFLINE_QUEUE).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        Ok(Self { pending })
    }

    /// Persist the full queue.
    pub async fn save(&self, storage: &dyn StorageBackend) -> CoreResult<()> {
        storage
            .set(keys::OFFLINE_QUEUE, &serde_json::to_string(&self.pending)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn request(endpoint: &str) -> QueuedRequest {
        QueuedRequest::new(endpoint, QueuedMethod::Post, BTreeMap::new(), None)
    }

    #[test]
    fn queue_preserves_insertion_order() {
        let mut queue = OfflineQueue::new();
        queue.push(request("/deliveries"));
        queue.push(request("/products"));
        queue.push(request("/purchases"));

        let endpoints: Vec<_> = queue
            .snapshot()
            .into_iter()
            .map(|entry| entry.endpoint)
            .collect();
        assert_eq!(endpoints, ["/deliveries", "/products", "/purchases"]);
    }

    #[test]
    fn remove_completed_keeps_failures_in_order() {
        let mut queue = OfflineQueue::new();
        let first = request("/a");
        let second = request("/b");
        let third = request("/c");
        let completed = vec![second.id.clone()];

        queue.push(first);
        queue.push(second);
        queue.push(third);
        queue.remove_completed(&completed);

        let endpoints: Vec<_> = queue
            .snapshot()
            .into_iter()
            .map(|entry| entry.endpoint)
            .collect();
        assert_eq!(endpoints, ["/a", "/c"]);
    }

    #[test]
    fn ids_are_unique_within_a_millisecond() {
        let a = request("/a");
        let b = request("/a");
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn persisted_queue_round_trips() {
        let storage = MemoryStorage::new();
        let mut queue = OfflineQueue::new();
        queue.push(request("/deliveries"));
        queue.push(request("/materials"));
        queue.save(&storage).await.unwrap();

        let restored = OfflineQueue::load(&storage).await.unwrap();
        assert_eq!(restored.snapshot(), queue.snapshot());
    }

    #[tokio::test]
    async fn loading_empty_storage_yields_empty_queue() {
        let storage = MemoryStorage::new();
        let queue = OfflineQueue::load(&storage).await.unwrap();
        assert!(queue.is_empty());
    }
}
