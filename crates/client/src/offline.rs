//! Offline queuing and replay

use crate::error::ClientError;
use crate::gateway::{Gateway, RequestOptions};
use reqwest::Method;
use stockdesk_core::{Notice, OfflineQueue, QueuedMethod, QueuedRequest};
use tracing::{debug, info, warn};

/// Optimistic result for a mutating call captured while offline. The UI
/// can treat it as a provisional success.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineReceipt {
    pub request_id: String,
    pub message: String,
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReplayReport {
    pub attempted: usize,
    pub synced: usize,
}

fn http_method(method: QueuedMethod) -> Method {
    match method {
        QueuedMethod::Post => Method::POST,
        QueuedMethod::Put => Method::PUT,
        QueuedMethod::Patch => Method::PATCH,
        QueuedMethod::Delete => Method::DELETE,
    }
}

impl Gateway {
    /// Capture a mutating request into the durable queue and hand back an
    /// optimistic receipt instead of an error.
    pub(crate) async fn enqueue_offline(
        &self,
        endpoint: &str,
        method: QueuedMethod,
        options: &RequestOptions,
    ) -> Result<OfflineReceipt, ClientError> {
        let body = options
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let request = QueuedRequest::new(endpoint, method, options.headers.clone(), body);
        let request_id = request.id.clone();

        let snapshot = {
            let mut queue = self.queue.lock().expect("offline queue lock poisoned");
            queue.push(request);
            queue.clone()
        };
        snapshot.save(self.storage.as_ref()).await?;

        debug!(endpoint, request_id = %request_id, "request queued for replay");
        Ok(OfflineReceipt {
            request_id,
            message: "Saved offline; will be synchronized when the connection returns"
                .to_string(),
        })
    }

    /// Replay queued mutations in FIFO order. An empty in-memory queue is
    /// first rehydrated from storage, covering queues built up in a prior
    /// process lifetime. Entries whose replay succeeds are removed; the
    /// rest stay queued for the next connectivity transition. Replaying
    /// nothing is a strict no-op: no storage write, no notice.
    pub async fn replay_queue(&self) -> Result<ReplayReport, ClientError> {
        let needs_rehydrate = self
            .queue
            .lock()
            .expect("offline queue lock poisoned")
            .is_empty();
        if needs_rehydrate {
            let persisted = OfflineQueue::load(self.storage.as_ref()).await?;
            if !persisted.is_empty() {
                *self.queue.lock().expect("offline queue lock poisoned") = persisted;
            }
        }

        let pending = self
            .queue
            .lock()
            .expect("offline queue lock poisoned")
            .snapshot();
        if pending.is_empty() {
            return Ok(ReplayReport::default());
        }

        let mut completed = Vec::new();
        for entry in &pending {
            match self.replay_entry(entry).await {
                Ok(()) => completed.push(entry.id.clone()),
                // A 401 lands here too: the session is already cleared by
                // send, the entry stays queued, later entries still run.
                Err(err) => warn!(
                    endpoint = %entry.endpoint,
                    request_id = %entry.id,
                    error = %err,
                    "replay failed; entry stays queued"
                ),
            }
        }

        let snapshot = {
            let mut queue = self.queue.lock().expect("offline queue lock poisoned");
            queue.remove_completed(&completed);
            queue.clone()
        };
        snapshot.save(self.storage.as_ref()).await?;

        let report = ReplayReport {
            attempted: pending.len(),
            synced: completed.len(),
        };
        if report.synced > 0 {
            info!(synced = report.synced, "offline queue replayed");
            if let Some(notices) = &self.notices {
                let _ = notices.send(Notice {
                    message: format!("{} offline changes synchronized", report.synced),
                    synced: report.synced,
                });
            }
        }
        Ok(report)
    }

    async fn replay_entry(&self, entry: &QueuedRequest) -> Result<(), ClientError> {
        let body = entry
            .body
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let options = RequestOptions {
            headers: entry.headers.clone(),
            body,
        };
        self.send(http_method(entry.method), &entry.endpoint, &options)
            .await?;
        Ok(())
    }

    /// Drive replay from connectivity transitions: every offline-to-online
    /// edge triggers one replay pass. Runs until the connectivity handle
    /// is dropped; spawn it alongside the application loop.
    pub async fn run_replay_on_reconnect(&self) {
        let mut monitor = self.connectivity.clone();
        while let Some(online) = monitor.changed().await {
            if !online {
                continue;
            }
            if let Err(err) = self.replay_queue().await {
                warn!(error = %err, "offline queue replay failed");
            }
        }
    }
}
