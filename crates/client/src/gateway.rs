//! The gateway and its request primitive
//!
//! Every call (domain methods, queue replay, logout) funnels through
//! [`Gateway::dispatch`] or its inner `send` step, so bearer-token
//! attachment, the timeout, status mapping and offline diversion apply
//! uniformly to all of them.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::offline::OfflineReceipt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use stockdesk_core::{
    AuthSession, ConnectivityMonitor, NoticeSender, OfflineQueue, QueuedMethod, QueuedRequest,
    StorageBackend,
};
use tracing::debug;

/// Per-call options for the request primitive. Caller headers override the
/// defaults on key collision.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    pub body: Option<JsonValue>,
}

impl RequestOptions {
    pub fn with_body(body: JsonValue) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: Some(body),
        }
    }
}

/// Result of the request primitive: completed against the backend, or
/// deferred into the offline queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched<T> {
    /// The backend accepted the call and returned this payload.
    Completed(T),
    /// The call failed at the network layer while offline; it was queued
    /// and will be replayed when connectivity returns.
    Deferred(OfflineReceipt),
}

impl<T> Dispatched<T> {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }

    pub fn deferred(self) -> Option<OfflineReceipt> {
        match self {
            Self::Completed(_) => None,
            Self::Deferred(receipt) => Some(receipt),
        }
    }
}

/// Client-side gateway mediating all backend HTTP calls for the
/// inventory application.
#[derive(Clone)]
pub struct Gateway {
    pub(crate) http: Client,
    pub(crate) config: ClientConfig,
    pub(crate) storage: Arc<dyn StorageBackend>,
    pub(crate) session: Arc<RwLock<AuthSession>>,
    pub(crate) queue: Arc<Mutex<OfflineQueue>>,
    pub(crate) connectivity: ConnectivityMonitor,
    pub(crate) notices: Option<NoticeSender>,
}

impl Gateway {
    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Rehydrate persisted auth state and the offline queue. Call once at
    /// application startup, before the first request.
    pub async fn init(&self) -> Result<(), ClientError> {
        let session = AuthSession::load(self.storage.as_ref()).await?;
        let queue = OfflineQueue::load(self.storage.as_ref()).await?;
        debug!(
            authenticated = session.is_authenticated(),
            queued = queue.len(),
            "gateway state rehydrated"
        );
        *self.session.write().expect("auth session lock poisoned") = session;
        *self.queue.lock().expect("offline queue lock poisoned") = queue;
        Ok(())
    }

    /// Flush session and queue to storage. Both are persisted on every
    /// change already; this is the explicit teardown for orderly exits.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        let queue = self
            .queue
            .lock()
            .expect("offline queue lock poisoned")
            .clone();
        queue.save(self.storage.as_ref()).await?;
        let session = self
            .session
            .read()
            .expect("auth session lock poisoned")
            .clone();
        session.save(self.storage.as_ref()).await?;
        Ok(())
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of requests currently queued for replay.
    pub fn queued_len(&self) -> usize {
        self.queue.lock().expect("offline queue lock poisoned").len()
    }

    /// Snapshot of the queued requests, oldest first.
    pub fn pending_requests(&self) -> Vec<QueuedRequest> {
        self.queue
            .lock()
            .expect("offline queue lock poisoned")
            .snapshot()
    }

    /// The request primitive. Sends the call; a mutating call that fails
    /// at the network layer while the device is offline is captured into
    /// the queue and reported as [`Dispatched::Deferred`] instead of an
    /// error.
    pub async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        match self.send(method.clone(), endpoint, &options).await {
            Ok(value) => Ok(Dispatched::Completed(value)),
            Err(err) => {
                if err.is_network_failure() && !self.connectivity.is_online() {
                    if let Some(queued_method) = QueuedMethod::from_name(method.as_str()) {
                        let receipt =
                            self.enqueue_offline(endpoint, queued_method, &options).await?;
                        return Ok(Dispatched::Deferred(receipt));
                    }
                }
                Err(err)
            }
        }
    }

    /// Compose, send and decode one HTTP call: URL from base + endpoint,
    /// merged headers with bearer token, per-call timeout, status mapping.
    /// A 401 clears the local session before surfacing.
    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<JsonValue, ClientError> {
        let url = format!("{}{}", self.config.base_url(), endpoint);
        let headers = self.compose_headers(options)?;

        let mut request = self
            .http
            .request(method, url)
            .timeout(self.config.timeout())
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.clear_session().await;
            return Err(ClientError::AuthenticationRequired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ClientError::from_status(status, body));
        }

        if response
            .headers()
            .get("x-served-by")
            .is_some_and(|v| v.as_bytes() == b"sw-cache")
        {
            debug!(endpoint, "response served from local cache");
        }

        Ok(response.json().await?)
    }

    fn compose_headers(&self, options: &RequestOptions) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let token = self
            .session
            .read()
            .expect("auth session lock poisoned")
            .token()
            .map(str::to_owned);
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::Configuration("token is not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ClientError::Configuration(format!("invalid header name: {name}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                ClientError::Configuration(format!("invalid value for header {name}"))
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Builder for [`Gateway`]
#[derive(Default)]
pub struct GatewayBuilder {
    config: Option<ClientConfig>,
    storage: Option<Arc<dyn StorageBackend>>,
    connectivity: Option<ConnectivityMonitor>,
    notices: Option<NoticeSender>,
    user_agent: Option<String>,
}

impl GatewayBuilder {
    /// Set the configuration; defaults to [`ClientConfig::from_env`].
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the durable storage backend (required).
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the connectivity signal; defaults to always-online.
    pub fn connectivity(mut self, monitor: ConnectivityMonitor) -> Self {
        self.connectivity = Some(monitor);
        self
    }

    /// Deliver user-facing notices (replay reports) to this channel.
    pub fn notices(mut self, sender: NoticeSender) -> Self {
        self.notices = Some(sender);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the gateway
    pub fn build(self) -> Result<Gateway, ClientError> {
        let config = self.config.unwrap_or_else(ClientConfig::from_env);
        url::Url::parse(config.base_url()).map_err(|err| {
            ClientError::Configuration(format!("invalid base URL {}: {err}", config.base_url()))
        })?;

        let storage = self
            .storage
            .ok_or_else(|| ClientError::Configuration("storage backend is required".into()))?;
        let connectivity = self
            .connectivity
            .unwrap_or_else(ConnectivityMonitor::always_online);

        let http = ClientBuilder::new()
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| "stockdesk-client/0.1.0".to_string()),
            )
            .build()?;

        Ok(Gateway {
            http,
            config,
            storage,
            session: Arc::new(RwLock::new(AuthSession::new())),
            queue: Arc::new(Mutex::new(OfflineQueue::new())),
            connectivity,
            notices: self.notices,
        })
    }
}
