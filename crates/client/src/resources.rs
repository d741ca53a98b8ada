//! Domain convenience methods
//!
//! Thin wrappers shaping endpoint, method and body over the request
//! primitive; no business logic lives here. The `*_legacy` read variants
//! substitute the locally persisted snapshot when the live call fails.

use crate::error::ClientError;
use crate::gateway::{Dispatched, Gateway, RequestOptions};
use reqwest::Method;
use serde_json::{Value as JsonValue, json};
use stockdesk_core::storage::keys;
use tracing::warn;

impl Gateway {
    pub(crate) async fn fetch(&self, endpoint: &str) -> Result<JsonValue, ClientError> {
        self.send(Method::GET, endpoint, &RequestOptions::default())
            .await
    }

    pub(crate) async fn submit(
        &self,
        method: Method,
        endpoint: &str,
        body: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.dispatch(method, endpoint, RequestOptions::with_body(body))
            .await
    }

    /// Degraded-but-available read path: a successful live read refreshes
    /// the snapshot; a failed one falls back to it. A missing or corrupt
    /// snapshot propagates the live error, not a storage error.
    async fn fetch_with_snapshot(
        &self,
        endpoint: &str,
        snapshot_key: &str,
    ) -> Result<JsonValue, ClientError> {
        match self.fetch(endpoint).await {
            Ok(value) => {
                if let Ok(raw) = serde_json::to_string(&value) {
                    if let Err(err) = self.storage.set(snapshot_key, &raw).await {
                        warn!(key = snapshot_key, error = %err, "failed to refresh snapshot");
                    }
                }
                Ok(value)
            }
            Err(err) => {
                warn!(endpoint, error = %err, "live read failed; trying local snapshot");
                match self.storage.get(snapshot_key).await {
                    Ok(Some(raw)) => serde_json::from_str(&raw).map_err(|_| err),
                    _ => Err(err),
                }
            }
        }
    }

    // Products

    pub async fn get_products(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/products").await
    }

    pub async fn get_product(&self, id: &str) -> Result<JsonValue, ClientError> {
        self.fetch(&format!("/products/{id}")).await
    }

    pub async fn create_product(
        &self,
        product: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::POST, "/products", product).await
    }

    pub async fn update_product(
        &self,
        id: &str,
        product: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::PUT, &format!("/products/{id}"), product)
            .await
    }

    pub async fn delete_product(&self, id: &str) -> Result<Dispatched<JsonValue>, ClientError> {
        self.dispatch(
            Method::DELETE,
            &format!("/products/{id}"),
            RequestOptions::default(),
        )
        .await
    }

    /// Products with snapshot fallback.
    pub async fn get_products_legacy(&self) -> Result<JsonValue, ClientError> {
        self.fetch_with_snapshot("/products", keys::PRODUCTS).await
    }

    // Clients

    pub async fn get_clients(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/clients").await
    }

    pub async fn create_client(
        &self,
        client: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::POST, "/clients", client).await
    }

    pub async fn update_client(
        &self,
        id: &str,
        client: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::PUT, &format!("/clients/{id}"), client)
            .await
    }

    /// Clients with snapshot fallback.
    pub async fn get_clients_legacy(&self) -> Result<JsonValue, ClientError> {
        self.fetch_with_snapshot("/clients", keys::CLIENTS).await
    }

    // Deliveries

    pub async fn get_deliveries(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/deliveries").await
    }

    pub async fn create_delivery(
        &self,
        delivery: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::POST, "/deliveries", delivery).await
    }

    pub async fn update_delivery_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(
            Method::PATCH,
            &format!("/deliveries/{id}"),
            json!({ "status": status }),
        )
        .await
    }

    /// Deliveries with snapshot fallback.
    pub async fn get_deliveries_legacy(&self) -> Result<JsonValue, ClientError> {
        self.fetch_with_snapshot("/deliveries", keys::DELIVERIES)
            .await
    }

    // Production

    pub async fn get_production_batches(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/production").await
    }

    pub async fn create_production_batch(
        &self,
        batch: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::POST, "/production", batch).await
    }

    pub async fn update_production_batch(
        &self,
        id: &str,
        batch: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::PUT, &format!("/production/{id}"), batch)
            .await
    }

    /// Production batches with snapshot fallback.
    pub async fn get_production_batches_legacy(&self) -> Result<JsonValue, ClientError> {
        self.fetch_with_snapshot("/production", keys::PRODUCTION_BATCHES)
            .await
    }

    // Materials

    pub async fn get_materials(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/materials").await
    }

    pub async fn create_material(
        &self,
        material: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::POST, "/materials", material).await
    }

    pub async fn update_material_stock(
        &self,
        id: &str,
        quantity: f64,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(
            Method::PATCH,
            &format!("/materials/{id}"),
            json!({ "quantity": quantity }),
        )
        .await
    }

    /// Materials with snapshot fallback.
    pub async fn get_materials_legacy(&self) -> Result<JsonValue, ClientError> {
        self.fetch_with_snapshot("/materials", keys::MATERIALS).await
    }

    // Purchases

    pub async fn get_purchases(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/purchases").await
    }

    pub async fn create_purchase(
        &self,
        purchase: JsonValue,
    ) -> Result<Dispatched<JsonValue>, ClientError> {
        self.submit(Method::POST, "/purchases", purchase).await
    }

    /// Purchases with snapshot fallback.
    pub async fn get_purchases_legacy(&self) -> Result<JsonValue, ClientError> {
        self.fetch_with_snapshot("/purchases", keys::PURCHASES).await
    }

    // Reports

    pub async fn get_inventory_report(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/reports/inventory").await
    }

    pub async fn get_production_report(&self) -> Result<JsonValue, ClientError> {
        self.fetch("/reports/production").await
    }
}
