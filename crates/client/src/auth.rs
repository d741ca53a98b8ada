//! Authentication methods

use crate::error::ClientError;
use crate::gateway::{Gateway, RequestOptions};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value as JsonValue, json};
use stockdesk_core::AuthSession;
use tracing::warn;

impl Gateway {
    /// POST credentials to the login endpoint. On success the token and
    /// user record are stored and persisted; any failure (network,
    /// non-2xx, or a response missing the token) surfaces as
    /// [`ClientError::Authentication`] and leaves the session unchanged.
    /// Never retried, never queued.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<JsonValue, ClientError> {
        // Deliberately not routed through dispatch: a 401 here means bad
        // credentials, not an expired session to clear.
        let url = format!("{}/auth/login", self.config.base_url());
        let response = self
            .http
            .post(url)
            .timeout(self.config.timeout())
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|err| ClientError::Authentication(format!("login request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Authentication(format!(
                "login rejected ({status}): {body}"
            )));
        }

        let payload: JsonValue = response
            .json()
            .await
            .map_err(|err| ClientError::Authentication(format!("malformed login response: {err}")))?;
        let token = payload
            .get("token")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ClientError::Authentication("login response missing token".into()))?;

        let session = AuthSession::authenticated(token, payload.get("user").cloned());
        session.save(self.storage.as_ref()).await?;
        *self.session.write().expect("auth session lock poisoned") = session;
        Ok(payload)
    }

    /// Best-effort server notification, then a guaranteed local clear:
    /// whatever the logout endpoint answers, the session ends up cleared
    /// in memory and persisted as unauthenticated.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if self.is_authenticated() {
            if let Err(err) = self
                .send(Method::POST, "/auth/logout", &RequestOptions::default())
                .await
            {
                warn!(error = %err, "logout request failed; clearing local session anyway");
            }
        }

        self.session
            .write()
            .expect("auth session lock poisoned")
            .clear();
        AuthSession::new().save(self.storage.as_ref()).await?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .expect("auth session lock poisoned")
            .is_authenticated()
    }

    pub fn current_user(&self) -> Option<JsonValue> {
        self.session
            .read()
            .expect("auth session lock poisoned")
            .user()
            .cloned()
    }

    pub fn auth_token(&self) -> Option<String> {
        self.session
            .read()
            .expect("auth session lock poisoned")
            .token()
            .map(str::to_owned)
    }

    /// Drop the local session after a 401. Clears and persists at most
    /// once, however many concurrent calls hit the same 401.
    pub(crate) async fn clear_session(&self) {
        let cleared = {
            let mut session = self.session.write().expect("auth session lock poisoned");
            if session.is_authenticated() {
                session.clear();
                true
            } else {
                false
            }
        };
        if cleared {
            warn!("session invalidated by the server; cleared local auth state");
            if let Err(err) = AuthSession::new().save(self.storage.as_ref()).await {
                warn!(error = %err, "failed to persist cleared session");
            }
        }
    }
}
