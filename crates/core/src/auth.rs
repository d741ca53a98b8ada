//! Authentication session state

use crate::CoreResult;
use crate::storage::{StorageBackend, keys};
use serde_json::Value as JsonValue;

/// In-memory record of the current session. The authenticated flag is
/// derived from the token, so the two can never disagree.
///
/// The user record is opaque: it is stored and handed back verbatim, no
/// field of it is interpreted here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSession {
    token: Option<String>,
    user: Option<JsonValue>,
}

impl AuthSession {
    /// An unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session carrying a freshly issued token.
    pub fn authenticated(token: impl Into<String>, user: Option<JsonValue>) -> Self {
        Self {
            token: Some(token.into()),
            user,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&JsonValue> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Drop the token and user record.
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Rehydrate a session persisted by an earlier process lifetime.
    /// A user record that no longer parses is dropped rather than failing
    /// the whole rehydration.
    pub async fn load(storage: &dyn StorageBackend) -> CoreResult<Self> {
        let token = storage.get(keys::AUTH_TOKEN).await?;
        let user = match storage.get(keys::USER).await? {
            Some(raw) => serde_json::from_str(&raw).ok(),
            None => None,
        };
        Ok(Self { token, user })
    }

    /// Persist the session, removing the keys for whatever is absent.
    pub async fn save(&self, storage: &dyn StorageBackend) -> CoreResult<()> {
        match &self.token {
            Some(token) => storage.set(keys::AUTH_TOKEN, token).await?,
            None => storage.remove(keys::AUTH_TOKEN).await?,
        }
        match &self.user {
            Some(user) => {
                storage
                    .set(keys::USER, &serde_json::to_string(user)?)
                    .await?
            }
            None => storage.remove(keys::USER).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn authenticated_flag_follows_token() {
        let mut session = AuthSession::authenticated("t1", Some(json!({"id": 1})));
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("t1"));

        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert_eq!(session.user(), None);
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let storage = MemoryStorage::new();
        let session = AuthSession::authenticated("t1", Some(json!({"id": 1, "name": "alice"})));
        session.save(&storage).await.unwrap();

        let restored = AuthSession::load(&storage).await.unwrap();
        assert_eq!(restored, session);
    }

    #[tokio::test]
    async fn saving_cleared_session_removes_keys() {
        let storage = MemoryStorage::new();
        AuthSession::authenticated("t1", Some(json!({"id": 1})))
            .save(&storage)
            .await
            .unwrap();

        AuthSession::new().save(&storage).await.unwrap();
        assert_eq!(storage.get(keys::AUTH_TOKEN).await.unwrap(), None);
        assert_eq!(storage.get(keys::USER).await.unwrap(), None);

        let restored = AuthSession::load(&storage).await.unwrap();
        assert!(!restored.is_authenticated());
    }

    #[tokio::test]
    async fn corrupt_user_record_is_dropped() {
        let storage = MemoryStorage::new();
        storage.set(keys::AUTH_TOKEN, "t1").await.unwrap();
        storage.set(keys::USER, "not json").await.unwrap();

        let restored = AuthSession::load(&storage).await.unwrap();
        assert!(restored.is_authenticated());
        assert_eq!(restored.user(), None);
    }
}
