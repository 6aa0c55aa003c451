//! Token/session store.
//!
//! The whole session (token, expiry, profile) is persisted as one record
//! under `keys::SESSION` on every mutation, before subscribers are notified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use labeldesk_core::{JsonStorage, Observable, StorageError, StorageResult, SubscriptionId, keys};

/// Profile of the logged-in operator as returned by the backend.
///
/// Unknown backend fields are kept in `extra` so the record round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
            nickname: None,
            extra: Map::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Persisted shape: `{ "token": ..., "expiresAt"?: ..., "userInfo": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_info: Option<UserProfile>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && !self.is_expired_at(now)
    }
}

#[derive(Debug)]
pub struct SessionStore {
    storage: JsonStorage,
    state: Observable<Session>,
}

impl SessionStore {
    /// Rehydrate the session from storage.
    pub fn new(storage: JsonStorage) -> Self {
        let initial: Session = storage.get_or_default(keys::SESSION);
        if initial.token.is_some() {
            tracing::debug!("session rehydrated from storage");
        }
        Self {
            storage,
            state: Observable::new(initial),
        }
    }

    /// Set token and profile together after a successful login.
    pub fn login(
        &self,
        token: impl Into<String>,
        profile: UserProfile,
        expires_at: Option<DateTime<Utc>>,
    ) -> StorageResult<()> {
        let session = Session {
            token: Some(token.into()),
            expires_at,
            user_info: Some(profile),
        };
        self.commit(|current| *current = session)?;
        tracing::info!("session started");
        Ok(())
    }

    /// Set a token with no known expiry.
    pub fn set_token(&self, token: impl Into<String>) -> StorageResult<()> {
        self.set_token_with_expiry(token, None)
    }

    pub fn set_token_with_expiry(
        &self,
        token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> StorageResult<()> {
        let token = token.into();
        self.commit(|session| {
            session.token = Some(token);
            session.expires_at = expires_at;
        })
    }

    pub fn set_user_profile(&self, profile: UserProfile) -> StorageResult<()> {
        self.commit(|session| session.user_info = Some(profile))
    }

    /// Drop token and profile, in memory and in storage.
    pub fn clear(&self) -> StorageResult<()> {
        self.commit(|session| *session = Session::default())?;
        tracing::info!("session cleared");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in_at(Utc::now())
    }

    /// Expiry is checked against `now`; an expired session is cleared.
    pub fn is_logged_in_at(&self, now: DateTime<Utc>) -> bool {
        let session = self.state.get();
        if session.token.is_some() && session.is_expired_at(now) {
            self.expire(now);
            return false;
        }
        session.token.is_some()
    }

    /// The token to send with requests, if the session is still valid.
    pub fn token(&self) -> Option<String> {
        if self.is_logged_in() {
            self.state.with(|s| s.token.clone())
        } else {
            None
        }
    }

    pub fn user_profile(&self) -> Option<UserProfile> {
        self.state.with(|s| s.user_info.clone())
    }

    pub fn snapshot(&self) -> Session {
        self.state.get()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.state.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    /// Clear only if the session is still expired once the write lock is
    /// held; a login that raced in after the check is left alone.
    fn expire(&self, now: DateTime<Utc>) {
        let result = self.state.try_update(|session| {
            if session.token.is_some() && session.is_expired_at(now) {
                *session = Session::default();
                self.storage.set(keys::SESSION, &*session)?;
                tracing::info!("session expired");
            }
            Ok::<(), StorageError>(())
        });
        if let Err(err) = result {
            tracing::error!(error = %err, "failed to persist expired session");
        }
    }

    /// Apply `f` and persist the result as one step: memory and storage
    /// change together or not at all.
    fn commit(&self, f: impl FnOnce(&mut Session)) -> StorageResult<()> {
        self.state.try_update(|session| {
            f(session);
            self.storage.set(keys::SESSION, &*session)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn persisted(storage: &JsonStorage) -> Value {
        storage.get(keys::SESSION).unwrap().unwrap()
    }

    #[test]
    fn token_then_profile_then_clear() {
        let storage = JsonStorage::in_memory();
        let store = SessionStore::new(storage.clone());

        store.set_token("abc123").unwrap();
        store.set_user_profile(UserProfile::new("u1")).unwrap();
        assert_eq!(
            persisted(&storage),
            json!({"token": "abc123", "userInfo": {"userId": "u1"}})
        );
        assert!(store.is_logged_in());

        store.clear().unwrap();
        assert_eq!(persisted(&storage), json!({"token": null, "userInfo": null}));
        assert_eq!(store.snapshot(), Session::default());
        assert!(!store.is_logged_in());
    }

    #[test]
    fn expiry_clears_session() {
        let storage = JsonStorage::in_memory();
        let store = SessionStore::new(storage.clone());
        let now = Utc::now();
        store
            .login("tok", UserProfile::new("u1"), Some(now + Duration::minutes(5)))
            .unwrap();

        assert!(store.is_logged_in_at(now));
        assert!(!store.is_logged_in_at(now + Duration::minutes(5)));
        assert!(store.snapshot().token.is_none());
        assert_eq!(persisted(&storage), json!({"token": null, "userInfo": null}));
    }

    #[test]
    fn expired_token_is_not_handed_out() {
        let store = SessionStore::new(JsonStorage::in_memory());
        store
            .set_token_with_expiry("old", Some(Utc::now() - Duration::seconds(1)))
            .unwrap();
        assert_eq!(store.token(), None);
        assert!(store.user_profile().is_none());
    }

    #[test]
    fn rehydrates_and_keeps_unknown_profile_fields() {
        let storage = JsonStorage::in_memory();
        storage
            .set(
                keys::SESSION,
                &json!({"token": "t", "userInfo": {"userId": "u9", "dept": "warehouse"}}),
            )
            .unwrap();

        let store = SessionStore::new(storage);
        assert_eq!(store.token().as_deref(), Some("t"));
        let profile = store.user_profile().unwrap();
        assert_eq!(profile.user_id, "u9");
        assert_eq!(profile.extra.get("dept"), Some(&json!("warehouse")));
    }

    #[test]
    fn subscribers_are_notified_after_persisting() {
        let storage = JsonStorage::in_memory();
        let store = SessionStore::new(storage.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reader = storage.clone();
        store.subscribe(move |session| {
            let on_disk: Session = reader.get(keys::SESSION).unwrap().unwrap();
            assert_eq!(&on_disk, session);
            sink.lock().unwrap().push(session.token.clone());
        });

        store.set_token("a").unwrap();
        store.clear().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some("a".to_string()), None]);
    }

    #[test]
    fn profile_update_racing_clear_never_resurrects_the_token() {
        let storage = JsonStorage::in_memory();
        let store = Arc::new(SessionStore::new(storage.clone()));

        for _ in 0..500 {
            store.login("t", UserProfile::new("u1"), None).unwrap();

            let updater = {
                let store = store.clone();
                std::thread::spawn(move || store.set_user_profile(UserProfile::new("u2")).unwrap())
            };
            let clearer = {
                let store = store.clone();
                std::thread::spawn(move || store.clear().unwrap())
            };
            updater.join().unwrap();
            clearer.join().unwrap();

            let in_memory = store.snapshot();
            let on_disk: Session = storage.get(keys::SESSION).unwrap().unwrap();
            assert_eq!(in_memory.token, None);
            assert_eq!(on_disk, in_memory);
        }
    }
}
