//! Client-side record of the current authentication state.
//!
//! The store keeps the session in memory and writes it through to
//! [`Storage`] on every mutation, so a new store built over the same storage
//! rehydrates the same session. The snapshot is stored as one JSON document
//! and mirrored into the individual token and profile keys.
//!
//! Construct one store per application (or per test) and share it through
//! `Arc`.

use crate::auth::claims::is_token_valid;
use crate::auth::models::UserProfile;
use crate::errors::{ApiError, ApiResult};
use crate::session::storage::{
    APP_DATA_KEYS, AUTH_TOKEN_KEY, MemoryStorage, REFRESH_TOKEN_KEY, SESSION_KEYS,
    SESSION_STATE_KEY, Storage, USER_INFO_KEY,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, warn};

/// Snapshot of the authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state: RwLock<Session>,
}

impl SessionStore {
    /// Creates a store over `storage`, rehydrating any persisted session.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let session = load_session(storage.as_ref());
        debug!(
            "Session rehydrated (token present: {})",
            session.access_token.is_some()
        );

        Self {
            storage,
            state: RwLock::new(session),
        }
    }

    /// A fresh store over empty in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    /// Replaces the whole session, e.g. after login or registration.
    pub fn set_session(&self, session: Session) -> ApiResult<()> {
        self.mutate(|state| *state = session)
    }

    /// Stores a refreshed token pair. Without a new refresh token the old one is kept.
    pub fn update_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> ApiResult<()> {
        self.mutate(|state| {
            state.access_token = Some(access_token.to_string());
            if let Some(refresh_token) = refresh_token {
                state.refresh_token = Some(refresh_token.to_string());
            }
        })
    }

    pub fn set_user(&self, user: UserProfile) -> ApiResult<()> {
        self.mutate(|state| state.user = Some(user))
    }

    /// Forgets the session in memory and in storage.
    pub fn clear(&self) -> ApiResult<()> {
        self.mutate(|state| *state = Session::default())
    }

    /// Forgets the session and every cached piece of application data.
    pub fn clear_all(&self) -> ApiResult<()> {
        self.clear()?;
        self.storage.remove_many(&APP_DATA_KEYS)
    }

    /// A token is present and its expiry claim lies in the future.
    pub fn is_authenticated(&self) -> bool {
        self.read()
            .access_token
            .as_deref()
            .map(is_token_valid)
            .unwrap_or(false)
    }

    /// Exact role membership check against the stored profile.
    pub fn has_permission(&self, role: &str) -> bool {
        self.read()
            .user
            .as_ref()
            .map(|user| user.roles.iter().any(|r| r == role))
            .unwrap_or(false)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_permission(role))
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `apply` to a copy of the session and only commits it once the
    /// copy is persisted. On failure storage is rolled back to the current
    /// session, or wiped if that fails too.
    fn mutate(&self, apply: impl FnOnce(&mut Session)) -> ApiResult<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = state.clone();
        apply(&mut next);

        if let Err(e) = persist_session(self.storage.as_ref(), &next) {
            warn!("Failed to persist session, keeping previous state: {}", e);
            if let Err(rollback) = persist_session(self.storage.as_ref(), &state) {
                warn!("Failed to restore stored session: {}", rollback);
                if let Err(wipe) = self.storage.remove_many(&SESSION_KEYS) {
                    warn!("Failed to wipe stored session: {}", wipe);
                }
            }
            return Err(e);
        }

        *state = next;
        Ok(())
    }
}

fn persist_session(storage: &dyn Storage, session: &Session) -> ApiResult<()> {
    if *session == Session::default() {
        storage.remove(SESSION_STATE_KEY)?;
    } else {
        let encoded = serde_json::to_string(session)
            .map_err(|e| ApiError::storage(format!("Failed to encode session: {}", e)))?;
        storage.set(SESSION_STATE_KEY, &encoded)?;
    }

    match &session.access_token {
        Some(token) => storage.set(AUTH_TOKEN_KEY, token)?,
        None => storage.remove(AUTH_TOKEN_KEY)?,
    }
    match &session.refresh_token {
        Some(token) => storage.set(REFRESH_TOKEN_KEY, token)?,
        None => storage.remove(REFRESH_TOKEN_KEY)?,
    }
    match &session.user {
        Some(user) => {
            let encoded = serde_json::to_string(user)
                .map_err(|e| ApiError::storage(format!("Failed to encode user profile: {}", e)))?;
            storage.set(USER_INFO_KEY, &encoded)?
        }
        None => storage.remove(USER_INFO_KEY)?,
    }
    Ok(())
}

fn load_session(storage: &dyn Storage) -> Session {
    let read = |key: &str| match storage.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!("Failed to read {} from storage: {}", key, e);
            None
        }
    };

    if let Some(raw) = read(SESSION_STATE_KEY) {
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => return session,
            Err(e) => warn!("Ignoring unreadable session snapshot: {}", e),
        }
    }

    let user = read(USER_INFO_KEY)
        .filter(|raw| raw != "undefined" && raw != "null")
        .and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring unreadable user profile: {}", e);
                None
            }
        });

    Session {
        access_token: read(AUTH_TOKEN_KEY),
        refresh_token: read(REFRESH_TOKEN_KEY),
        user,
    }
}
