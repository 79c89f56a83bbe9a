//! Durable credential persistence
//!
//! The mobile shell provides the real durable store (keychain, encrypted
//! preferences); this module defines the key-value boundary and a typed
//! facade that keeps the token pair and cached profile moving as a set.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::auth::{TokenPair, UserProfile};
use crate::error::Error;

const KEY_ACCESS_TOKEN: &str = "auth.access_token";
const KEY_REFRESH_TOKEN: &str = "auth.refresh_token";
const KEY_USER_PROFILE: &str = "auth.user_profile";

/// Durable string key-value persistence for credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a value by key
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Write a value by key
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove a value by key
    async fn remove(&self, key: &str) -> Result<(), Error>;
}

/// In-memory credential store, used as the default and in tests
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::store("store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::store("store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::store("store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Typed facade over the three credential entries.
///
/// Invariant: the access and refresh tokens are written and cleared together,
/// never one without the other. Every write path goes through
/// [`CredentialVault::store_session`], [`CredentialVault::update_tokens`] or
/// [`CredentialVault::clear`].
pub struct CredentialVault {
    store: Arc<dyn CredentialStore>,
}

impl CredentialVault {
    /// Create a vault over the given store
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// The current access token, if any
    pub async fn access_token(&self) -> Result<Option<String>, Error> {
        self.store.get(KEY_ACCESS_TOKEN).await
    }

    /// The current refresh token, if any
    pub async fn refresh_token(&self) -> Result<Option<String>, Error> {
        self.store.get(KEY_REFRESH_TOKEN).await
    }

    /// The cached user profile, if any
    pub async fn user(&self) -> Result<Option<UserProfile>, Error> {
        match self.store.get(KEY_USER_PROFILE).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Persist a freshly issued session: both tokens and the profile
    pub async fn store_session(
        &self,
        tokens: &TokenPair,
        user: &UserProfile,
    ) -> Result<(), Error> {
        self.store
            .set(KEY_ACCESS_TOKEN, &tokens.access_token)
            .await?;
        self.store
            .set(KEY_REFRESH_TOKEN, &tokens.refresh_token)
            .await?;
        let raw = serde_json::to_string(user)?;
        self.store.set(KEY_USER_PROFILE, &raw).await?;
        Ok(())
    }

    /// Replace the token pair after a successful refresh
    pub async fn update_tokens(&self, tokens: &TokenPair) -> Result<(), Error> {
        self.store
            .set(KEY_ACCESS_TOKEN, &tokens.access_token)
            .await?;
        self.store
            .set(KEY_REFRESH_TOKEN, &tokens.refresh_token)
            .await?;
        Ok(())
    }

    /// Destroy the session: remove all three entries
    pub async fn clear(&self) -> Result<(), Error> {
        self.store.remove(KEY_ACCESS_TOKEN).await?;
        self.store.remove(KEY_REFRESH_TOKEN).await?;
        self.store.remove(KEY_USER_PROFILE).await?;
        Ok(())
    }

    /// Whether both tokens are present
    pub async fn has_session(&self) -> Result<bool, Error> {
        Ok(self.access_token().await?.is_some() && self.refresh_token().await?.is_some())
    }
}
