//! Session token cache
//!
//! Memoizes short-lived credentials obtained from upstream authentication calls,
//! keyed by `(namespace, principal)`.
//!
//! Lookup and population are not transactional. Two callers missing on the same
//! key may both authenticate and both `put`; the last write wins. Expiry is not
//! tracked here: a caller that sees an auth failure re-authenticates and
//! overwrites the entry.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

/// Opaque bearer token plus the moment it was obtained
#[derive(Debug)]
pub struct Credential {
    value: SecretString,
    acquired_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(value: SecretString) -> Self {
        Self {
            value,
            acquired_at: Utc::now(),
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.value
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.acquired_at
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self {
            value: SecretString::from(self.value.expose_secret().to_owned()),
            acquired_at: self.acquired_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    namespace: String,
    key: String,
}

impl CacheKey {
    fn new(namespace: &str, key: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
        }
    }
}

/// Namespaced credential store, safe to share between in-flight requests
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: RwLock<HashMap<CacheKey, Credential>>,
}

/// Process-wide cache instance (lazy initialized)
static SHARED: OnceLock<Arc<TokenCache>> = OnceLock::new();

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the process-wide cache
    pub fn shared() -> Arc<TokenCache> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(TokenCache::new())))
    }

    pub async fn get(&self, namespace: &str, key: &str) -> Option<Credential> {
        let entries = self.entries.read().await;
        entries.get(&CacheKey::new(namespace, key)).cloned()
    }

    /// Store a credential, replacing any previous entry under the same key
    pub async fn put(&self, namespace: &str, key: &str, value: SecretString) -> Credential {
        let credential = Credential::new(value);
        let mut entries = self.entries.write().await;
        if entries
            .insert(CacheKey::new(namespace, key), credential.clone())
            .is_some()
        {
            tracing::debug!(namespace, key, "Replaced cached credential");
        }
        credential
    }

    /// Drop a credential so the next lookup misses
    pub async fn invalidate(&self, namespace: &str, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(&CacheKey::new(namespace, key)).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
