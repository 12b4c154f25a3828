//! In-memory capability key store.
//!
//! Keys are opaque bearer tokens (UUID v4 text) granting access to one
//! automation account's actions. The store lives for the process lifetime;
//! nothing is persisted. Tearing down the session behind a revoked key is the
//! registry's job, driven by the gateway.

use {chrono::{DateTime, Utc}, dashmap::DashMap, tracing::info, warble_common::redact_key};

/// Metadata retained per issued key.
#[derive(Debug, Clone)]
struct IssuedKey {
    issued_at: DateTime<Utc>,
}

/// Issues, validates, and revokes capability keys.
#[derive(Debug, Default)]
pub struct ApiKeyStore {
    keys: DashMap<String, IssuedKey>,
}

impl ApiKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an operator-provided key, typically the configured dev key.
    pub fn seed(&self, key: &str) {
        self.keys.insert(key.to_string(), IssuedKey { issued_at: Utc::now() });
        info!(key = %redact_key(key), "seeded api key");
    }

    /// Mint a new key. The raw key is returned to the caller exactly once.
    pub fn create_key(&self) -> String {
        let key = uuid::Uuid::new_v4().to_string();
        self.keys.insert(key.clone(), IssuedKey { issued_at: Utc::now() });
        info!(key = %redact_key(&key), "issued api key");
        key
    }

    /// True if the key has been issued and not revoked since.
    #[must_use]
    pub fn is_key_valid(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Revoke a key. Returns false when the key was never issued (or is
    /// already gone), mirroring the HTTP response's `deleted` field.
    pub fn delete_key(&self, key: &str) -> bool {
        match self.keys.remove(key) {
            Some((_, meta)) => {
                let lived = Utc::now().signed_duration_since(meta.issued_at);
                info!(
                    key = %redact_key(key),
                    lived_secs = lived.num_seconds(),
                    "revoked api key"
                );
                true
            },
            None => false,
        }
    }
}
