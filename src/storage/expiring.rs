//! Expiration-aware store wrapper with encrypted auth tokens

use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;

use super::crypto::{CryptoError, TokenCipher};
use super::item::StoredItem;
use super::keys::StorageKey;
use super::token::token_expired_at;
use super::{Store, StoreError};

/// Result of reading one key from the backend
enum ReadOutcome<T> {
    /// Missing, expired or backend unreadable
    Absent,
    /// Present but not a valid envelope for `T`
    Unreadable,
    Present(StoredItem<T>),
}

/// Keyed store with per-item TTL, lazy eviction and encrypted tokens
///
/// No public method returns an error or panics on backend trouble. Writes
/// report success as a `bool`; reads fall back to `None` or the caller's
/// default. Expired items are only noticed, and deleted, when read.
///
/// # Example
///
/// ```rust,ignore
/// let store = SecureExpiringStore::new(MemoryStore::new(), StoreConfig::default());
/// store.set_item("greeting", &"habari", Some(5));
/// let greeting: String = store.get_item("greeting", String::new());
/// ```
#[derive(Debug)]
pub struct SecureExpiringStore<S, C = SystemClock> {
    store: S,
    clock: C,
    cipher: Option<TokenCipher>,
    config: StoreConfig,
}

impl<S: Store> SecureExpiringStore<S, SystemClock> {
    /// Wrap `store` using the wall clock
    pub fn new(store: S, config: StoreConfig) -> Self {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: Store, C: Clock> SecureExpiringStore<S, C> {
    /// Wrap `store` using an explicit clock
    pub fn with_clock(store: S, clock: C, config: StoreConfig) -> Self {
        let cipher = match config.token_secret.as_deref() {
            Some(secret) => match TokenCipher::from_secret(secret) {
                Ok(cipher) => Some(cipher),
                Err(e) => {
                    warn!("Token encryption disabled: {}", e);
                    None
                }
            },
            None => None,
        };

        Self {
            store,
            clock,
            cipher,
            config,
        }
    }

    /// The wrapped backend
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether auth tokens can be written
    pub fn has_encryption(&self) -> bool {
        self.cipher.is_some()
    }

    /// Store `value` under `key`, expiring after `ttl_minutes` if given
    ///
    /// Returns `false` (and logs) on serialization or backend failure.
    pub fn set_item<T>(&self, key: &str, value: &T, ttl_minutes: Option<u64>) -> bool
    where
        T: Serialize + ?Sized,
    {
        match self.write_item(key, value, ttl_minutes) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to store {}: {}", key, e);
                false
            }
        }
    }

    fn write_item<T>(&self, key: &str, value: &T, ttl_minutes: Option<u64>) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let item = StoredItem::new(value, self.clock.now_millis(), ttl_minutes);
        let text = serde_json::to_string(&item)?;
        self.store.set(key, &text)
    }

    /// Read the value under `key`, or `default` if absent, unreadable or expired
    pub fn get_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_optional(key).unwrap_or(default)
    }

    /// Read the value under `key`, `None` if absent, unreadable or expired
    pub fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_stored(key).map(|item| item.value)
    }

    /// Read the full envelope under `key`
    ///
    /// An expired envelope is deleted from the backend before returning `None`.
    pub fn get_stored<T: DeserializeOwned>(&self, key: &str) -> Option<StoredItem<T>> {
        match self.read_stored(key) {
            ReadOutcome::Present(item) => Some(item),
            ReadOutcome::Absent | ReadOutcome::Unreadable => None,
        }
    }

    fn read_stored<T: DeserializeOwned>(&self, key: &str) -> ReadOutcome<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ReadOutcome::Absent,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return ReadOutcome::Absent;
            }
        };

        let item: StoredItem<T> = match serde_json::from_str(&raw) {
            Ok(item) => item,
            Err(e) => {
                warn!("Ignoring unreadable value under {}: {}", key, e);
                return ReadOutcome::Unreadable;
            }
        };

        if item.is_expired(self.clock.now_millis()) {
            debug!("Evicting expired {}", key);
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to evict expired {}: {}", key, e);
            }
            return ReadOutcome::Absent;
        }

        ReadOutcome::Present(item)
    }

    /// Delete `key`. Returns `false` (and logs) if the backend refuses.
    pub fn remove_item(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to remove {}: {}", key, e);
                false
            }
        }
    }

    /// Remove every key in `keys`
    ///
    /// A failed removal does not stop the others. Failed keys get one retry
    /// after the first pass. Returns `true` only if every key is gone.
    pub fn clear_all<I, K>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let failed: Vec<K> = keys
            .into_iter()
            .filter(|key| !self.remove_item(key.as_ref()))
            .collect();

        if failed.is_empty() {
            return true;
        }

        let mut all_removed = true;
        for key in &failed {
            if self.remove_item(key.as_ref()) {
                debug!("Removed {} on retry", key.as_ref());
            } else {
                error!("Giving up removing {}", key.as_ref());
                all_removed = false;
            }
        }

        all_removed
    }

    /// Encrypt and store `token` with the configured token TTL
    pub fn set_auth_token(&self, token: &str) -> bool {
        self.set_auth_token_with_ttl(token, self.config.token_ttl_minutes)
    }

    /// Encrypt and store `token`, expiring after `ttl_minutes`
    ///
    /// Fails closed: with no secret configured nothing is written.
    pub fn set_auth_token_with_ttl(&self, token: &str, ttl_minutes: u64) -> bool {
        let Some(cipher) = &self.cipher else {
            error!("Refusing to store auth token: no encryption secret configured");
            return false;
        };

        match cipher.encrypt(token) {
            Ok(envelope) => self.set_item(StorageKey::AuthToken.as_str(), &envelope, Some(ttl_minutes)),
            Err(e) => {
                error!("Failed to encrypt auth token: {}", e);
                false
            }
        }
    }

    /// Decrypted auth token, if present and unexpired
    ///
    /// A token that cannot be decrypted is deleted.
    pub fn get_auth_token(&self) -> Option<String> {
        let key = StorageKey::AuthToken.as_str();
        let envelope: String = match self.read_stored(key) {
            ReadOutcome::Present(item) => item.value,
            ReadOutcome::Absent => return None,
            ReadOutcome::Unreadable => {
                warn!("Discarding malformed auth token entry");
                self.remove_item(key);
                return None;
            }
        };

        let decrypted = match &self.cipher {
            Some(cipher) => cipher.decrypt(&envelope),
            None => Err(CryptoError::MissingKey),
        };

        match decrypted {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Discarding unreadable auth token: {}", e);
                self.remove_item(key);
                None
            }
        }
    }

    /// Whether the stored token's own `exp` claim has passed
    ///
    /// `true` when there is no token or its claim cannot be read.
    pub fn is_token_expired(&self) -> bool {
        match self.get_auth_token() {
            Some(token) => token_expired_at(&token, self.clock.now_millis()),
            None => true,
        }
    }
}
