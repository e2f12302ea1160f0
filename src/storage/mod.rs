//! Expiration-aware, optionally encrypted client storage
//!
//! This module provides:
//! - A `Store` trait over synchronous string key-value backends
//! - In-memory and JSON-file backends
//! - `SecureExpiringStore`: TTL envelopes, lazy eviction and AES-GCM
//!   encrypted auth tokens
//! - A closed registry of application keys with typed accessors
//!
//! # Failure policy
//!
//! Backend and crypto failures never reach callers of
//! `SecureExpiringStore`. They are logged and collapse to `false`, `None`
//! or the caller's default, so a flaky backend only ever costs a reset
//! preference or a fresh login.

mod backend;
mod item;
mod crypto;
mod token;
mod keys;
mod records;
mod expiring;
mod accessors;

use std::rc::Rc;

use thiserror::Error;

pub use backend::{FileStore, MemoryStore};
pub use item::StoredItem;
pub use crypto::{CryptoError, TokenCipher};
pub use token::{decode_expiry_claim, token_expired_at};
pub use keys::StorageKey;
pub use records::{
    ChatMessage, ChatRole, FinancialGoal, Language, MarketSnapshot, RiskProfile, Theme, UserProfile,
};
pub use expiring::SecureExpiringStore;

/// Failure of the underlying key-value backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("quota exceeded writing {key}: {needed} bytes needed, limit {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Synchronous string-keyed string store
///
/// Methods take `&self`: backends are shared handles with interior
/// mutability, like a browser's local storage.
pub trait Store {
    /// Read the raw value for `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write the raw value for `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently present
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<S: Store + ?Sized> Store for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

impl<S: Store + ?Sized> Store for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}
