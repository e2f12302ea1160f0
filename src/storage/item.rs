//! Envelope written for every stored value

use serde::{Deserialize, Serialize};

use crate::clock::MILLIS_PER_MINUTE;

/// A value with its creation time and optional expiration instant
///
/// Times are epoch milliseconds. Serialized as
/// `{"value": .., "timestamp": .., "expiration": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem<T> {
    pub value: T,

    /// When the item was written
    pub timestamp: i64,

    /// Instant at or after which the item counts as absent. `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
}

impl<T> StoredItem<T> {
    /// Wrap `value` written at `now`, expiring `ttl_minutes` later if given
    pub fn new(value: T, now: i64, ttl_minutes: Option<u64>) -> Self {
        let expiration = ttl_minutes.map(|minutes| {
            let ttl = i64::try_from(minutes)
                .unwrap_or(i64::MAX)
                .saturating_mul(MILLIS_PER_MINUTE);
            now.saturating_add(ttl)
        });

        Self {
            value,
            timestamp: now,
            expiration,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expiration.is_some_and(|expiration| now >= expiration)
    }

    /// Milliseconds left before expiry, `None` if the item never expires
    pub fn remaining_millis(&self, now: i64) -> Option<i64> {
        self.expiration.map(|expiration| (expiration - now).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ttl_never_expires() {
        let item = StoredItem::new("x", 1_000, None);
        assert!(!item.is_expired(i64::MAX));
        assert_eq!(item.remaining_millis(5), None);
    }

    #[test]
    fn test_ttl_boundary() {
        let item = StoredItem::new(1u32, 0, Some(30));
        assert!(!item.is_expired(30 * MILLIS_PER_MINUTE - 1));
        assert!(item.is_expired(30 * MILLIS_PER_MINUTE));
        assert_eq!(item.remaining_millis(MILLIS_PER_MINUTE), Some(29 * MILLIS_PER_MINUTE));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let item = StoredItem::new(1u32, 42, Some(0));
        assert!(item.is_expired(42));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let item = StoredItem::new((), 10, Some(u64::MAX));
        assert_eq!(item.expiration, Some(i64::MAX));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(StoredItem::new("tok", 5, None)).unwrap();
        assert_eq!(json, serde_json::json!({ "value": "tok", "timestamp": 5 }));

        let json = serde_json::to_value(StoredItem::new(7, 0, Some(1))).unwrap();
        assert_eq!(json["expiration"], serde_json::json!(60_000));
    }
}
