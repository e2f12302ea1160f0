//! PesaGuru core - loan amortization and secure client storage
//!
//! This library provides:
//! - Level-payment amortization schedules for fixed-rate loans
//! - KES currency formatting and CSV schedule export
//! - An expiration-aware key-value store wrapper with lazy eviction
//! - AES-GCM encrypted auth token storage with JWT expiry checks
//! - Typed accessors for the application's registered storage keys

pub mod clock;
pub mod config;
pub mod loan;
pub mod storage;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use loan::{AmortizationEngine, AmortizationResult, LoanError, LoanParameters, PaymentScheduleEntry};
pub use storage::{FileStore, MemoryStore, SecureExpiringStore, Store, StorageKey, StoredItem};
