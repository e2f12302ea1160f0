//! Store configuration: TTLs, limits, encryption secret and file location

use std::path::PathBuf;

use log::warn;

pub const ENV_TOKEN_SECRET: &str = "PESAGURU_TOKEN_SECRET";
pub const ENV_STORE_PATH: &str = "PESAGURU_STORE_PATH";
pub const ENV_TOKEN_TTL: &str = "PESAGURU_TOKEN_TTL_MINUTES";
pub const ENV_MARKET_TTL: &str = "PESAGURU_MARKET_DATA_TTL_MINUTES";
pub const ENV_MAX_MESSAGES: &str = "PESAGURU_MAX_CONVERSATION_MESSAGES";

/// Default auth token lifetime in the store
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 30;

/// Default market data cache lifetime
pub const DEFAULT_MARKET_DATA_TTL_MINUTES: u64 = 15;

/// Default number of chat messages kept
pub const DEFAULT_MAX_CONVERSATION_MESSAGES: usize = 50;

/// Configuration for `SecureExpiringStore`
#[derive(Clone)]
pub struct StoreConfig {
    /// TTL applied by `set_auth_token`
    pub token_ttl_minutes: u64,

    /// TTL applied to cached market data
    pub market_data_ttl_minutes: u64,

    /// Conversation history is trimmed to this many messages (oldest dropped)
    pub max_conversation_messages: usize,

    /// Secret the token encryption key is derived from.
    /// Without one, token writes fail closed.
    pub token_secret: Option<String>,

    /// Location of the file-backed store
    pub store_path: PathBuf,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("market_data_ttl_minutes", &self.market_data_ttl_minutes)
            .field("max_conversation_messages", &self.max_conversation_messages)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("store_path", &self.store_path)
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            market_data_ttl_minutes: DEFAULT_MARKET_DATA_TTL_MINUTES,
            max_conversation_messages: DEFAULT_MAX_CONVERSATION_MESSAGES,
            token_secret: None,
            store_path: PathBuf::from("pesaguru_store.json"),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `PESAGURU_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    ///
    /// Unparsable numbers are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            token_ttl_minutes: parse_or(&lookup, ENV_TOKEN_TTL, defaults.token_ttl_minutes),
            market_data_ttl_minutes: parse_or(&lookup, ENV_MARKET_TTL, defaults.market_data_ttl_minutes),
            max_conversation_messages: parse_or(
                &lookup,
                ENV_MAX_MESSAGES,
                defaults.max_conversation_messages,
            ),
            token_secret: lookup(ENV_TOKEN_SECRET).filter(|s| !s.is_empty()),
            store_path: lookup(ENV_STORE_PATH)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
        }
    }

    pub fn with_token_secret(mut self, secret: impl Into<String>) -> Self {
        self.token_secret = Some(secret.into());
        self
    }

    pub fn with_token_ttl(mut self, minutes: u64) -> Self {
        self.token_ttl_minutes = minutes;
        self
    }

    pub fn with_market_data_ttl(mut self, minutes: u64) -> Self {
        self.market_data_ttl_minutes = minutes;
        self
    }

    pub fn with_max_conversation_messages(mut self, max: usize) -> Self {
        self.max_conversation_messages = max;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using default", name, raw);
                default
            }
        },
        None => default,
    }
}
