//! Registry of application storage keys

use serde::{Deserialize, Serialize};

/// Every key the application writes
///
/// `logout` clears exactly this set; values under other keys survive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    AuthToken,
    UserProfile,
    LanguagePreference,
    RiskProfile,
    FinancialGoals,
    MarketData,
    ConversationHistory,
    Theme,
    LastActive,
}

impl StorageKey {
    pub const ALL: [StorageKey; 9] = [
        StorageKey::AuthToken,
        StorageKey::UserProfile,
        StorageKey::LanguagePreference,
        StorageKey::RiskProfile,
        StorageKey::FinancialGoals,
        StorageKey::MarketData,
        StorageKey::ConversationHistory,
        StorageKey::Theme,
        StorageKey::LastActive,
    ];

    /// Name used in the backing store
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AuthToken => "pesaguru_auth_token",
            StorageKey::UserProfile => "pesaguru_user_profile",
            StorageKey::LanguagePreference => "pesaguru_language",
            StorageKey::RiskProfile => "pesaguru_risk_profile",
            StorageKey::FinancialGoals => "pesaguru_financial_goals",
            StorageKey::MarketData => "pesaguru_market_data",
            StorageKey::ConversationHistory => "pesaguru_conversation_history",
            StorageKey::Theme => "pesaguru_theme",
            StorageKey::LastActive => "pesaguru_last_active",
        }
    }

    /// Look up a registered key by its store name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
