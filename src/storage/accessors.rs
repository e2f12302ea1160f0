//! Typed accessors for the registered keys
//!
//! Each key has one value type; these methods are the only place that
//! pairing is written down.

use chrono::{DateTime, Utc};

use crate::clock::{Clock, MILLIS_PER_MINUTE};

use super::expiring::SecureExpiringStore;
use super::keys::StorageKey;
use super::records::{ChatMessage, FinancialGoal, Language, MarketSnapshot, RiskProfile, Theme, UserProfile};
use super::Store;

impl<S: Store, C: Clock> SecureExpiringStore<S, C> {
    pub fn user_profile(&self) -> Option<UserProfile> {
        self.get_optional(StorageKey::UserProfile.as_str())
    }

    pub fn set_user_profile(&self, profile: &UserProfile) -> bool {
        self.set_item(StorageKey::UserProfile.as_str(), profile, None)
    }

    pub fn language(&self) -> Language {
        self.get_item(StorageKey::LanguagePreference.as_str(), Language::default())
    }

    pub fn set_language(&self, language: Language) -> bool {
        self.set_item(StorageKey::LanguagePreference.as_str(), &language, None)
    }

    pub fn theme(&self) -> Theme {
        self.get_item(StorageKey::Theme.as_str(), Theme::default())
    }

    pub fn set_theme(&self, theme: Theme) -> bool {
        self.set_item(StorageKey::Theme.as_str(), &theme, None)
    }

    /// Risk profile, `None` until the questionnaire is completed
    pub fn risk_profile(&self) -> Option<RiskProfile> {
        self.get_optional(StorageKey::RiskProfile.as_str())
    }

    pub fn set_risk_profile(&self, profile: RiskProfile) -> bool {
        self.set_item(StorageKey::RiskProfile.as_str(), &profile, None)
    }

    pub fn financial_goals(&self) -> Vec<FinancialGoal> {
        self.get_item(StorageKey::FinancialGoals.as_str(), Vec::new())
    }

    pub fn set_financial_goals(&self, goals: &[FinancialGoal]) -> bool {
        self.set_item(StorageKey::FinancialGoals.as_str(), goals, None)
    }

    /// Insert `goal`, replacing any goal with the same id
    pub fn upsert_financial_goal(&self, goal: FinancialGoal) -> bool {
        let mut goals = self.financial_goals();
        match goals.iter_mut().find(|g| g.id == goal.id) {
            Some(existing) => *existing = goal,
            None => goals.push(goal),
        }
        self.set_financial_goals(&goals)
    }

    /// Remove the goal with `id`; `false` if it was not there or the write failed
    pub fn remove_financial_goal(&self, id: &str) -> bool {
        let mut goals = self.financial_goals();
        let before = goals.len();
        goals.retain(|g| g.id != id);
        goals.len() != before && self.set_financial_goals(&goals)
    }

    /// Cached market data, `None` once the cache TTL has passed
    pub fn market_data(&self) -> Option<MarketSnapshot> {
        self.get_optional(StorageKey::MarketData.as_str())
    }

    /// Cache a market data response for the configured TTL
    pub fn cache_market_data(&self, payload: serde_json::Value) -> bool {
        let snapshot = MarketSnapshot {
            fetched_at: self.clock().now(),
            payload,
        };
        self.set_item(
            StorageKey::MarketData.as_str(),
            &snapshot,
            Some(self.config().market_data_ttl_minutes),
        )
    }

    pub fn conversation_history(&self) -> Vec<ChatMessage> {
        self.get_item(StorageKey::ConversationHistory.as_str(), Vec::new())
    }

    /// Append a message, dropping the oldest beyond the configured maximum
    pub fn append_chat_message(&self, message: ChatMessage) -> bool {
        let mut history = self.conversation_history();
        history.push(message);

        let max = self.config().max_conversation_messages;
        if history.len() > max {
            let excess = history.len() - max;
            history = history.split_off(excess);
        }

        self.set_item(StorageKey::ConversationHistory.as_str(), &history, None)
    }

    pub fn clear_conversation_history(&self) -> bool {
        self.remove_item(StorageKey::ConversationHistory.as_str())
    }

    /// Last recorded activity, if any
    pub fn last_active(&self) -> Option<DateTime<Utc>> {
        self.get_optional::<i64>(StorageKey::LastActive.as_str())
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Record activity now
    pub fn touch_last_active(&self) -> bool {
        let now = self.clock().now_millis();
        self.set_item(StorageKey::LastActive.as_str(), &now, None)
    }

    /// Whether more than `max_idle_minutes` have passed since the last activity
    ///
    /// `true` when no activity was ever recorded.
    pub fn is_session_idle(&self, max_idle_minutes: u64) -> bool {
        let Some(last) = self.get_optional::<i64>(StorageKey::LastActive.as_str()) else {
            return true;
        };
        let limit = i64::try_from(max_idle_minutes)
            .unwrap_or(i64::MAX)
            .saturating_mul(MILLIS_PER_MINUTE);
        self.clock().now_millis().saturating_sub(last) > limit
    }

    /// Forget everything the application stored
    pub fn logout(&self) -> bool {
        self.clear_all(StorageKey::ALL)
    }
}
