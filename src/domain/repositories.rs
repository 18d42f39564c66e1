//! Repository Pattern Abstractions
//!
//! Storage seams for rules, channels and settlements, keeping the settlement
//! workflow independent of where records live.
//!
//! # Current Implementation
//!
//! The `InMemory` implementations hold everything behind `Arc<RwLock>`
//! and are seeded from fixture files. Nothing is durable.
//!
//! # Example
//!
//! ```rust,no_run
//! use partnerpay::domain::repositories::RuleRepository;
//! use partnerpay::infrastructure::InMemoryRuleRepository;
//!
//! # async {
//! let repo = InMemoryRuleRepository::new();
//! let default_rule = repo.default_rule().await;
//! # };
//! ```

use crate::domain::commission::{Channel, ChannelOverride, CommissionRule, RuleStatus};
use crate::domain::errors::TierValidationError;
use crate::domain::settlement::{Settlement, SettlementPeriod};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Commission rules, channel overrides and channels
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Validate and store a rule
    async fn upsert_rule(&self, rule: CommissionRule) -> Result<(), TierValidationError>;

    async fn set_rule_status(&self, id: &str, status: RuleStatus) -> Result<()>;

    async fn get_rule(&self, id: &str) -> Option<CommissionRule>;

    /// The active rule flagged as default, if any
    async fn default_rule(&self) -> Option<CommissionRule>;

    async fn list_rules(&self) -> Vec<CommissionRule>;

    /// Validate and store a channel override
    async fn upsert_override(&self, channel_override: ChannelOverride)
    -> Result<(), TierValidationError>;

    async fn remove_override(&self, channel_id: &str) -> Option<ChannelOverride>;

    async fn get_override(&self, channel_id: &str) -> Option<ChannelOverride>;

    async fn upsert_channel(&self, channel: Channel);

    async fn get_channel(&self, id: &str) -> Option<Channel>;

    async fn list_channels(&self) -> Vec<Channel>;
}

/// Settlement applications
#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Insert or replace a settlement
    async fn save(&self, settlement: &Settlement) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Settlement>>;

    async fn find_by_channel_period(
        &self,
        channel_id: &str,
        period: SettlementPeriod,
    ) -> Result<Option<Settlement>>;

    async fn list_by_period(&self, period: SettlementPeriod) -> Result<Vec<Settlement>>;

    async fn count(&self) -> Result<usize>;
}
