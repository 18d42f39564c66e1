//! In-Memory Repository Implementations
//!
//! This module provides thread-safe, in-memory implementations of the
//! repository traits defined in `domain::repositories`.
//!
//! # Limitations
//!
//! - Data is lost on restart; fixtures are reloaded on every start
//! - No persistence across multiple instances
//! - Last writer wins, there is no optimistic locking

use crate::domain::commission::{
    Channel, ChannelOverride, CommissionRule, CommissionRuleBook, RuleStatus, TieredRateEngine,
};
use crate::domain::errors::TierValidationError;
use crate::domain::repositories::{RuleRepository, SettlementRepository};
use crate::domain::settlement::{Settlement, SettlementPeriod};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of RuleRepository
pub struct InMemoryRuleRepository {
    rules: Arc<RwLock<CommissionRuleBook>>,
    overrides: Arc<RwLock<HashMap<String, ChannelOverride>>>,
    channels: Arc<RwLock<BTreeMap<String, Channel>>>,
}

impl InMemoryRuleRepository {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(CommissionRuleBook::new())),
            overrides: Arc::new(RwLock::new(HashMap::new())),
            channels: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for InMemoryRuleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn upsert_rule(&self, rule: CommissionRule) -> Result<(), TierValidationError> {
        self.rules.write().await.upsert(rule)
    }

    async fn set_rule_status(&self, id: &str, status: RuleStatus) -> Result<()> {
        self.rules.write().await.set_status(id, status)?;
        Ok(())
    }

    async fn get_rule(&self, id: &str) -> Option<CommissionRule> {
        self.rules.read().await.get(id).cloned()
    }

    async fn default_rule(&self) -> Option<CommissionRule> {
        self.rules.read().await.default_rule().cloned()
    }

    async fn list_rules(&self) -> Vec<CommissionRule> {
        self.rules.read().await.list()
    }

    async fn upsert_override(
        &self,
        channel_override: ChannelOverride,
    ) -> Result<(), TierValidationError> {
        TieredRateEngine::validate(&channel_override.tiers)?;
        self.overrides
            .write()
            .await
            .insert(channel_override.channel_id.clone(), channel_override);
        Ok(())
    }

    async fn remove_override(&self, channel_id: &str) -> Option<ChannelOverride> {
        self.overrides.write().await.remove(channel_id)
    }

    async fn get_override(&self, channel_id: &str) -> Option<ChannelOverride> {
        self.overrides.read().await.get(channel_id).cloned()
    }

    async fn upsert_channel(&self, channel: Channel) {
        self.channels
            .write()
            .await
            .insert(channel.id.clone(), channel);
    }

    async fn get_channel(&self, id: &str) -> Option<Channel> {
        self.channels.read().await.get(id).cloned()
    }

    async fn list_channels(&self) -> Vec<Channel> {
        self.channels.read().await.values().cloned().collect()
    }
}

/// In-memory implementation of SettlementRepository
pub struct InMemorySettlementRepository {
    settlements: Arc<RwLock<HashMap<Uuid, Settlement>>>,
}

impl InMemorySettlementRepository {
    pub fn new() -> Self {
        Self {
            settlements: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySettlementRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementRepository for InMemorySettlementRepository {
    async fn save(&self, settlement: &Settlement) -> Result<()> {
        self.settlements
            .write()
            .await
            .insert(settlement.id, settlement.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Settlement>> {
        Ok(self.settlements.read().await.get(&id).cloned())
    }

    async fn find_by_channel_period(
        &self,
        channel_id: &str,
        period: SettlementPeriod,
    ) -> Result<Option<Settlement>> {
        let settlements = self.settlements.read().await;
        Ok(settlements
            .values()
            .find(|s| s.channel_id == channel_id && s.period == period)
            .cloned())
    }

    async fn list_by_period(&self, period: SettlementPeriod) -> Result<Vec<Settlement>> {
        let settlements = self.settlements.read().await;
        let mut found: Vec<Settlement> = settlements
            .values()
            .filter(|s| s.period == period)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        Ok(found)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.settlements.read().await.len())
    }
}
