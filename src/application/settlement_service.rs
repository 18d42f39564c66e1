//! Settlement workflow over the rule and settlement repositories.
//!
//! Tier sets are resolved and validated once per channel; every settlement row
//! for that channel is then evaluated against the cached [`ResolvedTiers`].

use crate::domain::commission::{ResolvedTiers, resolve_tiers};
use crate::domain::errors::SettlementError;
use crate::domain::repositories::{RuleRepository, SettlementRepository};
use crate::domain::settlement::{
    Adjustment, AdjustmentKind, Settlement, SettlementPeriod, SettlementPolicy, SettlementStatus,
};
use anyhow::Result;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One line of monthly performance input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub channel_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub performance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub channel_id: String,
    pub reason: String,
}

/// Result of a batch run: drafts that were stored and rows that were not.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub created: Vec<Settlement>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub period: SettlementPeriod,
    pub count: usize,
    pub by_status: HashMap<SettlementStatus, usize>,
    pub total_performance: Decimal,
    pub total_base_commission: Decimal,
    pub total_net_payable: Decimal,
}

pub struct SettlementService {
    rules: Arc<dyn RuleRepository>,
    settlements: Arc<dyn SettlementRepository>,
    policy: SettlementPolicy,
}

impl SettlementService {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        settlements: Arc<dyn SettlementRepository>,
        policy: SettlementPolicy,
    ) -> Self {
        Self {
            rules,
            settlements,
            policy,
        }
    }

    pub fn policy(&self) -> &SettlementPolicy {
        &self.policy
    }

    /// Resolves the tiers for an active channel: override, assigned rule, default rule.
    pub async fn resolve_for_channel(&self, channel_id: &str) -> Result<ResolvedTiers> {
        self.resolve(channel_id, true).await
    }

    async fn resolve(&self, channel_id: &str, require_active: bool) -> Result<ResolvedTiers> {
        let channel = self
            .rules
            .get_channel(channel_id)
            .await
            .ok_or_else(|| SettlementError::ChannelNotFound {
                channel_id: channel_id.to_string(),
            })?;
        if require_active && !channel.is_active() {
            return Err(SettlementError::ChannelNotActive {
                channel_id: channel_id.to_string(),
            }
            .into());
        }

        let channel_override = self.rules.get_override(channel_id).await;
        let assigned = match &channel.rule_id {
            Some(rule_id) => {
                let rule = self.rules.get_rule(rule_id).await;
                if rule.is_none() {
                    warn!(
                        "Channel {} references unknown rule {}, falling back to default",
                        channel_id, rule_id
                    );
                }
                rule
            }
            None => None,
        };
        let default = self.rules.default_rule().await;

        let resolved = resolve_tiers(
            &channel,
            channel_override.as_ref(),
            assigned.as_ref(),
            default.as_ref(),
        )?;
        debug!("Channel {} uses tiers from {:?}", channel_id, resolved.source);
        Ok(resolved)
    }

    pub async fn create_draft(
        &self,
        channel_id: &str,
        period: SettlementPeriod,
        performance: Decimal,
    ) -> Result<Settlement> {
        self.ensure_unique(channel_id, period).await?;
        let resolved = self.resolve_for_channel(channel_id).await?;
        let settlement = Settlement::draft(channel_id, period, performance, &resolved, &self.policy)?;
        self.settlements.save(&settlement).await?;

        info!(
            "Draft settlement {} for {} in {}: performance {} at {}% -> {}",
            settlement.id,
            channel_id,
            period,
            settlement.performance_amount,
            settlement.rate,
            settlement.net_payable
        );
        Ok(settlement)
    }

    /// Drafts settlements for many rows, resolving each channel's tiers once.
    ///
    /// Rows that fail (unknown channel, duplicate, negative amount, ...) are
    /// reported in the outcome and do not abort the batch.
    pub async fn batch_drafts(
        &self,
        period: SettlementPeriod,
        rows: Vec<PerformanceRow>,
    ) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut resolved: HashMap<String, ResolvedTiers> = HashMap::new();
        let mut unresolvable: HashMap<String, String> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending = Vec::with_capacity(rows.len());

        for row in rows {
            if row.performance < Decimal::ZERO {
                outcome.failures.push(RowFailure {
                    reason: SettlementError::NegativePerformance {
                        amount: row.performance,
                    }
                    .to_string(),
                    channel_id: row.channel_id,
                });
                continue;
            }

            if seen.contains(&row.channel_id)
                || self
                    .settlements
                    .find_by_channel_period(&row.channel_id, period)
                    .await?
                    .is_some()
            {
                outcome.failures.push(RowFailure {
                    reason: SettlementError::Duplicate {
                        channel_id: row.channel_id.clone(),
                        period: period.to_string(),
                    }
                    .to_string(),
                    channel_id: row.channel_id,
                });
                continue;
            }

            if !resolved.contains_key(&row.channel_id)
                && !unresolvable.contains_key(&row.channel_id)
            {
                match self.resolve_for_channel(&row.channel_id).await {
                    Ok(tiers) => {
                        resolved.insert(row.channel_id.clone(), tiers);
                    }
                    Err(e) => {
                        unresolvable.insert(row.channel_id.clone(), e.to_string());
                    }
                }
            }

            if let Some(reason) = unresolvable.get(&row.channel_id) {
                outcome.failures.push(RowFailure {
                    channel_id: row.channel_id,
                    reason: reason.clone(),
                });
                continue;
            }
            seen.insert(row.channel_id.clone());
            pending.push(row);
        }

        let policy = self.policy;
        let drafted: Vec<(String, Result<Settlement, SettlementError>)> = pending
            .into_par_iter()
            .map(|row| {
                let draft = match resolved.get(&row.channel_id) {
                    Some(tiers) => {
                        Settlement::draft(&row.channel_id, period, row.performance, tiers, &policy)
                    }
                    None => Err(SettlementError::NoApplicableRule {
                        channel_id: row.channel_id.clone(),
                    }),
                };
                (row.channel_id, draft)
            })
            .collect();

        for (channel_id, draft) in drafted {
            match draft {
                Ok(settlement) => {
                    self.settlements.save(&settlement).await?;
                    outcome.created.push(settlement);
                }
                Err(e) => outcome.failures.push(RowFailure {
                    channel_id,
                    reason: e.to_string(),
                }),
            }
        }

        info!(
            "Batch for {}: {} drafts created, {} rows failed",
            period,
            outcome.created.len(),
            outcome.failures.len()
        );
        for failure in &outcome.failures {
            warn!("Row for {} skipped: {}", failure.channel_id, failure.reason);
        }
        Ok(outcome)
    }

    /// Replaces the performance amount, re-resolving the channel's current tiers.
    ///
    /// Drafts stay correctable after their channel is suspended.
    pub async fn update_performance(&self, id: Uuid, performance: Decimal) -> Result<Settlement> {
        let mut settlement = self.load(id).await?;
        let resolved = self.resolve(&settlement.channel_id, false).await?;
        settlement.recalculate(performance, &resolved.tiers, &self.policy)?;
        settlement.tier_source = resolved.source;
        self.settlements.save(&settlement).await?;
        Ok(settlement)
    }

    pub async fn add_adjustment(
        &self,
        id: Uuid,
        kind: AdjustmentKind,
        amount: Decimal,
        reason: &str,
    ) -> Result<Settlement> {
        let adjustment = Adjustment::new(kind, amount, reason)?;
        let policy = self.policy;
        self.apply(id, |s| s.add_adjustment(adjustment, &policy))
            .await
    }

    pub async fn remove_adjustment(&self, id: Uuid, adjustment_id: Uuid) -> Result<Settlement> {
        let policy = self.policy;
        self.apply(id, |s| s.remove_adjustment(adjustment_id, &policy).map(|_| ()))
            .await
    }

    pub async fn submit(&self, id: Uuid) -> Result<Settlement> {
        self.apply(id, Settlement::submit).await
    }

    pub async fn dispute(&self, id: Uuid, reason: &str) -> Result<Settlement> {
        self.apply(id, |s| s.dispute(reason)).await
    }

    pub async fn reopen(&self, id: Uuid) -> Result<Settlement> {
        self.apply(id, Settlement::reopen).await
    }

    pub async fn confirm(&self, id: Uuid) -> Result<Settlement> {
        self.apply(id, Settlement::confirm).await
    }

    pub async fn settle(&self, id: Uuid) -> Result<Settlement> {
        self.apply(id, Settlement::settle).await
    }

    pub async fn list_period(&self, period: SettlementPeriod) -> Result<Vec<Settlement>> {
        self.settlements.list_by_period(period).await
    }

    pub async fn period_summary(&self, period: SettlementPeriod) -> Result<PeriodSummary> {
        let settlements = self.settlements.list_by_period(period).await?;
        let mut summary = PeriodSummary {
            period,
            count: settlements.len(),
            by_status: HashMap::new(),
            total_performance: Decimal::ZERO,
            total_base_commission: Decimal::ZERO,
            total_net_payable: Decimal::ZERO,
        };
        let overflow = || SettlementError::AmountOverflow {
            what: "period totals",
        };
        for s in &settlements {
            *summary.by_status.entry(s.status).or_insert(0) += 1;
            summary.total_performance = summary
                .total_performance
                .checked_add(s.performance_amount)
                .ok_or_else(overflow)?;
            summary.total_base_commission = summary
                .total_base_commission
                .checked_add(s.base_commission)
                .ok_or_else(overflow)?;
            summary.total_net_payable = summary
                .total_net_payable
                .checked_add(s.net_payable)
                .ok_or_else(overflow)?;
        }
        Ok(summary)
    }

    async fn load(&self, id: Uuid) -> Result<Settlement> {
        let settlement = self
            .settlements
            .get(id)
            .await?
            .ok_or_else(|| SettlementError::NotFound { id: id.to_string() })?;
        Ok(settlement)
    }

    async fn apply<F>(&self, id: Uuid, f: F) -> Result<Settlement>
    where
        F: FnOnce(&mut Settlement) -> Result<(), SettlementError>,
    {
        let mut settlement = self.load(id).await?;
        let before = settlement.status;
        f(&mut settlement)?;
        self.settlements.save(&settlement).await?;
        if before != settlement.status {
            info!(
                "Settlement {} ({} {}) {:?} -> {:?}",
                settlement.id, settlement.channel_id, settlement.period, before, settlement.status
            );
        }
        Ok(settlement)
    }

    async fn ensure_unique(&self, channel_id: &str, period: SettlementPeriod) -> Result<()> {
        if self
            .settlements
            .find_by_channel_period(channel_id, period)
            .await?
            .is_some()
        {
            return Err(SettlementError::Duplicate {
                channel_id: channel_id.to_string(),
                period: period.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
