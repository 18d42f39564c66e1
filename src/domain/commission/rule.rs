use crate::domain::commission::engine::{TieredRateEngine, ValidatedTierSet};
use crate::domain::commission::tier::TierSet;
use crate::domain::errors::{SettlementError, TierValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

/// A named commission rule shared by many channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tiers: TierSet,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl CommissionRule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tiers: TierSet) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tiers,
            status: RuleStatus::Active,
            is_default: false,
            updated_at: Utc::now(),
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    pub fn validated_tiers(&self) -> Result<ValidatedTierSet, TierValidationError> {
        TieredRateEngine::validate(&self.tiers)
    }
}

/// Per-channel tier set that replaces the channel's rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelOverride {
    pub channel_id: String,
    pub tiers: TierSet,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    #[default]
    Pending,
    Active,
    Suspended,
}

/// A channel partner going through onboarding and monthly settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub status: ChannelStatus,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rule_id: None,
            status: ChannelStatus::Pending,
        }
    }

    pub fn with_status(mut self, status: ChannelStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ChannelStatus::Active
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }
}

/// Where the tiers applied to a settlement came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rule_id", rename_all = "snake_case")]
pub enum TierSource {
    ChannelOverride,
    AssignedRule(String),
    DefaultRule(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedTiers {
    pub source: TierSource,
    pub tiers: ValidatedTierSet,
}

/// Picks the tiers for `channel`: override, then assigned rule (if active), then default rule.
pub fn resolve_tiers(
    channel: &Channel,
    channel_override: Option<&ChannelOverride>,
    assigned: Option<&CommissionRule>,
    default: Option<&CommissionRule>,
) -> Result<ResolvedTiers, SettlementError> {
    if let Some(ov) = channel_override {
        let tiers = TieredRateEngine::validate(&ov.tiers).map_err(|source| {
            SettlementError::InvalidTiers {
                owner: format!("channel override {}", channel.id),
                source,
            }
        })?;
        return Ok(ResolvedTiers {
            source: TierSource::ChannelOverride,
            tiers,
        });
    }

    let (rule, source) = match (assigned.filter(|r| r.is_active()), default) {
        (Some(rule), _) => (rule, TierSource::AssignedRule(rule.id.clone())),
        (None, Some(rule)) if rule.is_active() => (rule, TierSource::DefaultRule(rule.id.clone())),
        _ => {
            return Err(SettlementError::NoApplicableRule {
                channel_id: channel.id.clone(),
            });
        }
    };

    let tiers = rule
        .validated_tiers()
        .map_err(|source| SettlementError::InvalidTiers {
            owner: format!("rule {}", rule.id),
            source,
        })?;
    Ok(ResolvedTiers { source, tiers })
}

/// Collection of commission rules with the single-default invariant.
#[derive(Debug, Clone, Default)]
pub struct CommissionRuleBook {
    rules: BTreeMap<String, CommissionRule>,
}

impl CommissionRuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `rule` after validating its tiers. A new default clears the flag elsewhere.
    pub fn upsert(&mut self, mut rule: CommissionRule) -> Result<(), TierValidationError> {
        rule.validated_tiers()?;
        if rule.is_default {
            for other in self.rules.values_mut() {
                other.is_default = false;
            }
        }
        rule.updated_at = Utc::now();
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    pub fn set_status(&mut self, id: &str, status: RuleStatus) -> Result<(), SettlementError> {
        let rule = self
            .rules
            .get_mut(id)
            .ok_or_else(|| SettlementError::RuleNotFound {
                rule_id: id.to_string(),
            })?;
        rule.status = status;
        rule.updated_at = Utc::now();
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CommissionRule> {
        self.rules.get(id)
    }

    pub fn default_rule(&self) -> Option<&CommissionRule> {
        self.rules.values().find(|r| r.is_default && r.is_active())
    }

    pub fn list(&self) -> Vec<CommissionRule> {
        self.rules.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commission::tier::Tier;
    use rust_decimal_macros::dec;

    fn flat(rate: rust_decimal::Decimal) -> TierSet {
        TierSet::new(vec![Tier::unbounded(dec!(0), rate)])
    }

    #[test]
    fn test_upsert_rejects_invalid_tiers() {
        let mut book = CommissionRuleBook::new();
        let bad = CommissionRule::new("r1", "Broken", TierSet::new(vec![Tier::unbounded(dec!(10), dec!(5))]));
        assert_eq!(
            book.upsert(bad),
            Err(TierValidationError::InvalidLowerBound { index: 1 })
        );
        assert!(book.is_empty());
    }

    #[test]
    fn test_single_default_rule() {
        let mut book = CommissionRuleBook::new();
        book.upsert(CommissionRule::new("a", "A", flat(dec!(10))).as_default())
            .unwrap();
        book.upsert(CommissionRule::new("b", "B", flat(dec!(12))).as_default())
            .unwrap();

        assert_eq!(book.default_rule().map(|r| r.id.as_str()), Some("b"));
        assert!(!book.get("a").unwrap().is_default);
    }

    #[test]
    fn test_inactive_default_is_ignored() {
        let mut book = CommissionRuleBook::new();
        book.upsert(CommissionRule::new("a", "A", flat(dec!(10))).as_default())
            .unwrap();
        book.set_status("a", RuleStatus::Inactive).unwrap();
        assert!(book.default_rule().is_none());
        assert!(book.set_status("missing", RuleStatus::Active).is_err());
    }

    #[test]
    fn test_resolution_order() {
        let channel = Channel::new("ch-1", "North").with_rule("assigned");
        let assigned = CommissionRule::new("assigned", "Assigned", flat(dec!(15)));
        let default = CommissionRule::new("std", "Standard", flat(dec!(10))).as_default();
        let ov = ChannelOverride {
            channel_id: "ch-1".to_string(),
            tiers: flat(dec!(18)),
            reason: None,
        };

        let resolved = resolve_tiers(&channel, Some(&ov), Some(&assigned), Some(&default)).unwrap();
        assert_eq!(resolved.source, TierSource::ChannelOverride);

        let resolved = resolve_tiers(&channel, None, Some(&assigned), Some(&default)).unwrap();
        assert_eq!(resolved.source, TierSource::AssignedRule("assigned".to_string()));

        let mut inactive = assigned.clone();
        inactive.status = RuleStatus::Inactive;
        let resolved = resolve_tiers(&channel, None, Some(&inactive), Some(&default)).unwrap();
        assert_eq!(resolved.source, TierSource::DefaultRule("std".to_string()));

        assert!(matches!(
            resolve_tiers(&channel, None, Some(&inactive), None),
            Err(SettlementError::NoApplicableRule { .. })
        ));
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let channel = Channel::new("ch-2", "South");
        let ov = ChannelOverride {
            channel_id: "ch-2".to_string(),
            tiers: TierSet::default(),
            reason: Some("negotiated".to_string()),
        };
        let err = resolve_tiers(&channel, Some(&ov), None, None).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::InvalidTiers {
                source: TierValidationError::EmptyTierSet,
                ..
            }
        ));
    }
}
