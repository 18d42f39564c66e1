use crate::domain::commission::{
    ResolvedTiers, TierSource, TieredRateEngine, ValidatedTierSet, round_money,
};
use crate::domain::errors::SettlementError;
use crate::domain::settlement::adjustment::Adjustment;
use crate::domain::settlement::period::SettlementPeriod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Reconciliation status of a settlement application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Draft,
    Submitted,
    Disputed,
    Confirmed,
    Settled,
}

impl SettlementStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, SettlementStatus::Confirmed | SettlementStatus::Settled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: SettlementStatus,
    pub to: SettlementStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Rounding and floor behaviour applied when computing settlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPolicy {
    pub decimal_places: u32,
    pub allow_negative_payable: bool,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            allow_negative_payable: false,
        }
    }
}

/// Monthly settlement application for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: Uuid,
    pub channel_id: String,
    pub period: SettlementPeriod,
    pub tier_source: TierSource,
    pub performance_amount: Decimal,
    pub rate: Decimal,
    pub tier_index: usize,
    pub base_commission: Decimal,
    pub adjustments: Vec<Adjustment>,
    pub net_payable: Decimal,
    pub status: SettlementStatus,
    pub locked: bool,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Settlement {
    pub fn draft(
        channel_id: impl Into<String>,
        period: SettlementPeriod,
        performance_amount: Decimal,
        resolved: &ResolvedTiers,
        policy: &SettlementPolicy,
    ) -> Result<Self, SettlementError> {
        let now = Utc::now();
        let mut settlement = Self {
            id: Uuid::new_v4(),
            channel_id: channel_id.into(),
            period,
            tier_source: resolved.source.clone(),
            performance_amount: Decimal::ZERO,
            rate: Decimal::ZERO,
            tier_index: 0,
            base_commission: Decimal::ZERO,
            adjustments: Vec::new(),
            net_payable: Decimal::ZERO,
            status: SettlementStatus::Draft,
            locked: false,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        settlement.recalculate(performance_amount, &resolved.tiers, policy)?;
        Ok(settlement)
    }

    /// Recomputes rate, commission and payable for a new performance amount.
    pub fn recalculate(
        &mut self,
        performance_amount: Decimal,
        tiers: &ValidatedTierSet,
        policy: &SettlementPolicy,
    ) -> Result<(), SettlementError> {
        self.ensure_editable()?;
        if performance_amount < Decimal::ZERO {
            return Err(SettlementError::NegativePerformance {
                amount: performance_amount,
            });
        }

        let lookup = TieredRateEngine::evaluate(tiers, performance_amount);
        let base_commission = round_money(
            TieredRateEngine::compute_commission(tiers, performance_amount),
            policy.decimal_places,
        );
        let net_payable = self.payable_for(base_commission, policy)?;

        self.performance_amount = performance_amount;
        self.rate = lookup.rate;
        self.tier_index = lookup.tier_index;
        self.base_commission = base_commission;
        self.net_payable = net_payable;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn add_adjustment(
        &mut self,
        adjustment: Adjustment,
        policy: &SettlementPolicy,
    ) -> Result<(), SettlementError> {
        self.ensure_editable()?;
        self.adjustments.push(adjustment);
        if let Err(e) = self.refresh_payable(policy) {
            self.adjustments.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn remove_adjustment(
        &mut self,
        adjustment_id: Uuid,
        policy: &SettlementPolicy,
    ) -> Result<Adjustment, SettlementError> {
        self.ensure_editable()?;
        let position = self
            .adjustments
            .iter()
            .position(|a| a.id == adjustment_id)
            .ok_or_else(|| SettlementError::AdjustmentNotFound {
                id: adjustment_id.to_string(),
            })?;
        let removed = self.adjustments.remove(position);
        if let Err(e) = self.refresh_payable(policy) {
            self.adjustments.insert(position, removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Sum of signed adjustments.
    pub fn adjustment_total(&self) -> Result<Decimal, SettlementError> {
        self.adjustments
            .iter()
            .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a.signed_amount()))
            .ok_or(SettlementError::AmountOverflow {
                what: "adjustment total",
            })
    }

    pub fn submit(&mut self) -> Result<(), SettlementError> {
        self.transition(SettlementStatus::Draft, SettlementStatus::Submitted, "submit", None)
    }

    pub fn dispute(&mut self, reason: impl Into<String>) -> Result<(), SettlementError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(SettlementError::MissingReason { action: "dispute" });
        }
        self.transition(
            SettlementStatus::Submitted,
            SettlementStatus::Disputed,
            "dispute",
            Some(reason),
        )
    }

    pub fn reopen(&mut self) -> Result<(), SettlementError> {
        self.transition(SettlementStatus::Disputed, SettlementStatus::Draft, "reopen", None)
    }

    pub fn confirm(&mut self) -> Result<(), SettlementError> {
        self.transition(
            SettlementStatus::Submitted,
            SettlementStatus::Confirmed,
            "confirm",
            None,
        )?;
        self.locked = true;
        Ok(())
    }

    pub fn settle(&mut self) -> Result<(), SettlementError> {
        self.transition(
            SettlementStatus::Confirmed,
            SettlementStatus::Settled,
            "settle",
            None,
        )
    }

    fn transition(
        &mut self,
        expected: SettlementStatus,
        to: SettlementStatus,
        action: &'static str,
        note: Option<String>,
    ) -> Result<(), SettlementError> {
        if self.status != expected {
            return Err(SettlementError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        let now = Utc::now();
        self.history.push(StatusChange {
            from: self.status,
            to,
            at: now,
            note,
        });
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    // Only drafts can be edited; a submitted settlement must be disputed and reopened first.
    fn ensure_editable(&self) -> Result<(), SettlementError> {
        if self.locked || self.status.is_locked() {
            return Err(SettlementError::Locked {
                status: self.status,
            });
        }
        if self.status != SettlementStatus::Draft {
            return Err(SettlementError::InvalidTransition {
                from: self.status,
                action: "edit",
            });
        }
        Ok(())
    }

    fn refresh_payable(&mut self, policy: &SettlementPolicy) -> Result<(), SettlementError> {
        self.net_payable = self.payable_for(self.base_commission, policy)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn payable_for(
        &self,
        base_commission: Decimal,
        policy: &SettlementPolicy,
    ) -> Result<Decimal, SettlementError> {
        let net = base_commission
            .checked_add(self.adjustment_total()?)
            .ok_or(SettlementError::AmountOverflow {
                what: "net payable",
            })?;
        if net < Decimal::ZERO && !policy.allow_negative_payable {
            warn!(
                "Settlement {} for {} nets to {}, flooring payable at zero",
                self.id, self.channel_id, net
            );
            return Ok(Decimal::ZERO);
        }
        Ok(round_money(net, policy.decimal_places))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commission::{Tier, TierSet};
    use crate::domain::settlement::adjustment::AdjustmentKind;
    use rust_decimal_macros::dec;

    fn resolved() -> ResolvedTiers {
        let tiers = TieredRateEngine::validate(&TierSet::new(vec![
            Tier::bounded(dec!(0), dec!(50), dec!(20)),
            Tier::bounded(dec!(50), dec!(100), dec!(25)),
            Tier::unbounded(dec!(100), dec!(30)),
        ]))
        .unwrap();
        ResolvedTiers {
            source: TierSource::DefaultRule("std".to_string()),
            tiers,
        }
    }

    fn draft(amount: Decimal) -> Settlement {
        Settlement::draft(
            "ch-1",
            SettlementPeriod::new(2024, 5).unwrap(),
            amount,
            &resolved(),
            &SettlementPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_draft_computes_commission() {
        let s = draft(dec!(75));
        assert_eq!(s.rate, dec!(25));
        assert_eq!(s.tier_index, 2);
        assert_eq!(s.base_commission, dec!(18.75));
        assert_eq!(s.net_payable, dec!(18.75));
        assert_eq!(s.status, SettlementStatus::Draft);
    }

    #[test]
    fn test_negative_performance_rejected() {
        let result = Settlement::draft(
            "ch-1",
            SettlementPeriod::new(2024, 5).unwrap(),
            dec!(-1),
            &resolved(),
            &SettlementPolicy::default(),
        );
        assert!(matches!(
            result,
            Err(SettlementError::NegativePerformance { .. })
        ));
    }

    #[test]
    fn test_commission_rounding() {
        // 33.333 * 20% = 6.6666
        let s = draft(dec!(33.333));
        assert_eq!(s.base_commission, dec!(6.67));
    }

    #[test]
    fn test_adjustments_change_payable() {
        let policy = SettlementPolicy::default();
        let mut s = draft(dec!(100)); // 30.00
        let bonus = Adjustment::new(AdjustmentKind::Bonus, dec!(5.5), "launch bonus").unwrap();
        let bonus_id = bonus.id;
        s.add_adjustment(bonus, &policy).unwrap();
        s.add_adjustment(
            Adjustment::new(AdjustmentKind::Deduction, dec!(10), "chargeback").unwrap(),
            &policy,
        )
        .unwrap();
        assert_eq!(s.net_payable, dec!(25.5));

        s.remove_adjustment(bonus_id, &policy).unwrap();
        assert_eq!(s.net_payable, dec!(20));
        assert!(s.remove_adjustment(bonus_id, &policy).is_err());
    }

    #[test]
    fn test_huge_amounts_report_overflow() {
        let policy = SettlementPolicy::default();
        let mut s = draft(Decimal::MAX);
        assert_eq!(s.tier_index, 3);
        assert!(s.base_commission > Decimal::ZERO);

        let base = s.base_commission;
        let bonus = Adjustment::new(AdjustmentKind::Bonus, Decimal::MAX, "record month").unwrap();
        assert!(matches!(
            s.add_adjustment(bonus, &policy),
            Err(SettlementError::AmountOverflow { .. })
        ));
        assert!(s.adjustments.is_empty());
        assert_eq!(s.net_payable, base);
    }

    #[test]
    fn test_negative_payable_floor() {
        let mut s = draft(dec!(10)); // 2.00
        let deduction = Adjustment::new(AdjustmentKind::Deduction, dec!(5), "clawback").unwrap();
        s.add_adjustment(deduction.clone(), &SettlementPolicy::default())
            .unwrap();
        assert_eq!(s.net_payable, Decimal::ZERO);

        let lenient = SettlementPolicy {
            allow_negative_payable: true,
            ..SettlementPolicy::default()
        };
        s.remove_adjustment(deduction.id, &lenient).unwrap();
        s.add_adjustment(deduction, &lenient).unwrap();
        assert_eq!(s.net_payable, dec!(-3));
    }

    #[test]
    fn test_lifecycle_and_locking() {
        let policy = SettlementPolicy::default();
        let tiers = resolved().tiers;
        let mut s = draft(dec!(75));

        s.submit().unwrap();
        assert!(matches!(
            s.recalculate(dec!(80), &tiers, &policy),
            Err(SettlementError::InvalidTransition { action: "edit", .. })
        ));

        s.dispute("volume mismatch").unwrap();
        s.reopen().unwrap();
        s.recalculate(dec!(120), &tiers, &policy).unwrap();
        assert_eq!(s.base_commission, dec!(36));

        s.submit().unwrap();
        s.confirm().unwrap();
        assert!(s.locked);
        assert!(matches!(
            s.add_adjustment(
                Adjustment::new(AdjustmentKind::Bonus, dec!(1), "late").unwrap(),
                &policy
            ),
            Err(SettlementError::Locked { .. })
        ));

        s.settle().unwrap();
        assert_eq!(s.status, SettlementStatus::Settled);
        assert_eq!(s.history.len(), 6);
        assert_eq!(s.history[1].note.as_deref(), Some("volume mismatch"));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut s = draft(dec!(75));
        assert!(s.confirm().is_err());
        assert!(s.settle().is_err());
        assert!(s.reopen().is_err());
        assert!(s.dispute("no").is_err());
        s.submit().unwrap();
        assert!(s.submit().is_err());
        assert!(s.dispute(" ").is_err());
    }
}
