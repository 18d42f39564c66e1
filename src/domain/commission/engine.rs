//! Tiered commission rate engine.
//!
//! A [`TierSet`] entered by a user is checked once with [`TieredRateEngine::validate`],
//! which yields a [`ValidatedTierSet`]. Only that type can be evaluated, so rules that
//! are evaluated across many settlement rows are never re-validated per row.

use crate::domain::commission::tier::{Tier, TierSet};
use crate::domain::errors::TierValidationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const MAX_RATE: Decimal = dec!(100);

/// Tier set that passed validation, kept sorted by `min`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedTierSet {
    tiers: Vec<Tier>,
}

impl ValidatedTierSet {
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always false: validation rejects empty sets.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn into_tier_set(self) -> TierSet {
        TierSet::new(self.tiers)
    }
}

/// Result of looking up the applicable tier for an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLookup {
    pub rate: Decimal,
    /// 1-based position in sorted order
    pub tier_index: usize,
}

pub struct TieredRateEngine;

impl TieredRateEngine {
    /// Validates `tiers`, failing on the first violated invariant.
    ///
    /// Checks run as ordered passes over the sorted copy: non-empty, lower bound,
    /// inverted bounds, contiguity, rate range.
    pub fn validate(tiers: &TierSet) -> Result<ValidatedTierSet, TierValidationError> {
        let sorted = tiers.sorted();

        let Some(first) = sorted.first() else {
            return Err(TierValidationError::EmptyTierSet);
        };

        if first.min != Decimal::ZERO {
            return Err(TierValidationError::InvalidLowerBound { index: 1 });
        }

        for (i, tier) in sorted.iter().enumerate() {
            if tier.max.is_some_and(|max| tier.min >= max) {
                return Err(TierValidationError::InvertedBounds { index: i + 1 });
            }
        }

        for (i, pair) in sorted.windows(2).enumerate() {
            // Nothing may follow an unbounded tier.
            if pair[0].max != Some(pair[1].min) {
                return Err(TierValidationError::NonContiguous { index: i + 2 });
            }
        }

        for (i, tier) in sorted.iter().enumerate() {
            if tier.rate < Decimal::ZERO || tier.rate > MAX_RATE {
                return Err(TierValidationError::RateOutOfRange { index: i + 1 });
            }
        }

        Ok(ValidatedTierSet { tiers: sorted })
    }

    /// Finds the tier whose `[min, max)` band contains `amount`.
    ///
    /// Negative amounts are clamped to zero. Amounts past a bounded last tier
    /// resolve to that last tier.
    pub fn evaluate(tiers: &ValidatedTierSet, amount: Decimal) -> RateLookup {
        let amount = amount.max(Decimal::ZERO);
        // First tier starts at 0, so at least one tier satisfies `min <= amount`.
        let position = tiers
            .tiers
            .partition_point(|t| t.min <= amount)
            .saturating_sub(1);
        let tier = &tiers.tiers[position];
        RateLookup {
            rate: tier.rate,
            tier_index: position + 1,
        }
    }

    /// `amount * rate / 100`, unrounded. Total for every amount up to `Decimal::MAX`.
    pub fn compute_commission(tiers: &ValidatedTierSet, amount: Decimal) -> Decimal {
        let amount = amount.max(Decimal::ZERO);
        let lookup = Self::evaluate(tiers, amount);
        match amount.checked_mul(lookup.rate) {
            Some(product) => product / MAX_RATE,
            // rate / 100 <= 1, so the product stays within `amount`.
            None => amount * (lookup.rate / MAX_RATE),
        }
    }
}

impl TryFrom<&TierSet> for ValidatedTierSet {
    type Error = TierValidationError;

    fn try_from(tiers: &TierSet) -> Result<Self, Self::Error> {
        TieredRateEngine::validate(tiers)
    }
}
