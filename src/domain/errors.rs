use thiserror::Error;
use rust_decimal::Decimal;

use crate::domain::settlement::SettlementStatus;

/// Errors raised while validating a tier set.
///
/// Indices are 1-based and refer to the tier's position after sorting by `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TierValidationError {
    #[error("At least one tier is required")]
    EmptyTierSet,

    #[error("Tier {index}: the first tier must start at 0")]
    InvalidLowerBound { index: usize },

    #[error("Tier {index}: lower bound must be below the upper bound")]
    InvertedBounds { index: usize },

    #[error("Tier {index}: must start where the previous tier ends")]
    NonContiguous { index: usize },

    #[error("Tier {index}: rate must be between 0 and 100")]
    RateOutOfRange { index: usize },
}

impl TierValidationError {
    /// Offending tier (1-based, sorted order), if the error points at one.
    pub fn index(&self) -> Option<usize> {
        match self {
            TierValidationError::EmptyTierSet => None,
            TierValidationError::InvalidLowerBound { index }
            | TierValidationError::InvertedBounds { index }
            | TierValidationError::NonContiguous { index }
            | TierValidationError::RateOutOfRange { index } => Some(*index),
        }
    }
}

/// Errors related to settlement applications and their lifecycle
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Invalid tier configuration for {owner}: {source}")]
    InvalidTiers {
        owner: String,
        #[source]
        source: TierValidationError,
    },

    #[error("No applicable commission rule for channel {channel_id}")]
    NoApplicableRule { channel_id: String },

    #[error("Channel not found: {channel_id}")]
    ChannelNotFound { channel_id: String },

    #[error("Channel {channel_id} is not active")]
    ChannelNotActive { channel_id: String },

    #[error("Rule not found: {rule_id}")]
    RuleNotFound { rule_id: String },

    #[error("Settlement not found: {id}")]
    NotFound { id: String },

    #[error("Settlement for channel {channel_id} in {period} already exists")]
    Duplicate { channel_id: String, period: String },

    #[error("Performance amount must not be negative, got {amount}")]
    NegativePerformance { amount: Decimal },

    #[error("Invalid adjustment: {reason}")]
    InvalidAdjustment { reason: String },

    #[error("Adjustment not found: {id}")]
    AdjustmentNotFound { id: String },

    #[error("Settlement is locked in status {status:?}")]
    Locked { status: SettlementStatus },

    #[error("Cannot {action} a settlement in status {from:?}")]
    InvalidTransition {
        from: SettlementStatus,
        action: &'static str,
    },

    #[error("A reason is required to {action} a settlement")]
    MissingReason { action: &'static str },

    #[error("Invalid settlement period: {value}")]
    InvalidPeriod { value: String },

    #[error("Amount out of range while computing {what}")]
    AmountOverflow { what: &'static str },
}
