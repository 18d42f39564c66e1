use crate::domain::errors::SettlementError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Bonus,
    Deduction,
}

/// Manual correction applied on top of the computed commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: Uuid,
    pub kind: AdjustmentKind,
    pub amount: Decimal, // always positive; sign comes from `kind`
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Adjustment {
    pub fn new(
        kind: AdjustmentKind,
        amount: Decimal,
        reason: impl Into<String>,
    ) -> Result<Self, SettlementError> {
        let reason = reason.into();
        if amount <= Decimal::ZERO {
            return Err(SettlementError::InvalidAdjustment {
                reason: format!("amount must be positive, got {}", amount),
            });
        }
        if reason.trim().is_empty() {
            return Err(SettlementError::InvalidAdjustment {
                reason: "a reason is required".to_string(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            reason,
            created_at: Utc::now(),
        })
    }

    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            AdjustmentKind::Bonus => self.amount,
            AdjustmentKind::Deduction => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signed_amount() {
        let bonus = Adjustment::new(AdjustmentKind::Bonus, dec!(100), "Q4 campaign").unwrap();
        let deduction = Adjustment::new(AdjustmentKind::Deduction, dec!(40), "Refund").unwrap();
        assert_eq!(bonus.signed_amount(), dec!(100));
        assert_eq!(deduction.signed_amount(), dec!(-40));
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(Adjustment::new(AdjustmentKind::Bonus, dec!(0), "zero").is_err());
        assert!(Adjustment::new(AdjustmentKind::Bonus, dec!(-5), "negative").is_err());
        assert!(Adjustment::new(AdjustmentKind::Deduction, dec!(5), "  ").is_err());
    }
}
