use anyhow::{Result, anyhow, bail};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const TEN_THOUSAND: Decimal = dec!(10000);

/// Unit in which amounts enter or leave the system.
///
/// Internally every amount is held in plain currency units; conversion happens
/// only at the input/output boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountUnit {
    #[default]
    Currency,
    TenThousand,
}

impl AmountUnit {
    /// Fails when the scaled value does not fit in a `Decimal`.
    pub fn to_canonical(self, value: Decimal) -> Result<Decimal> {
        match self {
            AmountUnit::Currency => Ok(value),
            AmountUnit::TenThousand => value
                .checked_mul(TEN_THOUSAND)
                .ok_or_else(|| anyhow!("{} ten-thousand units is out of range", value)),
        }
    }

    pub fn from_canonical(self, value: Decimal) -> Decimal {
        match self {
            AmountUnit::Currency => value,
            AmountUnit::TenThousand => value / TEN_THOUSAND,
        }
    }
}

impl FromStr for AmountUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "currency" | "yuan" => Ok(AmountUnit::Currency),
            "ten_thousand" | "wan" => Ok(AmountUnit::TenThousand),
            _ => bail!(
                "Invalid AMOUNT_UNIT: {}. Must be 'currency' or 'ten_thousand'",
                s
            ),
        }
    }
}

/// Rounds a money amount to `decimal_places`, midpoint away from zero.
pub fn round_money(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_thousand_conversion() {
        let unit = AmountUnit::TenThousand;
        assert_eq!(unit.to_canonical(dec!(1.5)).unwrap(), dec!(15000));
        assert_eq!(unit.from_canonical(dec!(15000)), dec!(1.5));
        assert_eq!(AmountUnit::Currency.to_canonical(dec!(42)).unwrap(), dec!(42));
    }

    #[test]
    fn test_ten_thousand_conversion_out_of_range() {
        assert!(AmountUnit::TenThousand.to_canonical(Decimal::MAX).is_err());
        assert_eq!(
            AmountUnit::Currency.to_canonical(Decimal::MAX).unwrap(),
            Decimal::MAX
        );
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("WAN".parse::<AmountUnit>().unwrap(), AmountUnit::TenThousand);
        assert_eq!("yuan".parse::<AmountUnit>().unwrap(), AmountUnit::Currency);
        assert!("lots".parse::<AmountUnit>().is_err());
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(dec!(18.755), 2), dec!(18.76));
        assert_eq!(round_money(dec!(-18.755), 2), dec!(-18.76));
        assert_eq!(round_money(dec!(18.75), 0), dec!(19));
    }
}
