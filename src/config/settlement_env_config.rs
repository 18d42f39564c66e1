//! Settlement configuration parsing from environment variables.
//!
//! This module handles the amount unit used at the input/output boundary,
//! commission rounding and the negative-payable policy.

use crate::domain::commission::AmountUnit;
use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;

const MAX_DECIMAL_PLACES: u32 = 10;

/// Settlement environment configuration
#[derive(Debug, Clone)]
pub struct SettlementEnvConfig {
    pub amount_unit: AmountUnit,
    pub decimal_places: u32,
    pub allow_negative_payable: bool,
}

impl SettlementEnvConfig {
    pub fn from_env() -> Result<Self> {
        let amount_unit =
            AmountUnit::from_str(&env::var("AMOUNT_UNIT").unwrap_or_else(|_| "currency".to_string()))?;

        let decimal_places = env::var("SETTLEMENT_DECIMAL_PLACES")
            .unwrap_or_else(|_| "2".to_string())
            .parse::<u32>()
            .context("Failed to parse SETTLEMENT_DECIMAL_PLACES")?;
        if decimal_places > MAX_DECIMAL_PLACES {
            bail!(
                "SETTLEMENT_DECIMAL_PLACES must be at most {}, got: {}",
                MAX_DECIMAL_PLACES,
                decimal_places
            );
        }

        let allow_negative_payable = env::var("ALLOW_NEGATIVE_PAYABLE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .context("Failed to parse ALLOW_NEGATIVE_PAYABLE")?;

        Ok(Self {
            amount_unit,
            decimal_places,
            allow_negative_payable,
        })
    }
}
