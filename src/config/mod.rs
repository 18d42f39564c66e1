//! Configuration module for partnerpay.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Settlement and Storage.

mod settlement_env_config;
mod storage_env_config;

pub use settlement_env_config::SettlementEnvConfig;
pub use storage_env_config::StorageEnvConfig;

use crate::domain::commission::AmountUnit;
use crate::domain::settlement::SettlementPolicy;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Settlement
    pub amount_unit: AmountUnit,
    pub decimal_places: u32,
    pub allow_negative_payable: bool,

    // Storage
    pub fixtures_path: PathBuf,
    pub statement_output_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let settlement =
            SettlementEnvConfig::from_env().context("Failed to load settlement config")?;
        let storage = StorageEnvConfig::from_env();

        Ok(Self {
            amount_unit: settlement.amount_unit,
            decimal_places: settlement.decimal_places,
            allow_negative_payable: settlement.allow_negative_payable,
            fixtures_path: storage.fixtures_path,
            statement_output_dir: storage.statement_output_dir,
        })
    }

    pub fn settlement_policy(&self) -> SettlementPolicy {
        SettlementPolicy {
            decimal_places: self.decimal_places,
            allow_negative_payable: self.allow_negative_payable,
        }
    }
}
