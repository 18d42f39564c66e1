//! Seed fixtures for rules, channels and overrides.
//!
//! The console has no backend; its state starts from a seed file. Both JSON and
//! TOML seeds are accepted (chosen by file extension). Tier bounds in the seed are
//! read in the configured [`AmountUnit`] and converted to currency on load.

use crate::domain::commission::{AmountUnit, Channel, ChannelOverride, CommissionRule};
use crate::domain::repositories::RuleRepository;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub rules: Vec<CommissionRule>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub overrides: Vec<ChannelOverride>,
}

/// Outcome of applying a seed to the repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub rules_loaded: usize,
    pub overrides_loaded: usize,
    pub channels_loaded: usize,
    /// Ids of rules/overrides rejected by tier validation
    pub skipped: Vec<String>,
}

pub struct FixtureStore {
    file_path: PathBuf,
    unit: AmountUnit,
}

impl FixtureStore {
    pub fn new(file_path: impl Into<PathBuf>, unit: AmountUnit) -> Self {
        Self {
            file_path: file_path.into(),
            unit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Reads the seed file. A missing file yields an empty seed.
    pub fn load(&self) -> Result<SeedData> {
        if !self.file_path.exists() {
            warn!("Fixture file {:?} not found, starting empty", self.file_path);
            return Ok(SeedData::default());
        }

        let content = fs::read_to_string(&self.file_path)
            .context(format!("Failed to read fixture file: {:?}", self.file_path))?;
        let seed = self.parse(&content)?;
        self.to_canonical(seed)
    }

    fn parse(&self, content: &str) -> Result<SeedData> {
        let is_toml = self
            .file_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(content).context(format!(
                "Failed to parse fixture TOML: {:?}",
                self.file_path
            ))
        } else {
            serde_json::from_str(content).context(format!(
                "Failed to parse fixture JSON: {:?}",
                self.file_path
            ))
        }
    }

    fn to_canonical(&self, mut seed: SeedData) -> Result<SeedData> {
        let unit = self.unit;
        for rule in &mut seed.rules {
            rule.tiers = rule
                .tiers
                .try_map_bounds(|v| unit.to_canonical(v))
                .context(format!("Tier bound out of range in rule {}", rule.id))?;
        }
        for ov in &mut seed.overrides {
            ov.tiers = ov
                .tiers
                .try_map_bounds(|v| unit.to_canonical(v))
                .context(format!(
                    "Tier bound out of range in override for {}",
                    ov.channel_id
                ))?;
        }
        Ok(seed)
    }

    /// Loads the seed and writes it into `repo`, skipping invalid tier sets.
    pub async fn seed(&self, repo: &dyn RuleRepository) -> Result<SeedReport> {
        let seed = self.load()?;
        let report = apply_seed(seed, repo).await;
        info!(
            "Seeded {} rules, {} overrides, {} channels from {:?} ({} skipped)",
            report.rules_loaded,
            report.overrides_loaded,
            report.channels_loaded,
            self.file_path,
            report.skipped.len()
        );
        Ok(report)
    }
}

async fn apply_seed(seed: SeedData, repo: &dyn RuleRepository) -> SeedReport {
    let mut report = SeedReport::default();

    for rule in seed.rules {
        let id = rule.id.clone();
        match repo.upsert_rule(rule).await {
            Ok(()) => report.rules_loaded += 1,
            Err(e) => {
                warn!("Skipping rule {}: {}", id, e);
                report.skipped.push(id);
            }
        }
    }

    for ov in seed.overrides {
        let id = ov.channel_id.clone();
        match repo.upsert_override(ov).await {
            Ok(()) => report.overrides_loaded += 1,
            Err(e) => {
                warn!("Skipping override for channel {}: {}", id, e);
                report.skipped.push(id);
            }
        }
    }

    for channel in seed.channels {
        repo.upsert_channel(channel).await;
        report.channels_loaded += 1;
    }

    report
}
