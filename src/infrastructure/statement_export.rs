use crate::domain::commission::AmountUnit;
use crate::domain::settlement::{Settlement, SettlementPeriod, SettlementStatus};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// One CSV row of a monthly statement.
#[derive(Debug, Clone, Serialize)]
pub struct StatementRow {
    pub settlement_id: String,
    pub channel_id: String,
    pub period: String,
    pub performance_amount: Decimal,
    pub tier_index: usize,
    pub rate_pct: Decimal,
    pub base_commission: Decimal,
    pub adjustments: Decimal,
    pub net_payable: Decimal,
    pub status: SettlementStatus,
}

impl StatementRow {
    pub fn from_settlement(settlement: &Settlement, unit: AmountUnit) -> Result<Self> {
        Ok(Self {
            settlement_id: settlement.id.to_string(),
            channel_id: settlement.channel_id.clone(),
            period: settlement.period.to_string(),
            performance_amount: unit.from_canonical(settlement.performance_amount),
            tier_index: settlement.tier_index,
            rate_pct: settlement.rate,
            base_commission: settlement.base_commission,
            adjustments: settlement.adjustment_total()?,
            net_payable: settlement.net_payable,
            status: settlement.status,
        })
    }
}

/// Writes monthly settlement statements as CSV.
pub struct StatementExporter {
    output_dir: PathBuf,
    unit: AmountUnit,
}

impl StatementExporter {
    pub fn new(output_dir: impl Into<PathBuf>, unit: AmountUnit) -> Self {
        Self {
            output_dir: output_dir.into(),
            unit,
        }
    }

    /// Serializes `settlements` into any writer.
    pub fn write_to<W: Write>(&self, writer: W, settlements: &[Settlement]) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(writer);
        for settlement in settlements {
            wtr.serialize(StatementRow::from_settlement(settlement, self.unit)?)
                .context(format!("Failed to serialize settlement {}", settlement.id))?;
        }
        wtr.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }

    /// Writes `statement_<period>.csv` into the output directory and returns its path.
    pub fn export(&self, period: SettlementPeriod, settlements: &[Settlement]) -> Result<PathBuf> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).context("Failed to create statement directory")?;
        }
        let path = self.output_dir.join(format!("statement_{}.csv", period));

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("tmp");
        let file = fs::File::create(&temp_path).context("Failed to create temp statement file")?;
        self.write_to(file, settlements)?;
        fs::rename(&temp_path, &path).context("Failed to rename temp statement file")?;

        info!(
            "Exported {} settlements for {} to {:?}",
            settlements.len(),
            period,
            path
        );
        Ok(path)
    }
}
