//! partnerpay - channel commission and settlement tool
//!
//! # Usage
//! ```sh
//! cargo run -- validate --tiers tiers.json
//! cargo run -- evaluate --tiers tiers.json --amount 75
//! cargo run -- settle --period 2024-05 --rows performance.csv
//! ```
//!
//! # Environment Variables
//! - `AMOUNT_UNIT` - `currency` or `ten_thousand` for tier bounds and amounts (default: currency)
//! - `SETTLEMENT_DECIMAL_PLACES` - rounding scale of commissions (default: 2)
//! - `FIXTURES_PATH` - seed file with rules, channels and overrides
//! - `STATEMENT_OUTPUT_DIR` - where CSV statements are written

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use partnerpay::application::{PerformanceRow, SettlementService};
use partnerpay::config::Config;
use partnerpay::domain::commission::{AmountUnit, TierSet, TieredRateEngine, round_money};
use partnerpay::domain::settlement::SettlementPeriod;
use partnerpay::infrastructure::{
    FixtureStore, InMemoryRuleRepository, InMemorySettlementRepository, StatementExporter,
};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a tier set and report the first problem
    Validate {
        /// JSON file holding an array of {min, max, rate}
        #[arg(short, long)]
        tiers: String,
    },
    /// Look up the rate and commission for an amount
    Evaluate {
        /// JSON file holding an array of {min, max, rate}
        #[arg(short, long)]
        tiers: String,

        /// Performance amount (in AMOUNT_UNIT)
        #[arg(short, long)]
        amount: Decimal,
    },
    /// Draft settlements for a month from a performance CSV
    Settle {
        /// Settlement month (YYYY-MM)
        #[arg(short, long)]
        period: String,

        /// CSV with columns channel_id,performance (in AMOUNT_UNIT)
        #[arg(short, long)]
        rows: String,
    },
}

fn load_tiers(path: &str, unit: AmountUnit) -> Result<TierSet> {
    let content =
        std::fs::read_to_string(path).context(format!("Failed to read tier file: {}", path))?;
    let tiers: TierSet = serde_json::from_str(&content)
        .context(format!("Failed to parse tier JSON: {}", path))?;
    tiers
        .try_map_bounds(|v| unit.to_canonical(v))
        .context(format!("Tier bound out of range in {}", path))
}

fn load_rows(path: &Path, unit: AmountUnit) -> Result<Vec<PerformanceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context(format!("Failed to open performance CSV: {:?}", path))?;
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let mut row: PerformanceRow = record.context("Failed to parse performance row")?;
        row.performance = unit
            .to_canonical(row.performance)
            .context(format!("Performance out of range for {}", row.channel_id))?;
        rows.push(row);
    }
    Ok(rows)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Setup logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Validate { tiers } => {
            let set = load_tiers(&tiers, config.amount_unit)?;
            match TieredRateEngine::validate(&set) {
                Ok(validated) => println!("OK: {} tiers", validated.len()),
                Err(e) => {
                    println!("INVALID: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Evaluate { tiers, amount } => {
            let set = load_tiers(&tiers, config.amount_unit)?;
            let validated = TieredRateEngine::validate(&set)?;
            let amount = config.amount_unit.to_canonical(amount)?;
            let lookup = TieredRateEngine::evaluate(&validated, amount);
            let commission = TieredRateEngine::compute_commission(&validated, amount);
            println!("Tier:       {}", lookup.tier_index);
            println!("Rate:       {}%", lookup.rate);
            println!(
                "Commission: {}",
                round_money(commission, config.decimal_places)
            );
        }
        Commands::Settle { period, rows } => {
            let period: SettlementPeriod = period.parse()?;
            let rule_repo = Arc::new(InMemoryRuleRepository::new());
            let fixtures = FixtureStore::new(&config.fixtures_path, config.amount_unit);
            fixtures.seed(rule_repo.as_ref()).await?;

            let service = SettlementService::new(
                rule_repo,
                Arc::new(InMemorySettlementRepository::new()),
                config.settlement_policy(),
            );
            let rows = load_rows(Path::new(&rows), config.amount_unit)?;
            info!("Loaded {} performance rows for {}", rows.len(), period);

            let outcome = service.batch_drafts(period, rows).await?;
            let summary = service.period_summary(period).await?;

            println!("{}", "=".repeat(60));
            println!("SETTLEMENT {}", period);
            println!("Drafts:            {}", summary.count);
            println!("Failed rows:       {}", outcome.failures.len());
            println!("Total performance: {}", summary.total_performance);
            println!("Base commission:   {}", summary.total_base_commission);
            println!("Net payable:       {}", summary.total_net_payable);
            println!("{}", "=".repeat(60));
            for failure in &outcome.failures {
                println!("  ! {}: {}", failure.channel_id, failure.reason);
            }

            let exporter = StatementExporter::new(&config.statement_output_dir, config.amount_unit);
            let path = exporter.export(period, &service.list_period(period).await?)?;
            println!("Statement written to {:?}", path);
        }
    }

    Ok(())
}
