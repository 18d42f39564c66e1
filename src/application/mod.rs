// Settlement workflow: drafting, adjustments, reconciliation
pub mod settlement_service;

pub use settlement_service::{
    BatchOutcome, PerformanceRow, PeriodSummary, RowFailure, SettlementService,
};
