// Monthly settlement applications and their reconciliation lifecycle
pub mod adjustment;
pub mod period;
pub mod record;

pub use adjustment::{Adjustment, AdjustmentKind};
pub use period::SettlementPeriod;
pub use record::{Settlement, SettlementPolicy, SettlementStatus, StatusChange};
