// Tiered commission rates, rules and channel overrides
pub mod amount;
pub mod engine;
pub mod rule;
pub mod tier;

pub use amount::{AmountUnit, round_money};
pub use engine::{RateLookup, TieredRateEngine, ValidatedTierSet};
pub use rule::{
    Channel, ChannelOverride, ChannelStatus, CommissionRule, CommissionRuleBook, ResolvedTiers,
    RuleStatus, TierSource, resolve_tiers,
};
pub use tier::{Tier, TierSet};
