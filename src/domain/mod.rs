// Commission rates, rules and channel overrides
pub mod commission;

// Settlement applications and reconciliation
pub mod settlement;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
