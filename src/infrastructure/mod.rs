pub mod fixture_store;
pub mod repositories;
pub mod statement_export;

pub use fixture_store::{FixtureStore, SeedData, SeedReport};
pub use repositories::{InMemoryRuleRepository, InMemorySettlementRepository};
pub use statement_export::StatementExporter;
