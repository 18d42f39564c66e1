//! Fixture and export locations.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub fixtures_path: PathBuf,
    pub statement_output_dir: PathBuf,
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        Self {
            fixtures_path: env::var("FIXTURES_PATH")
                .unwrap_or_else(|_| "fixtures/seed.json".to_string())
                .into(),
            statement_output_dir: env::var("STATEMENT_OUTPUT_DIR")
                .unwrap_or_else(|_| "statements".to_string())
                .into(),
        }
    }
}
