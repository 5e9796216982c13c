//! Harness configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;
use crate::fixture::{Isolation, ResetAck};
use crate::role::TokenTable;

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the system under test
    pub base_url: String,

    /// Directory of case YAML files
    pub suites_dir: PathBuf,

    /// Fixture seed YAML
    pub seed_file: PathBuf,

    /// Where `test-results.json` is written
    pub output_dir: PathBuf,

    pub isolation: Isolation,

    pub reset_ack: ResetAck,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Bearer token per role name
    pub tokens: TokenTable,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://sut:3005".to_string(),
            suites_dir: PathBuf::from("suites"),
            seed_file: PathBuf::from("fixtures/seed.yaml"),
            output_dir: PathBuf::from("test-results"),
            isolation: Isolation::default(),
            reset_ack: ResetAck::default(),
            timeout_secs: 30,
            tokens: TokenTable::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults if it is absent
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> HarnessResult<()> {
        self.tokens.validate()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
