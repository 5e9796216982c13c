//! Error types for the harness

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::Role;

/// Harness misuse: a role that does not exist or has no credential.
///
/// These are bugs in the case data or configuration, never SUT defects, so
/// they are kept apart from transport and content failures.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigurationError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("no bearer token configured for role '{0}'")]
    MissingCredential(Role),
}

/// Why a single step of a test case failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StepError {
    #[error("configuration error: {0}")]
    Configuration(ConfigurationError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("expected HTTP status code {expected}, got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },
}

impl From<ConfigurationError> for StepError {
    fn from(e: ConfigurationError) -> Self {
        StepError::Configuration(e)
    }
}

impl From<reqwest::Error> for StepError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StepError::Transport(format!("request timed out: {}", e))
        } else {
            StepError::Transport(e.to_string())
        }
    }
}

/// Failure to put the SUT database into its fixture state
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("resetDB failed: {0}")]
    Reset(String),

    #[error("seed call {section}[{index}] ({path}) failed: {reason}")]
    Seed {
        section: String,
        index: usize,
        path: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
