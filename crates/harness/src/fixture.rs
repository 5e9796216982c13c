//! Database reset and fixture seeding for the system under test

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{ApiClient, ApiRequest};
use crate::compare;
use crate::error::{FixtureError, HarnessError, HarnessResult};
use crate::role::Role;

pub const RESET_PATH: &str = "/admin/db";
pub const RESET_COMMAND: &str = r#"{"command": "resetDB"}"#;
const RESET_SUCCESS: &str = r#"{"success": true}"#;

/// How the SUT acknowledges a database reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetAck {
    /// Any status, body equivalent to `{"success": true}`
    #[default]
    SuccessBody,
    /// HTTP 204 with an empty body
    NoContent,
}

/// Whether fixtures are rebuilt once per run or before every case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// Reset and seed before every case; mutations never leak
    #[default]
    PerCase,
    /// Reset and seed once; cases share accumulating state
    PerRun,
}

/// One creation request replayed while seeding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureCall {
    pub path: String,
    pub role: Role,
    pub body: String,

    #[serde(default = "default_created")]
    pub status: u16,

    /// ID the SUT must assign, checked against `{"id": N}` in the response
    #[serde(default)]
    pub id: Option<u64>,
}

fn default_created() -> u16 {
    201
}

/// Fixture records, one list per kind.
///
/// Replay order is the field order below. Later kinds refer to earlier ones by
/// the positional IDs the SUT hands out, so it must not change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPlan {
    #[serde(default)]
    pub users: Vec<FixtureCall>,
    #[serde(default)]
    pub projects: Vec<FixtureCall>,
    #[serde(default)]
    pub subprojects: Vec<FixtureCall>,
    #[serde(default)]
    pub repos: Vec<FixtureCall>,
    #[serde(default)]
    pub branches: Vec<FixtureCall>,
    #[serde(default)]
    pub pulls: Vec<FixtureCall>,
    #[serde(default)]
    pub agents: Vec<FixtureCall>,
    #[serde(default)]
    pub jobs: Vec<FixtureCall>,
}

impl SeedPlan {
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(HarnessError::from)
    }

    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| HarnessError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Sections in replay order
    pub fn sections(&self) -> [(&'static str, &[FixtureCall]); 8] {
        [
            ("users", self.users.as_slice()),
            ("projects", self.projects.as_slice()),
            ("subprojects", self.subprojects.as_slice()),
            ("repos", self.repos.as_slice()),
            ("branches", self.branches.as_slice()),
            ("pulls", self.pulls.as_slice()),
            ("agents", self.agents.as_slice()),
            ("jobs", self.jobs.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.sections().iter().map(|(_, calls)| calls.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Puts the SUT database into a known state
pub struct FixtureController<'a> {
    client: &'a ApiClient,
    plan: &'a SeedPlan,
    ack: ResetAck,
}

impl<'a> FixtureController<'a> {
    pub fn new(client: &'a ApiClient, plan: &'a SeedPlan, ack: ResetAck) -> Self {
        Self { client, plan, ack }
    }

    /// Reset then seed
    pub async fn prepare(&self) -> Result<(), FixtureError> {
        self.reset().await?;
        self.seed().await
    }

    /// Ask the SUT to drop back to its initial database
    pub async fn reset(&self) -> Result<(), FixtureError> {
        let request = ApiRequest::post(RESET_PATH, Role::Admin, RESET_COMMAND);
        let response = self
            .client
            .send(&request)
            .await
            .map_err(|e| FixtureError::Reset(e.to_string()))?;

        let acknowledged = match self.ack {
            ResetAck::SuccessBody => compare::equivalent(RESET_SUCCESS, &response.body),
            ResetAck::NoContent => response.status == 204 && compare::is_empty_body(&response.body),
        };
        if !acknowledged {
            return Err(FixtureError::Reset(format!(
                "HTTP {}: {}",
                response.status,
                response.body_text()
            )));
        }

        debug!("Database reset acknowledged");
        Ok(())
    }

    /// Replay every fixture call in order, stopping at the first failure
    pub async fn seed(&self) -> Result<(), FixtureError> {
        for (section, calls) in self.plan.sections() {
            for (index, call) in calls.iter().enumerate() {
                self.create(call)
                    .await
                    .map_err(|reason| FixtureError::Seed {
                        section: section.to_string(),
                        index,
                        path: call.path.clone(),
                        reason,
                    })?;
            }
            if !calls.is_empty() {
                debug!("Seeded {} {}", calls.len(), section);
            }
        }
        info!("Seeded {} fixture record(s)", self.plan.len());
        Ok(())
    }

    async fn create(&self, call: &FixtureCall) -> Result<(), String> {
        let request = ApiRequest::post(call.path.as_str(), call.role, call.body.as_str());
        let response = self.client.send(&request).await.map_err(|e| e.to_string())?;
        response
            .expect_status(call.status)
            .map_err(|e| format!("{} (body: {})", e, response.body_text()))?;

        if let Some(want) = call.id {
            let assigned = serde_json::from_slice::<serde_json::Value>(&response.body)
                .ok()
                .and_then(|v| v.get("id").and_then(serde_json::Value::as_u64));
            if assigned != Some(want) {
                return Err(format!(
                    "expected assigned id {}, got {}",
                    want,
                    response.body_text()
                ));
            }
        }
        Ok(())
    }
}
