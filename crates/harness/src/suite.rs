//! Runs the full ordered list of cases against the SUT

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::ApiClient;
use crate::error::HarnessResult;
use crate::fixture::{FixtureController, Isolation, ResetAck, SeedPlan};
use crate::runner::{CaseRunner, TestResult};
use crate::spec::TestCase;

/// Result of running all cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub base_url: String,
    pub isolation: Isolation,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    /// In execution order
    pub results: Vec<TestResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Write results as `test-results.json` under `output_dir`
    pub fn write_json(&self, output_dir: &Path) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Sequences cases, rebuilding fixtures as the isolation mode requires
pub struct SuiteRunner<'a> {
    client: &'a ApiClient,
    fixtures: FixtureController<'a>,
    isolation: Isolation,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(
        client: &'a ApiClient,
        plan: &'a SeedPlan,
        ack: ResetAck,
        isolation: Isolation,
    ) -> Self {
        Self {
            client,
            fixtures: FixtureController::new(client, plan, ack),
            isolation,
        }
    }

    /// Run every case in order, one at a time.
    ///
    /// A failing case never stops the run. A failed reset or seed does, since
    /// every later case would see an inconsistent database.
    pub async fn run(&self, cases: &[TestCase]) -> HarnessResult<SuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let runner = CaseRunner::new(self.client);
        let mut results = Vec::with_capacity(cases.len());
        let mut passed = 0;
        let mut failed = 0;

        info!(
            "Running {} test(s) against {} ({:?})...",
            cases.len(),
            self.client.base_url(),
            self.isolation
        );

        if self.isolation == Isolation::PerRun && !cases.is_empty() {
            self.fixtures.prepare().await?;
        }

        for case in cases {
            if self.isolation == Isolation::PerCase {
                self.fixtures.prepare().await?;
            }

            let result = runner.run(case).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.key(), result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - step {}",
                    result.key(),
                    result.fail_step.as_deref().unwrap_or("?")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            base_url: self.client.base_url().to_string(),
            isolation: self.isolation,
            started_at,
            total: cases.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }
}
