//! Executes a single test case step by step

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::compare;
use crate::error::StepError;
use crate::spec::{Step, TestCase};

/// Outcome of one test case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub element: String,
    pub id: String,

    /// True only if every step passed
    pub success: bool,

    /// Label of the failing step; `None` on success
    pub fail_step: Option<String>,

    /// Set when the failure was not a body mismatch
    pub fail_error: Option<StepError>,

    /// Expected body at the failing step
    pub wanted: String,

    /// Body actually received at the failing step.
    ///
    /// Decoded as UTF-8; invalid sequences become U+FFFD, so a non-UTF-8 body
    /// is not reproduced byte for byte.
    pub got: String,

    pub duration_ms: u64,
}

/// Classification of a failed case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Transport,
    UnexpectedStatus,
    ContentMismatch,
}

impl TestResult {
    /// An empty result labelled for `case`
    pub fn for_case(case: &TestCase) -> Self {
        Self {
            suite: case.suite.clone(),
            element: case.element.clone(),
            id: case.id.clone(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.suite, self.element, self.id)
    }

    pub fn pass(&mut self) {
        self.success = true;
        self.fail_step = None;
        self.fail_error = None;
        self.wanted.clear();
        self.got.clear();
    }

    /// Failed for a reason other than the body not matching
    pub fn fail_with_error(&mut self, step: impl Into<String>, error: StepError) {
        self.success = false;
        self.fail_step = Some(step.into());
        self.fail_error = Some(error);
    }

    /// Failed because the body did not match what was wanted
    pub fn fail_match(&mut self, step: impl Into<String>) {
        self.success = false;
        self.fail_step = Some(step.into());
        self.fail_error = None;
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.success {
            return None;
        }
        Some(match &self.fail_error {
            None => FailureKind::ContentMismatch,
            Some(StepError::Configuration(_)) => FailureKind::Configuration,
            Some(StepError::Transport(_)) => FailureKind::Transport,
            Some(StepError::UnexpectedStatus { .. }) => FailureKind::UnexpectedStatus,
        })
    }
}

/// Why a step stopped the case
enum StepFailure {
    Error(StepError),
    Mismatch,
}

/// Runs test cases against one SUT
pub struct CaseRunner<'a> {
    client: &'a ApiClient,
}

impl<'a> CaseRunner<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Run every step of `case` in order, stopping at the first failure.
    ///
    /// Never returns an error: whatever goes wrong is recorded in the result.
    pub async fn run(&self, case: &TestCase) -> TestResult {
        let start = Instant::now();
        let mut result = TestResult::for_case(case);
        let mut last_body: Vec<u8> = Vec::new();
        let mut failed = false;

        debug!("Running test: {}", case.key());

        for (index, step) in case.steps.iter().enumerate() {
            let label = step
                .label()
                .map(str::to_string)
                .unwrap_or_else(|| (index + 1).to_string());

            let failure = match self.execute(step, &mut last_body).await {
                Ok(()) => continue,
                Err(failure) => failure,
            };

            result.got = String::from_utf8_lossy(&last_body).into_owned();
            match failure {
                StepFailure::Error(error) => {
                    // Show what the following check would have compared against
                    result.wanted = case
                        .steps
                        .get(index + 1)
                        .and_then(Step::wanted)
                        .unwrap_or_default()
                        .to_string();
                    warn!("{} failed at step {}: {}", case.key(), label, error);
                    result.fail_with_error(label, error);
                }
                StepFailure::Mismatch => {
                    result.wanted = step.wanted().unwrap_or_default().to_string();
                    warn!("{} failed at step {}: body mismatch", case.key(), label);
                    result.fail_match(label);
                }
            }
            failed = true;
            break; // Stop on first failure
        }

        if !failed {
            result.pass();
        }
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    async fn execute(&self, step: &Step, last_body: &mut Vec<u8>) -> Result<(), StepFailure> {
        if let Some((request, status)) = step.to_request() {
            last_body.clear();
            let response = self
                .client
                .send(&request)
                .await
                .map_err(StepFailure::Error)?;
            let outcome = response.expect_status(status);
            *last_body = response.body;
            return outcome.map_err(StepFailure::Error);
        }

        let matched = match step {
            // An empty expected body means "no content" and is never parsed
            Step::ExpectJson { body, .. } if body.trim().is_empty() => {
                compare::is_empty_body(last_body)
            }
            Step::ExpectJson { body, .. } => {
                let ok = compare::equivalent(body, last_body);
                if !ok {
                    if let Some(path) = compare::first_difference(body, last_body) {
                        debug!("First difference at {}", path);
                    }
                }
                ok
            }
            Step::ExpectEmpty { .. } => compare::is_empty_body(last_body),
            Step::Request { .. } => true,
        };

        if matched {
            Ok(())
        } else {
            Err(StepFailure::Mismatch)
        }
    }
}
