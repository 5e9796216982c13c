//! Declarative YAML test case specification

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ApiRequest, HttpMethod};
use crate::error::{HarnessError, HarnessResult};
use crate::role::Role;

/// One YAML file: a suite label and the cases it contributes, in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
    pub suite: String,

    #[serde(default)]
    pub description: String,

    pub cases: Vec<TestCase>,
}

/// A named, deterministic sequence of requests and checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Filled in from the enclosing file when omitted
    #[serde(default)]
    pub suite: String,

    /// What is under test, e.g. `projects/{id}`
    pub element: String,

    /// Disambiguates within the element, e.g. `PUT (viewer)`
    pub id: String,

    #[serde(default)]
    pub description: String,

    pub steps: Vec<Step>,
}

/// A single step in a test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Send a request, require an exact status code, capture the body
    Request {
        method: HttpMethod,
        path: String,
        role: Role,
        #[serde(default)]
        body: Option<String>,
        status: u16,
        #[serde(default = "default_follow_redirects")]
        follow_redirects: bool,
        #[serde(default)]
        label: Option<String>,
    },

    /// The last captured body is structurally equal to `body`
    ExpectJson {
        body: String,
        #[serde(default)]
        label: Option<String>,
    },

    /// The last captured body is empty
    ExpectEmpty {
        #[serde(default)]
        label: Option<String>,
    },
}

fn default_follow_redirects() -> bool {
    true
}

impl Step {
    pub fn label(&self) -> Option<&str> {
        match self {
            Step::Request { label, .. }
            | Step::ExpectJson { label, .. }
            | Step::ExpectEmpty { label } => label.as_deref(),
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Step::Request { .. })
    }

    /// What a failure report should show as "wanted" for this step
    pub fn wanted(&self) -> Option<&str> {
        match self {
            Step::ExpectJson { body, .. } => Some(body.as_str()),
            Step::ExpectEmpty { .. } => Some(""),
            Step::Request { .. } => None,
        }
    }

    /// The request to send and the status it must return
    pub fn to_request(&self) -> Option<(ApiRequest, u16)> {
        match self {
            Step::Request {
                method,
                path,
                role,
                body,
                status,
                follow_redirects,
                ..
            } => Some((
                ApiRequest {
                    method: *method,
                    path: path.clone(),
                    role: *role,
                    body: body.clone(),
                    follow_redirects: *follow_redirects,
                },
                *status,
            )),
            _ => None,
        }
    }
}

impl TestCase {
    /// `suite:element:id`, the header used in failure reports
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.suite, self.element, self.id)
    }

    /// Reject cases the runner could not interpret
    pub fn validate(&self) -> HarnessResult<()> {
        let fail =
            |reason: &str| Err(HarnessError::SpecParse(format!("{}: {}", self.key(), reason)));

        if self.element.trim().is_empty() || self.id.trim().is_empty() {
            return fail("element and id must not be empty");
        }
        match self.steps.first() {
            None => return fail("no steps"),
            Some(step) if !step.is_request() => {
                return fail("first step must be a request; nothing to assert against");
            }
            _ => {}
        }
        for step in &self.steps {
            if let Step::Request { status, path, .. } = step {
                if !(100..=599).contains(status) {
                    return fail(&format!("invalid status code {}", status));
                }
                if path.is_empty() {
                    return fail("empty request path");
                }
            }
        }
        Ok(())
    }
}

impl CaseFile {
    /// Parse a case file from YAML string
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(HarnessError::from)
    }

    /// Parse a case file from a YAML file
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            HarnessError::SpecParse(format!("{}: {}", path.display(), e))
        })
    }

    /// The file's cases with the suite label applied, validated
    pub fn into_cases(self) -> HarnessResult<Vec<TestCase>> {
        let suite = self.suite;
        self.cases
            .into_iter()
            .map(|mut case| {
                if case.suite.is_empty() {
                    case.suite = suite.clone();
                }
                case.validate()?;
                Ok(case)
            })
            .collect()
    }
}

/// Load every case under `dir`.
///
/// Files are visited in file-name order, so enumeration is the same on every
/// run; within a file, cases keep their written order.
pub fn load_all(dir: &Path) -> HarnessResult<Vec<TestCase>> {
    if !dir.is_dir() {
        return Err(HarnessError::SpecParse(format!(
            "suites directory not found: {}",
            dir.display()
        )));
    }

    let mut cases = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
    {
        let file = CaseFile::from_file(entry.path())?;
        debug!("Loaded {} case(s) from {}", file.cases.len(), entry.path().display());
        cases.extend(file.into_cases()?);
    }

    ensure_unique(&cases)?;
    Ok(cases)
}

fn ensure_unique(cases: &[TestCase]) -> HarnessResult<()> {
    let mut seen = HashSet::new();
    for case in cases {
        if !seen.insert(case.key()) {
            return Err(HarnessError::SpecParse(format!("duplicate test case: {}", case.key())));
        }
    }
    Ok(())
}

/// Substring filter over the (suite, element, id) labels
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub suite: Option<String>,
    pub element: Option<String>,
    pub id: Option<String>,
}

impl CaseFilter {
    pub fn is_empty(&self) -> bool {
        self.suite.is_none() && self.element.is_none() && self.id.is_none()
    }

    pub fn matches(&self, case: &TestCase) -> bool {
        fn hit(want: &Option<String>, have: &str) -> bool {
            want.as_deref().is_none_or(|w| have.contains(w))
        }
        hit(&self.suite, &case.suite)
            && hit(&self.element, &case.element)
            && hit(&self.id, &case.id)
    }

    pub fn apply(&self, cases: Vec<TestCase>) -> Vec<TestCase> {
        cases.into_iter().filter(|c| self.matches(c)).collect()
    }
}
