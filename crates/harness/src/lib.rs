//! Peridot API Test Harness
//!
//! This crate drives a running peridot API server as a black box:
//! - Resets the server's database through its admin endpoint
//! - Seeds a fixed set of users, projects and related records
//! - Replays declarative YAML test cases as different roles
//! - Compares JSON bodies structurally and reports pass/fail per case
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SuiteRunner (isolation mode)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FixtureController                                          │
//! │    ├── reset()  POST /admin/db {"command": "resetDB"}       │
//! │    └── seed()   users → projects → ... → jobs               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CaseRunner                                                 │
//! │    ├── request { method, path, role, body?, status }        │
//! │    ├── expect_json { body }  (compare::equivalent)          │
//! │    └── expect_empty                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ApiClient  role → TokenTable → Authorization: Bearer ...   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  report::render  table + failure details                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod compare;
pub mod config;
pub mod error;
pub mod fixture;
pub mod report;
pub mod role;
pub mod runner;
pub mod spec;
pub mod suite;

pub use client::{ApiClient, ApiRequest, ApiResponse, HttpMethod};
pub use config::HarnessConfig;
pub use error::{ConfigurationError, FixtureError, HarnessError, HarnessResult, StepError};
pub use fixture::{FixtureController, Isolation, ResetAck, SeedPlan};
pub use role::{Role, TokenTable};
pub use runner::{CaseRunner, FailureKind, TestResult};
pub use spec::{CaseFilter, Step, TestCase};
pub use suite::{SuiteResult, SuiteRunner};
