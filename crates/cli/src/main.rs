//! apitest - Peridot API functional test runner
//!
//! Resets the server's database, seeds fixtures, runs every scripted case and
//! prints a result table. Exits 0 when all cases pass, 1 when any case fails
//! and 2 when the harness itself could not run.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use apitest_harness::spec::{self, CaseFilter};
use apitest_harness::{ApiClient, HarnessConfig, Isolation, ResetAck, Role, SeedPlan, SuiteRunner};

mod output;

use output::OutputFormat;

/// Black-box functional tests for the peridot REST API
#[derive(Parser, Debug)]
#[command(name = "apitest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults apply if it does not exist)
    #[arg(short, long, env = "APITEST_CONFIG", default_value = "apitest.toml")]
    config: PathBuf,

    /// Base URL of the server under test
    #[arg(long, env = "APITEST_BASE_URL")]
    base_url: Option<String>,

    /// Directory of case YAML files
    #[arg(long, env = "APITEST_SUITES")]
    suites: Option<PathBuf>,

    /// Fixture seed file
    #[arg(long, env = "APITEST_SEED")]
    seed: Option<PathBuf>,

    /// When to rebuild fixtures
    #[arg(long, value_enum)]
    isolation: Option<IsolationArg>,

    /// How the server acknowledges a database reset
    #[arg(long, value_enum)]
    reset_ack: Option<ResetAckArg>,

    /// Run only cases whose suite contains this text
    #[arg(long)]
    suite: Option<String>,

    /// Run only cases whose element contains this text
    #[arg(long)]
    element: Option<String>,

    /// Run only cases whose id contains this text
    #[arg(long = "case")]
    case: Option<String>,

    /// List matching cases without contacting the server
    #[arg(long)]
    list: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Output directory for test-results.json
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IsolationArg {
    PerCase,
    PerRun,
}

impl From<IsolationArg> for Isolation {
    fn from(arg: IsolationArg) -> Self {
        match arg {
            IsolationArg::PerCase => Isolation::PerCase,
            IsolationArg::PerRun => Isolation::PerRun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ResetAckArg {
    SuccessBody,
    NoContent,
}

impl From<ResetAckArg> for ResetAck {
    fn from(arg: ResetAckArg) -> Self {
        match arg {
            ResetAckArg::SuccessBody => ResetAck::SuccessBody,
            ResetAckArg::NoContent => ResetAck::NoContent,
        }
    }
}

impl Cli {
    fn filter(&self) -> CaseFilter {
        CaseFilter {
            suite: self.suite.clone(),
            element: self.element.clone(),
            id: self.case.clone(),
        }
    }

    /// Command-line values win over the file
    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(dir) = &self.suites {
            config.suites_dir = dir.clone();
        }
        if let Some(seed) = &self.seed {
            config.seed_file = seed.clone();
        }
        if let Some(isolation) = self.isolation {
            config.isolation = isolation.into();
        }
        if let Some(ack) = self.reset_ack {
            config.reset_ack = ack.into();
        }
        if let Some(dir) = &self.output {
            config.output_dir = dir.clone();
        }
    }
}

/// `APITEST_TOKEN_<ROLE>` overrides the configured token for that role
fn apply_token_env(config: &mut HarnessConfig) {
    for role in Role::all().iter().filter(|r| r.is_authenticated()) {
        let var = format!("APITEST_TOKEN_{}", role.as_str().to_uppercase());
        if let Ok(token) = std::env::var(&var) {
            config.tokens.insert(*role, token);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the report
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(run(cli)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = HarnessConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    apply_token_env(&mut config);
    cli.apply(&mut config);
    config.validate()?;

    let cases = cli.filter().apply(spec::load_all(&config.suites_dir)?);

    if cli.list {
        output::print_cases(&cases, cli.format)?;
        return Ok(true);
    }

    if cases.is_empty() {
        warn!("No test cases matched");
        return Ok(true);
    }

    let plan = SeedPlan::from_file(&config.seed_file)?;
    let client =
        ApiClient::new(config.base_url.as_str(), config.tokens.clone(), config.timeout())?;

    info!(
        "Loaded {} case(s) and {} fixture record(s)",
        cases.len(),
        plan.len()
    );

    let result = SuiteRunner::new(&client, &plan, config.reset_ack, config.isolation)
        .run(&cases)
        .await?;

    output::print_results(&result, cli.format)?;
    result.write_json(&config.output_dir)?;

    Ok(result.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["apitest"]).unwrap();
        assert!(!cli.list);
        assert_eq!(cli.format, OutputFormat::Table);
        assert!(cli.filter().is_empty());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "apitest",
            "--base-url",
            "http://localhost:3005",
            "--isolation",
            "per-run",
            "--reset-ack",
            "no-content",
            "--output",
            "out",
        ])
        .unwrap();

        let mut config = HarnessConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.base_url, "http://localhost:3005");
        assert_eq!(config.isolation, Isolation::PerRun);
        assert_eq!(config.reset_ack, ResetAck::NoContent);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.seed_file, HarnessConfig::default().seed_file);
    }

    #[test]
    fn test_filter_flags() {
        let cli =
            Cli::try_parse_from(["apitest", "--element", "agents", "--case", "PUT", "--list"])
                .unwrap();
        let filter = cli.filter();
        assert_eq!(filter.element.as_deref(), Some("agents"));
        assert_eq!(filter.id.as_deref(), Some("PUT"));
        assert!(cli.list);
    }

    #[test]
    fn test_rejects_unknown_isolation() {
        assert!(Cli::try_parse_from(["apitest", "--isolation", "sometimes"]).is_err());
    }
}
