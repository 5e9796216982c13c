//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use apitest_harness::{report, SuiteResult, TestCase};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Aligned result table followed by failure details
    #[default]
    Table,
    /// JSON format
    Json,
}

#[derive(Serialize)]
struct CaseSummary<'a> {
    suite: &'a str,
    element: &'a str,
    id: &'a str,
    steps: usize,
}

/// Print the outcome of a run to stdout
pub fn print_results(result: &SuiteResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print!("{}", report::render(&result.results)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}

/// Print the cases a run would execute, in order
pub fn print_cases(cases: &[TestCase], format: OutputFormat) -> anyhow::Result<()> {
    let summaries: Vec<CaseSummary> = cases
        .iter()
        .map(|c| CaseSummary {
            suite: &c.suite,
            element: &c.element,
            id: &c.id,
            steps: c.steps.len(),
        })
        .collect();

    match format {
        OutputFormat::Table => {
            if summaries.is_empty() {
                println!("No test cases found.");
                return Ok(());
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(vec!["Suite", "Element", "ID", "Steps"]);
            for s in &summaries {
                table.add_row(vec![
                    s.suite.to_string(),
                    s.element.to_string(),
                    s.id.to_string(),
                    s.steps.to_string(),
                ]);
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
    }
    Ok(())
}
