//! Plain-text rendering of suite results

use std::fmt::Write;

use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};

use crate::runner::{FailureKind, TestResult};

const SEPARATOR: &str = "==========";

pub fn status_label(result: &TestResult) -> &'static str {
    if result.success {
        "ok"
    } else {
        "FAIL"
    }
}

/// One whitespace-aligned row per case: suite, element, id, ok|FAIL
pub fn render_table(results: &[TestResult]) -> String {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled);

    for r in results {
        table.add_row(vec![
            r.suite.as_str(),
            r.element.as_str(),
            r.id.as_str(),
            status_label(r),
        ]);
    }

    table.to_string()
}

/// Detail blocks for every failed case; empty when all passed
pub fn render_failures(results: &[TestResult]) -> String {
    let mut out = String::new();
    if results.iter().all(|r| r.success) {
        return out;
    }

    let _ = write!(out, "\n\n{}\n\n", SEPARATOR);
    for r in results.iter().filter(|r| !r.success) {
        let _ = writeln!(out, "{}", r.key());
        let _ = writeln!(out, "    Status: FAIL");
        let _ = writeln!(out, "    Step:   {}", r.fail_step.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "    Errors: {}", describe_error(r));
        let _ = writeln!(out, "    Wanted: {}", r.wanted);
        let _ = writeln!(out, "    Got:    {}", r.got);
        let _ = write!(out, "\n{}\n\n", SEPARATOR);
    }
    out
}

/// Table followed by failure details
pub fn render(results: &[TestResult]) -> String {
    let mut out = render_table(results);
    out.push('\n');
    out.push_str(&render_failures(results));
    out
}

fn describe_error(result: &TestResult) -> String {
    match (&result.fail_error, result.failure_kind()) {
        (Some(err), Some(FailureKind::Configuration)) => {
            format!("{} (harness misconfiguration)", err)
        }
        (Some(err), _) => err.to_string(),
        (None, Some(FailureKind::ContentMismatch)) => "none (body did not match)".to_string(),
        (None, _) => "none".to_string(),
    }
}
