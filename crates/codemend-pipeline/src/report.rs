//! Markdown report rendering and output artifacts.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use codemend_types::{ExecutionReport, Result, TestOutcome, WorkflowState};

/// Where [`write_outputs`] placed the run's artifacts.
#[derive(Debug)]
pub struct ReportPaths {
    pub report: PathBuf,
    /// Present only when the run produced corrected code.
    pub fixed: Option<PathBuf>,
}

/// Render the completed state as a markdown review report.
pub fn render_markdown(state: &WorkflowState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Code review report");
    let _ = writeln!(out);
    let _ = writeln!(out, "Generated: {}", chrono::Utc::now().to_rfc3339());
    let _ = writeln!(out);

    // Verdict
    let _ = writeln!(out, "## Verdict");
    let _ = writeln!(out);
    match &state.verdict {
        Some(verdict) => {
            let icon = if verdict.passed() { "✅" } else { "❌" };
            let label = if verdict.passed() { "pass" } else { "fail" };
            let _ = writeln!(out, "{icon} **{label}** — {}", verdict.reason);
            if !verdict.suggestions.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Suggestions: {}", verdict.suggestions);
            }
        }
        None => {
            let _ = writeln!(out, "(no verdict recorded)");
        }
    }
    let _ = writeln!(out);

    // Static findings
    let _ = writeln!(out, "## Static analysis");
    let _ = writeln!(out);
    for (tool, lines) in &state.static_findings {
        let _ = writeln!(out, "### {tool} ({} finding(s))", lines.len());
        for line in lines {
            let _ = writeln!(out, "- `{line}`");
        }
        let _ = writeln!(out);
    }

    // Test execution
    let _ = writeln!(out, "## Generated tests");
    let _ = writeln!(out);
    match &state.execution_report {
        Some(ExecutionReport::Tests(report)) => {
            let _ = writeln!(
                out,
                "{} collected, {} failed",
                report.summary.collected, report.summary.failed
            );
            let _ = writeln!(out);
            for case in &report.tests {
                let icon = match case.outcome {
                    TestOutcome::Passed => "✅",
                    TestOutcome::Failed => "❌",
                };
                let _ = writeln!(out, "- {icon} `{}`", case.id);
                if let Some(reason) = &case.failure_reason {
                    let _ = writeln!(out, "  - {reason}");
                }
            }
        }
        Some(ExecutionReport::Error { error }) => {
            let _ = writeln!(out, "⚠️ {error}");
        }
        None => {
            let _ = writeln!(out, "(tests were not executed)");
        }
    }
    let _ = writeln!(out);

    if let Some(test_code) = &state.test_code {
        let _ = writeln!(out, "```python\n{test_code}\n```");
        let _ = writeln!(out);
    }

    // Fix
    if !state.fixed_code.is_empty() {
        let _ = writeln!(out, "## Suggested fix");
        let _ = writeln!(out);
        let _ = writeln!(out, "```python\n{}\n```", state.fixed_code);
    }

    out
}

/// Persist the report next to the reviewed file, and the corrected code as a
/// sibling artifact when the run produced one.
///
/// `submission.py` gets `submission.review.md` and, on a failing verdict,
/// `submission.fixed.py` containing exactly the fixed code.
pub fn write_outputs(input: &Path, state: &WorkflowState) -> Result<ReportPaths> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "submission".to_string());
    let dir = input.parent().unwrap_or_else(|| Path::new(""));

    let report_path = dir.join(format!("{stem}.review.md"));
    std::fs::write(&report_path, render_markdown(state))?;

    let fixed_path = if state.fixed_code.is_empty() {
        None
    } else {
        let path = dir.join(format!("{stem}.fixed.py"));
        std::fs::write(&path, &state.fixed_code)?;
        Some(path)
    };

    Ok(ReportPaths {
        report: report_path,
        fixed: fixed_path,
    })
}
