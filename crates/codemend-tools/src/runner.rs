use async_trait::async_trait;
use serde::Deserialize;

use codemend_types::{
    ExecutionReport, ReportSummary, Result, TestCase, TestOutcome, TestReport,
};

// ---------------------------------------------------------------------------
// TestRunner trait
// ---------------------------------------------------------------------------

/// Capability interface for the test-execution stage.
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Run `test_code` against `code` and return the structured report.
    async fn run(&self, code: &str, test_code: &str) -> Result<ExecutionReport>;
}

// ---------------------------------------------------------------------------
// PytestRunner
// ---------------------------------------------------------------------------

/// Materializes submission and tests as sibling files in a temp directory
/// and invokes pytest with a JSON report directive.
///
/// This stage absorbs runner failures: a crashed or missing runner, or a
/// runner that exits without writing the report file, produces the
/// `"No report generated"` marker instead of an error. Synthesized tests are
/// untrusted input and must not be able to abort the workflow.
pub struct PytestRunner {
    program: String,
}

impl PytestRunner {
    pub fn new() -> Self {
        Self::with_program("pytest")
    }

    /// Override the runner binary, used by tests.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PytestRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TestRunner for PytestRunner {
    async fn run(&self, code: &str, test_code: &str) -> Result<ExecutionReport> {
        // The whole directory and its contents are released on every exit
        // path when `dir` drops.
        let dir = tempfile::tempdir()?;
        let code_path = dir.path().join("submission.py");
        let test_path = dir.path().join("test_submission.py");
        let report_path = dir.path().join("report.json");

        tokio::fs::write(&code_path, code).await?;
        tokio::fs::write(&test_path, test_code).await?;

        let invocation = tokio::process::Command::new(&self.program)
            .arg(&test_path)
            .arg("--maxfail=1")
            .arg("--disable-warnings")
            .arg("--json-report")
            .arg(format!("--json-report-file={}", report_path.display()))
            .current_dir(dir.path())
            .output()
            .await;

        match invocation {
            Ok(output) => {
                tracing::debug!(exit = ?output.status.code(), "test runner finished");
            }
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "test runner failed to spawn");
            }
        }

        // Exit status is irrelevant: failing tests are an expected outcome.
        // Only the presence of the report file decides what we return.
        match tokio::fs::read_to_string(&report_path).await {
            Ok(raw) => Ok(parse_report(&raw)),
            Err(_) => Ok(ExecutionReport::no_report()),
        }
    }
}

// ---------------------------------------------------------------------------
// Report parsing (pytest-json-report shape)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawReport {
    #[serde(default)]
    summary: RawSummary,
    #[serde(default)]
    tests: Vec<RawTest>,
}

#[derive(Deserialize, Default)]
struct RawSummary {
    #[serde(default)]
    collected: u32,
    #[serde(default)]
    failed: u32,
}

#[derive(Deserialize)]
struct RawTest {
    nodeid: String,
    outcome: String,
    call: Option<RawPhase>,
}

#[derive(Deserialize)]
struct RawPhase {
    crash: Option<RawCrash>,
    longrepr: Option<String>,
}

#[derive(Deserialize)]
struct RawCrash {
    message: String,
}

/// Map the runner's JSON report into our [`ExecutionReport`]. An unreadable
/// report is absorbed into an error marker, same as a missing one.
fn parse_report(raw: &str) -> ExecutionReport {
    let raw_report: RawReport = match serde_json::from_str(raw) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable test report");
            return ExecutionReport::Error {
                error: format!("Unreadable report: {e}"),
            };
        }
    };

    let tests = raw_report
        .tests
        .into_iter()
        .map(|t| {
            let outcome = if t.outcome == "passed" {
                TestOutcome::Passed
            } else {
                TestOutcome::Failed
            };
            let (failure_reason, trace_tail) = match t.call {
                Some(phase) => (
                    phase.crash.map(|c| c.message),
                    phase.longrepr.as_deref().map(tail_lines),
                ),
                None => (None, None),
            };
            TestCase {
                id: t.nodeid,
                outcome,
                failure_reason,
                trace_tail,
            }
        })
        .collect();

    ExecutionReport::Tests(TestReport {
        summary: ReportSummary {
            collected: raw_report.summary.collected,
            failed: raw_report.summary.failed,
        },
        tests,
    })
}

/// Last three lines of a traceback, enough to see the failing assertion.
fn tail_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(3);
    lines[start..].join("\n")
}
