//! Shared types, errors, and workflow state for the codemend review pipeline.
//!
//! This crate provides the foundational types used across all other codemend
//! crates:
//! - `CodemendError` — unified error taxonomy
//! - `WorkflowState` — the per-run state record threaded through the stages
//! - `StageDelta` — the typed write each stage hands back to the engine
//! - `Verdict` / `ExecutionReport` — structured results from external tools

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CodemendError
// ---------------------------------------------------------------------------

/// Unified error type for all codemend subsystems.
#[derive(Debug, thiserror::Error)]
pub enum CodemendError {
    // === Startup errors ===
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // === Evaluator transport errors ===
    #[error("Evaluator returned HTTP {status}: {message}")]
    ServiceError { status: u16, message: String },

    #[error("Evaluator request timed out after {timeout_ms}ms")]
    RequestTimeout { timeout_ms: u64 },

    // === Verdict errors ===
    #[error("Malformed verdict reply ({message}): {snippet}")]
    MalformedVerdict { message: String, snippet: String },

    // === External tool errors ===
    #[error("Tool '{tool}' error: {message}")]
    ToolError { tool: String, message: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl CodemendError {
    /// Returns `true` if the error aborts the process before any run begins.
    pub fn is_startup(&self) -> bool {
        matches!(self, CodemendError::ConfigError(_))
    }

    /// Returns `true` for transport-class failures of the remote evaluator.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CodemendError::ServiceError { .. } | CodemendError::RequestTimeout { .. }
        )
    }
}

/// A convenience alias for `Result<T, CodemendError>`.
pub type Result<T> = std::result::Result<T, CodemendError>;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The evaluator's pass/fail judgment on a submission.
///
/// The downstream fix gate branches on [`VerdictOutcome`] alone; `reason`
/// and `suggestions` only flow into the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "verdict")]
    pub outcome: VerdictOutcome,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub suggestions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictOutcome {
    Pass,
    Fail,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.outcome == VerdictOutcome::Pass
    }
}

// ---------------------------------------------------------------------------
// ExecutionReport
// ---------------------------------------------------------------------------

/// Outcome of one synthesized test function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// A single test result extracted from the runner's JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub outcome: TestOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_tail: Option<String>,
}

/// Collected/failed counts from the runner's summary block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    #[serde(default)]
    pub collected: u32,
    #[serde(default)]
    pub failed: u32,
}

/// Parsed test-run report: summary counts plus per-test cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub summary: ReportSummary,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// Result of executing the synthesized tests.
///
/// `Error` is the marker the executor returns when the runner crashed before
/// writing a report; it serializes as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionReport {
    Tests(TestReport),
    Error { error: String },
}

impl ExecutionReport {
    /// Marker for a runner that produced no report file.
    pub fn no_report() -> Self {
        ExecutionReport::Error {
            error: "No report generated".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowState / StageDelta
// ---------------------------------------------------------------------------

/// The typed write a stage hands back to the engine. Each variant is produced
/// by exactly one stage, so merging deltas through [`WorkflowState::apply`]
/// preserves the single-writer-per-field invariant.
#[derive(Debug, Clone)]
pub enum StageDelta {
    Findings(BTreeMap<String, Vec<String>>),
    Verdict(Verdict),
    Tests(String),
    Report(ExecutionReport),
    Fix(String),
}

/// Per-run state record. Created with only `code` set; the five stages fill
/// the remaining fields additively, in fixed order, exactly once each. Never
/// reused across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub code: String,
    #[serde(default)]
    pub static_findings: BTreeMap<String, Vec<String>>,
    pub verdict: Option<Verdict>,
    pub test_code: Option<String>,
    pub execution_report: Option<ExecutionReport>,
    #[serde(default)]
    pub fixed_code: String,
}

impl WorkflowState {
    /// Create a fresh state for a single run.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            static_findings: BTreeMap::new(),
            verdict: None,
            test_code: None,
            execution_report: None,
            fixed_code: String::new(),
        }
    }

    /// Merge a stage's delta into the state. Each field is written once per
    /// run; a second write to the same field indicates an engine bug.
    pub fn apply(&mut self, delta: StageDelta) {
        match delta {
            StageDelta::Findings(findings) => {
                debug_assert!(self.static_findings.is_empty());
                self.static_findings = findings;
            }
            StageDelta::Verdict(verdict) => {
                debug_assert!(self.verdict.is_none());
                self.verdict = Some(verdict);
            }
            StageDelta::Tests(test_code) => {
                debug_assert!(self.test_code.is_none());
                self.test_code = Some(test_code);
            }
            StageDelta::Report(report) => {
                debug_assert!(self.execution_report.is_none());
                self.execution_report = Some(report);
            }
            StageDelta::Fix(fixed_code) => {
                debug_assert!(self.fixed_code.is_empty());
                self.fixed_code = fixed_code;
            }
        }
    }
}
