//! Workflow engine — the fixed five-stage traversal over a single run's state.

use std::sync::Arc;

use codemend_evaluator::Evaluator;
use codemend_tools::{StaticAnalyzer, TestRunner};
use codemend_types::{CodemendError, Result, StageDelta, WorkflowState};

use crate::{fix, synth, verdict};

// ---------------------------------------------------------------------------
// WorkflowStage
// ---------------------------------------------------------------------------

/// The engine's state machine. Transitions are unconditional; `FixSynth`
/// internally no-ops when the verdict passed, so no stage is ever skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    StaticCheck,
    VerdictEval,
    TestSynth,
    TestExec,
    FixSynth,
    Done,
}

impl WorkflowStage {
    /// The fixed total order of the pipeline.
    pub fn next(self) -> Self {
        match self {
            WorkflowStage::StaticCheck => WorkflowStage::VerdictEval,
            WorkflowStage::VerdictEval => WorkflowStage::TestSynth,
            WorkflowStage::TestSynth => WorkflowStage::TestExec,
            WorkflowStage::TestExec => WorkflowStage::FixSynth,
            WorkflowStage::FixSynth => WorkflowStage::Done,
            WorkflowStage::Done => WorkflowStage::Done,
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// The review workflow executor. Owns the three external capabilities and
/// drives the stage sequence over a per-run [`WorkflowState`].
pub struct Workflow {
    analyzer: Arc<dyn StaticAnalyzer>,
    evaluator: Arc<dyn Evaluator>,
    runner: Arc<dyn TestRunner>,
}

impl Workflow {
    pub fn new(
        analyzer: Arc<dyn StaticAnalyzer>,
        evaluator: Arc<dyn Evaluator>,
        runner: Arc<dyn TestRunner>,
    ) -> Self {
        Self {
            analyzer,
            evaluator,
            runner,
        }
    }

    /// Run the full pipeline on one submission.
    ///
    /// Each stage blocks on its external call before the next starts; every
    /// stage's output is merged into the state as a typed delta, so fields
    /// only accumulate. An unhandled stage error aborts the remainder of the
    /// run — there is no cross-stage recovery.
    pub async fn run(&self, code: impl Into<String>) -> Result<WorkflowState> {
        let mut state = WorkflowState::new(code);
        let mut stage = WorkflowStage::StaticCheck;

        while stage != WorkflowStage::Done {
            tracing::info!(stage = ?stage, "stage start");
            let delta = self.execute_stage(stage, &state).await?;
            state.apply(delta);
            stage = stage.next();
        }
        Ok(state)
    }

    async fn execute_stage(&self, stage: WorkflowStage, state: &WorkflowState) -> Result<StageDelta> {
        match stage {
            WorkflowStage::StaticCheck => {
                let findings = self.analyzer.analyze(&state.code).await?;
                Ok(StageDelta::Findings(findings))
            }
            WorkflowStage::VerdictEval => {
                let verdict = verdict::request_verdict(self.evaluator.as_ref(), &state.code).await?;
                Ok(StageDelta::Verdict(verdict))
            }
            WorkflowStage::TestSynth => {
                let test_code = synth::synthesize_tests(self.evaluator.as_ref(), &state.code).await?;
                tracing::debug!(preview = %preview(&test_code), "synthesized tests");
                Ok(StageDelta::Tests(test_code))
            }
            WorkflowStage::TestExec => {
                let test_code = state.test_code.as_deref().ok_or_else(|| {
                    CodemendError::Other("test code missing before execution stage".into())
                })?;
                let report = self.runner.run(&state.code, test_code).await?;
                Ok(StageDelta::Report(report))
            }
            WorkflowStage::FixSynth => {
                let verdict = state.verdict.as_ref().ok_or_else(|| {
                    CodemendError::Other("verdict missing before fix stage".into())
                })?;
                let fixed =
                    fix::synthesize_fix(self.evaluator.as_ref(), &state.code, verdict).await?;
                Ok(StageDelta::Fix(fixed))
            }
            WorkflowStage::Done => Err(CodemendError::Other(
                "terminal stage has no work".into(),
            )),
        }
    }
}

/// First 400 characters of the synthesized tests, for debug logs.
fn preview(text: &str) -> &str {
    let mut end = text.len().min(400);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEvaluator;
    use async_trait::async_trait;
    use codemend_types::{ExecutionReport, ReportSummary, TestReport, VerdictOutcome};
    use std::collections::BTreeMap;

    // --- deterministic doubles ---

    struct StubAnalyzer;

    #[async_trait]
    impl StaticAnalyzer for StubAnalyzer {
        async fn analyze(&self, _code: &str) -> Result<BTreeMap<String, Vec<String>>> {
            let mut findings = BTreeMap::new();
            findings.insert("lint".to_string(), vec!["E501 line too long".to_string()]);
            findings.insert("typecheck".to_string(), Vec::new());
            Ok(findings)
        }
    }

    struct StubRunner {
        report: ExecutionReport,
    }

    impl StubRunner {
        fn passing() -> Self {
            Self {
                report: ExecutionReport::Tests(TestReport {
                    summary: ReportSummary {
                        collected: 3,
                        failed: 0,
                    },
                    tests: Vec::new(),
                }),
            }
        }

        fn no_report() -> Self {
            Self {
                report: ExecutionReport::no_report(),
            }
        }
    }

    #[async_trait]
    impl TestRunner for StubRunner {
        async fn run(&self, _code: &str, _test_code: &str) -> Result<ExecutionReport> {
            Ok(self.report.clone())
        }
    }

    // The engine consumes the scripted replies as verdict, test synthesis
    // (once or twice), then fix when the gate is open.
    const PASS_VERDICT: &str = r#"{"verdict": "pass", "reason": "clean", "suggestions": ""}"#;
    const FAIL_VERDICT: &str =
        r#"{"verdict": "fail", "reason": "off by one", "suggestions": "fix bound"}"#;
    const TESTS: &str = "```python\ndef test_a():\n    assert f(0) == 0\n```";

    fn workflow(evaluator: Arc<ScriptedEvaluator>, runner: StubRunner) -> Workflow {
        Workflow::new(Arc::new(StubAnalyzer), evaluator, Arc::new(runner))
    }

    // 1. Stage order is the fixed total order
    #[test]
    fn stage_order_is_fixed() {
        let mut stage = WorkflowStage::StaticCheck;
        let mut seen = vec![stage];
        while stage != WorkflowStage::Done {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                WorkflowStage::StaticCheck,
                WorkflowStage::VerdictEval,
                WorkflowStage::TestSynth,
                WorkflowStage::TestExec,
                WorkflowStage::FixSynth,
                WorkflowStage::Done,
            ]
        );
    }

    // 2. Scenario A: pass verdict, fix gate closed, zero fix calls
    #[tokio::test]
    async fn pass_verdict_leaves_fix_empty() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&[PASS_VERDICT, TESTS]));
        let state = workflow(evaluator.clone(), StubRunner::passing())
            .run("def f(x): return x")
            .await
            .unwrap();

        assert!(state.verdict.unwrap().passed());
        assert_eq!(state.fixed_code, "");
        // verdict + one test synthesis; the fix branch never called out
        assert_eq!(evaluator.call_count(), 2);
    }

    // 3. Scenario B: fail verdict opens the gate and stores the cleaned fix
    #[tokio::test]
    async fn fail_verdict_produces_fixed_code() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&[
            FAIL_VERDICT,
            TESTS,
            "```python\ndef f(): return 1\n```",
        ]));
        let state = workflow(evaluator.clone(), StubRunner::passing())
            .run("def f(): return 2")
            .await
            .unwrap();

        assert_eq!(state.fixed_code, "def f(): return 1");
        assert_eq!(evaluator.call_count(), 3);
    }

    // 4. Findings always carry exactly the two fixed tool keys
    #[tokio::test]
    async fn findings_have_two_fixed_keys() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&[PASS_VERDICT, TESTS]));
        let state = workflow(evaluator, StubRunner::passing())
            .run("x = 1")
            .await
            .unwrap();

        let keys: Vec<&str> = state.static_findings.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["lint", "typecheck"]);
    }

    // 5. Retry threading: assertion-free first synthesis reply costs exactly
    //    one extra evaluator call and the second reply wins
    #[tokio::test]
    async fn synthesis_retry_threads_through_engine() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&[
            PASS_VERDICT,
            "Happy to help! Here is a plan.",
            TESTS,
        ]));
        let state = workflow(evaluator.clone(), StubRunner::passing())
            .run("x = 1")
            .await
            .unwrap();

        assert_eq!(evaluator.call_count(), 3);
        assert_eq!(
            state.test_code.as_deref(),
            Some("def test_a():\n    assert f(0) == 0")
        );
    }

    // 6. Sentinel fallback reaches the state record
    #[tokio::test]
    async fn synthesis_fallback_stores_sentinel() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&[PASS_VERDICT, "", ""]));
        let state = workflow(evaluator, StubRunner::passing())
            .run("x = 1")
            .await
            .unwrap();

        assert_eq!(
            state.test_code.as_deref(),
            Some(synth::SYNTHESIS_FAILURE_SENTINEL)
        );
    }

    // 7. Scenario C: runner with no report completes the run with the marker
    #[tokio::test]
    async fn missing_report_does_not_abort_run() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&[PASS_VERDICT, TESTS]));
        let state = workflow(evaluator, StubRunner::no_report())
            .run("x = 1")
            .await
            .unwrap();

        assert_eq!(state.execution_report, Some(ExecutionReport::no_report()));
        // later stages still ran
        assert_eq!(state.fixed_code, "");
    }

    // 8. Malformed verdict aborts the run before test synthesis
    #[tokio::test]
    async fn malformed_verdict_is_fatal() {
        let evaluator = Arc::new(ScriptedEvaluator::new(&["I think it passes."]));
        let result = workflow(evaluator.clone(), StubRunner::passing())
            .run("x = 1")
            .await;

        assert!(matches!(
            result,
            Err(CodemendError::MalformedVerdict { .. })
        ));
        // aborted after the verdict call; synthesis never ran
        assert_eq!(evaluator.call_count(), 1);
    }

    // 9. Fix-gate property: fixed_code empty iff verdict is not Fail
    #[tokio::test]
    async fn fix_gate_matches_verdict_outcome() {
        for (verdict_json, expect_empty) in [(PASS_VERDICT, true), (FAIL_VERDICT, false)] {
            let evaluator = Arc::new(ScriptedEvaluator::new(&[
                verdict_json,
                TESTS,
                "```python\nfixed = True\n```",
            ]));
            let state = workflow(evaluator, StubRunner::passing())
                .run("x = 1")
                .await
                .unwrap();

            let outcome = state.verdict.as_ref().unwrap().outcome;
            assert_eq!(state.fixed_code.is_empty(), expect_empty);
            assert_eq!(outcome != VerdictOutcome::Fail, state.fixed_code.is_empty());
        }
    }

    // 10. Idempotence: identical stubs and code give identical states
    #[tokio::test]
    async fn deterministic_stubs_give_identical_runs() {
        let script = [FAIL_VERDICT, TESTS, "```python\nfixed = True\n```"];
        let first = workflow(Arc::new(ScriptedEvaluator::new(&script)), StubRunner::passing())
            .run("x = 1")
            .await
            .unwrap();
        let second = workflow(Arc::new(ScriptedEvaluator::new(&script)), StubRunner::passing())
            .run("x = 1")
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}
