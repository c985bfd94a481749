//! The codemend review workflow: stage sequencing, shared-state threading,
//! bounded-retry test synthesis, and the verdict-gated fix branch.
//!
//! The engine composes three capability traits — `StaticAnalyzer`,
//! `Evaluator`, `TestRunner` — into a fixed five-stage pipeline over a
//! single `WorkflowState` record.

pub mod engine;
pub mod fix;
pub mod prompts;
pub mod report;
pub mod synth;
pub mod verdict;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Workflow, WorkflowStage};
pub use fix::synthesize_fix;
pub use report::{render_markdown, write_outputs, ReportPaths};
pub use synth::{contains_assertion, synthesize_tests, SYNTHESIS_FAILURE_SENTINEL};
pub use verdict::request_verdict;
