//! Conditional fix synthesis, gated on the verdict.

use std::time::Duration;

use codemend_evaluator::{strip_code_fences, CompletionRequest, Evaluator};
use codemend_types::{Result, Verdict};

use crate::prompts;

const MAX_TOKENS: u32 = 800;
const TEMPERATURE: f32 = 0.2;
const TIMEOUT: Duration = Duration::from_secs(60);

/// Produce corrected code for a failing submission.
///
/// No-ops to an empty string on a passing verdict — the gate switches over
/// the outcome variant, not a string. On a failing verdict, one request is
/// made; a transport failure here is fatal for the run, unlike test
/// synthesis: a guessed-at fix obtained by blind retrying is worse than an
/// aborted run.
pub async fn synthesize_fix(
    evaluator: &dyn Evaluator,
    code: &str,
    verdict: &Verdict,
) -> Result<String> {
    if verdict.passed() {
        return Ok(String::new());
    }

    let request = CompletionRequest::user_prompt(
        prompts::fix_prompt(code, &verdict.reason, &verdict.suggestions),
        MAX_TOKENS,
        TEMPERATURE,
        TIMEOUT,
    );
    let reply = evaluator.complete(&request).await?;
    Ok(strip_code_fences(&reply))
}
