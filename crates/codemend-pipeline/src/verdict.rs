//! Verdict client: one strict-JSON request to the evaluation capability.

use std::time::Duration;

use codemend_evaluator::{CompletionRequest, Evaluator};
use codemend_types::{CodemendError, Result, Verdict};

use crate::prompts;

const MAX_TOKENS: u32 = 400;
const TEMPERATURE: f32 = 0.2;
const TIMEOUT: Duration = Duration::from_secs(60);

/// Ask the evaluator for a pass/fail verdict on `code`.
///
/// Transport failures and non-JSON replies are both fatal here: a verdict
/// that cannot be decoded leaves the fix gate undecidable, so there is no
/// retry and no fallback at this stage.
pub async fn request_verdict(evaluator: &dyn Evaluator, code: &str) -> Result<Verdict> {
    let request = CompletionRequest::user_prompt(
        prompts::verdict_prompt(code),
        MAX_TOKENS,
        TEMPERATURE,
        TIMEOUT,
    );
    let reply = evaluator.complete(&request).await?;
    parse_verdict(&reply)
}

/// Decode the evaluator reply as a strict JSON verdict object.
pub fn parse_verdict(reply: &str) -> Result<Verdict> {
    serde_json::from_str(reply).map_err(|e| CodemendError::MalformedVerdict {
        message: e.to_string(),
        snippet: snippet(reply),
    })
}

fn snippet(reply: &str) -> String {
    const MAX: usize = 120;
    if reply.len() <= MAX {
        reply.to_string()
    } else {
        let mut end = MAX;
        while !reply.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &reply[..end])
    }
}
