//! Prompt construction for the three evaluator calls.

/// Verdict request: demands a bare JSON object so the reply can be parsed
/// strictly — any prose around it is a fatal run error by design.
pub fn verdict_prompt(code: &str) -> String {
    format!(
        "You are a senior Python reviewer.\n\
         \n\
         Return *ONLY* a JSON object with keys\n\
         \x20 verdict: \"pass\" | \"fail\"\n\
         \x20 reason:  one concise sentence\n\
         \x20 suggestions: short fix advice\n\
         (no extra keys, no markdown).\n\
         \n\
         # Code\n\
         ```python\n{code}\n```"
    )
}

/// Test-synthesis request. `extra` carries the reinforced no-prose reminder
/// on the single retry, and is empty on the first attempt.
pub fn test_prompt(code: &str, extra: &str) -> String {
    format!(
        "Write **exactly three** pytest test functions that reveal bugs or \
         edge-case failures in the code below. The tests may fail. \
         Return ONLY valid Python in a ```python fence. \
         Do NOT include prose.\n{extra}\n```python\n{code}\n```"
    )
}

/// Reminder appended on the one retry of test synthesis.
pub const RETRY_REMINDER: &str = "Remember: ONLY code, no prose.";

/// Fix request: the full corrected submission, signatures preserved.
pub fn fix_prompt(code: &str, reason: &str, suggestions: &str) -> String {
    format!(
        "The following Python code failed review.\n\
         Reason: {reason}\n\
         Suggestions: {suggestions}\n\
         \n\
         Return the COMPLETE corrected code, preserving the original \
         function signatures. Return ONLY valid Python in a ```python \
         fence, with no commentary.\n\
         \n\
         ```python\n{code}\n```"
    )
}
