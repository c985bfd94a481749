/// Strip markdown code-fence markers from an evaluator reply.
///
/// Replies to test/fix requests are expected as fenced code; the fence
/// markers must not leak into the materialized source files. This is a
/// plain marker removal, not a markdown parser.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```python", "")
        .replace("```", "")
        .trim()
        .to_string()
}
