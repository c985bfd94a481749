use std::collections::BTreeMap;
use std::io::Write;

use async_trait::async_trait;

use codemend_types::{CodemendError, Result};

// ---------------------------------------------------------------------------
// StaticAnalyzer trait
// ---------------------------------------------------------------------------

/// Capability interface for the static-check stage.
#[async_trait]
pub trait StaticAnalyzer: Send + Sync {
    /// Run every configured analyzer against `code` and return the findings,
    /// one map entry per tool key, one list entry per diagnostic line.
    async fn analyze(&self, code: &str) -> Result<BTreeMap<String, Vec<String>>>;
}

// ---------------------------------------------------------------------------
// CommandAnalyzer
// ---------------------------------------------------------------------------

/// Shells out to the configured analyzer programs against a transient
/// on-disk copy of the code.
///
/// Analyzers of this class use their exit status to signal "findings
/// present", not tool failure, so a non-zero exit is never an error here;
/// whatever the tool printed is parsed into the findings list. Only a
/// failure to spawn the program at all surfaces as a `ToolError`.
pub struct CommandAnalyzer {
    tools: Vec<(String, String)>,
}

impl CommandAnalyzer {
    /// The standard pairing: `lint` → flake8, `typecheck` → mypy.
    pub fn new() -> Self {
        Self::with_tools([("lint", "flake8"), ("typecheck", "mypy")])
    }

    /// Custom `(key, program)` pairs, used by tests and non-default setups.
    pub fn with_tools<I, K, P>(tools: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        Self {
            tools: tools
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        }
    }
}

impl Default for CommandAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StaticAnalyzer for CommandAnalyzer {
    async fn analyze(&self, code: &str) -> Result<BTreeMap<String, Vec<String>>> {
        // RAII temp file: removed when this scope exits, error paths included.
        let mut tmp = tempfile::Builder::new()
            .prefix("codemend-")
            .suffix(".py")
            .tempfile()?;
        tmp.write_all(code.as_bytes())?;
        tmp.flush()?;
        let code_path = tmp.path().to_path_buf();

        let mut findings = BTreeMap::new();
        for (key, program) in &self.tools {
            let output = tokio::process::Command::new(program)
                .arg(&code_path)
                .output()
                .await
                .map_err(|e| CodemendError::ToolError {
                    tool: program.clone(),
                    message: e.to_string(),
                })?;

            let mut text = String::from_utf8_lossy(&output.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&output.stderr));

            let lines: Vec<String> = text.trim().lines().map(str::to_string).collect();

            tracing::debug!(
                tool = %key,
                program = %program,
                exit = ?output.status.code(),
                findings = lines.len(),
                "static analyzer finished"
            );
            findings.insert(key.clone(), lines);
        }
        Ok(findings)
    }
}
