//! Deterministic evaluator double shared by the stage test modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use codemend_evaluator::{CompletionRequest, Evaluator};
use codemend_types::{CodemendError, Result};

/// Replays a scripted list of replies in order, counting calls. Running off
/// the end of the script is an error, so a test also fails loudly when a
/// stage makes more calls than expected.
pub(crate) struct ScriptedEvaluator {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub(crate) fn new(replies: &[&str]) -> Self {
        let mut replies: Vec<String> = replies.iter().map(|s| s.to_string()).collect();
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| CodemendError::Other("script exhausted".into()))
    }
}
