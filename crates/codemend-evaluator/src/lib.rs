//! Client for the remote evaluation capability.
//!
//! Provides the `Evaluator` trait (so the pipeline can be tested with
//! deterministic doubles), the `HttpEvaluator` implementation, credential
//! resolution, and the code-fence stripping shared by test and fix synthesis.

mod client;
mod config;
mod fence;
mod types;

pub use client::{Evaluator, HttpEvaluator};
pub use config::Credentials;
pub use fence::strip_code_fences;
pub use types::{CompletionRequest, Message, Role};
