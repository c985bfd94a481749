//! External tool adapters: static analyzers and the test runner.
//!
//! Both adapters are behind capability traits so the pipeline can be tested
//! without flake8, mypy, or pytest installed. The concrete implementations
//! shell out with `tokio::process::Command` and keep every transient file
//! inside a `tempfile` scope, so cleanup happens on all exit paths.

mod analyzer;
mod runner;

pub use analyzer::{CommandAnalyzer, StaticAnalyzer};
pub use runner::{PytestRunner, TestRunner};
