use std::path::Path;

use serde::Deserialize;

use codemend_types::{CodemendError, Result};

/// Name of the on-disk credentials file, looked up in the working directory.
pub const CONFIG_FILE: &str = "evaluator.json";

const URL_VAR: &str = "EVALUATOR_API_URL";
const KEY_VAR: &str = "EVALUATOR_API_KEY";

/// Endpoint and key for the remote evaluation capability.
///
/// Resolution order: `evaluator.json` in the working directory if present,
/// else the `EVALUATOR_API_URL` / `EVALUATOR_API_KEY` environment variables.
/// Neither source being available is a startup-time configuration error.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Deserialize)]
struct ConfigFile {
    evaluator: EvaluatorSection,
}

#[derive(Deserialize)]
struct EvaluatorSection {
    api_url: String,
    api_key: String,
}

impl Credentials {
    /// Resolve credentials relative to the current working directory.
    pub fn resolve() -> Result<Self> {
        Self::resolve_in(Path::new("."))
    }

    /// Resolve credentials with the config file looked up under `dir`.
    pub fn resolve_in(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Self::from_env()
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: ConfigFile = serde_json::from_str(&data).map_err(|e| {
            CodemendError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        Ok(Self {
            api_url: config.evaluator.api_url,
            api_key: config.evaluator.api_key,
        })
    }

    fn from_env() -> Result<Self> {
        match (std::env::var(URL_VAR), std::env::var(KEY_VAR)) {
            (Ok(api_url), Ok(api_key)) => Ok(Self { api_url, api_key }),
            _ => Err(CodemendError::ConfigError(format!(
                "no {CONFIG_FILE} found and {URL_VAR}/{KEY_VAR} are not both set"
            ))),
        }
    }
}
