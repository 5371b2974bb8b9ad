//! Optional `redline.config.json`.
//!
//! Every key is optional. Explicit command-line flags win over file values,
//! and a missing default file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "redline.config.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub strict: Option<bool>,
    pub max_reduction: Option<f64>,
    pub page_budget: Option<usize>,
    #[serde(default)]
    pub suppress_checks: Vec<String>,
}

impl Config {
    /// Load `explicit`, or the default file in the working directory if present.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn strict(&self, flag: bool) -> bool {
        flag || self.strict.unwrap_or(false)
    }

    /// Suppressed check names from the file followed by those from flags.
    pub fn suppress(&self, flags: &[String]) -> Vec<String> {
        let mut out = self.suppress_checks.clone();
        out.extend(flags.iter().cloned());
        out
    }
}
