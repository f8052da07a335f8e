//! Validation logic for configuration and the exit policy type.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Config;

/// How the statuses of executed steps combine into the runner's exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Status of the last executed step, as a plain shell script would report
    #[default]
    Last,
    /// First non-zero status among the executed steps
    Any,
}

impl fmt::Display for ExitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitPolicy::Last => write!(f, "last"),
            ExitPolicy::Any => write!(f, "any"),
        }
    }
}

impl FromStr for ExitPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "last" => Ok(ExitPolicy::Last),
            "any" => Ok(ExitPolicy::Any),
            other => anyhow::bail!("Invalid exit policy '{}'. Expected 'last' or 'any'", other),
        }
    }
}

impl Config {
    /// Validate configuration values that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        let package = self.project.package.as_str();
        if package.trim().is_empty() {
            anyhow::bail!("project.package must not be empty");
        }
        if package.chars().any(|c| c.is_whitespace()) {
            anyhow::bail!("project.package must not contain whitespace: '{}'", package);
        }
        if package.contains('/') || package.contains('\\') {
            anyhow::bail!(
                "project.package must be a package name, not a path: '{}'",
                package
            );
        }

        if self.lint.command.trim().is_empty() {
            anyhow::bail!("lint.command must not be empty");
        }
        if self.test.command.trim().is_empty() {
            anyhow::bail!("test.command must not be empty");
        }
        if self.test.path.trim().is_empty() {
            anyhow::bail!("test.path must not be empty");
        }

        let coverage = &self.test.coverage;
        if !coverage.enabled && (coverage.xml || coverage.xml_file.is_some()) {
            anyhow::bail!("test.coverage.xml requires test.coverage.enabled");
        }
        if let Some(file) = &coverage.xml_file {
            if file.trim().is_empty() {
                anyhow::bail!("test.coverage.xml_file must not be empty when set");
            }
        }

        Ok(())
    }
}
