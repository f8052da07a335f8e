//! Configuration management for lintrun.
//!
//! Values are layered, later overriding earlier:
//! built-in defaults, global config, project config, command-line overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::frontmatter::split_frontmatter;
use crate::paths::PROJECT_CONFIG;

pub mod defaults;
pub mod validation;

pub use defaults::*;
pub use validation::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub test: TestConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Values given on the command line; `None` leaves the configured value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub package: Option<String>,
    pub test_path: Option<String>,
    pub cover_xml: Option<bool>,
    pub fail_fast: Option<bool>,
    pub exit_policy: Option<ExitPolicy>,
}

impl Config {
    /// Load configuration with full merge semantics.
    /// Merge order (later overrides earlier):
    /// 1. Global config (<config dir>/lintrun/config.md), if present
    /// 2. Project config (.lintrun/config.md), if present
    pub fn load() -> Result<Self> {
        Self::load_merged_from(global_config_path().as_deref(), Path::new(PROJECT_CONFIG))
    }

    /// Load a single config file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let (frontmatter, _body) = split_frontmatter(content);
        let frontmatter = frontmatter.context("Failed to extract frontmatter from config")?;

        let config: Config =
            serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")?;

        config.validate()?;

        Ok(config)
    }

    /// Load merged configuration from the given global and project paths.
    /// Either file may be absent; built-in defaults fill the gaps.
    pub fn load_merged_from(global_path: Option<&Path>, project_path: &Path) -> Result<Self> {
        let global_config = global_path
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let project_config = if project_path.exists() {
            PartialConfig::load_from(project_path)?
        } else {
            tracing::debug!(path = %project_path.display(), "no project config, using defaults");
            PartialConfig::default()
        };

        let config = global_config.merge_with(project_config);
        config.validate()?;

        Ok(config)
    }

    /// Load merged configuration where the project file was named explicitly
    /// and therefore must exist.
    pub fn load_with_project(project_path: &Path) -> Result<Self> {
        if !project_path.exists() {
            anyhow::bail!("Config file not found: {}", project_path.display());
        }
        Self::load_merged_from(global_config_path().as_deref(), project_path)
    }

    /// Apply command-line overrides and re-validate.
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(package) = &overrides.package {
            self.project.package = package.clone();
        }
        if let Some(path) = &overrides.test_path {
            self.test.path = path.clone();
        }
        if let Some(xml) = overrides.cover_xml {
            self.test.coverage.xml = xml;
            // Asking for XML on the command line implies instrumentation
            if xml {
                self.test.coverage.enabled = true;
            }
        }
        if let Some(fail_fast) = overrides.fail_fast {
            self.run.fail_fast = fail_fast;
        }
        if let Some(policy) = overrides.exit_policy {
            self.run.exit_policy = policy;
        }

        self.validate()?;
        Ok(self)
    }

    /// Test path with `~` and environment variables expanded
    pub fn test_path(&self) -> Result<String> {
        expand(&self.test.path)
    }

    /// Custom XML coverage file with `~` and environment variables expanded
    pub fn xml_file(&self) -> Result<Option<String>> {
        self.test.coverage.xml_file.as_deref().map(expand).transpose()
    }

    /// Serialize to the on-disk format (YAML frontmatter)
    pub fn to_markdown(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config")?;
        Ok(crate::frontmatter::with_frontmatter(&yaml, ""))
    }
}

fn expand(value: &str) -> Result<String> {
    shellexpand::full(value)
        .map(|expanded| expanded.into_owned())
        .with_context(|| format!("Failed to expand path '{}'", value))
}

/// Returns the path to the global config file at <config dir>/lintrun/config.md
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lintrun").join("config.md"))
}

/// Partial config for merging - all fields optional
#[derive(Debug, Deserialize, Default)]
struct PartialConfig {
    pub project: Option<PartialProjectConfig>,
    pub lint: Option<PartialLintConfig>,
    pub test: Option<PartialTestConfig>,
    pub run: Option<PartialRunConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialProjectConfig {
    pub package: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialLintConfig {
    pub enabled: Option<bool>,
    pub command: Option<String>,
    pub extra_args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialTestConfig {
    pub enabled: Option<bool>,
    pub command: Option<String>,
    pub path: Option<String>,
    pub extra_args: Option<Vec<String>>,
    pub coverage: Option<PartialCoverageConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialCoverageConfig {
    pub enabled: Option<bool>,
    pub xml: Option<bool>,
    pub xml_file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialRunConfig {
    pub fail_fast: Option<bool>,
    pub exit_policy: Option<ExitPolicy>,
}

impl PartialConfig {
    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config file");

        Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        let (frontmatter, _body) = split_frontmatter(content);
        let frontmatter = frontmatter.context("Failed to extract frontmatter from config")?;

        serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")
    }

    /// Merge this global config with a project config, returning the merged result.
    /// Each key set in the project config takes precedence over the same key in
    /// the global config; unset keys fall back to the global value, then the default.
    fn merge_with(self, project: PartialConfig) -> Config {
        let global_project = self.project.unwrap_or_default();
        let project_project = project.project.unwrap_or_default();
        let global_lint = self.lint.unwrap_or_default();
        let project_lint = project.lint.unwrap_or_default();
        let mut global_test = self.test.unwrap_or_default();
        let mut project_test = project.test.unwrap_or_default();
        let global_coverage = global_test.coverage.take().unwrap_or_default();
        let project_coverage = project_test.coverage.take().unwrap_or_default();
        let global_run = self.run.unwrap_or_default();
        let project_run = project.run.unwrap_or_default();

        Config {
            project: ProjectConfig {
                package: project_project
                    .package
                    .or(global_project.package)
                    .unwrap_or_else(defaults::default_package),
            },
            lint: LintConfig {
                enabled: project_lint
                    .enabled
                    .or(global_lint.enabled)
                    .unwrap_or(true),
                command: project_lint
                    .command
                    .or(global_lint.command)
                    .unwrap_or_else(defaults::default_lint_command),
                extra_args: project_lint
                    .extra_args
                    .or(global_lint.extra_args)
                    .unwrap_or_default(),
            },
            test: TestConfig {
                enabled: project_test
                    .enabled
                    .or(global_test.enabled)
                    .unwrap_or(true),
                command: project_test
                    .command
                    .or(global_test.command)
                    .unwrap_or_else(defaults::default_test_command),
                path: project_test
                    .path
                    .or(global_test.path)
                    .unwrap_or_else(defaults::default_test_path),
                extra_args: project_test
                    .extra_args
                    .or(global_test.extra_args)
                    .unwrap_or_default(),
                coverage: CoverageConfig {
                    enabled: project_coverage
                        .enabled
                        .or(global_coverage.enabled)
                        .unwrap_or(true),
                    xml: project_coverage
                        .xml
                        .or(global_coverage.xml)
                        .unwrap_or(false),
                    xml_file: project_coverage.xml_file.or(global_coverage.xml_file),
                },
            },
            run: RunConfig {
                fail_fast: project_run
                    .fail_fast
                    .or(global_run.fail_fast)
                    .unwrap_or(false),
                exit_policy: project_run
                    .exit_policy
                    .or(global_run.exit_policy)
                    .unwrap_or_default(),
            },
        }
    }
}
