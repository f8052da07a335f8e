//! Default values and configuration structs with default implementations.

use serde::{Deserialize, Serialize};

use super::validation::ExitPolicy;

/// Macro to generate default functions for serde attributes
macro_rules! default_fn {
    ($name:ident, $type:ty, $value:expr) => {
        pub(crate) fn $name() -> $type {
            $value
        }
    };
}

// =========================================================================
// DEFAULT VALUE FUNCTIONS
// =========================================================================

default_fn!(default_package, String, "viscum".to_string());
default_fn!(default_lint_command, String, "flake8".to_string());
default_fn!(default_test_command, String, "nosetests".to_string());
default_fn!(default_test_path, String, "tests/test_args.py".to_string());
default_fn!(default_true, bool, true);

// =========================================================================
// CONFIG STRUCTS WITH DEFAULTS
// =========================================================================

/// Project identity: the package both steps target
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Package name, used as lint target and coverage target (default: viscum)
    #[serde(default = "default_package")]
    pub package: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
        }
    }
}

/// Linter step configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LintConfig {
    /// Whether the lint step runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Linter executable (default: flake8)
    #[serde(default = "default_lint_command")]
    pub command: String,
    /// Arguments inserted before the lint target
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_lint_command(),
            extra_args: Vec::new(),
        }
    }
}

/// Coverage instrumentation for the test step
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoverageConfig {
    /// Pass `--with-coverage --cover-package=<package>`
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Pass `--cover-xml` so the test runner writes an XML report
    #[serde(default)]
    pub xml: bool,
    /// Custom XML report path (`--cover-xml-file`); the tool default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_file: Option<String>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            xml: false,
            xml_file: None,
        }
    }
}

/// Test runner step configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TestConfig {
    /// Whether the test step runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Test runner executable (default: nosetests)
    #[serde(default = "default_test_command")]
    pub command: String,
    /// Test discovery root (default: tests/test_args.py)
    #[serde(default = "default_test_path")]
    pub path: String,
    /// Arguments inserted before the test path
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub coverage: CoverageConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_test_command(),
            path: default_test_path(),
            extra_args: Vec::new(),
            coverage: CoverageConfig::default(),
        }
    }
}

/// Sequencing and exit status behavior
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    /// Stop after the first failing step instead of running the rest
    #[serde(default)]
    pub fail_fast: bool,
    /// How step statuses map to the process exit status
    #[serde(default)]
    pub exit_policy: ExitPolicy,
}
