//! Step outcomes, the run report, and the exit status policy.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ExitPolicy;
use crate::executor::{ExecOutput, Termination};
use crate::parse::TestSummary;
use crate::step::{StepCommand, StepKind};

/// Exit status after a Ctrl-C, as a shell reports it
pub const STATUS_INTERRUPTED: i32 = 130;

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub kind: StepKind,
    /// The command line as it was run
    pub command: String,
    /// Shell-style status code of the step
    pub status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    pub duration_ms: u64,
    /// Lint violations counted in the linter output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_percent: Option<f64>,
    /// Coverage report file found after the test step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_error: Option<String>,
}

impl StepOutcome {
    /// Build an outcome from an executed command. Output figures are filled
    /// in according to the step kind.
    pub fn from_exec(command: &StepCommand, exec: &ExecOutput, duration_ms: u64) -> Self {
        let (signal, spawn_error) = match &exec.termination {
            Termination::Exited(_) => (None, None),
            Termination::Signaled(signal) => (Some(*signal), None),
            Termination::SpawnFailed { reason, .. } => (None, Some(reason.clone())),
        };
        let spawned = spawn_error.is_none();

        let mut outcome = Self {
            kind: command.kind,
            command: command.display(),
            status: exec.termination.status_code(),
            signal,
            duration_ms,
            violations: None,
            tests: None,
            coverage_percent: None,
            artifact: None,
            spawn_error,
        };

        if spawned {
            match command.kind {
                StepKind::Lint => {
                    outcome.violations = Some(crate::parse::count_violations(&exec.output));
                }
                StepKind::Test => {
                    outcome.tests = crate::parse::parse_test_summary(&exec.output);
                    outcome.coverage_percent = crate::parse::parse_coverage_percent(&exec.output);
                }
            }
        }

        outcome
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Everything a run produced, serializable for CI consumption
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub exit_policy: ExitPolicy,
    pub steps: Vec<StepOutcome>,
    pub warnings: Vec<String>,
    pub interrupted: bool,
    pub exit_code: i32,
}

impl RunReport {
    pub fn new(
        started_at: String,
        exit_policy: ExitPolicy,
        steps: Vec<StepOutcome>,
        warnings: Vec<String>,
        interrupted: bool,
    ) -> Self {
        let exit_code = if interrupted {
            STATUS_INTERRUPTED
        } else {
            resolve_exit_code(exit_policy, &steps)
        };

        Self {
            started_at,
            exit_policy,
            steps,
            warnings,
            interrupted,
            exit_code,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    pub fn step(&self, kind: StepKind) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }

    /// Write the report as JSON, creating parent directories as needed
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

/// Combine step statuses into the runner's exit status.
///
/// No executed steps means nothing failed.
pub fn resolve_exit_code(policy: ExitPolicy, steps: &[StepOutcome]) -> i32 {
    match policy {
        ExitPolicy::Last => steps.last().map(|s| s.status).unwrap_or(0),
        ExitPolicy::Any => steps
            .iter()
            .map(|s| s.status)
            .find(|status| *status != 0)
            .unwrap_or(0),
    }
}
