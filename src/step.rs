//! Lint and test step invocations.
//!
//! A [`StepCommand`] is a fully-resolved program and argument list. Nothing
//! here spawns processes; see [`crate::executor`] for that.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Which of the two steps a command or outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Lint,
    Test,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Lint => write!(f, "lint"),
            StepKind::Test => write!(f, "test"),
        }
    }
}

/// Which steps a run should execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Lint, then test
    All,
    Only(StepKind),
}

impl Selection {
    pub fn includes(&self, kind: StepKind) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(only) => *only == kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    pub kind: StepKind,
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the runner's
    pub cwd: Option<PathBuf>,
}

impl StepCommand {
    /// Render as a single shell-like line for display
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn with_cwd(mut self, cwd: Option<&Path>) -> Self {
        self.cwd = cwd.map(Path::to_path_buf);
        self
    }
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// `<lint.command> [extra_args...] <package>`
pub fn lint_command(config: &Config) -> StepCommand {
    let mut args = config.lint.extra_args.clone();
    args.push(config.project.package.clone());

    StepCommand {
        kind: StepKind::Lint,
        program: config.lint.command.clone(),
        args,
        cwd: None,
    }
}

/// `<test.command> --with-coverage --cover-package=<package> [--cover-xml]
/// [--cover-xml-file=<file>] [extra_args...] <test path>`
pub fn test_command(config: &Config) -> Result<StepCommand> {
    let coverage = &config.test.coverage;
    let mut args = Vec::new();

    if coverage.enabled {
        args.push("--with-coverage".to_string());
        args.push(format!("--cover-package={}", config.project.package));
        if coverage.xml {
            args.push("--cover-xml".to_string());
            if let Some(file) = config.xml_file()? {
                args.push(format!("--cover-xml-file={}", file));
            }
        }
    }

    args.extend(config.test.extra_args.iter().cloned());
    args.push(config.test_path()?);

    Ok(StepCommand {
        kind: StepKind::Test,
        program: config.test.command.clone(),
        args,
        cwd: None,
    })
}

/// Commands to run, in execution order, honoring the selection and the
/// per-step `enabled` switches.
pub fn plan(config: &Config, selection: Selection) -> Result<Vec<StepCommand>> {
    let mut steps = Vec::with_capacity(2);

    if selection.includes(StepKind::Lint) && config.lint.enabled {
        steps.push(lint_command(config));
    }
    if selection.includes(StepKind::Test) && config.test.enabled {
        steps.push(test_command(config)?);
    }

    Ok(steps)
}
