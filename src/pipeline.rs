//! Sequential execution of the lint and test steps.
//!
//! Steps run one at a time; each must terminate before the next starts. A
//! failing step does not stop the run unless `run.fail_fast` is set.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::executor::StepExecutor;
use crate::paths::DEFAULT_COVERAGE_XML;
use crate::report::{RunReport, StepOutcome};
use crate::step::{plan, Selection, StepCommand, StepKind};
use crate::ui::{self, colors, format};

pub struct Pipeline<'a, E: StepExecutor> {
    config: &'a Config,
    executor: &'a mut E,
    workdir: Option<PathBuf>,
    quiet: bool,
    interrupt: Option<&'a AtomicBool>,
}

impl<'a, E: StepExecutor> Pipeline<'a, E> {
    pub fn new(config: &'a Config, executor: &'a mut E) -> Self {
        Self {
            config,
            executor,
            workdir: None,
            quiet: false,
            interrupt: None,
        }
    }

    /// Run both steps from `dir` instead of the current directory
    pub fn with_workdir(mut self, dir: Option<&Path>) -> Self {
        self.workdir = dir.map(Path::to_path_buf);
        self
    }

    /// Suppress progress lines; tool output is unaffected
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Stop after the current step once `flag` is set
    pub fn with_interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.workdir {
            Some(dir) => dir.join(path),
            None => PathBuf::from(path),
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Check the inputs each selected step expects. Problems are warnings:
    /// the tools still run and their own exit status decides the outcome.
    pub fn preflight(&self, selection: Selection) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        let package = &self.config.project.package;

        if selection.includes(StepKind::Lint) && self.config.lint.enabled {
            let dir = self.resolve(package);
            if !dir.is_dir() {
                warnings.push(format!(
                    "lint target '{}' is not a directory",
                    dir.display()
                ));
            }
        }

        if selection.includes(StepKind::Test) && self.config.test.enabled {
            let test_path = self.resolve(&self.config.test_path()?);
            if !test_path.exists() {
                warnings.push(format!("test path '{}' does not exist", test_path.display()));
            }
        }

        Ok(warnings)
    }

    /// Where the test runner will write its XML coverage report, if requested
    pub fn coverage_artifact(&self) -> Result<Option<PathBuf>> {
        let coverage = &self.config.test.coverage;
        if !coverage.enabled || !coverage.xml {
            return Ok(None);
        }
        let file = self
            .config
            .xml_file()?
            .unwrap_or_else(|| DEFAULT_COVERAGE_XML.to_string());
        Ok(Some(self.resolve(&file)))
    }

    pub fn run(&mut self, selection: Selection) -> Result<RunReport> {
        let started_at = crate::utc_now_iso();
        let mut warnings = self.preflight(selection)?;
        for warning in &warnings {
            self.warn(warning);
        }

        let steps: Vec<StepCommand> = plan(self.config, selection)?
            .into_iter()
            .map(|step| step.with_cwd(self.workdir.as_deref()))
            .collect();
        tracing::debug!(count = steps.len(), "planned steps");

        let artifact = self.coverage_artifact()?;
        let mut outcomes = Vec::with_capacity(steps.len());
        let mut interrupted = false;
        let total = steps.len();

        for (index, step) in steps.iter().enumerate() {
            if self.interrupted() {
                interrupted = true;
                break;
            }

            if !self.quiet {
                println!(
                    "{} {} {}",
                    ui::step_icon(),
                    colors::heading(&step.kind.to_string()),
                    colors::secondary(&step.display())
                );
            }

            let before = artifact.as_deref().and_then(modified_time);
            let start = Instant::now();
            let exec = self.executor.execute(step)?;
            let elapsed = start.elapsed().as_millis() as u64;

            let mut outcome = StepOutcome::from_exec(step, &exec, elapsed);
            if step.kind == StepKind::Test {
                if let Some(path) = artifact.as_deref() {
                    match check_artifact(path, before) {
                        Some(found) => outcome.artifact = Some(found),
                        None => {
                            let warning =
                                format!("coverage report '{}' was not written", path.display());
                            self.warn(&warning);
                            warnings.push(warning);
                        }
                    }
                }
            }

            self.print_outcome(&outcome);
            let failed = !outcome.success();
            outcomes.push(outcome);

            if self.interrupted() {
                interrupted = true;
                break;
            }

            if failed && self.config.run.fail_fast && index + 1 < total {
                let warning = format!(
                    "{} step failed; skipping remaining steps (fail_fast)",
                    step.kind
                );
                self.warn(&warning);
                warnings.push(warning);
                break;
            }
        }

        Ok(RunReport::new(
            started_at,
            self.config.run.exit_policy,
            outcomes,
            warnings,
            interrupted,
        ))
    }

    fn warn(&self, message: &str) {
        tracing::debug!(warning = message, "run warning");
        if !self.quiet {
            eprintln!("{} {}", ui::warning_icon(), colors::warning(message));
        }
    }

    fn print_outcome(&self, outcome: &StepOutcome) {
        if let Some(reason) = &outcome.spawn_error {
            // Printed in quiet mode too
            eprintln!(
                "{} {} could not be started: {}",
                ui::result_icon(false),
                outcome.kind,
                colors::error(reason)
            );
            return;
        }
        if self.quiet {
            return;
        }

        let mut details = Vec::new();
        if let Some(count) = outcome.violations {
            details.push(format::plural(count, "violation", "violations"));
        }
        if let Some(tests) = &outcome.tests {
            details.push(format!(
                "{} passed, {} failed",
                tests.passed(),
                tests.failed()
            ));
        }
        if let Some(percent) = outcome.coverage_percent {
            details.push(format!("coverage {}", format::percent(percent)));
        }
        details.push(format::duration_ms(outcome.duration_ms));

        println!(
            "{} {} exited {} ({})",
            ui::result_icon(outcome.success()),
            outcome.kind,
            outcome.status,
            details.join(", ")
        );
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// The artifact counts as produced if it exists and is new or newer than
/// before the step ran.
fn check_artifact(path: &Path, before: Option<SystemTime>) -> Option<PathBuf> {
    let after = modified_time(path)?;
    match before {
        Some(before) if after <= before => None,
        _ => Some(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExitPolicy;
    use crate::executor::{ExecOutput, ScriptedExecutor, Termination};
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("viscum")).unwrap();
        fs::create_dir_all(tmp.path().join("tests")).unwrap();
        fs::write(tmp.path().join("tests/test_args.py"), "").unwrap();
        tmp
    }

    #[test]
    fn test_runs_lint_then_test() {
        let tmp = project();
        let config = Config::default();
        let mut executor =
            ScriptedExecutor::new([ExecOutput::exited(0, ""), ExecOutput::exited(0, "")]);

        let report = Pipeline::new(&config, &mut executor)
            .with_workdir(Some(tmp.path()))
            .quiet(true)
            .run(Selection::All)
            .unwrap();

        assert!(report.passed());
        assert!(report.warnings.is_empty());
        let kinds: Vec<_> = executor.executed().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![StepKind::Lint, StepKind::Test]);
        assert_eq!(executor.executed()[0].cwd.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn test_lint_failure_does_not_stop_tests() {
        let tmp = project();
        let config = Config::default();
        let mut executor = ScriptedExecutor::new([
            ExecOutput::exited(1, "viscum/hook.py:1:1: E302 expected 2 blank lines\n"),
            ExecOutput::exited(0, "Ran 1 test in 0.001s\n\nOK\n"),
        ]);

        let report = Pipeline::new(&config, &mut executor)
            .with_workdir(Some(tmp.path()))
            .quiet(true)
            .run(Selection::All)
            .unwrap();

        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.step(StepKind::Lint).unwrap().violations, Some(1));
        // Shell semantics: the last command decides
        assert_eq!(report.exit_code, 0);
    }

    #[test]
    fn test_any_policy_fails_on_lint() {
        let tmp = project();
        let mut config = Config::default();
        config.run.exit_policy = ExitPolicy::Any;
        let mut executor =
            ScriptedExecutor::new([ExecOutput::exited(1, ""), ExecOutput::exited(0, "")]);

        let report = Pipeline::new(&config, &mut executor)
            .with_workdir(Some(tmp.path()))
            .quiet(true)
            .run(Selection::All)
            .unwrap();

        assert_eq!(report.exit_code, 1);
    }

    #[test]
    fn test_fail_fast_skips_test_step() {
        let tmp = project();
        let mut config = Config::default();
        config.run.fail_fast = true;
        let mut executor = ScriptedExecutor::new([ExecOutput::exited(1, "")]);

        let report = Pipeline::new(&config, &mut executor)
            .with_workdir(Some(tmp.path()))
            .quiet(true)
            .run(Selection::All)
            .unwrap();

        assert_eq!(executor.executed().len(), 1);
        assert_eq!(report.exit_code, 1);
        assert!(report.warnings.iter().any(|w| w.contains("fail_fast")));
    }

    #[test]
    fn test_missing_tool_continues() {
        let tmp = project();
        let config = Config::default();
        let mut executor = ScriptedExecutor::new([
            ExecOutput {
                termination: Termination::SpawnFailed {
                    status: 127,
                    reason: "flake8: not found".to_string(),
                },
                output: String::new(),
            },
            ExecOutput::exited(0, ""),
        ]);

        let report = Pipeline::new(&config, &mut executor)
            .with_workdir(Some(tmp.path()))
            .quiet(true)
            .run(Selection::All)
            .unwrap();

        assert_eq!(report.step(StepKind::Lint).unwrap().status, 127);
        assert_eq!(executor.executed().len(), 2);
    }

    #[test]
    fn test_preflight_warns_on_missing_inputs() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let mut executor = ScriptedExecutor::default();

        let pipeline = Pipeline::new(&config, &mut executor).with_workdir(Some(tmp.path()));
        let warnings = pipeline.preflight(Selection::All).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("viscum"));
        assert!(warnings[1].contains("tests/test_args.py"));

        let warnings = pipeline.preflight(Selection::Only(StepKind::Lint)).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_xml_artifact_missing_is_warned() {
        let tmp = project();
        let mut config = Config::default();
        config.test.coverage.xml = true;
        let mut executor = ScriptedExecutor::new([ExecOutput::exited(0, "")]);

        let report = Pipeline::new(&config, &mut executor)
            .with_workdir(Some(tmp.path()))
            .quiet(true)
            .run(Selection::Only(StepKind::Test))
            .unwrap();

        let test = report.step(StepKind::Test).unwrap();
        assert!(test.artifact.is_none());
        assert!(report.warnings.iter().any(|w| w.contains("coverage.xml")));
    }

    #[test]
    fn test_no_artifact_expected_without_xml() {
        let tmp = project();
        let config = Config::default();
        let mut executor = ScriptedExecutor::default();

        let pipeline = Pipeline::new(&config, &mut executor).with_workdir(Some(tmp.path()));
        assert!(pipeline.coverage_artifact().unwrap().is_none());
    }

    #[test]
    fn test_custom_xml_file_location() {
        let tmp = project();
        let mut config = Config::default();
        config.test.coverage.xml = true;
        config.test.coverage.xml_file = Some("build/cov.xml".to_string());
        let mut executor = ScriptedExecutor::default();

        let pipeline = Pipeline::new(&config, &mut executor).with_workdir(Some(tmp.path()));
        assert_eq!(
            pipeline.coverage_artifact().unwrap(),
            Some(tmp.path().join("build/cov.xml"))
        );
    }

    #[test]
    fn test_check_artifact_requires_fresh_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("coverage.xml");
        assert!(check_artifact(&path, None).is_none());

        fs::write(&path, "<coverage/>").unwrap();
        assert_eq!(check_artifact(&path, None), Some(path.clone()));

        let mtime = modified_time(&path);
        assert!(check_artifact(&path, mtime).is_none());
    }

    #[test]
    fn test_interrupt_before_start_runs_nothing() {
        let tmp = project();
        let config = Config::default();
        let flag = AtomicBool::new(true);
        let mut executor = ScriptedExecutor::default();

        let report = Pipeline::new(&config, &mut executor)
            .with_workdir(Some(tmp.path()))
            .with_interrupt(&flag)
            .quiet(true)
            .run(Selection::All)
            .unwrap();

        assert!(report.interrupted);
        assert!(report.steps.is_empty());
        assert_eq!(report.exit_code, crate::report::STATUS_INTERRUPTED);
    }
}
