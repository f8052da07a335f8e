//! Running a step as a blocking child process.
//!
//! [`ProcessExecutor`] spawns the tool, echoes its stdout and stderr to the
//! terminal line by line, and keeps a copy of both for [`crate::parse`].
//! [`ScriptedExecutor`] replays canned results for tests.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use crate::step::StepCommand;

/// Exit status reported for a program that could not be found, as in a shell
pub const STATUS_NOT_FOUND: i32 = 127;
/// Exit status reported for a program that exists but could not be executed
pub const STATUS_NOT_EXECUTABLE: i32 = 126;

/// How a step's process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
    SpawnFailed { status: i32, reason: String },
}

impl Termination {
    /// Shell-style status code: exit code, `128 + signal`, or 126/127 for
    /// spawn failures
    pub fn status_code(&self) -> i32 {
        match self {
            Termination::Exited(code) => *code,
            Termination::Signaled(signal) => 128 + signal,
            Termination::SpawnFailed { status, .. } => *status,
        }
    }

    pub fn success(&self) -> bool {
        self.status_code() == 0
    }

    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Termination::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Termination::Signaled(signal);
            }
        }
        Termination::Exited(1)
    }

    fn from_spawn_error(program: &str, err: &io::Error) -> Self {
        let status = match err.kind() {
            io::ErrorKind::PermissionDenied => STATUS_NOT_EXECUTABLE,
            _ => STATUS_NOT_FOUND,
        };
        Termination::SpawnFailed {
            status,
            reason: format!("{}: {}", program, err),
        }
    }
}

/// Result of executing one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub termination: Termination,
    /// Captured stdout followed by captured stderr
    pub output: String,
}

impl ExecOutput {
    pub fn exited(code: i32, output: impl Into<String>) -> Self {
        Self {
            termination: Termination::Exited(code),
            output: output.into(),
        }
    }
}

/// Runs a single step to completion.
pub trait StepExecutor {
    /// Execute the command and block until it terminates.
    ///
    /// A program that cannot be spawned is not an error here; it is reported
    /// as [`Termination::SpawnFailed`] so the run can continue.
    fn execute(&mut self, command: &StepCommand) -> Result<ExecOutput>;
}

/// Executes steps as real child processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    echo: bool,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self { echo: true }
    }

    /// Capture output without echoing it to the terminal
    pub fn silent() -> Self {
        Self { echo: false }
    }
}

impl StepExecutor for ProcessExecutor {
    fn execute(&mut self, command: &StepCommand) -> Result<ExecOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(program = %command.program, args = ?command.args, cwd = ?command.cwd, "spawning step");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::debug!(error = %err, "spawn failed");
                return Ok(ExecOutput {
                    termination: Termination::from_spawn_error(&command.program, &err),
                    output: String::new(),
                });
            }
        };

        // Drain stderr on its own thread so a chatty stderr cannot block stdout
        let echo = self.echo;
        let stderr_reader = child
            .stderr
            .take()
            .map(|stderr| thread::spawn(move || drain_lines(stderr, echo.then(io::stderr))));

        let mut output = child
            .stdout
            .take()
            .map(|stdout| drain_lines(stdout, self.echo.then(io::stdout)))
            .unwrap_or_default();

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for '{}'", command.program))?;

        if let Some(handle) = stderr_reader {
            match handle.join() {
                Ok(captured) => output.push_str(&captured),
                Err(_) => tracing::warn!("stderr reader thread panicked"),
            }
        }

        let termination = Termination::from_status(status);
        tracing::debug!(program = %command.program, ?termination, "step finished");

        Ok(ExecOutput {
            termination,
            output,
        })
    }
}

/// Copies a child's output line by line until EOF, echoing the raw bytes to
/// `sink` and returning a lossily decoded copy.
///
/// Reading stops only at EOF or a read error, never on undecodable bytes, so
/// the child is not left writing into a closed pipe.
fn drain_lines<R: Read, W: Write>(source: R, mut sink: Option<W>) -> String {
    let mut reader = BufReader::new(source);
    let mut captured = String::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                if !line.ends_with(b"\n") {
                    line.push(b'\n');
                }
                if let Some(sink) = sink.as_mut() {
                    // Echo errors are ignored; capture continues to EOF
                    let _ = sink.write_all(&line).and_then(|()| sink.flush());
                }
                captured.push_str(&String::from_utf8_lossy(&line));
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                tracing::debug!(error = %err, "stopped reading step output");
                break;
            }
        }
    }

    captured
}

/// Replays queued results in order and records every command it was given.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    results: VecDeque<ExecOutput>,
    executed: Vec<StepCommand>,
}

impl ScriptedExecutor {
    pub fn new(results: impl IntoIterator<Item = ExecOutput>) -> Self {
        Self {
            results: results.into_iter().collect(),
            executed: Vec::new(),
        }
    }

    /// Commands executed so far, in order
    pub fn executed(&self) -> &[StepCommand] {
        &self.executed
    }
}

impl StepExecutor for ScriptedExecutor {
    fn execute(&mut self, command: &StepCommand) -> Result<ExecOutput> {
        self.executed.push(command.clone());
        self.results
            .pop_front()
            .with_context(|| format!("No scripted result left for '{}'", command.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepKind;

    fn command(program: &str, args: &[&str]) -> StepCommand {
        StepCommand {
            kind: StepKind::Lint,
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: None,
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Termination::Exited(0).status_code(), 0);
        assert_eq!(Termination::Exited(3).status_code(), 3);
        assert_eq!(Termination::Signaled(9).status_code(), 137);
        assert!(Termination::Exited(0).success());
        assert!(!Termination::Signaled(2).success());
    }

    #[test]
    fn test_missing_program_is_127() {
        let mut executor = ProcessExecutor::silent();
        let out = executor
            .execute(&command("lintrun-no-such-program-xyz", &[]))
            .unwrap();
        assert_eq!(out.termination.status_code(), STATUS_NOT_FOUND);
        match out.termination {
            Termination::SpawnFailed { reason, .. } => {
                assert!(reason.contains("lintrun-no-such-program-xyz"))
            }
            other => panic!("unexpected termination: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_stderr() {
        let mut executor = ProcessExecutor::silent();
        let out = executor
            .execute(&command("sh", &["-c", "echo out; echo err 1>&2; exit 3"]))
            .unwrap();
        assert_eq!(out.termination, Termination::Exited(3));
        assert!(out.output.contains("out\n"));
        assert!(out.output.contains("err\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let mut executor = ProcessExecutor::silent();
        let cmd = command("cat", &["marker.txt"]).with_cwd(Some(dir.path()));
        let out = executor.execute(&cmd).unwrap();
        assert!(out.termination.success());
        assert_eq!(out.output, "here\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_termination() {
        let mut executor = ProcessExecutor::silent();
        let out = executor
            .execute(&command("sh", &["-c", "kill -TERM $$"]))
            .unwrap();
        assert_eq!(out.termination, Termination::Signaled(15));
        assert_eq!(out.termination.status_code(), 143);
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_utf8_line_keeps_capturing() {
        let mut executor = ProcessExecutor::silent();
        let out = executor
            .execute(&command(
                "sh",
                &[
                    "-c",
                    "printf 'viscum/a.py:1:1: E101 x\\n\\377\\nviscum/b.py:2:1: F401 y\\n'; exit 1",
                ],
            ))
            .unwrap();
        assert_eq!(out.termination, Termination::Exited(1));
        assert!(out.output.contains("viscum/a.py:1:1: E101 x\n"));
        assert!(out.output.contains('\u{FFFD}'));
        assert!(out.output.contains("viscum/b.py:2:1: F401 y\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_utf8_does_not_break_pipe() {
        let script = "printf '\\377\\n'; printf '\\377\\n' >&2; \
                      i=0; while [ $i -lt 20000 ]; do echo \"line $i\"; echo \"err $i\" >&2; i=$((i+1)); done; \
                      exit 0";
        let mut executor = ProcessExecutor::silent();
        let out = executor.execute(&command("sh", &["-c", script])).unwrap();
        assert_eq!(out.termination, Termination::Exited(0));
        assert!(out.output.contains("line 19999\n"));
        assert!(out.output.contains("err 19999\n"));
    }

    #[test]
    fn test_drain_lines_echoes_raw_bytes() {
        let mut echoed = Vec::new();
        let captured = drain_lines(&b"ok\n\xffbad\nlast"[..], Some(&mut echoed));
        assert_eq!(echoed, b"ok\n\xffbad\nlast\n");
        assert_eq!(captured, "ok\n\u{FFFD}bad\nlast\n");
    }

    #[test]
    fn test_scripted_executor_replays_in_order() {
        let mut executor =
            ScriptedExecutor::new([ExecOutput::exited(1, "a"), ExecOutput::exited(0, "b")]);

        let first = executor.execute(&command("flake8", &["viscum"])).unwrap();
        let second = executor.execute(&command("nosetests", &[])).unwrap();
        assert_eq!(first.output, "a");
        assert_eq!(second.termination, Termination::Exited(0));
        assert_eq!(executor.executed().len(), 2);
        assert_eq!(executor.executed()[0].program, "flake8");

        assert!(executor.execute(&command("extra", &[])).is_err());
    }
}
