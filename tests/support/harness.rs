use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Stands in for flake8: reports one violation when `<target>/.violation` exists.
const FAKE_FLAKE8: &str = r#"#!/bin/sh
echo "flake8 $*" >> calls.log
for target; do :; done
if [ -f "$target/.violation" ]; then
  echo "$target/__init__.py:1:1: F401 'os' imported but unused"
  exit 1
fi
exit 0
"#;

/// Stands in for nosetests: one test, fails when `tests/.fail` exists, writes
/// an XML report when asked to.
const FAKE_NOSETESTS: &str = r#"#!/bin/sh
echo "nosetests $*" >> calls.log
xml=""
xml_file="coverage.xml"
for arg; do
  case "$arg" in
    --cover-xml) xml=1 ;;
    --cover-xml-file=*) xml_file="${arg#--cover-xml-file=}" ;;
  esac
done
if [ -n "$xml" ]; then
  mkdir -p "$(dirname "$xml_file")"
  echo '<coverage line-rate="0.9"/>' > "$xml_file"
fi
cat >&2 <<EOF
.
Name                 Stmts   Miss  Cover
----------------------------------------
viscum/__init__.py      10      1    90%
----------------------------------------------------------------------
Ran 1 test in 0.001s

EOF
if [ -f tests/.fail ]; then
  echo "FAILED (failures=1)" >&2
  exit 1
fi
echo "OK" >&2
exit 0
"#;

/// TestHarness provides an isolated Python-style project with fake linter and
/// test runner executables first on PATH.
///
/// Layout:
/// - viscum/__init__.py
/// - tests/test_args.py
/// - .fakebin/{flake8,nosetests}
pub struct TestHarness {
    pub dir: TempDir,
    pub bin_dir: PathBuf,
    pub lintrun_binary: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path();

        fs::create_dir_all(base_path.join("viscum")).expect("Failed to create package dir");
        fs::write(base_path.join("viscum/__init__.py"), "\"\"\"viscum.\"\"\"\n")
            .expect("Failed to write package");
        fs::create_dir_all(base_path.join("tests")).expect("Failed to create tests dir");
        fs::write(base_path.join("tests/test_args.py"), "def test_ok():\n    pass\n")
            .expect("Failed to write test file");

        let bin_dir = base_path.join(".fakebin");
        fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");
        write_executable(&bin_dir.join("flake8"), FAKE_FLAKE8);
        write_executable(&bin_dir.join("nosetests"), FAKE_NOSETESTS);

        TestHarness {
            dir: temp_dir,
            bin_dir,
            lintrun_binary: PathBuf::from(env!("CARGO_BIN_EXE_lintrun")),
        }
    }

    /// Returns the base directory path (the TempDir path).
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Build a lintrun command with an isolated environment.
    pub fn command(&self, args: &[&str]) -> Command {
        let path = format!(
            "{}:{}",
            self.bin_dir.display(),
            std::env::var("PATH").unwrap_or_default()
        );

        let mut cmd = Command::new(&self.lintrun_binary);
        cmd.args(args)
            .current_dir(self.path())
            .env("PATH", path)
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".xdg"))
            .env("NO_COLOR", "1")
            .env_remove("LINTRUN_QUIET")
            .env_remove("LINTRUN_LOG");
        cmd
    }

    /// Executes the lintrun binary with the given arguments in the harness directory.
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("Failed to run lintrun")
    }

    /// Writes `.lintrun/config.md`.
    #[allow(dead_code)]
    pub fn write_config(&self, content: &str) {
        let dir = self.path().join(".lintrun");
        fs::create_dir_all(&dir).expect("Failed to create .lintrun");
        fs::write(dir.join("config.md"), content).expect("Failed to write config");
    }

    /// Make the fake linter report a violation.
    #[allow(dead_code)]
    pub fn add_lint_violation(&self) {
        fs::write(self.path().join("viscum/.violation"), "").expect("Failed to mark violation");
    }

    /// Make the fake test runner report a failing test.
    #[allow(dead_code)]
    pub fn add_failing_test(&self) {
        fs::write(self.path().join("tests/.fail"), "").expect("Failed to mark failure");
    }

    /// Lines the fake tools appended to calls.log, in invocation order.
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[allow(dead_code)]
    pub fn clear_calls(&self) {
        let _ = fs::remove_file(self.path().join("calls.log"));
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write script");
    let mut perms = fs::metadata(path)
        .expect("Failed to stat script")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to chmod script");
}

#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
