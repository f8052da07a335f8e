//! Extracting figures from linter and test runner output.
//!
//! The tools own their output format; these helpers only read the parts the
//! run summary needs. Anything unrecognized yields `None` rather than an error.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// `path:line:col: CODE message`, the default flake8 format
static VIOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^:\s][^:]*:\d+:\d+: [A-Z]+\d+\b").expect("violation pattern")
});

static RAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Ran (\d+) tests? in ").expect("ran pattern"));

static FAILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^FAILED \(([^)]*)\)").expect("failed pattern"));

static COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)=(\d+)").expect("counter pattern"));

static COVERAGE_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^TOTAL\s+(?:\d+\s+)+(\d+(?:\.\d+)?)%").expect("coverage total pattern")
});

static COVERAGE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+\s+(?:\d+\s+)+(\d+(?:\.\d+)?)%").expect("coverage row pattern")
});

/// Test totals reported by the test runner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub ran: u32,
    pub failures: u32,
    pub errors: u32,
    pub skipped: u32,
}

impl TestSummary {
    pub fn passed(&self) -> u32 {
        self.ran
            .saturating_sub(self.failed().saturating_add(self.skipped))
    }

    /// Failures plus errors
    pub fn failed(&self) -> u32 {
        self.failures.saturating_add(self.errors)
    }

    pub fn is_success(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }
}

/// Count lint violation lines
pub fn count_violations(output: &str) -> usize {
    output
        .lines()
        .filter(|line| VIOLATION.is_match(line.trim_end()))
        .count()
}

/// Parse the `Ran N tests` / `OK` / `FAILED (...)` trailer of a unittest-style run
pub fn parse_test_summary(output: &str) -> Option<TestSummary> {
    let mut summary: Option<TestSummary> = None;

    for line in output.lines() {
        let line = line.trim();

        if let Some(caps) = RAN.captures(line) {
            let ran = caps[1].parse().ok()?;
            summary = Some(TestSummary {
                ran,
                ..Default::default()
            });
            continue;
        }

        let Some(current) = summary.as_mut() else {
            continue;
        };

        let counters = if let Some(caps) = FAILED.captures(line) {
            caps.get(1).map(|m| m.as_str().to_string())
        } else if let Some(rest) = line.strip_prefix("OK") {
            let rest = rest.trim();
            rest.strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .map(str::to_string)
        } else {
            None
        };

        if let Some(counters) = counters {
            for caps in COUNTER.captures_iter(&counters) {
                let value: u32 = caps[2].parse().unwrap_or(0);
                match caps[1].to_ascii_lowercase().as_str() {
                    "failures" => current.failures = value,
                    "errors" => current.errors = value,
                    "skip" | "skipped" => current.skipped = value,
                    _ => {}
                }
            }
        }
    }

    summary
}

/// Total coverage percentage from a coverage.py text report.
///
/// Uses the `TOTAL` row when present. A report over a single module has no
/// `TOTAL` row, in which case the only module row is used.
pub fn parse_coverage_percent(output: &str) -> Option<f64> {
    let mut rows = Vec::new();
    let mut in_table = false;

    for line in output.lines() {
        let line = line.trim_end();

        if let Some(caps) = COVERAGE_TOTAL.captures(line) {
            return caps[1].parse().ok();
        }

        if line.starts_with("Name") && line.contains("Stmts") {
            in_table = true;
            continue;
        }
        if !in_table || line.starts_with('-') {
            continue;
        }

        match COVERAGE_ROW.captures(line) {
            Some(caps) => rows.push(caps[1].to_string()),
            None => in_table = false,
        }
    }

    match rows.as_slice() {
        [only] => only.parse().ok(),
        _ => None,
    }
}
