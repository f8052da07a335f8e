//! # lintrun - lint and test in one step
//!
//! lintrun executes a linter pass and then a coverage-instrumented test pass
//! over a Python package, and reports a combined outcome through its exit
//! status. It is meant to be the single command a CI job calls.
//!
//! ## Overview
//!
//! The two tools (by default `flake8` and `nosetests`) are external programs.
//! lintrun resolves their invocations from layered configuration, runs them
//! strictly one after the other, echoes their output, and summarizes what it
//! saw: violation counts, test totals, and the coverage percentage.
//!
//! ## Modules
//!
//! - [`config`] - Layered configuration (defaults, global, project, CLI)
//! - [`step`] - Building the lint and test invocations
//! - [`executor`] - Running a step as a blocking child process
//! - [`parse`] - Extracting figures from tool output
//! - [`report`] - Step outcomes, run report, and exit policy
//! - [`pipeline`] - Sequential execution of the planned steps
//!
//! ## Example
//!
//! ```no_run
//! use lintrun::config::Config;
//! use lintrun::executor::ProcessExecutor;
//! use lintrun::pipeline::Pipeline;
//! use lintrun::step::Selection;
//!
//! let config = Config::load().expect("Failed to load config");
//! let mut executor = ProcessExecutor::new();
//! let report = Pipeline::new(&config, &mut executor)
//!     .run(Selection::All)
//!     .expect("Run failed");
//!
//! std::process::exit(report.exit_code);
//! ```

pub mod config;
pub mod executor;
pub mod frontmatter;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod step;
pub mod ui;

/// Default path constants for the lintrun directory structure.
pub mod paths {
    /// Directory containing project-local lintrun files: `.lintrun`
    pub const LINTRUN_DIR: &str = ".lintrun";
    /// Project config file: `.lintrun/config.md`
    pub const PROJECT_CONFIG: &str = ".lintrun/config.md";
    /// Default XML coverage file written by the test runner's `--cover-xml`
    pub const DEFAULT_COVERAGE_XML: &str = "coverage.xml";
}

/// Generate a UTC timestamp in ISO 8601 format: `YYYY-MM-DDTHH:MM:SSZ`
pub fn utc_now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
