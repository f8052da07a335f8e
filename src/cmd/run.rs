//! Run command: lint and/or test, then summarize.

use anyhow::Result;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};

use lintrun::executor::ProcessExecutor;
use lintrun::pipeline::Pipeline;
use lintrun::report::RunReport;
use lintrun::step::Selection;
use lintrun::ui::{self, colors, format};

use crate::GlobalArgs;

static RUN_INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Set up SIGINT handler: first Ctrl+C stops after the running step
fn setup_run_signal_handler() {
    RUN_INTERRUPTED.store(false, Ordering::SeqCst);
    let _ = ctrlc::set_handler(move || {
        if RUN_INTERRUPTED.load(Ordering::SeqCst) {
            eprintln!("\n{} Force exit", "✗".red());
            std::process::exit(130);
        }
        eprintln!(
            "\n{} Interrupt received - stopping after the current step...",
            "→".yellow()
        );
        eprintln!("  {} Press Ctrl+C again to force exit", "→".dimmed());
        RUN_INTERRUPTED.store(true, Ordering::SeqCst);
    });
}

/// Execute the selected steps and exit with the resolved status
pub fn cmd_run(global: &GlobalArgs, selection: Selection) -> Result<()> {
    let config = super::load_config(global)?;
    let quiet = global.is_quiet();
    tracing::debug!(?selection, package = %config.project.package, "starting run");

    setup_run_signal_handler();

    let mut executor = ProcessExecutor::new();
    let report = Pipeline::new(&config, &mut executor)
        .with_workdir(global.dir.as_deref())
        .quiet(quiet)
        .with_interrupt(&RUN_INTERRUPTED)
        .run(selection)?;

    if let Some(path) = &global.report {
        report.write_json(path)?;
        tracing::debug!(path = %path.display(), "wrote run report");
    }

    if !quiet {
        print_summary(&report);
    }

    if report.exit_code != 0 {
        std::process::exit(report.exit_code);
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", colors::secondary(&format::separator(40)));

    if report.steps.is_empty() && !report.interrupted {
        println!("Nothing to run: all selected steps are disabled");
        return;
    }

    for step in &report.steps {
        let mut line = format!(
            "{} {:<5} exit {}",
            ui::result_icon(step.success()),
            step.kind,
            step.status
        );
        if let Some(artifact) = &step.artifact {
            line.push_str(&format!(
                "  {}",
                colors::identifier(&artifact.display().to_string())
            ));
        }
        println!("{}", line);
    }

    if report.interrupted {
        println!("{} Interrupted", "✗".red());
    } else if report.passed() {
        println!(
            "{} {}",
            "✓".green(),
            colors::success(&format!("Passed (exit policy: {})", report.exit_policy))
        );
    } else {
        println!(
            "{} {}",
            "✗".red(),
            colors::error(&format!(
                "Failed with exit {} (exit policy: {})",
                report.exit_code, report.exit_policy
            ))
        );
    }
}
