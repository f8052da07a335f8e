//! Config commands: show the resolved configuration, validate it

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;

use lintrun::config::Config;

use crate::GlobalArgs;

/// Print the resolved configuration in config-file format
pub fn cmd_config_show(global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global)?;
    print!("{}", config.to_markdown()?);
    Ok(())
}

/// Validate config semantically and report issues
pub fn cmd_config_validate(global: &GlobalArgs) -> Result<()> {
    // Structural errors surface here as Err
    let config = super::load_config(global)?;

    println!("{}", "Validating lintrun configuration...".bold());
    println!();

    let mut errors = 0;
    let mut warnings = 0;

    errors += validate_tools(&config);
    warnings += check_inputs(&config, global.dir.as_deref());
    show_run_config(&config);

    println!();
    if errors == 0 && warnings == 0 {
        println!("{} Configuration is valid", "✓".green());
    } else if errors == 0 {
        println!(
            "{} Configuration valid with {} warning(s)",
            "✓".green(),
            warnings
        );
    } else {
        println!(
            "{} Found {} error(s) and {} warning(s)",
            "✗".red(),
            errors,
            warnings
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Validate that the enabled tools can be found
fn validate_tools(config: &Config) -> usize {
    println!("{}", "Checking tools...".dimmed());

    let mut errors = 0;
    let tools = [
        ("lint.command", &config.lint.command, config.lint.enabled),
        ("test.command", &config.test.command, config.test.enabled),
    ];

    for (key, command, enabled) in tools {
        if !enabled {
            println!("  {} {} (disabled)", "-".dimmed(), key);
            continue;
        }
        if command_exists(command) {
            println!("  {} {}: {}", "✓".green(), key, command.dimmed());
        } else {
            println!("  {} {}: {} - not found in PATH", "✗".red(), key, command);
            errors += 1;
        }
    }

    errors
}

/// Check if a command exists in PATH, or as a file when given as a path
fn command_exists(cmd: &str) -> bool {
    if cmd.contains('/') {
        return Path::new(cmd).is_file();
    }
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check the lint target and test path exist
fn check_inputs(config: &Config, dir: Option<&Path>) -> usize {
    println!("{}", "Checking inputs...".dimmed());

    let resolve = |p: &str| -> PathBuf {
        match dir {
            Some(dir) => dir.join(p),
            None => PathBuf::from(p),
        }
    };
    let mut warnings = 0;

    if config.lint.enabled {
        let package_dir = resolve(&config.project.package);
        if package_dir.is_dir() {
            println!("  {} {} (project.package)", "✓".green(), package_dir.display());
        } else {
            println!(
                "  {} {} is not a directory (project.package)",
                "⚠".yellow(),
                package_dir.display()
            );
            warnings += 1;
        }
    }

    if config.test.enabled {
        match config.test_path() {
            Ok(path) if resolve(&path).exists() => {
                println!("  {} {} (test.path)", "✓".green(), path);
            }
            Ok(path) => {
                println!("  {} {} not found (test.path)", "⚠".yellow(), path);
                warnings += 1;
            }
            Err(e) => {
                println!("  {} test.path: {}", "⚠".yellow(), e);
                warnings += 1;
            }
        }
    }

    warnings
}

/// Display sequencing and coverage settings (informational)
fn show_run_config(config: &Config) {
    println!("{}", "Run config...".dimmed());

    let coverage = &config.test.coverage;
    let xml = if !coverage.enabled {
        "coverage off".to_string()
    } else if coverage.xml {
        format!(
            "xml report: {}",
            coverage
                .xml_file
                .as_deref()
                .unwrap_or(lintrun::paths::DEFAULT_COVERAGE_XML)
        )
    } else {
        "console report only".to_string()
    };

    println!(
        "  {} exit policy: {}, fail fast: {}, {}",
        "ℹ".blue(),
        config.run.exit_policy,
        config.run.fail_fast,
        xml
    );
}
