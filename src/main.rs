//! CLI entry point and command handlers for lintrun.

mod cmd;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use lintrun::config::{ConfigOverrides, ExitPolicy};
use lintrun::step::{Selection, StepKind};

#[derive(Parser)]
#[command(name = "lintrun")]
#[command(version)]
#[command(about = "Run the linter, then the tests with coverage", long_about = None)]
#[command(
    after_help = "EXAMPLES:\n    lintrun                    Lint, then test (same as 'lintrun run')\n    lintrun --cover-xml        Also write an XML coverage report\n    lintrun test --tests tests/test_other.py\n\n    Configuration is read from .lintrun/config.md when present."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Working directory for both steps
    #[arg(short = 'C', long = "dir", value_name = "DIR", global = true)]
    pub dir: Option<PathBuf>,
    /// Project config file (default: .lintrun/config.md)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
    /// Package to lint and measure coverage for
    #[arg(long, value_name = "NAME", global = true)]
    pub package: Option<String>,
    /// Test file or directory handed to the test runner
    #[arg(long = "tests", value_name = "PATH", global = true)]
    pub tests: Option<String>,
    /// Ask the test runner for an XML coverage report
    #[arg(long, global = true, overrides_with = "no_cover_xml")]
    pub cover_xml: bool,
    /// Do not ask for an XML coverage report, even if configured
    #[arg(long, global = true, overrides_with = "cover_xml")]
    pub no_cover_xml: bool,
    /// Stop after the first failing step
    #[arg(long, global = true)]
    pub fail_fast: bool,
    /// How step statuses become the exit status (last, any)
    #[arg(long, value_name = "POLICY", global = true)]
    pub exit_policy: Option<ExitPolicy>,
    /// Write a JSON run report to FILE
    #[arg(long, value_name = "FILE", global = true)]
    pub report: Option<PathBuf>,
    /// Only show tool output and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        let cover_xml = if self.cover_xml {
            Some(true)
        } else if self.no_cover_xml {
            Some(false)
        } else {
            None
        };

        ConfigOverrides {
            package: self.package.clone(),
            test_path: self.tests.clone(),
            cover_xml,
            fail_fast: self.fail_fast.then_some(true),
            exit_policy: self.exit_policy,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet || lintrun::ui::is_quiet()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Lint, then run the tests (default)
    Run,
    /// Run only the linter
    Lint,
    /// Run only the tests with coverage
    Test,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Validate configuration and check that the tools are in PATH
    Validate,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LINTRUN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let global = &cli.global;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd::run::cmd_run(global, Selection::All),
        Commands::Lint => cmd::run::cmd_run(global, Selection::Only(StepKind::Lint)),
        Commands::Test => cmd::run::cmd_run(global, Selection::Only(StepKind::Test)),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd::config::cmd_config_show(global),
            ConfigCommands::Validate => cmd::config::cmd_config_validate(global),
        },
        Commands::Completion { shell } => cmd_completion(shell),
    }
}

fn cmd_completion(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "lintrun", &mut io::stdout());
    Ok(())
}
