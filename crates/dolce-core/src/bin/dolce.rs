//! `dolce` command-line entry point.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use _dolce_core::commands;
use _dolce_core::config::DolceConfig;
use _dolce_core::errors::DolceResult;
use _dolce_core::logging::init_tracing;
use _dolce_core::oracle::Oracle;
use _dolce_core::rules::Catalogue;

/// Exit code for configuration, connection and I/O failures.
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "dolce", version, about = "Docstring linter for Python code")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check docstrings in the specified Python file or directory.
    Check {
        /// Python file or directory to check.
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,

        /// Model name to use, overriding the configuration.
        #[arg(long, value_name = "MODEL")]
        model: Option<String>,

        /// Disable LLM-based checks, even if configured.
        #[arg(long)]
        no_llm: bool,
    },
    /// List all available rules with their references and descriptions.
    Rules,
}

fn check(path: PathBuf, model: Option<String>, no_llm: bool) -> DolceResult<u8> {
    let catalogue = Catalogue::builtin()?;
    let mut config = DolceConfig::load(&path)?;
    config.apply_overrides(model, no_llm);
    let oracle = commands::build_oracle(&config, &catalogue)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = commands::run_check(
        &path,
        &config,
        &catalogue,
        oracle.as_ref().map(|o| o as &dyn Oracle),
        &mut out,
    )?;
    out.flush()?;
    Ok(summary.exit_code() as u8)
}

fn rules() -> DolceResult<u8> {
    let catalogue = Catalogue::builtin()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::list_rules(&catalogue, &mut out)?;
    Ok(0)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.cmd {
        Command::Check {
            path,
            model,
            no_llm,
        } => check(path, model, no_llm),
        Command::Rules => rules(),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
