use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use specfem_stager::{
    load_parameter_file, CampaignPaths, ConfigError, LogCollector, Orchestrator,
    OrchestratorError, Stage, StageReport, SystemRunner,
};

#[derive(Parser)]
#[command(
    name = "specfem_stager",
    version,
    about = "Stage, compile, link and submit a SPECFEM simulation campaign"
)]
struct Cli {
    /// Campaign parameter file (key/value lines or .toml)
    #[arg(short = 'f', long = "parameter-file", global = true)]
    parameter_file: Option<PathBuf>,

    /// Skip interactive confirmation prompts
    #[arg(long, global = true)]
    yes: bool,

    /// Print the stage report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create run directories, stage inputs, compile and distribute binaries
    Mesh,
    /// Link the master mesh into every event directory
    PrepareSolve,
    /// Remove linked mesh files from every event directory
    CleanSolve,
    /// Submit the mesher job from the mesh directory
    SubmitMesher,
    /// Submit the solver job array for an inclusive index range
    SubmitSolver {
        #[arg(long = "first-job", short = 'F')]
        first_job: u32,
        #[arg(long = "last-job", short = 'L')]
        last_job: u32,
    },
    /// Submit per-event solver scripts, a capped number per invocation
    SubmitEach {
        /// Index of the first event directory to submit (sorted by name)
        #[arg(long, default_value_t = 0)]
        from: usize,
    },
}

impl Commands {
    fn stage(&self) -> Stage {
        match self {
            Commands::Mesh => Stage::Mesh,
            Commands::PrepareSolve => Stage::PrepareSolve,
            Commands::CleanSolve => Stage::CleanSolve,
            Commands::SubmitMesher => Stage::SubmitMesher,
            Commands::SubmitSolver { first_job, last_job } => Stage::SubmitSolver {
                first: *first_job,
                last: *last_job,
            },
            Commands::SubmitEach { from } => Stage::SubmitEach { from: *from },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let collector = LogCollector::new(level, true)
        .install()
        .context("Failed to register logger")?;

    let result = run(&cli, &collector).await;
    collector.wait_for_empty();

    match result {
        Ok(Some(report)) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            if cli.json {
                let kind = error_kind(&err);
                println!(
                    "{}",
                    json!({ "error": kind, "message": format!("{:#}", err) })
                );
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

async fn run(cli: &Cli, collector: &LogCollector) -> Result<Option<StageReport>> {
    let parameter_file = cli
        .parameter_file
        .as_ref()
        .context("A parameter file is required (-f)")?;
    let params = load_parameter_file(parameter_file)
        .map_err(OrchestratorError::from)
        .with_context(|| format!("Failed to load {}", parameter_file.display()))?;
    let ctx = params.into_context().map_err(OrchestratorError::from)?;

    let stage = cli.command.stage();
    let orchestrator = Orchestrator::new(ctx, Arc::new(SystemRunner::new()));

    if !cli.yes {
        if let Some(prompt) = orchestrator.confirmation_prompt(stage)? {
            collector.wait_for_empty();
            if !confirm(&prompt)? {
                log::info!("[Main] Aborted by operator");
                return Ok(None);
            }
        }
    }

    let result = orchestrator.run(stage).await;
    if let Some(log_dir) = session_log_dir(&orchestrator.context().paths) {
        match collector.start_session(&log_dir, stage.as_str()) {
            Ok(path) => log::debug!("[Main] Session log: {}", path.display()),
            Err(e) => log::warn!("[Main] {}", e),
        }
    }
    Ok(Some(result?))
}

/// Where this run's log goes, or `None` when the campaign root does not exist.
/// Logging never creates the campaign root itself.
fn session_log_dir(paths: &CampaignPaths) -> Option<PathBuf> {
    let root = paths.campaign_root();
    if root.is_dir() {
        Some(paths.logs_dir().join("orchestrator"))
    } else {
        None
    }
}

/// Error tag for `--json` output.
fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<OrchestratorError>() {
        e.kind()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "config_error"
    } else {
        "command_failed"
    }
}

/// Ask the operator to press enter. EOF counts as a refusal.
fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = std::io::stderr();
    writeln!(
        stderr,
        "{}\n\n+++> Press enter to confirm, or ctrl-C to quit. <+++",
        prompt
    )?;
    stderr.flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    Ok(read > 0)
}
