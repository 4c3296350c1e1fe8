//! System abstraction: path planning and external command execution.
//!
//! External tools (the compile script and the batch scheduler) are reached only
//! through the `CommandRunner` trait. Production code uses `SystemRunner`, which
//! spawns real processes with tokio; tests substitute a recording runner.

pub mod paths;

pub use paths::{CampaignPaths, RunDirectory, MESH_DIR_NAME};

use crate::error::OrchestratorError;
use futures::future::BoxFuture;
use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// One external command to run to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the process.
    pub cwd: PathBuf,
    /// When set, combined stdout/stderr is written to this file instead of captured.
    pub log_file: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: PathBuf) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            cwd,
            log_file: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn log_to(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Shell-style rendering for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit information of a finished external command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty when output went to a log file).
    pub stdout: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Trait for launching external processes and waiting for them.
///
/// There is no timeout: a hung tool blocks the stage until the operator interrupts.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, Result<CommandOutcome, OrchestratorError>>;
}

/// Default production implementation of CommandRunner.
#[derive(Clone, Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, Result<CommandOutcome, OrchestratorError>> {
        Box::pin(async move {
            let spawn_err = |source: std::io::Error| OrchestratorError::Spawn {
                command: invocation.command_line(),
                cwd: invocation.cwd.clone(),
                source,
            };

            let mut command = Command::new(&invocation.program);
            command.args(&invocation.args).current_dir(&invocation.cwd);

            if let Some(ref log_path) = invocation.log_file {
                let log = File::create(log_path).map_err(&spawn_err)?;
                let log_err = log.try_clone().map_err(&spawn_err)?;
                command.stdout(Stdio::from(log)).stderr(Stdio::from(log_err));
                log::debug!(
                    "[System] [EXEC] {} (output -> {})",
                    invocation.command_line(),
                    log_path.display()
                );
                let status = command.status().await.map_err(&spawn_err)?;
                return Ok(CommandOutcome {
                    code: status.code(),
                    stdout: String::new(),
                });
            }

            command.stdout(Stdio::piped()).stderr(Stdio::inherit());
            log::debug!("[System] [EXEC] {}", invocation.command_line());
            let output = command.output().await.map_err(&spawn_err)?;
            Ok(CommandOutcome {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        })
    }
}
