//! Unified error type hierarchy for the campaign orchestrator
//!
//! Provides structured error handling with ConfigError (parameter file loading)
//! and OrchestratorError (every fatal stage condition).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Parameter file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parameter file not found: {0}")]
    FileNotFound(String),

    #[error("Parameter {0} not in parameter file")]
    MissingParameter(String),

    #[error("Invalid value for parameter {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid TOML in parameter file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Fatal stage conditions.
///
/// Every variant carries the path (or command) involved so an operator can tell
/// "mesher never ran" apart from a plain disk error.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Iteration descriptor absent; raised before any directory work.
    #[error("Iteration descriptor does not exist: {}", path.display())]
    MissingDescriptor { path: PathBuf },

    #[error("Iteration descriptor {} is malformed: {reason}", path.display())]
    MalformedDescriptor { path: PathBuf, reason: String },

    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Non-zero exit from the compiler invocation. The log is the only diagnostic.
    #[error("External tool '{command}' failed ({status}); see log {}", log.display())]
    ExternalTool {
        command: String,
        status: String,
        log: PathBuf,
    },

    #[error("The mesher has not been run: no mesh files in {}", path.display())]
    MesherNotRun { path: PathBuf },

    #[error("Failed to {action} {}: {source}", path.display())]
    Staging {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list directory {}: {source}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start '{command}' in {}: {source}", cwd.display())]
    Spawn {
        command: String,
        cwd: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Scheduler rejected '{command}' in {} ({status})", cwd.display())]
    SubmissionRejected {
        command: String,
        cwd: PathBuf,
        status: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl OrchestratorError {
    /// Stable short tag for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::MissingDescriptor { .. } => "missing_descriptor",
            OrchestratorError::MalformedDescriptor { .. } => "malformed_descriptor",
            OrchestratorError::DirectoryCreation { .. } => "directory_creation_failure",
            OrchestratorError::ExternalTool { .. } => "external_tool_failure",
            OrchestratorError::MesherNotRun { .. } => "mesher_not_run",
            OrchestratorError::Staging { .. } => "staging_failure",
            OrchestratorError::Listing { .. } => "listing_failure",
            OrchestratorError::Spawn { .. } => "spawn_failure",
            OrchestratorError::SubmissionRejected { .. } => "submission_rejected",
            OrchestratorError::Config(_) => "config_error",
        }
    }
}

/// Top-level result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
