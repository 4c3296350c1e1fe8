//! Specfem Stager
//!
//! Drives the staged lifecycle of a seismic forward/adjoint simulation campaign on
//! HPC scratch: per-event run directories, input staging, the external compile
//! step, mesh fan-out via symbolic links, and batch submission.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Campaign context, staging outcomes, stage reports
//! - **system**: Path planning and external command execution
//! - **config**: Parameter file loading and validation
//! - **log_collector**: `log` backend persisting each run to the campaign logs
//! - **orchestrator**: Stage dispatch, staging primitives, event catalog, phases

// Core foundational modules
pub mod error;
pub mod models;

// Path planning and external processes
pub mod system;

// Parameter file handling
pub mod config;

// Logging backend
pub mod log_collector;

// Stage orchestration
pub mod orchestrator;

// Re-export the log crate for macro usage
pub use log;

pub use log_collector::{LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{ConfigError, OrchestratorError, Result};

pub use models::{
    CampaignContext, JobKind, SkipReason, StageReport, StagingOutcome, SubmissionRecord,
    SubmissionRequest, ToolNames,
};

pub use config::{load_parameter_file, CampaignParams};

pub use system::{CampaignPaths, CommandOutcome, CommandRunner, Invocation, RunDirectory, SystemRunner};

pub use orchestrator::{LinkDirection, Orchestrator, Stage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
