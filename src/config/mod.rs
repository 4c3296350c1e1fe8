//! Campaign parameter configuration.
//!
//! The parameter file is the only configuration input. It names the campaign
//! (`project_name`, `iteration_name`), where things live (`scratch_path`,
//! `lasif_path`, `specfem_root`) and the opaque `compiler_suite`. Optional keys
//! override cluster-specific script names.
//!
//! # Module Structure
//!
//! - `loader`: reads key/value or TOML parameter files into `CampaignParams`
//! - `validator`: checks identifiers that become path components or arguments

pub mod loader;
pub mod validator;

pub use loader::load_parameter_file;

use crate::error::ConfigError;
use crate::models::{CampaignContext, ToolNames};
use crate::system::CampaignPaths;
use serde::Deserialize;
use std::path::PathBuf;

/// Default cap on per-directory submissions per invocation.
pub const DEFAULT_SUBMISSION_CAP: usize = 10;

/// Parameters read from the campaign parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CampaignParams {
    pub compiler_suite: String,
    pub project_name: String,
    pub scratch_path: PathBuf,
    pub specfem_root: PathBuf,
    pub lasif_path: PathBuf,
    pub iteration_name: String,

    #[serde(default)]
    pub compile_script: Option<String>,
    #[serde(default)]
    pub scheduler: Option<String>,
    #[serde(default)]
    pub mesher_script: Option<String>,
    #[serde(default)]
    pub solver_script: Option<String>,
    #[serde(default)]
    pub solver_array_script: Option<String>,
    #[serde(default)]
    pub submission_cap: Option<usize>,
}

impl CampaignParams {
    /// Validate and turn the parameters into the context every stage receives.
    pub fn into_context(self) -> Result<CampaignContext, ConfigError> {
        validator::validate_params(&self)?;

        let defaults = ToolNames::default();
        let tools = ToolNames {
            compile_script: self.compile_script.unwrap_or(defaults.compile_script),
            scheduler: self.scheduler.unwrap_or(defaults.scheduler),
            mesher_script: self.mesher_script.unwrap_or(defaults.mesher_script),
            solver_script: self.solver_script.unwrap_or(defaults.solver_script),
            solver_array_script: self
                .solver_array_script
                .unwrap_or(defaults.solver_array_script),
        };

        Ok(CampaignContext {
            paths: CampaignPaths::new(&self.scratch_path, &self.project_name, &self.iteration_name),
            lasif_root: self.lasif_path,
            specfem_root: self.specfem_root,
            compiler_suite: self.compiler_suite,
            tools,
            submission_cap: self.submission_cap.unwrap_or(DEFAULT_SUBMISSION_CAP),
        })
    }
}
