//! Core data structures shared by every stage.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::system::CampaignPaths;

/// Names of the scheduler scripts and external commands for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    /// Compile/mesh-generation script inside the solver installation.
    pub compile_script: String,
    /// Batch submission command.
    pub scheduler: String,
    /// Mesher batch script submitted from the mesh directory.
    pub mesher_script: String,
    /// Per-event solver script (throttled per-directory submission).
    pub solver_script: String,
    /// Solver job-array script kept in the campaign root.
    pub solver_array_script: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        ToolNames {
            compile_script: "mk_daint.sh".to_string(),
            scheduler: "sbatch".to_string(),
            mesher_script: "job_mesher_daint.sbatch".to_string(),
            solver_script: "job_solver_daint.sbatch".to_string(),
            solver_array_script: "jobArray_solver_daint.sbatch".to_string(),
        }
    }
}

/// Everything a stage needs to know about the campaign, passed explicitly.
#[derive(Debug, Clone)]
pub struct CampaignContext {
    pub paths: CampaignPaths,
    /// LASIF project root (ITERATIONS/, OUTPUT/, SUBMISSION/).
    pub lasif_root: PathBuf,
    /// Solver installation root (compile script, bin/, DATA/).
    pub specfem_root: PathBuf,
    /// Opaque compiler-suite identifier handed to the compile script.
    pub compiler_suite: String,
    pub tools: ToolNames,
    /// Maximum per-directory submissions per invocation.
    pub submission_cap: usize,
}

impl CampaignContext {
    pub fn iteration_name(&self) -> &str {
        self.paths.iteration_name()
    }

    /// `lasif_root/ITERATIONS/ITERATION_<name>.xml`
    pub fn iteration_descriptor(&self) -> PathBuf {
        self.lasif_root
            .join("ITERATIONS")
            .join(format!("ITERATION_{}.xml", self.iteration_name()))
    }

    pub fn lasif_output(&self) -> PathBuf {
        self.lasif_root.join("OUTPUT")
    }

    pub fn submission_dir(&self) -> PathBuf {
        self.lasif_root.join("SUBMISSION")
    }

    /// Parameter file staged into the solver installation before compiling.
    pub fn submission_par_file(&self) -> PathBuf {
        self.submission_dir().join("Par_file")
    }

    pub fn specfem_bin(&self) -> PathBuf {
        self.specfem_root.join("bin")
    }

    pub fn specfem_data(&self) -> PathBuf {
        self.specfem_root.join("DATA")
    }

    pub fn compilation_log(&self) -> PathBuf {
        self.specfem_root.join("compilation_log.txt")
    }

    /// Extension that marks scheduler scripts when scanning the iteration root.
    pub fn script_extension(&self) -> &str {
        Path::new(&self.tools.solver_array_script)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("sbatch")
    }
}

/// Why a staging primitive did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Source is a directory.
    SourceIsDirectory,
    /// Destination directory does not exist.
    DestinationMissing,
    /// Link or file already present at the destination.
    AlreadyPresent,
    /// Nothing to remove.
    Absent,
    /// Removal failed for another reason; logged and ignored.
    RemoveFailed,
    /// Entry is a regular file or a link to something other than the mesh copy.
    NotOurLink,
}

/// Result of a single staging primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingOutcome {
    Applied,
    Skipped(SkipReason),
}

impl StagingOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StagingOutcome::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Mesher,
    Solver,
}

/// One request handed to the scheduler. Not tracked after acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    pub job_kind: JobKind,
    /// Inclusive array range, solver job arrays only.
    pub array_range: Option<(u32, u32)>,
    pub target_directory: PathBuf,
}

impl SubmissionRequest {
    /// Scheduler array argument, e.g. `"0-4"`.
    pub fn array_spec(&self) -> Option<String> {
        self.array_range
            .map(|(first, last)| format!("{}-{}", first, last))
    }
}

/// A submission the scheduler accepted, with whatever it printed.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub request: SubmissionRequest,
    pub scheduler_output: String,
}

/// Summary of one stage reconcile pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub applied: usize,
    pub skipped: usize,
    pub directories: Vec<PathBuf>,
    pub submissions: Vec<SubmissionRecord>,
}

impl StageReport {
    pub fn new(stage: &str) -> Self {
        StageReport {
            stage: stage.to_string(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: StagingOutcome) {
        match outcome {
            StagingOutcome::Applied => self.applied += 1,
            StagingOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn touched(&mut self, dir: &Path) {
        self.directories.push(dir.to_path_buf());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> CampaignContext {
        CampaignContext {
            paths: CampaignPaths::new(Path::new("/scratch"), "P", "S1"),
            lasif_root: PathBuf::from("/lasif"),
            specfem_root: PathBuf::from("/specfem"),
            compiler_suite: "cray".to_string(),
            tools: ToolNames::default(),
            submission_cap: 10,
        }
    }

    #[test]
    fn test_descriptor_path() {
        let ctx = test_context();
        assert_eq!(
            ctx.iteration_descriptor(),
            PathBuf::from("/lasif/ITERATIONS/ITERATION_S1.xml")
        );
        assert_eq!(ctx.script_extension(), "sbatch");
    }

    #[test]
    fn test_array_spec() {
        let req = SubmissionRequest {
            job_kind: JobKind::Solver,
            array_range: Some((0, 4)),
            target_directory: PathBuf::from("/scratch/P"),
        };
        assert_eq!(req.array_spec().as_deref(), Some("0-4"));
    }

    #[test]
    fn test_report_counts() {
        let mut report = StageReport::new("mesh");
        report.record(StagingOutcome::Applied);
        report.record(StagingOutcome::Skipped(SkipReason::DestinationMissing));
        report.record(StagingOutcome::Applied);
        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, 1);
    }
}
