/// Campaign path planning: canonical locations under the scratch root.
///
/// Every stage resolves its directories through `CampaignPaths` so that the
/// mesh, link and submission stages agree on naming. Nothing here touches the
/// filesystem.
use std::path::{Component, Path, PathBuf};

/// Name of the master mesh pseudo-event.
pub const MESH_DIR_NAME: &str = "mesh";

/// Fixed sub-structure of every run directory, parents before children.
pub const RUN_SUBDIRS: [&str; 5] = [
    "bin",
    "DATA",
    "DATA/cemRequest",
    "OUTPUT_FILES",
    "DATABASES_MPI",
];

/// Canonical path planner for one `(project, iteration)` campaign.
///
/// Layout:
/// ```text
/// scratch_root/
///   project/                 <- campaign root (job-array script, logs/)
///     logs/
///     iteration/             <- iteration root
///       <event>/             <- run directory per event
///       mesh/                <- master mesh run directory
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignPaths {
    scratch_root: PathBuf,
    project_name: String,
    iteration_name: String,
}

impl CampaignPaths {
    /// Build a planner. Trailing separators and `.` segments are normalized away.
    pub fn new(scratch_root: &Path, project_name: &str, iteration_name: &str) -> Self {
        CampaignPaths {
            scratch_root: normalize(scratch_root),
            project_name: trim_separators(project_name).to_string(),
            iteration_name: trim_separators(iteration_name).to_string(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn iteration_name(&self) -> &str {
        &self.iteration_name
    }

    /// `scratch_root/project`
    pub fn campaign_root(&self) -> PathBuf {
        self.scratch_root.join(&self.project_name)
    }

    /// `scratch_root/project/iteration`
    pub fn iteration_root(&self) -> PathBuf {
        self.campaign_root().join(&self.iteration_name)
    }

    /// `scratch_root/project/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.campaign_root().join("logs")
    }

    /// Run directory for an event name (or the literal `mesh`).
    pub fn run_dir(&self, event: &str) -> RunDirectory {
        RunDirectory::new(self.iteration_root().join(trim_separators(event)))
    }

    pub fn mesh_dir(&self) -> RunDirectory {
        self.run_dir(MESH_DIR_NAME)
    }
}

/// A single run directory and its fixed subdirectories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunDirectory {
    root: PathBuf,
}

impl RunDirectory {
    pub fn new(root: PathBuf) -> Self {
        RunDirectory { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn data(&self) -> PathBuf {
        self.root.join("DATA")
    }

    pub fn cem_request(&self) -> PathBuf {
        self.data().join("cemRequest")
    }

    pub fn output_files(&self) -> PathBuf {
        self.root.join("OUTPUT_FILES")
    }

    pub fn databases_mpi(&self) -> PathBuf {
        self.root.join("DATABASES_MPI")
    }

    pub fn topo_bathy(&self) -> PathBuf {
        self.data().join("topo_bathy")
    }

    /// All fixed subdirectories, in creation order.
    pub fn subdirectories(&self) -> Vec<PathBuf> {
        RUN_SUBDIRS.iter().map(|sub| self.root.join(sub)).collect()
    }
}

fn trim_separators(name: &str) -> &str {
    name.trim_matches(|c| c == '/' || c == std::path::MAIN_SEPARATOR)
}

/// Rebuild a path from its components, dropping trailing separators and `.` segments.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
