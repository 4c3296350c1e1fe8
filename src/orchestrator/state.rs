//! Campaign stages.
//!
//! The orchestrator keeps no transition history: each stage re-derives what it
//! needs from the filesystem. `Stage` is the closed set of things an operator can
//! ask for, and the usual order is
//! `Mesh -> SubmitMesher -> PrepareSolve -> SubmitSolver/SubmitEach`, with
//! `CleanSolve` to reclaim space between iterations.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Build run directories, stage inputs, compile, distribute binaries.
    Mesh,

    /// Link mesh databases into every event directory.
    PrepareSolve,

    /// Remove linked mesh databases from every event directory.
    CleanSolve,

    /// Submit the mesher batch script from the mesh directory.
    SubmitMesher,

    /// Submit the solver job array over an inclusive index range.
    SubmitSolver { first: u32, last: u32 },

    /// Submit per-event solver scripts one directory at a time, capped per invocation.
    ///
    /// `from` is the index (in sorted directory order) of the first directory to submit.
    SubmitEach { from: usize },
}

impl Stage {
    /// Get the operator-facing name for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Mesh => "mesh",
            Stage::PrepareSolve => "prepare_solve",
            Stage::CleanSolve => "clean_solve",
            Stage::SubmitMesher => "submit_mesher",
            Stage::SubmitSolver { .. } => "submit_solver",
            Stage::SubmitEach { .. } => "submit_each",
        }
    }

    /// Stages that delete files or submit many jobs ask for confirmation first.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Stage::Mesh | Stage::CleanSolve | Stage::SubmitEach { .. })
    }

    /// What must already be true on disk for this stage to do useful work.
    pub fn precondition(&self) -> Option<&'static str> {
        match self {
            Stage::Mesh => None,
            Stage::SubmitMesher => Some("mesh stage has staged the mesh directory"),
            Stage::PrepareSolve | Stage::CleanSolve => {
                Some("mesher has written mesh/DATABASES_MPI")
            }
            Stage::SubmitSolver { .. } | Stage::SubmitEach { .. } => {
                Some("prepare_solve has linked every event directory")
            }
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::SubmitSolver { first, last } => write!(f, "submit_solver[{}-{}]", first, last),
            Stage::SubmitEach { from } if *from > 0 => write!(f, "submit_each[{}..]", from),
            other => f.write_str(other.as_str()),
        }
    }
}
