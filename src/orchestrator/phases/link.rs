//! Link stage: share the master mesh with every event directory, or take it back.
//!
//! Mesh databases are symlinked (they are large and identical for every event);
//! mesher output files are copied. Event directories are rediscovered by listing
//! the iteration root, so the stage works on whatever tree is actually there.

use crate::error::{OrchestratorError, Result};
use crate::models::{CampaignContext, StageReport};
use crate::orchestrator::staging::{copy_into, link, list_entries, unlink};
use crate::system::{RunDirectory, MESH_DIR_NAME};
use std::path::PathBuf;

/// Direction of the link stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    Prepare,
    Clean,
}

/// Files in `mesh/DATABASES_MPI`, or `MesherNotRun` when there are none.
pub fn mesh_databases(ctx: &CampaignContext) -> Result<Vec<PathBuf>> {
    let databases = ctx.paths.mesh_dir().databases_mpi();
    let not_run = || OrchestratorError::MesherNotRun {
        path: databases.clone(),
    };
    if !databases.is_dir() {
        return Err(not_run());
    }
    let entries = list_entries(&databases)?;
    if entries.is_empty() {
        return Err(not_run());
    }
    Ok(entries)
}

/// Every run directory except `mesh`, skipping scheduler scripts and plain files.
pub fn event_directories(ctx: &CampaignContext) -> Result<Vec<RunDirectory>> {
    let script_marker = format!(".{}", ctx.script_extension());
    let mut dirs = Vec::new();
    for entry in list_entries(&ctx.paths.iteration_root())? {
        let name = match entry.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if name == MESH_DIR_NAME || name.contains(&script_marker) || !entry.is_dir() {
            continue;
        }
        dirs.push(RunDirectory::new(entry));
    }
    Ok(dirs)
}

/// Link (or unlink) the master mesh into every event directory.
///
/// The mesher precondition is checked before any directory is touched, so a
/// failure never leaves a partial link set behind.
pub fn reconcile(ctx: &CampaignContext, direction: LinkDirection) -> Result<StageReport> {
    let stage = match direction {
        LinkDirection::Prepare => "prepare_solve",
        LinkDirection::Clean => "clean_solve",
    };
    let mut report = StageReport::new(stage);

    let databases = mesh_databases(ctx)?;
    let mesh = ctx.paths.mesh_dir();
    let output_files = match direction {
        LinkDirection::Prepare => list_entries(&mesh.output_files())?,
        LinkDirection::Clean => Vec::new(),
    };
    let targets = event_directories(ctx)?;

    for run in &targets {
        let name = run.root().file_name().map(|n| n.to_string_lossy().into_owned());
        match direction {
            LinkDirection::Prepare => {
                log::info!("[Link] Linking {}", name.unwrap_or_default());
                for source in &databases {
                    if let Some(file_name) = source.file_name() {
                        let dest = run.databases_mpi().join(file_name);
                        report.record(link(source, &dest)?);
                    }
                }
                for source in &output_files {
                    report.record(copy_into(source, &run.output_files())?);
                }
            }
            LinkDirection::Clean => {
                log::info!("[Link] Cleaning {}", name.unwrap_or_default());
                // Only links back to the mesh copy go; event-local files stay.
                for source in &databases {
                    if let Some(file_name) = source.file_name() {
                        report.record(unlink(&run.databases_mpi().join(file_name), source));
                    }
                }
            }
        }
        report.touched(run.root());
    }

    log::info!(
        "[Link] Done: {} directories, {} applied, {} skipped",
        targets.len(),
        report.applied,
        report.skipped
    );
    Ok(report)
}
